use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lodging_core::models::{Address, Enrollment, UserId};
use lodging_core::repository::EnrollmentRepository;
use lodging_core::CoreResult;
use lodging_shared::Masked;
use sqlx::PgPool;

use crate::database::db_error;

pub struct StoreEnrollmentRepository {
    pool: PgPool,
}

impl StoreEnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Enrollment joined with its (optional) address
#[derive(sqlx::FromRow)]
struct EnrollmentRow {
    id: i32,
    user_id: i32,
    name: String,
    cpf: String,
    birthday: DateTime<Utc>,
    phone: String,
    cep: Option<String>,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    number: Option<String>,
    neighborhood: Option<String>,
    address_detail: Option<String>,
}

impl From<EnrollmentRow> for Enrollment {
    fn from(row: EnrollmentRow) -> Self {
        let address = match (row.cep, row.street, row.city, row.state, row.number, row.neighborhood) {
            (Some(cep), Some(street), Some(city), Some(state), Some(number), Some(neighborhood)) => Some(Address {
                cep,
                street: Masked(street),
                city,
                state,
                number: Masked(number),
                neighborhood,
                address_detail: row.address_detail.map(Masked),
            }),
            _ => None,
        };

        Enrollment {
            id: row.id,
            user_id: row.user_id,
            name: Masked(row.name),
            cpf: Masked(row.cpf),
            birthday: row.birthday,
            phone: Masked(row.phone),
            address,
        }
    }
}

#[async_trait]
impl EnrollmentRepository for StoreEnrollmentRepository {
    async fn find_by_user_id(&self, user_id: UserId) -> CoreResult<Option<Enrollment>> {
        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT e.id, e.user_id, e.name, e.cpf, e.birthday, e.phone,
                   a.cep, a.street, a.city, a.state, a.number, a.neighborhood, a.address_detail
            FROM enrollments e
            LEFT JOIN addresses a ON a.enrollment_id = e.id
            WHERE e.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Enrollment::from))
    }
}
