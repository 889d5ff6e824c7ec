use async_trait::async_trait;
use lodging_core::models::{EnrollmentId, Ticket, TicketType};
use lodging_core::repository::TicketRepository;
use lodging_core::CoreResult;
use sqlx::PgPool;

use crate::database::db_error;

pub struct StoreTicketRepository {
    pool: PgPool,
}

impl StoreTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: i32,
    enrollment_id: i32,
    status: String,
    ticket_type_id: i32,
    ticket_type_name: String,
    price: i32,
    is_remote: bool,
    includes_hotel: bool,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = lodging_core::CoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            enrollment_id: row.enrollment_id,
            status: row.status.parse()?,
            ticket_type: TicketType {
                id: row.ticket_type_id,
                name: row.ticket_type_name,
                price: row.price,
                is_remote: row.is_remote,
                includes_hotel: row.includes_hotel,
            },
        })
    }
}

#[async_trait]
impl TicketRepository for StoreTicketRepository {
    async fn find_by_enrollment_id(&self, enrollment_id: EnrollmentId) -> CoreResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT t.id, t.enrollment_id, t.status,
                   tt.id AS ticket_type_id, tt.name AS ticket_type_name,
                   tt.price, tt.is_remote, tt.includes_hotel
            FROM tickets t
            INNER JOIN ticket_types tt ON tt.id = t.ticket_type_id
            WHERE t.enrollment_id = $1
            ORDER BY t.id ASC
            LIMIT 1
            "#,
        )
        .bind(enrollment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Ticket::try_from).transpose()
    }
}
