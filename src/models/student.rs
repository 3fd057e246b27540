use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

/// Read-only reference to the identity domain. A student carries up to two
/// independent NFC surrogates: a physical card id and a phone (HCE) id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub card_id: Option<String>,
    pub phone_id: Option<String>,
}

impl Student {
    pub async fn find_by_card_id(
        ex: impl PgExecutor<'_>,
        card_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE card_id = $1")
            .bind(card_id)
            .fetch_optional(ex)
            .await
    }

    pub async fn find_by_phone_id(
        ex: impl PgExecutor<'_>,
        phone_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE phone_id = $1")
            .bind(phone_id)
            .fetch_optional(ex)
            .await
    }
}
