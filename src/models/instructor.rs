use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Instructor {
    pub id: i64,
    pub name: String,
    pub email: String,
}
