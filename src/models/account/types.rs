use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Operator account of one association.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub association_id: String,
    pub association_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_superadmin: bool,
    pub created_at: DateTime<Utc>,
}

/// Account without its credential, for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub association_id: String,
    pub association_name: String,
    pub email: String,
    pub is_superadmin: bool,
}

impl From<Account> for AccountView {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            association_id: a.association_id,
            association_name: a.association_name,
            email: a.email,
            is_superadmin: a.is_superadmin,
        }
    }
}

/// Insert payload; `password_hash` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub association_id: String,
    pub association_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_superadmin: bool,
}
