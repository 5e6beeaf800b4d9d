use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use super::types::*;

const COLUMNS: &str = "id, association_id, association_name, email, password_hash, \
                       is_active, is_superadmin, created_at";

/// Emails are stored and compared lower-case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>(&format!("SELECT {COLUMNS} FROM spolky_accounts WHERE email = $1"))
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;
    Ok(account)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>(&format!("SELECT {COLUMNS} FROM spolky_accounts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(account)
}

pub async fn create(pool: &PgPool, new: &NewAccount) -> Result<Uuid, AppError> {
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO spolky_accounts (association_id, association_name, email, password_hash, is_superadmin) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&new.association_id)
    .bind(&new.association_name)
    .bind(normalize_email(&new.email))
    .bind(&new.password_hash)
    .bind(new.is_superadmin)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn update_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE spolky_accounts SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
