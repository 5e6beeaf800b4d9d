use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::password;
use crate::config::AdminBootstrap;
use crate::errors::AppError;
use crate::models::account::{self, NewAccount};

pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(8)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Create the configured superadmin unless an account with that email exists.
pub async fn seed_admin(pool: &PgPool, admin: &AdminBootstrap) -> Result<(), AppError> {
    if account::find_by_email(pool, &admin.email).await?.is_some() {
        log::debug!("Admin account {} already present", admin.email);
        return Ok(());
    }

    let password_hash = password::hash_password(&admin.password).map_err(AppError::Hash)?;
    let id = account::create(
        pool,
        &NewAccount {
            association_id: admin.association_id.clone(),
            association_name: admin.association_name.clone(),
            email: admin.email.clone(),
            password_hash,
            is_superadmin: true,
        },
    )
    .await?;

    log::info!("Created superadmin account {} ({})", admin.email, id);
    Ok(())
}
