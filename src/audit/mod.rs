use std::time::Duration;

use serde_json::Value;
use sqlx::PgPool;

use crate::context::SessionContext;

const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Record an operator action. Failures are logged and swallowed; the
/// mutation being audited has already happened.
pub async fn log(
    pool: &PgPool,
    ctx: &SessionContext,
    action: &str,
    target_type: &str,
    target_id: &str,
    details: Value,
) {
    let result = sqlx::query(
        "INSERT INTO audit_log (actor_email, association_id, action, target_type, target_id, details) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(&ctx.email)
    .bind(&ctx.association_id)
    .bind(action)
    .bind(target_type)
    .bind(target_id)
    .bind(details)
    .execute(pool)
    .await;

    if let Err(e) = result {
        log::error!("Failed to write audit entry '{}' for {}: {}", action, target_id, e);
    }
}

/// Delete entries older than `retention_days`. Returns how many went.
pub async fn cleanup_old_entries(pool: &PgPool, retention_days: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM audit_log WHERE created_at < NOW() - make_interval(days => $1)")
        .bind(i32::try_from(retention_days).unwrap_or(i32::MAX))
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Sweep old audit entries once a day.
pub fn spawn_retention_task(pool: PgPool, retention_days: i64) {
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(RETENTION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match cleanup_old_entries(&pool, retention_days).await {
                Ok(0) => {}
                Ok(n) => log::info!("Audit retention: removed {} entries older than {} days", n, retention_days),
                Err(e) => log::error!("Audit retention sweep failed: {}", e),
            }
        }
    });
}
