use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};

use spolky_admin::auth::rate_limit::RateLimiter;
use spolky_admin::config::AppConfig;
use spolky_admin::slides::SaveLocks;
use spolky_admin::storage::{PUBLIC_OBJECT_PREFIX, local::LocalBlobStore};
use spolky_admin::{audit, db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(|e| std::io::Error::other(e.to_string()))?;

    let pool = db::init_pool(&config.database_url)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to connect to database: {e}")))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to run migrations: {e}")))?;

    if let Some(admin) = &config.admin {
        db::seed_admin(&pool, admin)
            .await
            .map_err(|e| std::io::Error::other(format!("Failed to seed admin: {e}")))?;
    }

    audit::spawn_retention_task(pool.clone(), config.audit_retention_days);

    std::fs::create_dir_all(std::path::Path::new(&config.storage_root).join(&config.storage_bucket))?;
    let blobs = LocalBlobStore::new(&config.storage_root, &config.storage_bucket, &config.public_base_url);

    // Session encryption key; load from SESSION_KEY for sessions that survive restarts
    let secret_key = match &config.session_key {
        Some(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Some(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+); generating random key", val.len());
            Key::generate()
        }
        None => {
            log::warn!("No SESSION_KEY set; generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    if config.prune_orphaned_images {
        log::info!("Orphaned slide images are pruned on save");
    }

    let bind_addr = config.bind_addr.clone();
    let storage_root = config.storage_root.clone();
    let max_payload = config.max_payload_bytes;
    let config = web::Data::new(config);
    let blobs = web::Data::new(blobs);
    let locks = web::Data::new(SaveLocks::new());
    let limiter = web::Data::new(RateLimiter::new());

    log::info!("Starting server at http://{}", bind_addr);

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
            .cookie_secure(false)
            .cookie_http_only(true)
            .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(config.clone())
            .app_data(blobs.clone())
            .app_data(locks.clone())
            .app_data(limiter.clone())
            .app_data(web::PayloadConfig::new(max_payload))
            .app_data(web::JsonConfig::default().limit(max_payload))
            // Stored slide images, read-only
            .service(actix_files::Files::new(&format!("/{PUBLIC_OBJECT_PREFIX}"), &storage_root))
            .configure(handlers::configure)
            .default_service(web::to(|| async {
                actix_web::HttpResponse::NotFound().json(serde_json::json!({ "error": "Not found" }))
            }))
    })
    .bind(bind_addr)?
    .run()
    .await
}
