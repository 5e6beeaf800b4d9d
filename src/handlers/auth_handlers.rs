use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use sqlx::PgPool;

use crate::audit;
use crate::auth::session::store_operator;
use crate::auth::{password, rate_limit::RateLimiter, validate};
use crate::context::SessionContext;
use crate::errors::AppError;
use crate::models::account::{self, AccountView};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

fn client_ip(req: &HttpRequest) -> std::net::IpAddr {
    req.peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED))
}

/// POST /api/auth/login
pub async fn login(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    limiter: web::Data<RateLimiter>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    // Rate-limit check BEFORE any database access
    let ip = client_ip(&req);
    if limiter.is_blocked(ip) {
        log::warn!("Login blocked for {}: too many failed attempts", ip);
        return Ok(HttpResponse::TooManyRequests().json(serde_json::json!({
            "error": "Too many failed login attempts. Please try again later."
        })));
    }

    let found = account::find_by_email(&pool, &body.email)
        .await?
        .filter(|a| a.is_active);

    // Unknown emails still pay for one verification
    let verified = password::verify_login(&body.password, found.as_ref().map(|a| a.password_hash.as_str()));

    match found {
        Some(account) if verified => {
            limiter.clear(ip);
            let ctx = SessionContext::from(&account);
            session.renew();
            store_operator(&session, &ctx)?;
            log::info!("Operator {} signed in", ctx.email);
            Ok(HttpResponse::Ok().json(AccountView::from(account)))
        }
        _ => {
            limiter.record_failure(ip);
            Ok(HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "Invalid email or password"
            })))
        }
    }
}

/// POST /api/auth/logout
pub async fn logout(session: Session) -> Result<HttpResponse, AppError> {
    session.purge();
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/auth/me
pub async fn me(ctx: SessionContext) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ctx))
}

/// POST /api/auth/password
pub async fn change_password(
    pool: web::Data<PgPool>,
    ctx: SessionContext,
    body: web::Json<PasswordChangeRequest>,
) -> Result<HttpResponse, AppError> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_password(&body.new_password));
    if body.new_password != body.confirm_password {
        errors.push("Passwords do not match".to_string());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let account = account::find_by_id(&pool, ctx.account_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let current_ok = password::verify_password(&body.current_password, &account.password_hash)
        .map_err(AppError::Hash)?;
    if !current_ok {
        return Err(AppError::Validation(vec!["Current password is incorrect".to_string()]));
    }

    let new_hash = password::hash_password(&body.new_password).map_err(AppError::Hash)?;
    account::update_password(&pool, account.id, &new_hash).await?;

    audit::log(
        &pool,
        &ctx,
        "account.password_changed",
        "account",
        &account.id.to_string(),
        serde_json::json!({}),
    )
    .await;

    Ok(HttpResponse::NoContent().finish())
}
