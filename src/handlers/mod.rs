pub mod auth_handlers;
pub mod image_handlers;
pub mod notification_handlers;
pub mod tutorial_handlers;

use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::Method,
    middleware::{Next, from_fn},
    web,
};

use crate::auth::middleware::require_auth;

/// CSRF guard for mutation endpoints.
///
/// Rejects POST/PUT/DELETE requests without `Content-Type: application/json`.
/// A cross-site form post cannot set that header, so no token is needed.
pub async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == Method::POST || method == Method::PUT || method == Method::DELETE {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let body = serde_json::json!({
                "error": "Content-Type must be application/json for mutation requests"
            });
            let response = HttpResponse::BadRequest().json(body);
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Register every API route.
///
/// Narrow `/api/...` resources come before the authenticated `/api` scope,
/// which would otherwise swallow them.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/public")
            .route("/notifications", web::get().to(notification_handlers::public_list))
            .route("/notifications/{id}/view", web::post().to(notification_handlers::record_view))
            .route("/notifications/{id}/click", web::post().to(notification_handlers::record_click)),
    );
    cfg.service(
        web::resource("/api/auth/login")
            .wrap(from_fn(require_json_content_type))
            .route(web::post().to(auth_handlers::login)),
    );
    cfg.service(
        web::resource("/api/images/normalize")
            .wrap(from_fn(require_auth))
            .route(web::post().to(image_handlers::normalize)),
    );
    cfg.service(
        web::scope("/api")
            .wrap(from_fn(require_json_content_type))
            .wrap(from_fn(require_auth))
            .route("/auth/logout", web::post().to(auth_handlers::logout))
            .route("/auth/me", web::get().to(auth_handlers::me))
            .route("/auth/password", web::post().to(auth_handlers::change_password))
            // /pending before /{id}
            .route("/notifications", web::get().to(notification_handlers::list))
            .route("/notifications", web::post().to(notification_handlers::create))
            .route("/notifications/pending", web::get().to(notification_handlers::pending))
            .route("/notifications/{id}", web::delete().to(notification_handlers::delete))
            .route("/notifications/{id}/approve", web::post().to(notification_handlers::approve))
            .route("/notifications/{id}/reject", web::post().to(notification_handlers::reject))
            .route("/tutorials", web::get().to(tutorial_handlers::list))
            .route("/tutorials", web::post().to(tutorial_handlers::create))
            .route("/tutorials/{id}", web::get().to(tutorial_handlers::read))
            .route("/tutorials/{id}", web::put().to(tutorial_handlers::update))
            .route("/tutorials/{id}", web::delete().to(tutorial_handlers::delete)),
    );
}
