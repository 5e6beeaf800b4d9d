//! HTTP layer tests: the JSON content-type guard, the auth gate, the session
//! extractor and error rendering.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{
    App, HttpResponse, ResponseError,
    body::to_bytes,
    cookie::Key,
    http::StatusCode,
    middleware::from_fn,
    test, web,
};
use uuid::Uuid;

use spolky_admin::auth::middleware::require_auth;
use spolky_admin::context::SessionContext;
use spolky_admin::errors::AppError;
use spolky_admin::handlers::require_json_content_type;
use spolky_admin::images::NormalizeError;
use spolky_admin::slides::{ReconcileError, ReconcileStage};
use spolky_admin::storage::StoreError;

async fn ok() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn whoami(ctx: SessionContext) -> HttpResponse {
    HttpResponse::Ok().json(ctx)
}

fn session() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_secure(false)
        .build()
}

#[actix_web::test]
async fn test_guard_rejects_non_json_mutations() {
    let app = test::init_service(
        App::new().service(
            web::scope("/api")
                .wrap(from_fn(require_json_content_type))
                .route("/thing", web::post().to(ok))
                .route("/thing", web::get().to(ok)),
        ),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/thing")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/thing")
        .insert_header(("content-type", "application/json; charset=utf-8"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Reads are exempt
    let req = test::TestRequest::get().uri("/api/thing").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_protected_scope_requires_session() {
    let app = test::init_service(
        App::new().wrap(session()).service(
            web::scope("/api")
                .wrap(from_fn(require_auth))
                .route("/me", web::get().to(ok)),
        ),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Authentication required");
}

#[actix_web::test]
async fn test_session_context_extractor_without_login() {
    let app = test::init_service(App::new().wrap(session()).route("/whoami", web::get().to(whoami))).await;

    let req = test::TestRequest::get().uri("/whoami").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[::core::prelude::v1::test]
fn test_superadmin_check() {
    let mut ctx = SessionContext {
        account_id: Uuid::new_v4(),
        email: "op@spolky.cz".to_string(),
        association_id: "a".to_string(),
        association_name: "Spolek".to_string(),
        is_superadmin: false,
    };
    assert!(matches!(ctx.require_superadmin(), Err(AppError::PermissionDenied(_))));

    ctx.is_superadmin = true;
    assert!(ctx.require_superadmin().is_ok());
}

#[::core::prelude::v1::test]
fn test_error_status_mapping() {
    let cases: Vec<(AppError, StatusCode)> = vec![
        (AppError::Validation(vec!["Title is required".to_string()]), StatusCode::BAD_REQUEST),
        (AppError::BadRequest("x".to_string()), StatusCode::BAD_REQUEST),
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::PermissionDenied("superadmin".to_string()), StatusCode::FORBIDDEN),
        (AppError::NotFound, StatusCode::NOT_FOUND),
        (AppError::Conflict("busy".to_string()), StatusCode::CONFLICT),
        (
            AppError::Image(NormalizeError::InvalidInput("text/plain".to_string())),
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ),
        (AppError::Image(NormalizeError::Encode("empty".to_string())), StatusCode::UNPROCESSABLE_ENTITY),
        (
            AppError::Reconcile(ReconcileError::DuplicateSlide { id: Uuid::nil() }),
            StatusCode::BAD_REQUEST,
        ),
        (
            AppError::Reconcile(ReconcileError::UnknownSlide { id: Uuid::nil() }),
            StatusCode::BAD_REQUEST,
        ),
        (
            AppError::Reconcile(ReconcileError::Store {
                stage: ReconcileStage::Deleting,
                source: StoreError::Rejected("boom".to_string()),
            }),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (AppError::Hash("bad".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
        assert_eq!(err.status_code(), status, "{err}");
        assert_eq!(err.error_response().status(), status, "{err}");
    }
}

#[actix_web::test]
async fn test_save_failure_surfaces_message_and_stage() {
    let err = AppError::Reconcile(ReconcileError::Upload {
        position: 2,
        source: StoreError::Rejected("bucket is full".to_string()),
    });
    let body = to_bytes(err.error_response().into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["error"], "upload failed for slide 2: bucket is full");
    assert_eq!(json["details"]["stage"], "uploading images");
}

#[actix_web::test]
async fn test_internal_errors_hide_details() {
    let err = AppError::Session("cookie exploded".to_string());
    let body = to_bytes(err.error_response().into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["error"], "Internal Server Error");
}
