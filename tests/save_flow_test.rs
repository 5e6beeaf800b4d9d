//! Save plumbing around the reconciler: per-tutorial locks, upload payload
//! decoding, slide preparation and the tutorial save body.

mod common;

use actix_web::ResponseError;
use actix_web::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use uuid::Uuid;

use common::*;
use spolky_admin::errors::AppError;
use spolky_admin::handlers::tutorial_handlers::{decode_base64_image, prepare_slides};
use spolky_admin::images::{NormalizeError, NormalizeOptions};
use spolky_admin::models::tutorial::{SlideImageInput, SlideInput, SlideLayout, TutorialSaveRequest};
use spolky_admin::slides::{ImageRef, ReconcileError, SaveLocks, SlideSetReconciler};

fn upload(content_type: &str, bytes: &[u8]) -> SlideInput {
    SlideInput {
        id: None,
        layout: SlideLayout::Single,
        image: Some(SlideImageInput::Upload {
            data: STANDARD.encode(bytes),
            content_type: content_type.to_string(),
            file_name: Some("shot.png".to_string()),
        }),
    }
}

#[test]
fn test_second_save_of_same_tutorial_is_refused() {
    let locks = SaveLocks::new();
    let tutorial = Uuid::new_v4();

    let guard = locks.try_acquire(tutorial).expect("first save should get the lock");
    assert!(locks.try_acquire(tutorial).is_none());

    // Other tutorials are independent
    assert!(locks.try_acquire(Uuid::new_v4()).is_some());

    drop(guard);
    assert!(locks.try_acquire(tutorial).is_some());
}

#[test]
fn test_locks_are_shared_between_clones() {
    let locks = SaveLocks::new();
    let worker_view = locks.clone();
    let tutorial = Uuid::new_v4();

    let _guard = locks.try_acquire(tutorial).unwrap();
    assert!(worker_view.try_acquire(tutorial).is_none());
}

#[test]
fn test_decode_plain_and_data_url_payloads() {
    let bytes = vec![0x89, b'P', b'N', b'G', 1, 2, 3];
    let encoded = STANDARD.encode(&bytes);

    assert_eq!(decode_base64_image(&encoded).unwrap(), bytes);
    assert_eq!(
        decode_base64_image(&format!("data:image/png;base64,{encoded}")).unwrap(),
        bytes
    );
    assert!(decode_base64_image("***").is_err());
}

#[test]
fn test_save_request_parses_mixed_slides() {
    let id = Uuid::new_v4();
    let body = format!(
        r#"{{
            "title": "Jak založit akci",
            "slides": [
                {{ "id": "{id}", "image": {{ "kind": "persisted", "url": "http://h/a.webp" }} }},
                {{ "layout": "single", "image": {{ "kind": "upload", "data": "AAEC", "content_type": "image/png" }} }},
                {{}}
            ]
        }}"#
    );
    let req: TutorialSaveRequest = serde_json::from_str(&body).unwrap();

    assert!(!req.is_published);
    assert_eq!(req.description, None);
    assert_eq!(req.slides.len(), 3);
    assert_eq!(req.slides[0].id, Some(id));
    assert!(matches!(&req.slides[0].image, Some(SlideImageInput::Persisted { url }) if url == "http://h/a.webp"));
    assert!(matches!(
        &req.slides[1].image,
        Some(SlideImageInput::Upload { file_name: None, .. })
    ));
    assert_eq!(req.slides[2].layout, SlideLayout::Single);
    assert!(req.slides[2].image.is_none());
}

#[actix_web::test]
async fn test_prepare_normalizes_uploads_in_order() {
    let kept = Uuid::new_v4();
    let slides = vec![
        SlideInput {
            id: Some(kept),
            layout: SlideLayout::Single,
            image: Some(SlideImageInput::Persisted { url: "http://h/a.webp".to_string() }),
        },
        upload("image/png", &png_bytes(40, 30)),
    ];

    let list = prepare_slides(slides, NormalizeOptions::default()).await.unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(list.as_slice()[0].id, Some(kept));
    match &list.as_slice()[1].image {
        Some(ImageRef::Pending(image)) => assert_eq!(image.file_name, "shot.webp"),
        other => panic!("expected a pending upload, got {other:?}"),
    }
}

#[actix_web::test]
async fn test_bad_upload_is_refused_before_any_write() {
    let slides = vec![
        upload("image/png", &png_bytes(10, 10)),
        upload("text/plain", b"hi"),
    ];

    let err = prepare_slides(slides, NormalizeOptions::default()).await.unwrap_err();
    assert!(matches!(err, AppError::Image(NormalizeError::InvalidInput(_))));

    let err = prepare_slides(vec![upload("image/png", b"not a png")], NormalizeOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Image(_)));
}

#[actix_web::test]
async fn test_prepared_list_with_foreign_slide_is_rejected() {
    let store = MemoryStore::new();
    let [mine, theirs] = [Uuid::new_v4(), Uuid::new_v4()];
    let foreign = Uuid::new_v4();
    store.seed(theirs, &[(foreign, None)]);

    let slides = vec![SlideInput { id: Some(foreign), layout: SlideLayout::Single, image: None }];
    let list = prepare_slides(slides, NormalizeOptions::default()).await.unwrap();

    let err = SlideSetReconciler::new(&store, &store)
        .reconcile(mine, list.as_slice())
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::UnknownSlide { id } if id == foreign));
    assert_eq!(AppError::from(err).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(store.slides_of(theirs).len(), 1);
}
