use actix_web::{HttpRequest, HttpResponse, http::header, web};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::images::{self, RawImage};

#[derive(Deserialize)]
pub struct NormalizeQuery {
    pub file_name: Option<String>,
}

/// POST /api/images/normalize - raw image body in, bounded WebP out.
///
/// Lets the editor preview exactly what a save will upload.
pub async fn normalize(
    req: HttpRequest,
    config: web::Data<AppConfig>,
    query: web::Query<NormalizeQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let raw = RawImage {
        file_name: query.into_inner().file_name.unwrap_or_else(|| "image".to_string()),
        content_type,
        bytes: body.to_vec(),
    };
    let options = config.image;
    let image = web::block(move || images::normalize(&raw, &options)).await??;

    log::debug!("Normalized {} to {}x{}", image.file_name, image.width, image.height);

    // Header values must stay printable ASCII
    let file_name: String = image
        .file_name
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && *c != '"')
        .collect();

    Ok(HttpResponse::Ok()
        .content_type(image.content_type())
        .insert_header(("X-Image-Width", image.width.to_string()))
        .insert_header(("X-Image-Height", image.height.to_string()))
        .insert_header((header::CONTENT_DISPOSITION, format!("inline; filename=\"{file_name}\"")))
        .body(image.bytes))
}
