//! # HTTP 处理函数
//!
//! 处理函数仅做参数适配与响应组装，不承载业务逻辑。
//! 所有图片计算交由 `ImageServiceState`。

use axum::Json;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::Engine as _;
use base64::engine::general_purpose;
use serde::Serialize;
use serde_json::{Value, json};

use super::form::{FIELD_IMAGE, FIELD_IMAGE_BASE64, FormFields, OverlayFields};
use crate::error::AppError;
use crate::image_handler::{ImageHandler, ImageInfo, ImageServiceState};

const FILENAME_TEXT_CHARS: usize = 20;

#[derive(Debug, Serialize)]
pub struct Base64Response {
    pub success: bool,
    pub imagen_procesada: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// `POST /api/procesar-imagen`：上传图片文件，返回叠加文字后的 JPEG。
pub async fn process_image(
    State(service): State<ImageServiceState>,
    mut form: FormFields,
) -> Result<Response, AppError> {
    let upload = form.take_file(FIELD_IMAGE)?;
    let overlay = OverlayFields::parse(&form, service.config())?;

    let declared = upload.content_type.as_deref().unwrap_or_default();
    if !ImageHandler::is_image_content_type(declared) {
        let shown = if declared.is_empty() { "未声明" } else { declared };
        return Err(AppError::UnsupportedMedia(shown.to_string()));
    }

    log::info!(
        "📥 收到图片上传 - 文件: {} 类型: {} 体积: {} 字节",
        upload.file_name.as_deref().unwrap_or("-"),
        declared,
        upload.bytes.len()
    );

    let disposition = content_disposition(&attachment_filename(&overlay.text));
    let jpeg = service.annotate(overlay.into_request(upload.bytes.to_vec())).await?;

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("image/jpeg")),
            (CONTENT_DISPOSITION, disposition),
        ],
        jpeg,
    )
        .into_response())
}

/// `POST /api/procesar-imagen-base64`：Base64 图片入，Data URL 形式的 JPEG 出。
pub async fn process_image_base64(
    State(service): State<ImageServiceState>,
    form: FormFields,
) -> Result<Json<Base64Response>, AppError> {
    let overlay = OverlayFields::parse(&form, service.config())?;
    let payload = form.text(FIELD_IMAGE_BASE64)?.to_string();

    let bytes = service.decode_base64(payload).await?;
    let filename = attachment_filename(&overlay.text);
    let jpeg = service.annotate(overlay.into_request(bytes)).await?;

    Ok(Json(Base64Response {
        success: true,
        imagen_procesada: format!(
            "data:image/jpeg;base64,{}",
            general_purpose::STANDARD.encode(&jpeg)
        ),
        filename,
    }))
}

/// `POST /api/info-imagen`：读取上传图片的元数据。
pub async fn image_info(
    State(service): State<ImageServiceState>,
    mut form: FormFields,
) -> Result<Json<ImageInfo>, AppError> {
    let upload = form.take_file(FIELD_IMAGE)?;
    let info = service
        .inspect(upload.bytes.to_vec())
        .await
        .map_err(AppError::Inspect)?;
    Ok(Json(info))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Image text overlay API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/procesar-imagen": "multipart: imagen, texto, x, y, [tamaño_fuente], [color_texto] → image/jpeg",
            "POST /api/procesar-imagen-base64": "form: imagen_base64, texto, x, y, [tamaño_fuente], [color_texto] → JSON data URL",
            "POST /api/info-imagen": "multipart: imagen → width, height, format, mode, size_kb",
            "GET /health": "service status",
        }
    }))
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
}

/// `imagen_procesada_<前 20 个字符>.jpg`，并替换响应头中不安全的字符。
pub fn attachment_filename(text: &str) -> String {
    let prefix: String = text
        .chars()
        .take(FILENAME_TEXT_CHARS)
        .map(|c| {
            if c == '"' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("imagen_procesada_{}.jpg", prefix)
}

fn content_disposition(filename: &str) -> HeaderValue {
    HeaderValue::from_bytes(format!("attachment; filename=\"{}\"", filename).as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
