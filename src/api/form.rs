//! # 表单提取
//!
//! ## 设计思路
//!
//! 三个提交接口的参数都来自 HTML 表单，可能是 `multipart/form-data`
//! 也可能是 `application/x-www-form-urlencoded`。`FormFields` 作为自定义提取器
//! 统一两种编码，处理函数只按字段名取值。
//!
//! ## 实现思路
//!
//! - 带 `filename` 的 multipart 分段视为文件，其余视为文本字段。
//! - 必填字段缺失（含空字符串）或整数格式错误 → `AppError::InvalidForm`（422）。
//! - 请求体超过 `DefaultBodyLimit` → `AppError::PayloadTooLarge`（413）。

use std::collections::HashMap;

use axum::Form;
use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use bytes::Bytes;

use crate::error::AppError;
use crate::image_handler::{AnnotationRequest, ImageConfig};

pub const FIELD_IMAGE: &str = "imagen";
pub const FIELD_IMAGE_BASE64: &str = "imagen_base64";
pub const FIELD_TEXT: &str = "texto";
pub const FIELD_X: &str = "x";
pub const FIELD_Y: &str = "y";
pub const FIELD_FONT_SIZE: &str = "tamaño_fuente";
pub const FIELD_COLOR: &str = "color_texto";

/// multipart 中上传的文件分段。
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    /// 客户端声明的媒体类型，未声明时为 `None`
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// 已解析的表单字段（文本 + 文件）。
#[derive(Debug, Default)]
pub struct FormFields {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormFields {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            texts: pairs.into_iter().collect(),
            files: HashMap::new(),
        }
    }

    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut fields = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;

            if file_name.is_some() {
                fields.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        bytes,
                    },
                );
            } else {
                let text = String::from_utf8(bytes.to_vec()).map_err(|_| {
                    AppError::InvalidForm(format!("字段 `{}` 不是有效的 UTF-8 文本", name))
                })?;
                fields.texts.insert(name, text);
            }
        }

        Ok(fields)
    }

    /// 必填文本字段，空字符串视同缺失。
    pub fn text(&self, name: &str) -> Result<&str, AppError> {
        self.texts
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::InvalidForm(format!("缺少必填字段 `{}`", name)))
    }

    /// 可选文本字段，缺失或为空时返回默认值。
    pub fn text_or(&self, name: &str, default: &str) -> String {
        match self.texts.get(name) {
            Some(value) if !value.trim().is_empty() => value.clone(),
            _ => default.to_string(),
        }
    }

    /// 必填整数字段。
    pub fn integer(&self, name: &str) -> Result<i32, AppError> {
        let raw = self.text(name)?;
        parse_integer(name, raw)
    }

    /// 可选整数字段，缺失或为空时返回默认值。
    pub fn integer_or(&self, name: &str, default: i32) -> Result<i32, AppError> {
        match self.texts.get(name) {
            Some(raw) if !raw.trim().is_empty() => parse_integer(name, raw),
            _ => Ok(default),
        }
    }

    /// 取出必填文件字段。
    pub fn take_file(&mut self, name: &str) -> Result<UploadedFile, AppError> {
        if let Some(file) = self.files.remove(name) {
            return Ok(file);
        }
        if self.texts.contains_key(name) {
            return Err(AppError::InvalidForm(format!(
                "字段 `{}` 需要以文件形式上传",
                name
            )));
        }
        Err(AppError::InvalidForm(format!("缺少必填字段 `{}`", name)))
    }
}

impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| {
                value
                    .trim()
                    .to_ascii_lowercase()
                    .starts_with("multipart/form-data")
            })
            .unwrap_or(false);

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidForm(e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|e| rejection(e.status(), e.body_text()))?;
        Ok(Self::from_pairs(pairs))
    }
}

/// 文字叠加的公共参数，两个提交接口共用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayFields {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub font_size: i32,
    pub color: String,
}

impl OverlayFields {
    pub fn parse(form: &FormFields, config: &ImageConfig) -> Result<Self, AppError> {
        Ok(Self {
            text: form.text(FIELD_TEXT)?.to_string(),
            x: form.integer(FIELD_X)?,
            y: form.integer(FIELD_Y)?,
            font_size: form.integer_or(FIELD_FONT_SIZE, config.default_font_size)?,
            color: form.text_or(FIELD_COLOR, &config.default_color),
        })
    }

    pub fn into_request(self, bytes: Vec<u8>) -> AnnotationRequest {
        AnnotationRequest::new(bytes, self.text, self.x, self.y)
            .with_font_size(self.font_size)
            .with_color(self.color)
    }
}

fn parse_integer(name: &str, raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| AppError::InvalidForm(format!("字段 `{}` 必须是整数，收到：{}", name, raw)))
}

fn multipart_error(error: MultipartError) -> AppError {
    rejection(error.status(), error.body_text())
}

fn rejection(status: StatusCode, text: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(text)
    } else {
        AppError::InvalidForm(text)
    }
}
