//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，所有 HTTP 处理函数统一返回 `Result<T, AppError>`，
//! 客户端收到一致的错误格式：状态码 + `{"detail": "..."}`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ProcessingError` 提供 `From` 转换，无需手动 map。
//! - 实现 `IntoResponse`，状态码由变体决定：
//!   媒体类型不符 400、表单字段缺失或非法 422、请求体过大 413、其余 500。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::image_handler::ProcessingError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 上传文件声明的媒体类型不是 `image/*`
    #[error("文件必须是图片（Content-Type 需以 image/ 开头），收到：{0}")]
    UnsupportedMedia(String),

    /// 表单字段缺失或格式错误
    #[error("表单参数错误：{0}")]
    InvalidForm(String),

    /// 请求体超过上限
    #[error("请求体过大：{0}")]
    PayloadTooLarge(String),

    /// 文字叠加流水线错误（解码 / Base64 / 颜色 / 编码）
    #[error("图片处理失败：{0}")]
    Processing(#[from] ProcessingError),

    /// 元数据读取失败
    #[error("图片读取失败：{0}")]
    Inspect(ProcessingError),

    /// 服务配置错误
    #[error("配置错误：{0}")]
    Settings(String),

    /// 网络 / 文件系统 I/O 错误
    #[error("I/O 错误：{0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedMedia(_) => StatusCode::BAD_REQUEST,
            Self::InvalidForm(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Processing(_) | Self::Inspect(_) | Self::Settings(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::Processing(inner) | Self::Inspect(inner) => log::warn!(
                "请求失败 - status={} code={} stage={}: {}",
                status.as_u16(),
                inner.code(),
                inner.stage(),
                inner
            ),
            other => log::warn!("请求失败 - status={}: {}", status.as_u16(), other),
        }

        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_variant() {
        assert_eq!(
            AppError::UnsupportedMedia("text/plain".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidForm("缺少 x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(ProcessingError::Base64("bad".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn processing_detail_embeds_cause() {
        let err = AppError::from(ProcessingError::Decode("截断".into()));
        assert_eq!(err.to_string(), "图片处理失败：解码错误：截断");
    }

    #[test]
    fn unsupported_media_mentions_requirement() {
        let err = AppError::UnsupportedMedia("text/plain".into());
        assert!(err.to_string().contains("image/"));
    }
}
