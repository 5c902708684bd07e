//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载文字叠加链路中的所有失败来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 字体加载失败不在此列：候选字体逐个尝试，失败即跳过，最终回退内置字体。

/// 图片处理统一错误类型。
///
/// 该类型会在接口层被上转为 `AppError`，消息原样写入响应的 `detail`。
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("颜色错误：{0}")]
    InvalidColor(String),

    #[error("Base64 错误：{0}")]
    Base64(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("处理任务中断：{0}")]
    Interrupted(String),
}

impl ProcessingError {
    /// 稳定的机器可读错误码，用于日志检索。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_failed",
            Self::InvalidFormat(_) => "invalid_format",
            Self::InvalidColor(_) => "invalid_color",
            Self::Base64(_) => "invalid_base64",
            Self::Encode(_) => "encode_failed",
            Self::ResourceLimit(_) => "resource_limit",
            Self::Interrupted(_) => "interrupted",
        }
    }

    /// 出错所在的处理阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Base64(_) => "load",
            Self::Decode(_) | Self::InvalidFormat(_) | Self::ResourceLimit(_) => "decode",
            Self::InvalidColor(_) => "draw",
            Self::Encode(_) => "encode",
            Self::Interrupted(_) => "runtime",
        }
    }
}
