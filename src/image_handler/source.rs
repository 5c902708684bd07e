//! # 请求与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入”和“流水线中间结果”解耦：
//! - `AnnotationRequest` 表示一次叠加调用的完整输入
//! - `RawImageData` 表示已加载但未解码的字节
//! - `ImageInfo` 表示元数据查询结果

use serde::Serialize;

/// 一次文字叠加调用的不可变输入。
#[derive(Debug, Clone)]
pub struct AnnotationRequest {
    /// 原始图片字节。
    pub bytes: Vec<u8>,
    /// 要绘制的文字，`\n` 表示换行。
    pub text: String,
    /// 文字左上角 X 坐标（像素，可为负）。
    pub x: i32,
    /// 文字左上角 Y 坐标（像素，可为负）。
    pub y: i32,
    /// 字号（像素）。回退到内置字体时忽略。
    pub font_size: i32,
    /// 颜色描述：颜色名、`#rrggbb` 或 `rgb(r, g, b)`。
    pub color: String,
}

impl AnnotationRequest {
    /// 以默认字号（40）与默认颜色（black）构造请求。
    pub fn new(bytes: Vec<u8>, text: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            bytes,
            text: text.into(),
            x,
            y,
            font_size: 40,
            color: "black".to_string(),
        }
    }

    pub fn with_font_size(mut self, font_size: i32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 图片元数据。字段名即 JSON 输出格式。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// 容器格式，大写，如 `PNG`、`JPEG`。
    pub format: String,
    /// 颜色模式，如 `RGB`、`RGBA`、`LA`。
    pub mode: String,
    /// 原始字节体积（KB，浮点）。
    pub size_kb: f64,
}
