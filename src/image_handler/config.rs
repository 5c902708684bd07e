//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ImageConfig`，保证运行时行为可观测、可调整、可测试。
//! 字体候选列表单独放在 `font::FontCatalog`，便于测试注入确定性的字体环境。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的配置（JPEG 质量 95、默认字号 40、默认黑色）。
//! - `validate` 在服务启动时拒绝明显错误的参数组合。

use super::ProcessingError;

/// 图片处理配置。
///
/// 字段覆盖了加载、解码、绘制与编码四个阶段。
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// Base64 解码后允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 输出 JPEG 质量（1~100）。
    pub jpeg_quality: u8,
    /// 调用方未指定字号时使用的字号。
    pub default_font_size: i32,
    /// 允许的最大字号，超出直接拒绝（字形栅格缓冲区随字号平方增长）。
    pub max_font_size: i32,
    /// 调用方未指定颜色时使用的颜色描述。
    pub default_color: String,
    /// 多行文字的额外行距（像素）。
    pub line_spacing: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            jpeg_quality: 95,
            default_font_size: 40,
            max_font_size: 1000,
            default_color: "black".to_string(),
            line_spacing: 4,
        }
    }
}

impl ImageConfig {
    /// 校验配置取值范围。
    pub(crate) fn validate(&self) -> Result<(), ProcessingError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ProcessingError::InvalidFormat(format!(
                "jpeg_quality 必须在 1~100 之间，当前：{}",
                self.jpeg_quality
            )));
        }
        if self.max_decoded_pixels == 0 || self.max_decoded_bytes == 0 {
            return Err(ProcessingError::InvalidFormat(
                "解码上限不能为 0".to_string(),
            ));
        }
        if self.max_font_size <= 0 || self.default_font_size > self.max_font_size {
            return Err(ProcessingError::InvalidFormat(format!(
                "max_font_size 必须为正且不小于默认字号，当前：{}",
                self.max_font_size
            )));
        }
        if self.max_file_size == 0 {
            return Err(ProcessingError::InvalidFormat(
                "max_file_size 不能为 0".to_string(),
            ));
        }
        Ok(())
    }
}
