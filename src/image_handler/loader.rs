//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理两种来源（原始字节 / Base64 文本）的原始字节加载，
//! 并在“尽可能早”的阶段执行输入校验，减少不必要的内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - 上传：声明的媒体类型必须以 `image/` 开头（由接口层调用 `is_image_content_type`）。
//! - Base64：剥离 Data URL 前缀（第一个逗号及之前的内容）→ 估算体积 → 宽松解码。
//! - 签名：`infer` 明确识别为非图片类型时提前拒绝；无法识别时交给解码器判断，
//!   避免误拒 `image` 能解码但没有魔数的格式（如 TGA）。

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use super::source::RawImageData;
use super::{ImageConfig, ImageHandler, ProcessingError};

/// 与常见浏览器/脚本输出兼容：补齐与否均可，末尾多余位不报错。
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

impl ImageHandler {
    /// 从 Base64 字符串加载图片原始字节。
    pub(super) fn load_from_base64(
        &self,
        data: &str,
        config: &ImageConfig,
    ) -> Result<RawImageData, ProcessingError> {
        log::info!("📝 开始处理 base64 图片（{} 字符）", data.len());

        let bytes = Self::parse_base64_with_limit(data, config.max_file_size)?;

        if bytes.len() as u64 > config.max_file_size {
            return Err(ProcessingError::ResourceLimit(format!(
                "Base64 解码后体积过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
        Self::reject_non_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "base64",
        })
    }

    /// 包装调用方直接提供的原始字节（multipart 上传或已解码的 Base64）。
    pub(super) fn load_from_bytes(
        &self,
        bytes: Vec<u8>,
        config: &ImageConfig,
    ) -> Result<RawImageData, ProcessingError> {
        if bytes.len() as u64 > config.max_file_size {
            return Err(ProcessingError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(RawImageData {
            bytes,
            source_hint: "bytes",
        })
    }

    /// 解析 Base64 输入（支持 Data URL / 纯 Base64）。
    pub fn parse_base64(data: &str) -> Result<Vec<u8>, ProcessingError> {
        Self::parse_base64_with_limit(data, u64::MAX)
    }

    /// 判断声明的媒体类型是否为图片。
    ///
    /// 忽略大小写与参数部分，例如 `IMAGE/PNG; q=1` 视为图片。
    pub fn is_image_content_type(content_type: &str) -> bool {
        content_type
            .split(';')
            .next()
            .map(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }

    /// 去掉 Data URL 头部：第一个逗号及之前的内容全部丢弃。
    fn strip_data_uri_prefix(data: &str) -> &str {
        match data.split_once(',') {
            Some((_, payload)) => payload,
            None => data,
        }
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, ProcessingError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| ProcessingError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| ProcessingError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, ProcessingError> {
        let payload = Self::strip_data_uri_prefix(data.trim());

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(payload)?;
        if estimated_len > max_file_size {
            return Err(ProcessingError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        // 表单提交常把长 Base64 折行，空白一律忽略
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        if compact.is_empty() {
            return Err(ProcessingError::Base64("图片内容为空".to_string()));
        }

        LENIENT_BASE64
            .decode(compact.as_bytes())
            .map_err(|e| ProcessingError::Base64(format!("Base64 解码失败：{}", e)))
    }

    /// 仅在签名明确属于非图片类型时拒绝。
    fn reject_non_image_signature(bytes: &[u8]) -> Result<(), ProcessingError> {
        if bytes.is_empty() {
            return Err(ProcessingError::InvalidFormat("图片内容为空".to_string()));
        }

        if let Some(kind) = infer::get(bytes) {
            if kind.matcher_type() != infer::MatcherType::Image {
                return Err(ProcessingError::InvalidFormat(format!(
                    "文件签名不是图片类型：{}",
                    kind.mime_type()
                )));
            }
        }

        Ok(())
    }
}
