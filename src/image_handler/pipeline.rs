//! # 解码与颜色模式归一化模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → 不透明 RGB”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸
//! 2. 按像素/内存上限快速拒绝
//! 3. 完整解码
//! 4. 按 `ColorModePlan` 归一化：带透明通道的图像合成到白色画布，其余直接转 RGB
//!
//! 调色板图像在解码时已被展开：带透明色的展开为 RGBA（走合成分支），
//! 不带透明色的展开为 RGB（走直转分支），与先转 RGBA 再合成的结果一致。
//! 元数据中的 `mode` 仍按文件头报告为 `P`。

use image::{
    ColorType, DynamicImage, GenericImageView, ImageDecoder, ImageFormat, ImageReader, Rgb, RgbImage,
    RgbaImage,
};
use std::io::Cursor;

use super::source::{ImageInfo, RawImageData};
use super::{ImageConfig, ImageHandler, ProcessingError};

/// 颜色模式处理策略，每次调用只判定一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModePlan {
    /// 无透明通道，直接转换为 8 位 RGB。
    Direct,
    /// 带透明通道，需要以自身 alpha 为蒙版合成到白色画布。
    NeedsCompositing,
}

impl ColorModePlan {
    pub fn for_color_type(color: ColorType) -> Self {
        if color.has_alpha() {
            Self::NeedsCompositing
        } else {
            Self::Direct
        }
    }
}

impl ImageHandler {
    /// 将原始字节解码为不透明的 RGB 画布。
    pub(crate) fn decode_and_normalize(
        &self,
        raw: RawImageData,
        config: &ImageConfig,
    ) -> Result<RgbImage, ProcessingError> {
        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        self.validate_pixel_limits(config, header_width, header_height)?;
        self.validate_decoded_memory_limits(config, header_width, header_height)?;

        let decoded = ImageReader::new(Cursor::new(&raw.bytes))
            .with_guessed_format()
            .map_err(|e| ProcessingError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
            .decode()
            .map_err(|e| ProcessingError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        self.validate_pixel_limits(config, width, height)?;

        let color = decoded.color();
        let plan = ColorModePlan::for_color_type(color);
        let canvas = Self::normalize_color_mode(decoded, plan);

        log::info!(
            "✅ 图片解码成功 - 来源: {} 尺寸: {}x{} 模式: {} 策略: {:?}",
            raw.source_hint,
            width,
            height,
            Self::mode_name(color),
            plan
        );

        Ok(canvas)
    }

    /// 按策略归一化为不透明 RGB。
    pub(crate) fn normalize_color_mode(image: DynamicImage, plan: ColorModePlan) -> RgbImage {
        match plan {
            ColorModePlan::Direct => image.into_rgb8(),
            ColorModePlan::NeedsCompositing => Self::composite_onto_white(&image.into_rgba8()),
        }
    }

    fn composite_onto_white(source: &RgbaImage) -> RgbImage {
        RgbImage::from_fn(source.width(), source.height(), |x, y| {
            let [r, g, b, a] = source.get_pixel(x, y).0;
            Rgb([
                blend_over_white(r, a),
                blend_over_white(g, a),
                blend_over_white(b, a),
            ])
        })
    }

    /// 只读取头信息，生成元数据。不做完整解码。
    pub(crate) fn inspect_header(bytes: &[u8]) -> Result<ImageInfo, ProcessingError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ProcessingError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

        let format = reader
            .format()
            .ok_or_else(|| ProcessingError::InvalidFormat("无法识别图片格式".to_string()))?;

        let decoder = reader
            .into_decoder()
            .map_err(|e| ProcessingError::Decode(format!("无法读取图片头信息：{}", e)))?;

        let (width, height) = decoder.dimensions();

        Ok(ImageInfo {
            width,
            height,
            format: Self::format_name(format),
            mode: Self::source_mode(format, bytes, decoder.color_type()).to_string(),
            size_kb: bytes.len() as f64 / 1024.0,
        })
    }

    /// 仅通过内存中的图片头信息读取宽高。
    ///
    /// 用于在完整解码前做像素限制检查。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ProcessingError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ProcessingError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
            .into_dimensions()
            .map_err(|e| ProcessingError::Decode(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(
        &self,
        config: &ImageConfig,
        width: u32,
        height: u32,
    ) -> Result<(), ProcessingError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| ProcessingError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(ProcessingError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn validate_decoded_memory_limits(
        &self,
        config: &ImageConfig,
        width: u32,
        height: u32,
    ) -> Result<(), ProcessingError> {
        let estimated = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| ProcessingError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > config.max_decoded_bytes {
            return Err(ProcessingError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    /// 源文件的颜色模式。调色板在解码器里已被展开，这里按文件头还原为 `P`。
    fn source_mode(format: ImageFormat, bytes: &[u8], decoded: ColorType) -> &'static str {
        match format {
            ImageFormat::Gif => "P",
            ImageFormat::Png if Self::is_indexed_png(bytes) => "P",
            _ => Self::mode_name(decoded),
        }
    }

    fn is_indexed_png(bytes: &[u8]) -> bool {
        png::Decoder::new(Cursor::new(bytes))
            .read_info()
            .map(|reader| reader.info().color_type == png::ColorType::Indexed)
            .unwrap_or(false)
    }

    /// 颜色模式的通用名称（`L` / `LA` / `RGB` / `RGBA` / `I;16`）。
    pub(crate) fn mode_name(color: ColorType) -> &'static str {
        match color {
            ColorType::L8 => "L",
            ColorType::L16 => "I;16",
            ColorType::La8 | ColorType::La16 => "LA",
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB",
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA",
            other if other.has_alpha() => "RGBA",
            _ => "RGB",
        }
    }

    fn format_name(format: ImageFormat) -> String {
        let name = match format {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Gif => "GIF",
            ImageFormat::WebP => "WEBP",
            ImageFormat::Bmp => "BMP",
            ImageFormat::Ico => "ICO",
            ImageFormat::Tiff => "TIFF",
            ImageFormat::Tga => "TGA",
            ImageFormat::Pnm => "PPM",
            ImageFormat::OpenExr => "EXR",
            ImageFormat::Hdr => "HDR",
            other => {
                return other
                    .extensions_str()
                    .first()
                    .map(|ext| ext.to_ascii_uppercase())
                    .unwrap_or_else(|| "UNKNOWN".to_string());
            }
        };
        name.to_string()
    }
}

/// `out = c * a + 255 * (1 - a)`，四舍五入到 8 位。
fn blend_over_white(channel: u8, alpha: u8) -> u8 {
    let c = channel as u32;
    let a = alpha as u32;
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}
