//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageHandler` 只负责流程编排与配置管理，不直接与 HTTP 绑定。
//! 文字叠加链路固定为：
//! 1. 包装原始字节并校验体积
//! 2. 解码并归一化为不透明 RGB
//! 3. 解析颜色与字体
//! 4. 绘制文字
//! 5. 编码为 JPEG
//!
//! ## 实现思路
//!
//! - 配置与字体目录在构造时确定，处理过程中只读，不持有任何跨请求可变状态。
//! - 记录 `decode/draw/encode/total` 阶段耗时，便于性能诊断。

use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use std::time::Instant;

use super::color::parse_color;
use super::draw::draw_text;
use super::font::FontCatalog;
use super::source::{AnnotationRequest, ImageInfo};
use super::{ImageConfig, ProcessingError};

/// 图片处理器。
pub struct ImageHandler {
    pub(super) config: ImageConfig,
    pub(super) fonts: FontCatalog,
}

impl ImageHandler {
    /// 使用默认字体目录创建处理器。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use image_processor_api::image_handler::{ImageConfig, ImageHandler};
    ///
    /// let handler = ImageHandler::new(ImageConfig::default())?;
    /// # Ok::<(), image_processor_api::image_handler::ProcessingError>(())
    /// ```
    pub fn new(config: ImageConfig) -> Result<Self, ProcessingError> {
        Self::with_fonts(config, FontCatalog::default())
    }

    /// 注入自定义字体目录，测试中常用 `FontCatalog::builtin_only()`。
    pub fn with_fonts(config: ImageConfig, fonts: FontCatalog) -> Result<Self, ProcessingError> {
        config.validate()?;
        Ok(Self { config, fonts })
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    /// 处理主入口：在图片上绘制文字并输出 JPEG 字节。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use image_processor_api::image_handler::{AnnotationRequest, ImageConfig, ImageHandler};
    ///
    /// let handler = ImageHandler::new(ImageConfig::default())?;
    /// let png = std::fs::read("input.png").unwrap();
    /// let jpeg = handler.annotate(AnnotationRequest::new(png, "hola", 10, 10))?;
    /// # Ok::<(), image_processor_api::image_handler::ProcessingError>(())
    /// ```
    pub fn annotate(&self, request: AnnotationRequest) -> Result<Vec<u8>, ProcessingError> {
        let total_start = Instant::now();
        let AnnotationRequest {
            bytes,
            text,
            x,
            y,
            font_size,
            color,
        } = request;

        if font_size > self.config.max_font_size {
            return Err(ProcessingError::ResourceLimit(format!(
                "字号过大：{}（限制：{}）",
                font_size, self.config.max_font_size
            )));
        }

        let decode_start = Instant::now();
        let raw = self.load_from_bytes(bytes, &self.config)?;
        let mut canvas = self.decode_and_normalize(raw, &self.config)?;
        let decode_elapsed = decode_start.elapsed();

        let draw_start = Instant::now();
        let fill = parse_color(&color)?;
        let font = self.fonts.resolve(font_size);
        draw_text(&mut canvas, &font, &text, x, y, fill, self.config.line_spacing);
        let draw_elapsed = draw_start.elapsed();

        let encode_start = Instant::now();
        let jpeg = Self::encode_jpeg(&canvas, self.config.jpeg_quality)?;
        let encode_elapsed = encode_start.elapsed();

        log::info!(
            "✅ 文字叠加完成 - 尺寸: {}x{} 字体: {:?} decode={}ms draw={}ms encode={}ms total={}ms",
            canvas.width(),
            canvas.height(),
            font,
            decode_elapsed.as_millis(),
            draw_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(jpeg)
    }

    /// 解析 Base64（可带 Data URL 前缀）得到原始图片字节。
    pub fn decode_base64_source(&self, data: &str) -> Result<Vec<u8>, ProcessingError> {
        Ok(self.load_from_base64(data, &self.config)?.bytes)
    }

    /// 只读取头信息返回元数据。
    pub fn inspect(&self, bytes: &[u8]) -> Result<ImageInfo, ProcessingError> {
        let info = Self::inspect_header(bytes)?;
        log::info!(
            "🔍 图片信息 - {}x{} 格式: {} 模式: {} 体积: {:.2}KB",
            info.width,
            info.height,
            info.format,
            info.mode,
            info.size_kb
        );
        Ok(info)
    }

    fn encode_jpeg(canvas: &RgbImage, quality: u8) -> Result<Vec<u8>, ProcessingError> {
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, quality)
            .encode_image(canvas)
            .map_err(|e| ProcessingError::Encode(format!("JPEG 编码失败：{}", e)))?;
        Ok(buffer)
    }
}
