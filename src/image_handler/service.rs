//! # 服务层（可注入状态）
//!
//! ## 设计思路
//!
//! 使用 `ImageServiceState` 作为 axum 注入状态，替代全局单例函数。
//! 好处：
//! 1. 生命周期清晰（由 `main.rs` 统一创建）
//! 2. 测试可创建独立实例（例如只用内置字体），减少共享状态副作用
//!
//! ## 实现思路
//!
//! 解码、绘制、编码都是同步 CPU 计算，统一放到 `spawn_blocking` 中执行，
//! 避免阻塞 tokio 工作线程。内部只持有只读的 `ImageHandler`，克隆成本是一次 `Arc` 计数。

use std::sync::Arc;

use super::font::FontCatalog;
use super::source::{AnnotationRequest, ImageInfo};
use super::{ImageConfig, ImageHandler, ProcessingError};

/// 图片处理服务状态。
#[derive(Clone)]
pub struct ImageServiceState {
    handler: Arc<ImageHandler>,
}

impl ImageServiceState {
    /// 使用默认配置与环境变量指定的字体候选创建服务状态。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_processor_api::image_handler::ImageServiceState;
    ///
    /// let service = ImageServiceState::new()?;
    /// # Ok::<(), image_processor_api::image_handler::ProcessingError>(())
    /// ```
    pub fn new() -> Result<Self, ProcessingError> {
        Self::with_config(ImageConfig::default(), FontCatalog::from_env())
    }

    /// 使用自定义配置与字体目录创建服务状态。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_processor_api::image_handler::{FontCatalog, ImageConfig, ImageServiceState};
    ///
    /// let service = ImageServiceState::with_config(ImageConfig::default(), FontCatalog::builtin_only())?;
    /// # Ok::<(), image_processor_api::image_handler::ProcessingError>(())
    /// ```
    pub fn with_config(config: ImageConfig, fonts: FontCatalog) -> Result<Self, ProcessingError> {
        let handler = ImageHandler::with_fonts(config, fonts)?;
        Ok(Self {
            handler: Arc::new(handler),
        })
    }

    pub fn config(&self) -> &ImageConfig {
        self.handler.config()
    }

    /// 在阻塞线程池中执行文字叠加。
    pub async fn annotate(&self, request: AnnotationRequest) -> Result<Vec<u8>, ProcessingError> {
        let handler = Arc::clone(&self.handler);
        Self::run_blocking(move || handler.annotate(request)).await
    }

    /// 在阻塞线程池中解析 Base64 图片。
    pub async fn decode_base64(&self, data: String) -> Result<Vec<u8>, ProcessingError> {
        let handler = Arc::clone(&self.handler);
        Self::run_blocking(move || handler.decode_base64_source(&data)).await
    }

    /// 在阻塞线程池中读取图片元数据。
    pub async fn inspect(&self, bytes: Vec<u8>) -> Result<ImageInfo, ProcessingError> {
        let handler = Arc::clone(&self.handler);
        Self::run_blocking(move || handler.inspect(&bytes)).await
    }

    async fn run_blocking<T, F>(task: F) -> Result<T, ProcessingError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ProcessingError> + Send + 'static,
    {
        tokio::task::spawn_blocking(task)
            .await
            .map_err(|e| ProcessingError::Interrupted(e.to_string()))?
    }
}
