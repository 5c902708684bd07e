//! # 图片处理模块（image_handler）
//!
//! ## 设计思路
//!
//! 该模块将“字节加载 → 解码归一化 → 字体解析 → 绘制文字 → JPEG 编码”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `service`：承载可注入状态（`ImageServiceState`），负责把同步计算移出 async 运行时
//! - `handler`：编排整条处理流水线
//! - `loader`：负责原始字节 / Base64 加载与体积校验
//! - `pipeline`：负责解码、像素限制、颜色模式归一化、头信息读取
//! - `font`：候选字体解析与内置字体回退
//! - `color`：颜色描述解析
//! - `draw`：文字栅格化
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! HTTP 请求
//!    ↓
//! api/handlers.rs（参数适配）
//!    ↓
//! service.rs（State 注入、spawn_blocking）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（Base64 解析 + 体积校验）
//!    ├─ pipeline.rs（解码 + 像素限制 + 合成白底）
//!    ├─ color.rs / font.rs（颜色、字体解析）
//!    └─ draw.rs（绘制文字）
//!    ↓
//! JPEG 字节 / ProcessingError
//! ```

mod color;
mod config;
mod draw;
mod error;
mod font;
mod handler;
mod loader;
mod pipeline;
mod service;
mod source;

pub use color::parse_color;
pub use config::ImageConfig;
pub use error::ProcessingError;
pub use font::{BUILTIN_GLYPH_SIZE, DEFAULT_FONT_CANDIDATES, FONT_CANDIDATES_ENV, FontCatalog, FontHandle};
pub use handler::ImageHandler;
pub use pipeline::ColorModePlan;
pub use service::ImageServiceState;
pub use source::{AnnotationRequest, ImageInfo};
