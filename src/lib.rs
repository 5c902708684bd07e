//! # 图片文字叠加服务 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 客户端 (HTML 表单 / 脚本)                 │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ HTTP (multipart / urlencoded → JPEG / JSON)
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            后端 (Rust)                           │
//! │                                                          │
//! │  ┌─ api ──────── axum 路由 + 表单提取 + 响应组装           │
//! │  │                                                       │
//! │  ├─ error ────── AppError → {"detail": ...}              │
//! │  │                                                       │
//! │  ├─ image_handler  解码·合成白底·字体·绘制·JPEG 编码      │
//! │  └─ settings       监听地址 / 请求体上限                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`api`] | 路由表、CORS、表单字段提取、各端点处理函数 |
//! | [`error`] | 统一错误类型 `AppError`，所有处理函数的错误类型 |
//! | [`image_handler`] | 在图片指定坐标绘制文字并输出 JPEG，读取图片元数据 |
//! | [`settings`] | 服务监听地址与请求体上限的加载 |

pub mod api;
pub mod error;
pub mod image_handler;
pub mod settings;
