//! # HTTP 接口层
//!
//! ## 设计思路
//!
//! 接口层仅做 HTTP 参数接收与结果返回，不承载业务逻辑：
//!
//! - `routes`：路由表与中间件（CORS、请求体上限）
//! - `form`：multipart / urlencoded 表单统一提取
//! - `handlers`：各端点的参数适配与响应组装

pub mod form;
pub mod handlers;
mod routes;

pub use routes::router;
