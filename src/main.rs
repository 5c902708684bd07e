//! # 图片文字叠加服务 — 应用入口
//!
//! 本文件仅负责日志、配置、状态初始化与服务启动。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use image_processor_api::api;
use image_processor_api::error::AppError;
use image_processor_api::image_handler::ImageServiceState;
use image_processor_api::settings::ServerSettings;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run().await {
        log::error!("服务启动失败: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    log::info!("setup: begin");
    let settings = ServerSettings::load()?;

    let service = ImageServiceState::new()?;
    log::info!(
        "setup: image service ready (jpeg_quality={})",
        service.config().jpeg_quality
    );

    let app = api::router(service, &settings);
    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port)).await?;
    log::info!("🚀 listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("监听退出信号失败: {err}");
        std::future::pending::<()>().await;
    }
    log::info!("收到退出信号，等待进行中的请求完成");
}
