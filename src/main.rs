use anyhow::Context;
use clap::Parser;
use log::info;
use pagestyle::analyzer::PageStyleExtractor;
use pagestyle::cdp::ChromeLauncher;
use pagestyle::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();
    config.validate()?;
    let addr = config.socket_addr()?;

    let extractor = PageStyleExtractor::new(ChromeLauncher::new(config.engine_config()))
        .with_timeout_ms(config.analysis_timeout_ms);
    let app = pagestyle::server::router(extractor, config.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("pagestyle listening on http://{}", listener.local_addr()?);
    if let Some(dir) = &config.static_dir {
        info!("Serving static files from {}", dir.display());
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("pagestyle stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown requested");
}
