use anyhow::{Context, Result};
use intersection_core::config::Config;
use intersection_core::density::DensityProvider;
use std::path::Path;
use std::sync::Arc;

pub fn run(root: &Path, port: Option<u16>) -> Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let port = port.unwrap_or(config.server.port);

    // The blocking client must be built, and finally dropped, outside the
    // runtime, so `provider` is declared before `rt`.
    let provider: Arc<dyn DensityProvider> = Arc::new(
        config
            .density_service()
            .context("failed to configure density service")?,
    );
    let server_provider = Arc::clone(&provider);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual_port = listener.local_addr()?.port();
        println!(
            "Intersection shell → http://localhost:{actual_port}  (density service: {})",
            config.service.base_url
        );

        tokio::select! {
            res = intersection_server::serve_on(&config, server_provider, listener) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    })
}
