//! relay-proxy: transparent HTTP relay. A request to `/?url=<target>` is
//! replayed against `<target>` (method, headers, body and extra query
//! parameters intact) and the target's answer is relayed back.

mod config;
mod cors;
mod error;
mod proxy;
mod server;

use config::ProxyConfig;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1).cloned())
        .or_else(|| args.get(1).filter(|a| !a.starts_with('-')).cloned())
        .or_else(|| std::env::var("RELAY_PROXY_CONFIG").ok())
        .unwrap_or_else(|| "relay-proxy.toml".to_string());

    let listen_override = args
        .iter()
        .position(|a| a == "--listen")
        .and_then(|i| args.get(i + 1).cloned());

    let mut config = ProxyConfig::load(&config_path)?;

    // CLI overrides take precedence over TOML and env vars
    if let Some(addr) = listen_override {
        config.server.listen_address = addr;
    }

    // Build the tokio runtime first; the tonic gRPC exporter needs a reactor context
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let tracing_guard = relay_tracing::init_tracing(&config.tracing);

        tracing::info!(
            config_path = %config_path,
            listen_address = %config.server.listen_address,
            timeout_secs = config.forward.timeout_secs,
            allowed_origins = ?config.cors.origins(),
            otlp_export = tracing_guard.exporting(),
            "Starting relay-proxy"
        );

        server::run(config).await
    })
}
