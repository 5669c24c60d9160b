use anyhow::Result;
use kestrel_uci::UciEngine;
use tracing::info;

fn main() -> Result<()> {
    // stdout belongs to the protocol
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::INFO)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "kestrel starting");
    UciEngine::new().run()?;
    Ok(())
}
