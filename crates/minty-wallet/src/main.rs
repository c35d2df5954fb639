//! Minty wallet: signs and tracks NFT marketplace transactions.

mod bridge;
#[cfg(not(target_arch = "wasm32"))]
mod cli;
#[cfg(not(target_arch = "wasm32"))]
mod console;
#[cfg(target_arch = "wasm32")]
mod dom;

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    use clap::Parser;

    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = cli::Cli::parse();
    tracing::info!("Starting Minty wallet");
    cli::run(cli).await
}

#[cfg(target_arch = "wasm32")]
fn main() {
    tracing_wasm::set_as_global_default();
    if let Err(e) = dom::install() {
        tracing::error!(error = ?e, "failed to bind marketplace controls");
    }
}
