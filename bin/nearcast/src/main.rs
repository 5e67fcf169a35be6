//! Nearcast dispatcher binary.

mod cli;

use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    let args = cli::NearcastCli::parse();
    args.init_tracing()?;
    cli::run(args).await
}
