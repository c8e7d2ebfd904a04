use clap::Parser;
use sphinx_search::cli::{Cli, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    sphinx_search::tracing::init_with(cli.log_format);
    run(cli).await
}
