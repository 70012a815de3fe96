//! pest-cli - Command line tool for pest observation analytics.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "pest-cli",
    version,
    about = "Pest monitoring analytics: KPIs, trends and forecast outlooks"
)]
struct Cli {
    #[command(subcommand)]
    command: pest_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    pest_cmd::run(cli.command).await
}
