//! Command implementations for the pest monitoring CLI.
//!
//! Every subcommand loads the configured feeds, folds them into the
//! dashboard state and prints a JSON view of the resulting snapshot.

use clap::Subcommand;

pub mod args;
pub mod report;
pub mod sources;

use args::{FilterArgs, ReportArgs, SourceArgs};

#[derive(Subcommand)]
pub enum Command {
    /// KPIs, week-over-week trends and threshold/action breakdowns for the filtered observations
    Summary {
        #[command(flatten)]
        sources: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        report: ReportArgs,
    },

    /// Stitched history and forecast series with benchmarks and risk outlook
    Forecast {
        #[command(flatten)]
        sources: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        report: ReportArgs,
    },

    /// The full dashboard snapshot
    Dashboard {
        #[command(flatten)]
        sources: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        report: ReportArgs,
    },

    /// Values available for each filter in the observation feed
    Options {
        #[command(flatten)]
        sources: SourceArgs,
        #[command(flatten)]
        report: ReportArgs,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Summary {
            sources,
            filters,
            report,
        } => report::run_summary(&sources, &filters, &report).await,
        Command::Forecast {
            sources,
            filters,
            report,
        } => report::run_forecast(&sources, &filters, &report).await,
        Command::Dashboard {
            sources,
            filters,
            report,
        } => report::run_dashboard(&sources, &filters, &report).await,
        Command::Options { sources, report } => report::run_options(&sources, &report).await,
    }
}
