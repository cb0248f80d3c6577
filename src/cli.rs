//! Command-line interface argument parsing.

use crate::color::Metric;
use crate::filters::DatasetFilter;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

/// Farm dashboard reports - risk alerts, exports and map layers
///
/// Without --batch an interactive menu is shown:
///   [1] Load the file
///   [2] Generate Reports
///
/// Examples:
///   farm_dashboard --input farm_master_data.csv
///   farm_dashboard --batch --metric Rainfall --only-alerts
///   farm_dashboard --batch --owner "Ama Mensah,Kofi Boateng" --season Major
///   farm_dashboard --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Joined plot dataset (CSV). Overrides the config file.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for farm_dashboard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Metric used to color the map (Profit Margin, Temperature, Rainfall, Humidity)
    #[arg(short, long, value_parser = parse_metric)]
    pub metric: Option<Metric>,

    /// Keep only these owners (comma-separated)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub owner: Vec<String>,

    /// Keep only these seasons (comma-separated)
    #[arg(long, value_name = "SEASONS", value_delimiter = ',')]
    pub season: Vec<String>,

    /// Keep only these farm locations (comma-separated)
    #[arg(long, value_name = "LOCATIONS", value_delimiter = ',')]
    pub location: Vec<String>,

    /// Keep only these plot ids (comma-separated)
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    pub plot: Vec<String>,

    /// Show only plots with alerts
    #[arg(long)]
    pub only_alerts: bool,

    /// Directory for generated files
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Load and generate once, without the interactive menu
    #[arg(long)]
    pub batch: bool,

    /// Write a default farm_dashboard.toml and exit
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_metric(s: &str) -> Result<Metric, String> {
    s.parse().map_err(|e: crate::error::DashboardError| e.to_string())
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else if self.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        }
    }

    pub fn filter(&self) -> DatasetFilter {
        DatasetFilter {
            owners: self.owner.clone(),
            seasons: self.season.clone(),
            locations: self.location.clone(),
            plot_ids: self.plot.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["farm_dashboard"]);
        assert!(args.input.is_none());
        assert!(args.metric.is_none());
        assert!(!args.batch);
        assert!(args.filter().is_empty());
        assert_eq!(args.log_level(), Level::WARN);
    }

    #[test]
    fn test_filter_lists_are_comma_delimited() {
        let args = Args::parse_from([
            "farm_dashboard",
            "--owner",
            "Ama,Kofi",
            "--plot",
            "P1",
            "--plot",
            "P2",
        ]);
        let filter = args.filter();
        assert_eq!(filter.owners, vec!["Ama", "Kofi"]);
        assert_eq!(filter.plot_ids, vec!["P1", "P2"]);
        assert!(filter.seasons.is_empty());
    }

    #[test]
    fn test_metric_flag() {
        let args = Args::parse_from(["farm_dashboard", "--metric", "Profit Margin"]);
        assert_eq!(args.metric, Some(Metric::ProfitMargin));
        assert!(Args::try_parse_from(["farm_dashboard", "--metric", "wind"]).is_err());
    }

    #[test]
    fn test_log_levels() {
        let verbose = Args::parse_from(["farm_dashboard", "-v"]);
        assert_eq!(verbose.log_level(), Level::DEBUG);
        let quiet = Args::parse_from(["farm_dashboard", "-q"]);
        assert_eq!(quiet.log_level(), Level::ERROR);
        assert!(Args::try_parse_from(["farm_dashboard", "-v", "-q"]).is_err());
    }
}
