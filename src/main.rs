// Entry point and high-level CLI flow.
//
// - Option [1] loads the joined plot CSV, applies the selection filters and
//   prints load diagnostics.
// - Option [2] runs risk detection and writes the alert export, the overview
//   summary, the filtered dataset and the colored map layer.
// - After generating reports, the user can choose to go back to the
//   selection menu or exit. `--batch` runs [1] then [2] once.
mod alerts;
mod cli;
mod color;
mod config;
mod error;
mod export;
mod filters;
mod loader;
mod map;
mod output;
mod reports;
mod types;
mod util;

use anyhow::{Context, Result};
use chrono::Local;
use cli::Args;
use color::Metric;
use config::Config;
use filters::DatasetFilter;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};
use tracing_subscriber::FmtSubscriber;
use types::PlotRecord;

// Simple in-memory app state so we only load the CSV once but can
// generate reports multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Vec<PlotRecord>>,
}

/// Everything the menu handlers need, resolved once at startup.
struct Session {
    config: Config,
    filter: DatasetFilter,
    metric: Metric,
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
///
/// Returns `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask the user whether to go back to the report selection menu after
/// generating reports.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).unwrap_or(0) == 0 {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load the dataset and apply the selection filters.
fn handle_load(session: &Session) -> Result<()> {
    let path = &session.config.dashboard.input;
    let loaded = if path.as_os_str() == "-" {
        loader::read_dataset(io::stdin().lock())
    } else {
        loader::load_dataset(path)
    };
    let (data, report) = loaded.with_context(|| format!("Failed to load {}", path.display()))?;
    if !session.filter.is_empty() {
        debug!(filter = ?session.filter, "applying selection filters");
    }
    let data = session.filter.apply(&data);
    println!(
        "Processing dataset... ({} rows read, {} loaded, {} after filters)",
        util::format_int(report.total_rows),
        util::format_int(report.loaded_rows),
        util::format_int(data.len())
    );
    if report.parse_errors > 0 || report.missing_plot_id > 0 {
        println!(
            "Note: {} rows skipped ({} unreadable, {} without plot_id).",
            util::format_int(report.parse_errors + report.missing_plot_id),
            util::format_int(report.parse_errors),
            util::format_int(report.missing_plot_id)
        );
    }
    println!();
    info!(rows = data.len(), "dataset loaded");
    let mut state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    state.data = Some(data);
    Ok(())
}

/// Handle option [2]: alerts, export, overview and map.
///
/// Writes the alert CSV, `overview.json`, `filtered_farm_data.csv` and
/// `farm_map.geojson` into the output directory and prints Markdown previews to the console.
fn handle_generate_reports(session: &Session) -> Result<()> {
    let data = {
        let state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
        state.data.clone()
    };
    let Some(mut data) = data else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return Ok(());
    };

    let dash = &session.config.dashboard;
    std::fs::create_dir_all(&dash.output_dir)
        .with_context(|| format!("Failed to create {}", dash.output_dir.display()))?;

    let risk_alerts = alerts::detect_risks_list(&data);
    let plot_alerts = alerts::detect_risks_map(&data);
    if dash.show_only_alerts {
        data = filters::retain_alerted(&data, &plot_alerts);
        debug!(rows = data.len(), "kept alerted plots only");
    }

    println!("Generating reports...\n");

    let overview = reports::generate_overview(&data);
    println!("Key Performance Indicators");
    println!(
        "  Plots: {}  Area: {} ha  Crops: {}  Yield: {} t",
        util::format_int(overview.total_plots),
        util::format_number(overview.total_area_ha, 2),
        overview.crop_diversity,
        util::format_number(overview.total_yield, 2)
    );
    println!(
        "  Profit margin: {} %  Revenue: {}  Expense: {}",
        util::format_optional(overview.avg_profit_margin, 2),
        util::format_number(overview.total_revenue, 2),
        util::format_number(overview.total_expense, 2)
    );
    println!(
        "  Avg temp: {} °C  Avg humidity: {} %  Avg rainfall: {} mm\n",
        util::format_optional(overview.avg_rt_temperature, 1),
        util::format_optional(overview.avg_rt_humidity, 1),
        util::format_optional(overview.avg_rt_rainfall, 2)
    );
    let overview_path = dash.output_dir.join("overview.json");
    output::write_json(&overview_path, &overview)?;
    let filtered_path = output::write_filtered_data(&dash.output_dir, &data)?;
    println!(
        "Filtered data ({} plots) saved to {}\n",
        util::format_int(data.len()),
        filtered_path.display()
    );

    let by_owner = reports::yield_and_cost_by_owner(&data);
    output::preview_table("Yield and Input Cost by Owner", None, &by_owner, dash.preview_rows);
    let by_crop = reports::finance_by_crop(&data);
    output::preview_table("Revenue vs Expense by Crop", None, &by_crop, dash.preview_rows);

    println!("Risk Alerts\n");
    if risk_alerts.is_empty() {
        println!("No critical alerts detected across filtered plots.\n");
    } else {
        for alert in &risk_alerts {
            println!("  {}", alert);
        }
        println!();

        let rows = export::generate_alert_export(&data, &plot_alerts);
        let export_path = dash
            .output_dir
            .join(export::export_file_name(Local::now().naive_local()));
        output::write_csv(&export_path, &rows)?;
        output::preview_table("Alert List", Some("export preview"), &rows, dash.preview_rows);
        println!("(Full alert list exported to {})\n", export_path.display());
    }

    let frequency = reports::alert_frequency(&plot_alerts);
    output::preview_table(
        "Alert Type Frequency",
        Some("plots triggering each alert type"),
        &frequency,
        frequency.len(),
    );

    let scale = color::build_scale(&data, session.metric);
    let layer = map::build_features(&data, &plot_alerts, &scale);
    let map_path = dash.output_dir.join("farm_map.geojson");
    output::write_json(&map_path, &layer.to_geojson())?;
    println!(
        "Map colored by {} [{} .. {}]: {} plots drawn, {} without usable geometry.",
        scale.caption,
        util::format_number(scale.domain_min, 2),
        util::format_number(scale.domain_max, 2),
        util::format_int(layer.features.len()),
        util::format_int(layer.skipped)
    );
    println!(
        "Outputs saved to {} and {}\n",
        overview_path.display(),
        map_path.display()
    );
    Ok(())
}

fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::DEFAULT_CONFIG_FILE);
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::write(path, Config::default_toml()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {} with default settings.", path.display());
    Ok(())
}

fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .compact()
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: logging already initialized");
    }
}

fn main() -> Result<()> {
    let args = Args::parse_args();
    if args.init_config {
        return handle_init_config();
    }
    init_logging(&args);

    let mut config = Config::resolve(args.config.as_deref()).context("Failed to load config")?;
    config.merge_with_args(&args);
    let metric = config.metric()?;
    if config.weather.api_key.is_none() {
        debug!("no weather API key configured; rt_* columns are taken from the input as-is");
    }
    let session = Session {
        config,
        filter: args.filter(),
        metric,
    };

    if args.batch {
        handle_load(&session)?;
        return handle_generate_reports(&session);
    }

    loop {
        println!("Farm Dashboard Reports:");
        println!("[1] Load the file");
        println!("[2] Generate Reports\n");
        let Some(choice) = read_choice() else {
            break;
        };
        match choice.as_str() {
            "1" => {
                if let Err(e) = handle_load(&session) {
                    eprintln!("{:#}\n", e);
                }
            }
            "2" => {
                println!();
                if let Err(e) = handle_generate_reports(&session) {
                    eprintln!("{:#}\n", e);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
    Ok(())
}
