use crate::error::Result;
use crate::types::PlotRecord;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "csv written");
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    debug!(path = %path.display(), "json written");
    Ok(())
}

pub const FILTERED_DATA_FILE: &str = "filtered_farm_data.csv";

/// Write the selected plot rows, in dataset column layout, to
/// `filtered_farm_data.csv` under `dir`.
pub fn write_filtered_data(dir: impl AsRef<Path>, data: &[PlotRecord]) -> Result<PathBuf> {
    let path = dir.as_ref().join(FILTERED_DATA_FILE);
    write_csv(&path, data)?;
    Ok(path)
}

/// Render the first `max_rows` rows as a Markdown table.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    match render_table(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(no rows)\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExportRow, NumericColumn};

    fn row(id: &str) -> ExportRow {
        ExportRow {
            plot_id: id.to_string(),
            owner: "Ama".to_string(),
            location: "Kumasi".to_string(),
            cycle_id: "C1".to_string(),
            crop: "Maize".to_string(),
            profit_margin: "-3.5".to_string(),
            alert_issues: "Negative profit, Heavy rainfall".to_string(),
            exported_at: "2024-03-01 09:15:42".to_string(),
        }
    }

    #[test]
    fn test_write_csv_uses_export_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.csv");
        write_csv(&path, &[row("P1"), row("P2")]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Plot ID,Owner,Location,Cycle ID,Crop,Profit Margin (%),Alert Issues,Exported At")
        );
        assert_eq!(
            lines.next(),
            Some("P1,Ama,Kumasi,C1,Maize,-3.5,\"Negative profit, Heavy rainfall\",2024-03-01 09:15:42")
        );
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_write_filtered_data_keeps_dataset_columns() {
        let dir = tempfile::tempdir().unwrap();
        let data = vec![
            PlotRecord {
                owner: Some("Ama".to_string()),
                ..PlotRecord::new("P1")
            }
            .with(NumericColumn::ProfitMargin, "-3.5"),
            PlotRecord::new("P2").with(NumericColumn::RtRainfall, "5e-05"),
        ];
        let path = write_filtered_data(dir.path(), &data).unwrap();
        assert_eq!(path, dir.path().join("filtered_farm_data.csv"));

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("plot_id,owner,farm_location,"));
        assert!(header.ends_with(",rt_rainfall"));
        assert_eq!(text.lines().count(), 3);

        let (back, report) = crate::loader::load_dataset(&path).unwrap();
        assert_eq!(report.loaded_rows, 2);
        assert_eq!(back[0].plot_id, "P1");
        assert_eq!(back[0].owner(), "Ama");
        assert_eq!(back[0].numeric(NumericColumn::ProfitMargin), Some(-3.5));
        assert_eq!(back[1].numeric(NumericColumn::RtRainfall), Some(5e-05));
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overview.json");
        write_json(&path, &serde_json::json!({ "total_plots": 3 })).unwrap();
        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["total_plots"], 3);
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&[row("P1"), row("P2"), row("P3")], 2).unwrap();
        assert!(table.contains("| Plot ID"));
        assert!(table.contains("P2"));
        assert!(!table.contains("P3"));
        assert!(render_table::<ExportRow>(&[], 5).is_none());
    }
}
