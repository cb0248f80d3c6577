use crate::error::Result;
use crate::types::PlotRecord;
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub missing_plot_id: usize,
}

/// Load the joined plot dataset from a CSV export.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<(Vec<PlotRecord>, LoadReport)> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading dataset");
    let rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    read_records(rdr)
}

/// Same as [`load_dataset`] for any reader (stdin, in-memory buffers).
pub fn read_dataset<R: Read>(reader: R) -> Result<(Vec<PlotRecord>, LoadReport)> {
    let rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    read_records(rdr)
}

fn read_records<R: Read>(mut rdr: csv::Reader<R>) -> Result<(Vec<PlotRecord>, LoadReport)> {
    let mut report = LoadReport::default();
    let mut data: Vec<PlotRecord> = Vec::new();

    for result in rdr.deserialize::<PlotRecord>() {
        report.total_rows += 1;
        let mut row = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(row = report.total_rows, error = %e, "skipping unreadable row");
                report.parse_errors += 1;
                continue;
            }
        };

        row.plot_id = row.plot_id.trim().to_string();
        if row.plot_id.is_empty() {
            report.missing_plot_id += 1;
            continue;
        }
        trim_text_fields(&mut row);
        data.push(row);
    }

    report.loaded_rows = data.len();
    Ok((data, report))
}

// Whitespace-only cells count as missing.
fn trim_text_fields(row: &mut PlotRecord) {
    for cell in [
        &mut row.owner,
        &mut row.farm_location,
        &mut row.season,
        &mut row.cycle_id,
        &mut row.crop_name,
        &mut row.planting_date,
        &mut row.actual_harvest_date,
        &mut row.location_geometry,
    ] {
        *cell = cell
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NumericColumn;
    use std::io::Write;

    const SAMPLE: &str = "\
plot_id,owner,farm_location,season,cycle_id,crop_name,profit_margin,yield_gap,rt_rainfall
P1, Ama Mensah ,Kumasi,Major,C1,Maize,-4.5,2,10
P2,Kofi Boateng,Tamale,Minor,C2,Yam,,15,
,Nobody,Accra,Major,C3,Rice,1,1,1
P3,Esi Owusu,  ,Major,C4,Cassava,bad,0,75.2
";

    #[test]
    fn test_read_dataset_counts_rows() {
        let (data, report) = read_dataset(SAMPLE.as_bytes()).unwrap();
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.loaded_rows, 3);
        assert_eq!(report.missing_plot_id, 1);
        assert_eq!(report.parse_errors, 0);
        let ids: Vec<&str> = data.iter().map(|r| r.plot_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn test_read_dataset_cleans_cells() {
        let (data, _) = read_dataset(SAMPLE.as_bytes()).unwrap();
        assert_eq!(data[0].owner(), "Ama Mensah");
        assert_eq!(data[0].numeric(NumericColumn::ProfitMargin), Some(-4.5));
        assert_eq!(data[1].profit_margin, None);
        assert_eq!(data[1].rt_rainfall, None);
        assert_eq!(data[2].farm_location, None);
        assert_eq!(data[2].raw(NumericColumn::ProfitMargin), Some("bad"));
        // Columns absent from the header read as missing.
        assert_eq!(data[0].rt_humidity, None);
    }

    #[test]
    fn test_read_dataset_tolerates_ragged_rows() {
        let csv = "plot_id,owner,profit_margin\nP1,Ama\nP2,Kofi,-3\n";
        let (data, report) = read_dataset(csv.as_bytes()).unwrap();
        assert_eq!(report.loaded_rows + report.parse_errors, 2);
        assert!(data.iter().any(|r| r.plot_id == "P2"));
    }

    #[test]
    fn test_load_dataset_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let (data, report) = load_dataset(file.path()).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(report.loaded_rows, 3);
    }

    #[test]
    fn test_load_dataset_missing_file() {
        assert!(load_dataset("/nonexistent/farm_master_data.csv").is_err());
    }
}
