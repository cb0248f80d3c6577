use crate::alerts::{join_issues, AlertIndex};
use crate::types::{ExportRow, PlotRecord};
use chrono::{Local, NaiveDateTime};

/// Timestamp format of the `Exported At` column.
pub const EXPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Join the alert index back onto the dataset, stamped with the current
/// local time.
pub fn generate_alert_export(data: &[PlotRecord], alerts: &AlertIndex) -> Vec<ExportRow> {
    generate_alert_export_at(data, alerts, Local::now().naive_local())
}

/// Same as [`generate_alert_export`] with an explicit export time.
///
/// Every dataset row whose `plot_id` is indexed is emitted, duplicates
/// included. Each row carries the index's issues for its id, which for a
/// repeated id are those of the last alerted row.
pub fn generate_alert_export_at(
    data: &[PlotRecord],
    alerts: &AlertIndex,
    exported_at: NaiveDateTime,
) -> Vec<ExportRow> {
    // One clock read per export; all rows share it.
    let stamp = exported_at.format(EXPORT_TIME_FORMAT).to_string();
    data.iter()
        .filter_map(|r| {
            let issues = alerts.get(&r.plot_id)?;
            Some(ExportRow {
                plot_id: r.plot_id.clone(),
                owner: r.owner().to_string(),
                location: r.location().to_string(),
                cycle_id: r.cycle_id.clone().unwrap_or_default(),
                crop: r.crop().to_string(),
                profit_margin: r.profit_margin.clone().unwrap_or_default(),
                alert_issues: join_issues(issues),
                exported_at: stamp.clone(),
            })
        })
        .collect()
}

/// Download name for an export made at `at`, e.g. `farm_alerts_20240301_0915.csv`.
pub fn export_file_name(at: NaiveDateTime) -> String {
    format!("farm_alerts_{}.csv", at.format("%Y%m%d_%H%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{detect_risks_map, Issue};
    use crate::types::NumericColumn;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 15, 42)
            .unwrap()
    }

    fn record(id: &str, margin: &str, rain: &str) -> PlotRecord {
        PlotRecord {
            owner: Some("Kofi Boateng".to_string()),
            farm_location: Some("Tamale".to_string()),
            cycle_id: Some(format!("C-{}", id)),
            crop_name: Some("Cassava".to_string()),
            ..PlotRecord::new(id)
        }
        .with(NumericColumn::ProfitMargin, margin)
        .with(NumericColumn::RtRainfall, rain)
    }

    #[test]
    fn test_export_flattens_alerted_rows() {
        let data = vec![record("P1", "-12.5", "0"), record("P2", "30", "0")];
        let index = detect_risks_map(&data);
        let rows = generate_alert_export_at(&data, &index, at());

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.plot_id, "P1");
        assert_eq!(row.owner, "Kofi Boateng");
        assert_eq!(row.location, "Tamale");
        assert_eq!(row.cycle_id, "C-P1");
        assert_eq!(row.crop, "Cassava");
        assert_eq!(row.profit_margin, "-12.5");
        assert_eq!(row.alert_issues, "Negative profit");
        assert_eq!(row.exported_at, "2024-03-01 09:15:42");
    }

    #[test]
    fn test_export_joins_multiple_issues() {
        let data = vec![record("P1", "-1", "75")];
        let index = detect_risks_map(&data);
        let rows = generate_alert_export_at(&data, &index, at());
        assert_eq!(rows[0].alert_issues, "Negative profit, Heavy rainfall");
    }

    #[test]
    fn test_export_repeats_rows_with_last_seen_issues() {
        let data = vec![
            record("P1", "-1", "0"),
            record("P2", "10", "0"),
            record("P1", "10", "90"),
        ];
        let index = detect_risks_map(&data);
        let rows = generate_alert_export_at(&data, &index, at());

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.plot_id == "P1"));
        // The first P1 row inherits the second row's issues from the index.
        assert!(rows.iter().all(|r| r.alert_issues == "Heavy rainfall"));
    }

    #[test]
    fn test_export_uses_supplied_index_only() {
        let data = vec![record("P1", "50", "0"), record("P2", "50", "0")];
        let mut index = AlertIndex::new();
        index.insert("P2".to_string(), vec![Issue::HighYieldGap]);
        let rows = generate_alert_export_at(&data, &index, at());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].plot_id, "P2");
        assert_eq!(rows[0].alert_issues, "High yield gap");
    }

    #[test]
    fn test_export_shares_one_timestamp() {
        let data = vec![record("P1", "-1", "0"), record("P2", "-2", "0")];
        let index = detect_risks_map(&data);
        let rows = generate_alert_export(&data, &index);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].exported_at, rows[1].exported_at);
        assert!(NaiveDateTime::parse_from_str(&rows[0].exported_at, EXPORT_TIME_FORMAT).is_ok());
    }

    #[test]
    fn test_export_is_idempotent_for_fixed_time() {
        let data = vec![
            record("P1", "-1", "0"),
            record("P2", "10", "65"),
            record("P1", "-4", "0"),
        ];
        let index = detect_risks_map(&data);
        let first = generate_alert_export_at(&data, &index, at());
        let second = generate_alert_export_at(&data, &index, at());
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_export_missing_fields_are_blank() {
        let data = vec![PlotRecord::new("P9").with(NumericColumn::YieldGap, "40")];
        let index = detect_risks_map(&data);
        let rows = generate_alert_export_at(&data, &index, at());
        assert_eq!(rows[0].owner, "");
        assert_eq!(rows[0].cycle_id, "");
        assert_eq!(rows[0].profit_margin, "");
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(at()), "farm_alerts_20240301_0915.csv");
    }
}
