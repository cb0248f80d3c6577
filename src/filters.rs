use crate::alerts::AlertIndex;
use crate::types::PlotRecord;

/// Sidebar-style selections. An empty list means "no restriction".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetFilter {
    pub owners: Vec<String>,
    pub seasons: Vec<String>,
    pub locations: Vec<String>,
    pub plot_ids: Vec<String>,
}

fn allows(selection: &[String], value: Option<&str>) -> bool {
    selection.is_empty() || value.is_some_and(|v| selection.iter().any(|s| s == v))
}

impl DatasetFilter {
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
            && self.seasons.is_empty()
            && self.locations.is_empty()
            && self.plot_ids.is_empty()
    }

    pub fn matches(&self, r: &PlotRecord) -> bool {
        allows(&self.owners, r.owner.as_deref())
            && allows(&self.seasons, r.season.as_deref())
            && allows(&self.locations, r.farm_location.as_deref())
            && allows(&self.plot_ids, Some(r.plot_id.as_str()))
    }

    /// Rows passing every selection, in their original order.
    pub fn apply(&self, data: &[PlotRecord]) -> Vec<PlotRecord> {
        data.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Keep only rows whose plot carries an alert.
pub fn retain_alerted(data: &[PlotRecord], alerts: &AlertIndex) -> Vec<PlotRecord> {
    data.iter()
        .filter(|r| alerts.contains_key(&r.plot_id))
        .cloned()
        .collect()
}
