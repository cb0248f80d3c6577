use crate::util::parse_f64_safe;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One joined farm-plot row as handed over by the data-join query.
///
/// Every cell is kept as text: numeric columns regularly arrive empty, as
/// `NULL`-ish strings or with stray formatting, and are only coerced when a
/// consumer needs a number (see [`PlotRecord::numeric`]).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlotRecord {
    pub plot_id: String,
    pub owner: Option<String>,
    pub farm_location: Option<String>,
    pub season: Option<String>,
    pub cycle_id: Option<String>,
    pub crop_name: Option<String>,
    pub planting_date: Option<String>,
    pub actual_harvest_date: Option<String>,
    pub location_geometry: Option<String>,
    pub size_ha: Option<String>,
    pub expected_yield: Option<String>,
    pub actual_yield: Option<String>,
    pub yield_gap: Option<String>,
    pub total_input_cost: Option<String>,
    pub total_revenue: Option<String>,
    pub total_expense: Option<String>,
    pub profit: Option<String>,
    pub profit_margin: Option<String>,
    pub rt_temperature: Option<String>,
    pub rt_humidity: Option<String>,
    pub rt_rainfall: Option<String>,
}

/// Numeric columns of [`PlotRecord`] that rules, scales and reports read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericColumn {
    SizeHa,
    ExpectedYield,
    ActualYield,
    YieldGap,
    TotalInputCost,
    TotalRevenue,
    TotalExpense,
    Profit,
    ProfitMargin,
    RtTemperature,
    RtHumidity,
    RtRainfall,
}

impl NumericColumn {
    /// Column name as it appears in the dataset header.
    pub fn name(self) -> &'static str {
        match self {
            NumericColumn::SizeHa => "size_ha",
            NumericColumn::ExpectedYield => "expected_yield",
            NumericColumn::ActualYield => "actual_yield",
            NumericColumn::YieldGap => "yield_gap",
            NumericColumn::TotalInputCost => "total_input_cost",
            NumericColumn::TotalRevenue => "total_revenue",
            NumericColumn::TotalExpense => "total_expense",
            NumericColumn::Profit => "profit",
            NumericColumn::ProfitMargin => "profit_margin",
            NumericColumn::RtTemperature => "rt_temperature",
            NumericColumn::RtHumidity => "rt_humidity",
            NumericColumn::RtRainfall => "rt_rainfall",
        }
    }
}

impl PlotRecord {
    /// Raw cell text of a numeric column.
    pub fn raw(&self, column: NumericColumn) -> Option<&str> {
        let cell = match column {
            NumericColumn::SizeHa => &self.size_ha,
            NumericColumn::ExpectedYield => &self.expected_yield,
            NumericColumn::ActualYield => &self.actual_yield,
            NumericColumn::YieldGap => &self.yield_gap,
            NumericColumn::TotalInputCost => &self.total_input_cost,
            NumericColumn::TotalRevenue => &self.total_revenue,
            NumericColumn::TotalExpense => &self.total_expense,
            NumericColumn::Profit => &self.profit,
            NumericColumn::ProfitMargin => &self.profit_margin,
            NumericColumn::RtTemperature => &self.rt_temperature,
            NumericColumn::RtHumidity => &self.rt_humidity,
            NumericColumn::RtRainfall => &self.rt_rainfall,
        };
        cell.as_deref()
    }

    /// Coerced value of a numeric column, `None` when missing or unparseable.
    pub fn numeric(&self, column: NumericColumn) -> Option<f64> {
        parse_f64_safe(self.raw(column))
    }

    pub fn owner(&self) -> &str {
        self.owner.as_deref().unwrap_or("")
    }

    pub fn location(&self) -> &str {
        self.farm_location.as_deref().unwrap_or("")
    }

    pub fn crop(&self) -> &str {
        self.crop_name.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
impl PlotRecord {
    pub fn new(plot_id: impl Into<String>) -> Self {
        Self {
            plot_id: plot_id.into(),
            ..Self::default()
        }
    }

    pub fn with(mut self, column: NumericColumn, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match column {
            NumericColumn::SizeHa => self.size_ha = value,
            NumericColumn::ExpectedYield => self.expected_yield = value,
            NumericColumn::ActualYield => self.actual_yield = value,
            NumericColumn::YieldGap => self.yield_gap = value,
            NumericColumn::TotalInputCost => self.total_input_cost = value,
            NumericColumn::TotalRevenue => self.total_revenue = value,
            NumericColumn::TotalExpense => self.total_expense = value,
            NumericColumn::Profit => self.profit = value,
            NumericColumn::ProfitMargin => self.profit_margin = value,
            NumericColumn::RtTemperature => self.rt_temperature = value,
            NumericColumn::RtHumidity => self.rt_humidity = value,
            NumericColumn::RtRainfall => self.rt_rainfall = value,
        }
        self
    }
}

/// Flattened alert row, ready for CSV download.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ExportRow {
    #[serde(rename = "Plot ID")]
    #[tabled(rename = "Plot ID")]
    pub plot_id: String,
    #[serde(rename = "Owner")]
    #[tabled(rename = "Owner")]
    pub owner: String,
    #[serde(rename = "Location")]
    #[tabled(rename = "Location")]
    pub location: String,
    #[serde(rename = "Cycle ID")]
    #[tabled(rename = "Cycle ID")]
    pub cycle_id: String,
    #[serde(rename = "Crop")]
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Profit Margin (%)")]
    #[tabled(rename = "Profit Margin (%)")]
    pub profit_margin: String,
    #[serde(rename = "Alert Issues")]
    #[tabled(rename = "Alert Issues")]
    pub alert_issues: String,
    #[serde(rename = "Exported At")]
    #[tabled(rename = "Exported At")]
    pub exported_at: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct OwnerTotalsRow {
    #[serde(rename = "Owner")]
    #[tabled(rename = "Owner")]
    pub owner: String,
    #[serde(rename = "TotalYield")]
    #[tabled(rename = "TotalYield")]
    pub total_yield: String,
    #[serde(rename = "TotalInputCost")]
    #[tabled(rename = "TotalInputCost")]
    pub total_input_cost: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CropFinanceRow {
    #[serde(rename = "Crop")]
    #[tabled(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "TotalRevenue")]
    #[tabled(rename = "TotalRevenue")]
    pub total_revenue: String,
    #[serde(rename = "TotalExpense")]
    #[tabled(rename = "TotalExpense")]
    pub total_expense: String,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct AlertFrequencyRow {
    #[serde(rename = "Alert Type")]
    #[tabled(rename = "Alert Type")]
    pub alert_type: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

/// Headline KPIs written to `overview.json`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Overview {
    pub total_plots: usize,
    pub total_area_ha: f64,
    pub crop_diversity: usize,
    pub total_yield: f64,
    pub avg_profit_margin: Option<f64>,
    pub total_revenue: f64,
    pub total_expense: f64,
    pub avg_rt_temperature: Option<f64>,
    pub avg_rt_humidity: Option<f64>,
    pub avg_rt_rainfall: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        let rec = PlotRecord::new("P1")
            .with(NumericColumn::ProfitMargin, "-12.5")
            .with(NumericColumn::YieldGap, "bad")
            .with(NumericColumn::RtRainfall, "");
        assert_eq!(rec.numeric(NumericColumn::ProfitMargin), Some(-12.5));
        assert_eq!(rec.numeric(NumericColumn::YieldGap), None);
        assert_eq!(rec.numeric(NumericColumn::RtRainfall), None);
        assert_eq!(rec.numeric(NumericColumn::RtHumidity), None);
        assert_eq!(rec.raw(NumericColumn::YieldGap), Some("bad"));
    }

    #[test]
    fn test_text_accessors_default_to_empty() {
        let rec = PlotRecord::new("P1");
        assert_eq!(rec.owner(), "");
        assert_eq!(rec.location(), "");
        assert_eq!(rec.crop(), "");
    }
}
