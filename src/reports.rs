use crate::alerts::{AlertIndex, Issue};
use crate::types::{
    AlertFrequencyRow, CropFinanceRow, NumericColumn, Overview, OwnerTotalsRow, PlotRecord,
};
use crate::util::{format_number, mean_present, round_to, sum_present};
use std::collections::{BTreeMap, HashSet};

fn column(data: &[PlotRecord], col: NumericColumn) -> impl Iterator<Item = Option<f64>> + '_ {
    data.iter().map(move |r| r.numeric(col))
}

/// Headline KPIs for the overview panel. Figures are rounded to 2 decimals.
pub fn generate_overview(data: &[PlotRecord]) -> Overview {
    let crops: HashSet<&str> = data
        .iter()
        .filter_map(|r| r.crop_name.as_deref())
        .filter(|c| !c.is_empty())
        .collect();
    let mean = |col| mean_present(column(data, col)).map(|v| round_to(v, 2));
    Overview {
        total_plots: data.len(),
        total_area_ha: round_to(sum_present(column(data, NumericColumn::SizeHa)), 2),
        crop_diversity: crops.len(),
        total_yield: round_to(sum_present(column(data, NumericColumn::ActualYield)), 2),
        avg_profit_margin: mean(NumericColumn::ProfitMargin),
        total_revenue: round_to(sum_present(column(data, NumericColumn::TotalRevenue)), 2),
        total_expense: round_to(sum_present(column(data, NumericColumn::TotalExpense)), 2),
        avg_rt_temperature: mean(NumericColumn::RtTemperature),
        avg_rt_humidity: mean(NumericColumn::RtHumidity),
        avg_rt_rainfall: mean(NumericColumn::RtRainfall),
    }
}

/// Summed yield and input cost per owner, ordered by owner.
pub fn yield_and_cost_by_owner(data: &[PlotRecord]) -> Vec<OwnerTotalsRow> {
    #[derive(Default)]
    struct Acc {
        yield_total: f64,
        input_cost: f64,
    }
    let mut map: BTreeMap<&str, Acc> = BTreeMap::new();
    for r in data {
        let Some(owner) = r.owner.as_deref() else {
            continue;
        };
        let e = map.entry(owner).or_default();
        e.yield_total += r.numeric(NumericColumn::ActualYield).unwrap_or(0.0);
        e.input_cost += r.numeric(NumericColumn::TotalInputCost).unwrap_or(0.0);
    }
    map.into_iter()
        .map(|(owner, acc)| OwnerTotalsRow {
            owner: owner.to_string(),
            total_yield: format_number(acc.yield_total, 2),
            total_input_cost: format_number(acc.input_cost, 2),
        })
        .collect()
}

/// Summed revenue and expense per crop, ordered by crop.
pub fn finance_by_crop(data: &[PlotRecord]) -> Vec<CropFinanceRow> {
    let mut map: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for r in data {
        let Some(crop) = r.crop_name.as_deref() else {
            continue;
        };
        let e = map.entry(crop).or_insert((0.0, 0.0));
        e.0 += r.numeric(NumericColumn::TotalRevenue).unwrap_or(0.0);
        e.1 += r.numeric(NumericColumn::TotalExpense).unwrap_or(0.0);
    }
    map.into_iter()
        .map(|(crop, (revenue, expense))| CropFinanceRow {
            crop: crop.to_string(),
            total_revenue: format_number(revenue, 2),
            total_expense: format_number(expense, 2),
        })
        .collect()
}

/// Number of indexed plots raising each issue type.
pub fn alert_frequency(alerts: &AlertIndex) -> Vec<AlertFrequencyRow> {
    Issue::ALL
        .iter()
        .filter_map(|issue| {
            let count = alerts.values().filter(|v| v.contains(issue)).count();
            (count > 0).then(|| AlertFrequencyRow {
                alert_type: issue.label().to_string(),
                count,
            })
        })
        .collect()
}
