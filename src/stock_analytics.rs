// src/stock_analytics.rs
//! Inventory overview: where the stock sits and which SKUs hold most of it.

use std::collections::HashMap;

use crate::models::{
    LocationQuantity, SkuQuantity, StockOverview, StockRecord, WarehouseTypeBreakdown, WarehouseTypeShare,
};

pub const DEFAULT_TOP_SKUS: usize = 20;

/// Sums `quantity` per key, sorted descending (ties by key).
fn sum_by<'a, F>(rows: &[&'a StockRecord], key: F) -> Vec<(String, i64)>
where
    F: Fn(&'a StockRecord) -> &'a str,
{
    let mut totals: HashMap<&str, i64> = HashMap::new();
    for row in rows {
        *totals.entry(key(*row)).or_insert(0) += row.quantity;
    }

    let mut sorted: Vec<(String, i64)> = totals.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

pub fn total_quantity(rows: &[&StockRecord]) -> i64 {
    rows.iter().map(|r| r.quantity).sum()
}

pub fn warehouse_type_distribution(rows: &[&StockRecord]) -> Vec<WarehouseTypeShare> {
    let total = total_quantity(rows);
    sum_by(rows, |r| r.warehouse_type.as_str())
        .into_iter()
        .map(|(warehouse_type, quantity)| {
            let share_pct = if total != 0 {
                quantity as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            WarehouseTypeShare {
                warehouse_type,
                quantity,
                share_pct,
                share_label: format!("{:.1}%", share_pct),
            }
        })
        .collect()
}

pub fn top_skus(rows: &[&StockRecord], limit: usize) -> Vec<SkuQuantity> {
    sum_by(rows, |r| r.stock_name.as_str())
        .into_iter()
        .take(limit)
        .map(|(stock_name, quantity)| SkuQuantity { stock_name, quantity })
        .collect()
}

/// Locations holding stock for each warehouse type, in `order`.
/// Types without any positive location are left out.
pub fn location_breakdowns(rows: &[&StockRecord], order: &[WarehouseTypeShare]) -> Vec<WarehouseTypeBreakdown> {
    order
        .iter()
        .filter_map(|share| {
            let in_type: Vec<&StockRecord> = rows
                .iter()
                .copied()
                .filter(|r| r.warehouse_type == share.warehouse_type && r.quantity > 0)
                .collect();

            let locations: Vec<LocationQuantity> = sum_by(&in_type, |r| r.warehouse_name.as_str())
                .into_iter()
                .map(|(warehouse_name, quantity)| LocationQuantity { warehouse_name, quantity })
                .collect();

            if locations.is_empty() {
                return None;
            }

            Some(WarehouseTypeBreakdown {
                warehouse_type: share.warehouse_type.clone(),
                total: locations.iter().map(|l| l.quantity).sum(),
                locations,
            })
        })
        .collect()
}

pub fn build_overview(rows: &[&StockRecord], top_limit: usize) -> StockOverview {
    let distribution = warehouse_type_distribution(rows);
    let breakdowns = location_breakdowns(rows, &distribution);

    StockOverview {
        total_quantity: total_quantity(rows),
        top_skus: top_skus(rows, top_limit),
        distribution,
        breakdowns,
    }
}
