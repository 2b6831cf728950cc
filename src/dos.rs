// src/dos.rs
//! Days-of-Stock health model.
//!
//! `DOS = current stock / average daily sales over the trailing window`.
//! The window always ends at the latest date in the full sales history,
//! independent of any date range selected for the other views.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::models::{DaysOfStock, DosStatus, DosSummary, ProductDosEntry, SalesRecord, StockRecord};

pub const DEFAULT_WINDOW_DAYS: u32 = 21;
pub const LOW_STOCK_DAYS: f64 = 14.0;
pub const OVERSTOCK_DAYS: f64 = 60.0;

// ==================== TRAILING WINDOW ====================

/// Trailing sales window `(latest - W days, latest]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesWindow {
    pub latest: NaiveDate,
    pub days: u32,
}

impl SalesWindow {
    pub fn new(latest: NaiveDate, days: u32) -> Self {
        Self { latest, days }
    }

    /// Anchors the window at the latest date in `sales`; `None` for no sales.
    pub fn ending_at_latest(sales: &[SalesRecord], days: u32) -> Option<Self> {
        sales.iter().map(|s| s.date).max().map(|latest| Self::new(latest, days))
    }

    /// First day inside the window.
    pub fn first_day(&self) -> NaiveDate {
        self.latest - Duration::days(self.days as i64 - 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date > self.latest - Duration::days(self.days as i64) && date <= self.latest
    }

    pub fn select<'a>(&self, sales: &'a [SalesRecord]) -> impl Iterator<Item = &'a SalesRecord> + 'a {
        let window = *self;
        sales.iter().filter(move |s| window.contains(s.date))
    }
}

// ==================== COMPUTATION ====================

/// Units sold per product over the window divided by the window length.
///
/// Days without sales still count toward the divisor. Products without
/// sales in the window are absent, as are lines without a stock code.
pub fn average_daily_sales<'a, I>(window_sales: I, window_days: u32) -> HashMap<String, f64>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut totals: HashMap<String, f64> = HashMap::new();
    for record in window_sales.into_iter().filter(|r| r.has_code()) {
        *totals.entry(record.stock_code.clone()).or_insert(0.0) += record.quantity;
    }

    let divisor = window_days.max(1) as f64;
    totals.into_iter().map(|(code, qty)| (code, qty / divisor)).collect()
}

/// Current quantity per product code, summed across warehouses.
/// Order follows the first appearance of each code; the first name seen wins.
/// Rows without a stock code (totals, notes) are not products and are skipped.
pub fn aggregate_stock(stock: &[StockRecord]) -> Vec<(String, String, i64)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut aggregated: Vec<(String, String, i64)> = Vec::new();

    for record in stock.iter().filter(|r| r.has_code()) {
        match positions.get(record.stock_code.as_str()) {
            Some(&idx) => aggregated[idx].2 += record.quantity,
            None => {
                positions.insert(record.stock_code.as_str(), aggregated.len());
                aggregated.push((record.stock_code.clone(), record.stock_name.clone(), record.quantity));
            }
        }
    }

    aggregated
}

/// Health status; rules are checked in order and the first match wins.
///
/// Only an ADS of exactly zero means dead stock. A negative ADS (returns
/// outweigh sales in the window) still yields a ratio and is classified on it.
pub fn classify(quantity: i64, ads: f64) -> DosStatus {
    if quantity <= 0 {
        return DosStatus::OutOfStock;
    }
    if ads == 0.0 {
        return DosStatus::DeadStock;
    }
    match quantity as f64 / ads {
        days if days < LOW_STOCK_DAYS => DosStatus::LowStock,
        days if days > OVERSTOCK_DAYS => DosStatus::Overstock,
        _ => DosStatus::Healthy,
    }
}

/// Most urgent first: ascending DOS, then higher ADS.
pub fn compare_urgency(a: &ProductDosEntry, b: &ProductDosEntry) -> Ordering {
    a.dos_days
        .total_cmp(&b.dos_days)
        .then_with(|| b.ads.total_cmp(&a.ads))
}

/// One entry per product in `stock`, ordered by urgency.
pub fn compute_dos(stock: &[StockRecord], sales: &[SalesRecord], window_days: u32) -> Vec<ProductDosEntry> {
    let ads_by_code = match SalesWindow::ending_at_latest(sales, window_days) {
        Some(window) => {
            log::debug!(
                "DOS window {} .. {} ({} days)",
                window.first_day(),
                window.latest,
                window.days
            );
            average_daily_sales(window.select(sales), window_days)
        }
        None => HashMap::new(),
    };

    let mut entries: Vec<ProductDosEntry> = aggregate_stock(stock)
        .into_iter()
        .map(|(stock_code, stock_name, quantity)| {
            let ads = ads_by_code.get(&stock_code).copied().unwrap_or(0.0);
            ProductDosEntry {
                status: classify(quantity, ads),
                dos_days: DaysOfStock::from_quantity(quantity, ads).as_days(),
                stock_code,
                stock_name,
                quantity,
                ads,
            }
        })
        .collect();

    entries.sort_by(compare_urgency);
    entries
}

pub fn summarize(entries: &[ProductDosEntry]) -> DosSummary {
    let mut summary = DosSummary::default();
    for entry in entries {
        match entry.status {
            DosStatus::LowStock => summary.low_stock += 1,
            DosStatus::Healthy => summary.healthy += 1,
            DosStatus::Overstock => summary.overstock += 1,
            DosStatus::DeadStock => summary.dead_stock += 1,
            DosStatus::OutOfStock => summary.out_of_stock += 1,
        }
    }
    summary
}

/// Keeps entries whose status is selected; an empty selection keeps all.
pub fn filter_by_status(entries: Vec<ProductDosEntry>, statuses: &[DosStatus]) -> Vec<ProductDosEntry> {
    if statuses.is_empty() {
        return entries;
    }
    entries.into_iter().filter(|e| statuses.contains(&e.status)).collect()
}
