// src/sales_analytics.rs
//! Sales performance views. Every function works on rows already
//! narrowed to the selected warehouses.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::category::Category;
use crate::models::{
    CategorySales, ChannelBreakdown, ChannelMonthSales, CustomerSales, ProductPerformance, ProductSparkline,
    SalesKpi, SalesRecord, SalesSummary, SalesTrend, TopModel, TrendPoint, WarehouseTrendPoint,
};
use crate::time::{DateRange, Granularity, Month, Period};

pub const DEFAULT_TOP_CUSTOMERS: usize = 50;
pub const DEFAULT_TOP_MODELS: usize = 5;
pub const DEFAULT_SPARKLINES: usize = 20;

pub fn in_range<'a>(rows: &[&'a SalesRecord], range: &DateRange) -> Vec<&'a SalesRecord> {
    rows.iter().copied().filter(|r| range.contains(r.date)).collect()
}

pub fn in_month<'a>(rows: &[&'a SalesRecord], month: Month) -> Vec<&'a SalesRecord> {
    rows.iter().copied().filter(|r| Month::of(r.date) == month).collect()
}

/// Sorts descending by value, ties by key.
fn sorted_desc<K: Ord>(totals: HashMap<K, f64>) -> Vec<(K, f64)> {
    let mut sorted: Vec<(K, f64)> = totals.into_iter().collect();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

// ==================== KPI ====================

pub fn kpis(rows: &[&SalesRecord]) -> SalesKpi {
    let total_revenue: f64 = rows.iter().map(|r| r.sales).sum();
    let units_sold: f64 = rows.iter().map(|r| r.quantity).sum();
    let avg_ticket_size = if rows.is_empty() {
        0.0
    } else {
        total_revenue / rows.len() as f64
    };

    SalesKpi {
        total_revenue,
        units_sold,
        avg_ticket_size,
        transactions: rows.len(),
    }
}

pub fn summary(rows: &[&SalesRecord], primary: DateRange, comparison: Option<DateRange>) -> SalesSummary {
    let current = in_range(rows, &primary);
    let previous = comparison.map(|range| kpis(&in_range(rows, &range)));

    SalesSummary {
        primary,
        comparison,
        current: if current.is_empty() { None } else { Some(kpis(&current)) },
        previous,
    }
}

// ==================== TREND ====================

/// Revenue per period, ordered by period start.
pub fn trend(rows: &[&SalesRecord], granularity: Granularity) -> Vec<TrendPoint> {
    let mut totals: BTreeMap<Period, f64> = BTreeMap::new();
    for row in rows {
        *totals.entry(Period::of(row.date, granularity)).or_insert(0.0) += row.sales;
    }

    totals
        .into_iter()
        .map(|(period, sales)| TrendPoint {
            period_start: period.start,
            period: period.label,
            sales,
        })
        .collect()
}

/// Revenue per (period, warehouse).
pub fn warehouse_trend(rows: &[&SalesRecord], granularity: Granularity) -> Vec<WarehouseTrendPoint> {
    let mut totals: BTreeMap<(Period, &str), f64> = BTreeMap::new();
    for row in rows {
        let key = (Period::of(row.date, granularity), row.warehouse.as_str());
        *totals.entry(key).or_insert(0.0) += row.sales;
    }

    totals
        .into_iter()
        .map(|((period, warehouse), sales)| WarehouseTrendPoint {
            period_start: period.start,
            period: period.label,
            warehouse: warehouse.to_string(),
            sales,
        })
        .collect()
}

pub fn sales_trend(rows: &[&SalesRecord], primary: DateRange, granularity: Granularity) -> SalesTrend {
    let current = in_range(rows, &primary);
    SalesTrend {
        granularity,
        overall: trend(&current, granularity),
        by_warehouse: warehouse_trend(&current, granularity),
    }
}

// ==================== CHANNELS & CUSTOMERS ====================

/// Channel revenue per month and the top customers across the primary
/// and comparison periods. A row in both periods is counted once.
pub fn channel_breakdown(
    rows: &[&SalesRecord],
    primary: DateRange,
    comparison: Option<DateRange>,
    customer_limit: usize,
) -> ChannelBreakdown {
    let selected: Vec<&SalesRecord> = rows
        .iter()
        .copied()
        .filter(|r| primary.contains(r.date) || comparison.map_or(false, |c| c.contains(r.date)))
        .collect();

    let mut by_channel: BTreeMap<(String, &str), f64> = BTreeMap::new();
    let mut months: BTreeSet<String> = BTreeSet::new();
    let mut by_customer: HashMap<(&str, &str), f64> = HashMap::new();

    for row in &selected {
        let month = Month::of(row.date).label();
        months.insert(month.clone());
        *by_channel.entry((month, row.ar_type.as_str())).or_insert(0.0) += row.sales;
        *by_customer.entry((row.ar_type.as_str(), row.ar_name.as_str())).or_insert(0.0) += row.sales;
    }

    let channels = by_channel
        .into_iter()
        .map(|((month, ar_type), sales)| ChannelMonthSales {
            ar_type: ar_type.to_string(),
            month,
            sales,
        })
        .collect();

    let top_customers = sorted_desc(by_customer)
        .into_iter()
        .take(customer_limit)
        .map(|((ar_type, ar_name), sales)| CustomerSales {
            ar_type: ar_type.to_string(),
            ar_name: ar_name.to_string(),
            sales,
        })
        .collect();

    ChannelBreakdown {
        months: months.into_iter().collect(),
        channels,
        top_customers,
    }
}

// ==================== PRODUCTS ====================

pub fn category_sales(month_rows: &[&SalesRecord]) -> Vec<CategorySales> {
    let mut totals: HashMap<Category, f64> = HashMap::new();
    for row in month_rows {
        *totals.entry(row.category).or_insert(0.0) += row.sales;
    }

    sorted_desc(totals)
        .into_iter()
        .map(|(category, sales)| CategorySales { category, sales })
        .collect()
}

/// Best sellers by units.
pub fn top_models(month_rows: &[&SalesRecord], limit: usize) -> Vec<TopModel> {
    let mut totals: HashMap<(&str, Category), (f64, f64)> = HashMap::new();
    for row in month_rows {
        let entry = totals.entry((row.stock_name.as_str(), row.category)).or_insert((0.0, 0.0));
        entry.0 += row.quantity;
        entry.1 += row.sales;
    }

    let mut models: Vec<TopModel> = totals
        .into_iter()
        .map(|((stock_name, category), (quantity, sales))| TopModel {
            stock_name: stock_name.to_string(),
            category,
            quantity,
            sales,
        })
        .collect();
    models.sort_by(|a, b| b.quantity.total_cmp(&a.quantity).then_with(|| a.stock_name.cmp(&b.stock_name)));
    models.truncate(limit);
    models
}

/// Percent change from `previous`; 0 when there is nothing to compare with.
pub fn growth_pct(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

fn units_by_name<'a>(rows: &[&'a SalesRecord]) -> HashMap<&'a str, f64> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for row in rows {
        *totals.entry(row.stock_name.as_str()).or_insert(0.0) += row.quantity;
    }
    totals
}

/// Month-over-month units for the best sellers of `month`, each with
/// its unit history from the first month in `rows` up to `month`.
pub fn sparklines(rows: &[&SalesRecord], month: Month, limit: usize) -> (Vec<Month>, Vec<ProductSparkline>) {
    let first = rows
        .iter()
        .map(|r| Month::of(r.date))
        .filter(|m| *m <= month)
        .min()
        .unwrap_or(month);
    let axis = Month::range_inclusive(first, month);

    let mut history: HashMap<&str, Vec<f64>> = HashMap::new();
    for row in rows {
        let row_month = Month::of(row.date);
        if let Some(idx) = axis.iter().position(|m| *m == row_month) {
            history.entry(row.stock_name.as_str()).or_insert_with(|| vec![0.0; axis.len()])[idx] += row.quantity;
        }
    }

    let current = units_by_name(&in_month(rows, month));
    let previous = units_by_name(&in_month(rows, month.prev()));

    let mut lines: Vec<ProductSparkline> = current
        .into_iter()
        .map(|(name, units)| {
            let prev_units = previous.get(name).copied().unwrap_or(0.0);
            ProductSparkline {
                stock_name: name.to_string(),
                current: units,
                previous: prev_units,
                growth_pct: growth_pct(units, prev_units),
                trend: history.get(name).cloned().unwrap_or_else(|| vec![0.0; axis.len()]),
            }
        })
        .collect();

    lines.sort_by(|a, b| b.current.total_cmp(&a.current).then_with(|| a.stock_name.cmp(&b.stock_name)));
    lines.truncate(limit);
    (axis, lines)
}

/// Product views for the calendar month containing the primary end date.
pub fn product_performance(rows: &[&SalesRecord], primary: DateRange, model_limit: usize) -> ProductPerformance {
    let month = Month::of(primary.end);
    let month_rows = in_month(rows, month);
    let (axis, sparklines) = sparklines(rows, month, DEFAULT_SPARKLINES);

    ProductPerformance {
        month: month.label(),
        previous_month: month.prev().label(),
        categories: category_sales(&month_rows),
        top_models: top_models(&month_rows, model_limit),
        trend_months: axis.iter().map(Month::label).collect(),
        sparklines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sale(date: NaiveDate, name: &str, qty: f64, revenue: f64) -> SalesRecord {
        SalesRecord::new(date, name, name, qty).with_sales(revenue)
    }

    fn sample() -> Vec<SalesRecord> {
        vec![
            sale(d(2024, 1, 10), "Eye Pro", 4.0, 400.0).with_warehouse("KL").with_customer("Online", "Shopee"),
            sale(d(2024, 2, 12), "Eye Pro", 5.0, 500.0).with_warehouse("KL").with_customer("Online", "Shopee"),
            sale(d(2024, 3, 4), "Eye Pro", 10.0, 1000.0).with_warehouse("KL").with_customer("Online", "Lazada"),
            sale(d(2024, 3, 6), "Neck Relax", 3.0, 150.0).with_warehouse("PG").with_customer("Retail", "Store 1"),
            sale(d(2024, 3, 15), "Gift box", 1.0, 20.0).with_warehouse("PG").with_customer("Retail", "Store 2"),
        ]
    }

    #[test]
    fn test_kpis() {
        let rows = sample();
        let refs: Vec<&SalesRecord> = rows.iter().collect();
        let march = in_range(&refs, &DateRange::new(d(2024, 3, 1), d(2024, 3, 31)));
        let kpi = kpis(&march);

        assert_eq!(kpi.total_revenue, 1170.0);
        assert_eq!(kpi.units_sold, 14.0);
        assert_eq!(kpi.avg_ticket_size, 390.0);
        assert_eq!(kpis(&[]).avg_ticket_size, 0.0);
    }

    #[test]
    fn test_summary_empty_primary() {
        let rows = sample();
        let refs: Vec<&SalesRecord> = rows.iter().collect();
        let primary = DateRange::new(d(2024, 4, 1), d(2024, 4, 30));
        let result = summary(&refs, primary, Some(primary.previous_period()));

        assert!(result.current.is_none());
        assert_eq!(result.previous.map(|k| k.transactions), Some(3));
    }

    #[test]
    fn test_monthly_and_weekly_trend() {
        let rows = sample();
        let refs: Vec<&SalesRecord> = rows.iter().collect();

        let monthly = trend(&refs, Granularity::Monthly);
        let labels: Vec<&str> = monthly.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(monthly[2].sales, 1170.0);

        // 4 и 6 марта попадают в одну неделю
        let weekly = trend(&refs, Granularity::Weekly);
        assert_eq!(weekly.len(), 4);
        assert_eq!(weekly[2].period, "2024-03-04/2024-03-10");
        assert_eq!(weekly[2].sales, 1150.0);
    }

    #[test]
    fn test_warehouse_trend() {
        let rows = sample();
        let refs: Vec<&SalesRecord> = rows.iter().collect();
        let march = in_range(&refs, &DateRange::new(d(2024, 3, 1), d(2024, 3, 31)));
        let points = warehouse_trend(&march, Granularity::Monthly);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].warehouse, "KL");
        assert_eq!(points[1].sales, 170.0);
    }

    #[test]
    fn test_channel_breakdown_counts_overlap_once() {
        let rows = sample();
        let refs: Vec<&SalesRecord> = rows.iter().collect();
        let primary = DateRange::new(d(2024, 3, 1), d(2024, 3, 31));
        let overlapping = DateRange::new(d(2024, 2, 1), d(2024, 3, 5));
        let result = channel_breakdown(&refs, primary, Some(overlapping), DEFAULT_TOP_CUSTOMERS);

        assert_eq!(result.months, vec!["2024-02".to_string(), "2024-03".to_string()]);
        let online_march = result
            .channels
            .iter()
            .find(|c| c.ar_type == "Online" && c.month == "2024-03")
            .unwrap();
        assert_eq!(online_march.sales, 1000.0);

        assert_eq!(result.top_customers[0].ar_name, "Lazada");
        assert_eq!(result.top_customers.len(), 4);
    }

    #[test]
    fn test_category_and_top_models() {
        let rows = sample();
        let refs: Vec<&SalesRecord> = rows.iter().collect();
        let march = in_month(&refs, Month::of(d(2024, 3, 1)));

        let categories = category_sales(&march);
        assert_eq!(categories[0].category, Category::EyeMassager);
        assert_eq!(categories.last().map(|c| c.category), Some(Category::Others));

        let models = top_models(&march, 2);
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].stock_name, "Eye Pro");
        assert_eq!(models[1].category, Category::NeckCervical);
    }

    #[test]
    fn test_growth_pct() {
        assert_eq!(growth_pct(10.0, 5.0), 100.0);
        assert_eq!(growth_pct(5.0, 10.0), -50.0);
        assert_eq!(growth_pct(3.0, 0.0), 0.0);
    }

    #[test]
    fn test_sparklines_full_axis() {
        let rows = sample();
        let refs: Vec<&SalesRecord> = rows.iter().collect();
        let (axis, lines) = sparklines(&refs, Month::of(d(2024, 3, 1)), DEFAULT_SPARKLINES);

        assert_eq!(axis.len(), 3);
        let eye = &lines[0];
        assert_eq!(eye.stock_name, "Eye Pro");
        assert_eq!(eye.current, 10.0);
        assert_eq!(eye.previous, 5.0);
        assert_eq!(eye.growth_pct, 100.0);
        assert_eq!(eye.trend, vec![4.0, 5.0, 10.0]);

        let neck = lines.iter().find(|l| l.stock_name == "Neck Relax").unwrap();
        assert_eq!(neck.trend, vec![0.0, 0.0, 3.0]);
        assert_eq!(neck.growth_pct, 0.0);
    }

    #[test]
    fn test_product_performance_uses_end_month() {
        let rows = sample();
        let refs: Vec<&SalesRecord> = rows.iter().collect();
        let result = product_performance(&refs, DateRange::new(d(2024, 2, 1), d(2024, 2, 20)), DEFAULT_TOP_MODELS);

        assert_eq!(result.month, "2024-02");
        assert_eq!(result.previous_month, "2024-01");
        assert_eq!(result.top_models.len(), 1);
        assert_eq!(result.trend_months, vec!["2024-01".to_string(), "2024-02".to_string()]);
    }
}
