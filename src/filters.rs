// src/filters.rs
//! Request filters shared by every dashboard endpoint.

use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dataset::Dataset;
use crate::error::{ApiError, ApiResult};
use crate::models::{DosStatus, SalesRecord, StockRecord};
use crate::time::{DateRange, Granularity};

// ==================== QUERY ====================

#[derive(Debug, Default, Deserialize, Validate)]
pub struct DashboardQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Comparison period on/off, on by default
    pub compare: Option<bool>,
    pub compare_start: Option<NaiveDate>,
    pub compare_end: Option<NaiveDate>,
    /// Comma-separated lists
    pub warehouse_types: Option<String>,
    pub warehouses: Option<String>,
    pub statuses: Option<String>,
    pub granularity: Option<String>,
    #[validate(range(min = 1, max = 1000, message = "Limit must be between 1 and 1000"))]
    pub limit: Option<usize>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_statuses(raw: &str) -> ApiResult<Vec<DosStatus>> {
    let mut statuses = Vec::new();
    for value in split_list(raw) {
        let status = DosStatus::from_str(&value).map_err(|_| ApiError::unknown_status(&value))?;
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }
    Ok(statuses)
}

// ==================== FILTER ====================

/// Immutable view configuration built once per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardFilter {
    pub primary: DateRange,
    pub comparison: Option<DateRange>,
    /// Empty = all
    pub warehouse_types: Vec<String>,
    /// Empty = all
    pub warehouses: Vec<String>,
    /// Empty = all
    pub statuses: Vec<DosStatus>,
    pub granularity: Granularity,
    pub limit: Option<usize>,
}

impl DashboardFilter {
    /// Defaults for `dataset`: month-to-date of the latest sale, previous period, everything selected.
    pub fn defaults(dataset: &Dataset) -> Self {
        let primary = default_primary(dataset);
        Self {
            primary,
            comparison: Some(primary.previous_period()),
            warehouse_types: Vec::new(),
            warehouses: Vec::new(),
            statuses: Vec::new(),
            granularity: Granularity::default(),
            limit: None,
        }
    }

    pub fn from_query(query: &DashboardQuery, dataset: &Dataset) -> ApiResult<Self> {
        query.validate()?;

        let mut filter = Self::defaults(dataset);

        if query.start.is_some() || query.end.is_some() {
            let requested = DateRange::new(
                query.start.unwrap_or(filter.primary.start),
                query.end.unwrap_or(filter.primary.end),
            );
            if !requested.is_valid() {
                return Err(ApiError::invalid_date_range(
                    &requested.start.to_string(),
                    &requested.end.to_string(),
                ));
            }
            filter.primary = match dataset.sales_bounds() {
                Some(bounds) => requested.clamp_to(&bounds),
                None => requested,
            };
        }

        filter.comparison = if query.compare.unwrap_or(true) {
            match (query.compare_start, query.compare_end) {
                (Some(start), Some(end)) => {
                    let range = DateRange::new(start, end);
                    if !range.is_valid() {
                        return Err(ApiError::invalid_date_range(&start.to_string(), &end.to_string()));
                    }
                    Some(range)
                }
                (None, None) => Some(filter.primary.previous_period()),
                _ => {
                    return Err(ApiError::bad_request(
                        "compare_start and compare_end must be given together",
                    ))
                }
            }
        } else {
            None
        };

        if let Some(raw) = &query.warehouse_types {
            let known = dataset.warehouse_types();
            let selected: Vec<String> = split_list(raw)
                .into_iter()
                .filter(|t| known.contains(t))
                .collect();
            if selected.is_empty() {
                return Err(ApiError::no_warehouse_type_selected());
            }
            filter.warehouse_types = selected;
        }

        if let Some(raw) = &query.warehouses {
            filter.warehouses = split_list(raw);
        }

        if let Some(raw) = &query.statuses {
            filter.statuses = parse_statuses(raw)?;
        }

        if let Some(raw) = &query.granularity {
            filter.granularity = Granularity::from_str(raw)
                .map_err(|_| ApiError::BadRequest(format!("Unknown granularity '{}'", raw)))?;
        }

        filter.limit = query.limit;
        Ok(filter)
    }

    pub fn limit_or(&self, default: usize) -> usize {
        self.limit.unwrap_or(default)
    }

    pub fn includes_warehouse_type(&self, warehouse_type: &str) -> bool {
        self.warehouse_types.is_empty() || self.warehouse_types.iter().any(|t| t == warehouse_type)
    }

    pub fn includes_warehouse(&self, warehouse: &str) -> bool {
        self.warehouses.is_empty() || self.warehouses.iter().any(|w| w == warehouse)
    }

    /// Stock rows of the selected warehouse types.
    pub fn stock_rows<'a>(&self, dataset: &'a Dataset) -> Vec<&'a StockRecord> {
        dataset
            .stock
            .iter()
            .filter(|s| self.includes_warehouse_type(&s.warehouse_type))
            .collect()
    }

    /// Sales rows of the selected warehouses, any date.
    pub fn sales_rows<'a>(&self, dataset: &'a Dataset) -> Vec<&'a SalesRecord> {
        dataset
            .sales
            .iter()
            .filter(|s| self.includes_warehouse(&s.warehouse))
            .collect()
    }
}

fn default_primary(dataset: &Dataset) -> DateRange {
    let latest = dataset
        .latest_sales_date()
        .unwrap_or_else(|| Utc::now().date_naive());
    DateRange::month_to_date(latest)
}

// ==================== FILTER OPTIONS ====================

/// Values the client can choose from.
#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub warehouse_types: Vec<String>,
    pub warehouses: Vec<String>,
    pub statuses: Vec<DosStatus>,
    pub granularities: Vec<Granularity>,
    pub sales_bounds: Option<DateRange>,
    pub default_primary: DateRange,
    pub default_comparison: DateRange,
}

impl FilterOptions {
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let primary = default_primary(dataset);
        Self {
            warehouse_types: dataset.warehouse_types(),
            warehouses: dataset.sales_warehouses(),
            statuses: DosStatus::all(),
            granularities: vec![Granularity::Monthly, Granularity::Weekly],
            sales_bounds: dataset.sales_bounds(),
            default_primary: primary,
            default_comparison: primary.previous_period(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dataset() -> Dataset {
        Dataset::new(
            vec![
                StockRecord::new("A", "Widget", 10).with_warehouse("KL", "Main"),
                StockRecord::new("B", "Gadget", 5).with_warehouse("PG", "Outlet"),
            ],
            vec![
                SalesRecord::new(d(2024, 1, 5), "A", "Widget", 1.0).with_warehouse("KL"),
                SalesRecord::new(d(2024, 3, 20), "A", "Widget", 2.0).with_warehouse("PG"),
            ],
        )
    }

    #[test]
    fn test_defaults() {
        let filter = DashboardFilter::from_query(&DashboardQuery::default(), &dataset()).unwrap();
        assert_eq!(filter.primary, DateRange::new(d(2024, 3, 1), d(2024, 3, 20)));
        assert_eq!(filter.comparison, Some(DateRange::new(d(2024, 2, 10), d(2024, 2, 29))));
        assert!(filter.warehouse_types.is_empty());
        assert!(filter.statuses.is_empty());
        assert_eq!(filter.granularity, Granularity::Monthly);
    }

    #[test]
    fn test_range_is_clamped_to_data() {
        let query = DashboardQuery {
            start: Some(d(2023, 6, 1)),
            end: Some(d(2024, 12, 31)),
            ..Default::default()
        };
        let filter = DashboardFilter::from_query(&query, &dataset()).unwrap();
        assert_eq!(filter.primary, DateRange::new(d(2024, 1, 5), d(2024, 3, 20)));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let query = DashboardQuery {
            start: Some(d(2024, 3, 10)),
            end: Some(d(2024, 3, 1)),
            ..Default::default()
        };
        assert!(matches!(
            DashboardFilter::from_query(&query, &dataset()),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_comparison_toggle_and_custom_range() {
        let off = DashboardQuery { compare: Some(false), ..Default::default() };
        assert_eq!(DashboardFilter::from_query(&off, &dataset()).unwrap().comparison, None);

        let custom = DashboardQuery {
            compare_start: Some(d(2024, 1, 1)),
            compare_end: Some(d(2024, 1, 31)),
            ..Default::default()
        };
        assert_eq!(
            DashboardFilter::from_query(&custom, &dataset()).unwrap().comparison,
            Some(DateRange::new(d(2024, 1, 1), d(2024, 1, 31)))
        );

        let half = DashboardQuery { compare_start: Some(d(2024, 1, 1)), ..Default::default() };
        assert!(DashboardFilter::from_query(&half, &dataset()).is_err());
    }

    #[test]
    fn test_warehouse_type_selection() {
        let query = DashboardQuery {
            warehouse_types: Some("Main, Nowhere".to_string()),
            ..Default::default()
        };
        let data = dataset();
        let filter = DashboardFilter::from_query(&query, &data).unwrap();
        assert_eq!(filter.warehouse_types, vec!["Main".to_string()]);
        assert_eq!(filter.stock_rows(&data).len(), 1);

        // Ни одного существующего типа склада
        let none = DashboardQuery { warehouse_types: Some("Nowhere".to_string()), ..Default::default() };
        assert!(matches!(DashboardFilter::from_query(&none, &data), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_statuses_and_granularity() {
        let query = DashboardQuery {
            statuses: Some("low_stock,Out of Stock,low_stock".to_string()),
            granularity: Some("weekly".to_string()),
            ..Default::default()
        };
        let filter = DashboardFilter::from_query(&query, &dataset()).unwrap();
        assert_eq!(filter.statuses, vec![DosStatus::LowStock, DosStatus::OutOfStock]);
        assert_eq!(filter.granularity, Granularity::Weekly);

        let bad = DashboardQuery { statuses: Some("sold_out".to_string()), ..Default::default() };
        assert!(DashboardFilter::from_query(&bad, &dataset()).is_err());
    }

    #[test]
    fn test_limit_validation() {
        let query = DashboardQuery { limit: Some(0), ..Default::default() };
        assert!(matches!(
            DashboardFilter::from_query(&query, &dataset()),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn test_sales_rows_by_warehouse() {
        let data = dataset();
        let query = DashboardQuery { warehouses: Some("PG".to_string()), ..Default::default() };
        let filter = DashboardFilter::from_query(&query, &data).unwrap();
        assert_eq!(filter.sales_rows(&data).len(), 1);
    }

    #[test]
    fn test_filter_options() {
        let options = FilterOptions::for_dataset(&dataset());
        assert_eq!(options.warehouse_types, vec!["Main".to_string(), "Outlet".to_string()]);
        assert_eq!(options.statuses.len(), 5);
        assert_eq!(options.default_primary.end, d(2024, 3, 20));
    }
}
