// src/models/sales.rs
use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

use crate::category::Category;
use crate::time::{DateRange, Granularity};

// ==================== SALES ====================

/// One sales transaction line after column normalization.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub stock_code: String,
    pub stock_name: String,
    pub quantity: f64,
    /// Revenue of the line (RM)
    pub sales: f64,
    pub warehouse: String,
    /// Sales channel
    pub ar_type: String,
    /// Customer account
    pub ar_name: String,
    pub category: Category,
}

impl SalesRecord {
    pub fn new(date: NaiveDate, stock_code: impl Into<String>, stock_name: impl Into<String>, quantity: f64) -> Self {
        let stock_name = stock_name.into();
        let category = Category::from_stock_name(&stock_name);
        Self {
            date,
            stock_code: stock_code.into(),
            stock_name,
            quantity,
            sales: 0.0,
            warehouse: crate::models::UNKNOWN.to_string(),
            ar_type: crate::models::UNKNOWN.to_string(),
            ar_name: crate::models::UNKNOWN.to_string(),
            category,
        }
    }

    pub fn with_sales(mut self, sales: f64) -> Self {
        self.sales = sales;
        self
    }

    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = warehouse.into();
        self
    }

    pub fn with_customer(mut self, ar_type: impl Into<String>, ar_name: impl Into<String>) -> Self {
        self.ar_type = ar_type.into();
        self.ar_name = ar_name.into();
        self
    }

    pub fn has_code(&self) -> bool {
        !self.stock_code.trim().is_empty()
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SalesKpi {
    pub total_revenue: f64,
    pub units_sold: f64,
    pub avg_ticket_size: f64,
    pub transactions: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TrendPoint {
    pub period_start: NaiveDate,
    pub period: String,
    pub sales: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WarehouseTrendPoint {
    pub period_start: NaiveDate,
    pub period: String,
    pub warehouse: String,
    pub sales: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChannelMonthSales {
    pub ar_type: String,
    pub month: String,
    pub sales: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CustomerSales {
    pub ar_type: String,
    pub ar_name: String,
    pub sales: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CategorySales {
    pub category: Category,
    pub sales: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TopModel {
    pub stock_name: String,
    pub category: Category,
    pub quantity: f64,
    pub sales: f64,
}

/// Month-over-month row with the full history trend for a sparkline.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProductSparkline {
    pub stock_name: String,
    pub current: f64,
    pub previous: f64,
    pub growth_pct: f64,
    pub trend: Vec<f64>,
}

// ==================== RESPONSES ====================

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SalesSummary {
    pub primary: DateRange,
    pub comparison: Option<DateRange>,
    /// `None` when no sales fall in the primary range
    pub current: Option<SalesKpi>,
    pub previous: Option<SalesKpi>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SalesTrend {
    pub granularity: Granularity,
    pub overall: Vec<TrendPoint>,
    pub by_warehouse: Vec<WarehouseTrendPoint>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChannelBreakdown {
    pub months: Vec<String>,
    pub channels: Vec<ChannelMonthSales>,
    pub top_customers: Vec<CustomerSales>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProductPerformance {
    pub month: String,
    pub previous_month: String,
    pub categories: Vec<CategorySales>,
    pub top_models: Vec<TopModel>,
    /// Month labels matching each sparkline's `trend`
    pub trend_months: Vec<String>,
    pub sparklines: Vec<ProductSparkline>,
}
