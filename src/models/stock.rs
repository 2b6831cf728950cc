// src/models/stock.rs
use serde::{Deserialize, Serialize};

// ==================== STOCK ====================

/// One stock balance row (a product in one warehouse).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StockRecord {
    pub stock_code: String,
    pub stock_name: String,
    pub quantity: i64,
    pub warehouse_name: String,
    pub warehouse_type: String,
}

impl StockRecord {
    pub fn new(stock_code: impl Into<String>, stock_name: impl Into<String>, quantity: i64) -> Self {
        Self {
            stock_code: stock_code.into(),
            stock_name: stock_name.into(),
            quantity,
            warehouse_name: crate::models::UNKNOWN.to_string(),
            warehouse_type: crate::models::UNKNOWN.to_string(),
        }
    }

    pub fn with_warehouse(mut self, warehouse_name: impl Into<String>, warehouse_type: impl Into<String>) -> Self {
        self.warehouse_name = warehouse_name.into();
        self.warehouse_type = warehouse_type.into();
        self
    }

    /// Footer and note rows come without a code.
    pub fn has_code(&self) -> bool {
        !self.stock_code.trim().is_empty()
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WarehouseTypeShare {
    pub warehouse_type: String,
    pub quantity: i64,
    pub share_pct: f64,
    /// Share formatted as "12.3%"
    pub share_label: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SkuQuantity {
    pub stock_name: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LocationQuantity {
    pub warehouse_name: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WarehouseTypeBreakdown {
    pub warehouse_type: String,
    pub total: i64,
    pub locations: Vec<LocationQuantity>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StockOverview {
    pub total_quantity: i64,
    pub distribution: Vec<WarehouseTypeShare>,
    pub top_skus: Vec<SkuQuantity>,
    pub breakdowns: Vec<WarehouseTypeBreakdown>,
}
