// src/models/dos.rs
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Value reported for `dos_days` when ADS is zero.
pub const DOS_SENTINEL_DAYS: f64 = 9999.0;

// ==================== HEALTH STATUS ====================

/// Inventory health of one product.
///
/// Parsing accepts both the display label and the snake_case code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    EnumString, Display, AsRefStr, EnumIter,
)]
pub enum DosStatus {
    #[strum(to_string = "Low Stock (<14 Days)", serialize = "low_stock")]
    #[serde(rename = "Low Stock (<14 Days)")]
    LowStock,
    #[strum(to_string = "Healthy (14-60 Days)", serialize = "healthy")]
    #[serde(rename = "Healthy (14-60 Days)")]
    Healthy,
    #[strum(to_string = "Overstock (>60 Days)", serialize = "overstock")]
    #[serde(rename = "Overstock (>60 Days)")]
    Overstock,
    #[strum(to_string = "Dead Stock (No Sales)", serialize = "dead_stock")]
    #[serde(rename = "Dead Stock (No Sales)")]
    DeadStock,
    #[strum(to_string = "Out of Stock", serialize = "out_of_stock")]
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl DosStatus {
    pub fn all() -> Vec<DosStatus> {
        DosStatus::iter().collect()
    }
}

// ==================== DAYS OF STOCK ====================

/// Reported runway; `Undefined` unless ADS is positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DaysOfStock {
    Finite(f64),
    Undefined,
}

impl DaysOfStock {
    pub fn from_quantity(quantity: i64, ads: f64) -> Self {
        if ads > 0.0 {
            DaysOfStock::Finite(quantity as f64 / ads)
        } else {
            DaysOfStock::Undefined
        }
    }

    /// Numeric value used for display and sorting.
    pub fn as_days(&self) -> f64 {
        match self {
            DaysOfStock::Finite(days) => *days,
            DaysOfStock::Undefined => DOS_SENTINEL_DAYS,
        }
    }
}

// ==================== DOS ENTRY ====================

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProductDosEntry {
    pub status: DosStatus,
    pub stock_code: String,
    pub stock_name: String,
    pub quantity: i64,
    pub ads: f64,
    pub dos_days: f64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct DosSummary {
    pub low_stock: usize,
    pub healthy: usize,
    pub overstock: usize,
    pub dead_stock: usize,
    pub out_of_stock: usize,
}

impl DosSummary {
    pub fn get(&self, status: DosStatus) -> usize {
        match status {
            DosStatus::LowStock => self.low_stock,
            DosStatus::Healthy => self.healthy,
            DosStatus::Overstock => self.overstock,
            DosStatus::DeadStock => self.dead_stock,
            DosStatus::OutOfStock => self.out_of_stock,
        }
    }

    pub fn total(&self) -> usize {
        DosStatus::iter().map(|s| self.get(s)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_labels() {
        assert_eq!(DosStatus::LowStock.to_string(), "Low Stock (<14 Days)");
        assert_eq!(DosStatus::DeadStock.to_string(), "Dead Stock (No Sales)");
        assert_eq!(DosStatus::OutOfStock.as_ref(), "Out of Stock");
    }

    #[test]
    fn test_status_parsing_accepts_code_and_label() {
        assert_eq!(DosStatus::from_str("overstock"), Ok(DosStatus::Overstock));
        assert_eq!(DosStatus::from_str("Healthy (14-60 Days)"), Ok(DosStatus::Healthy));
        assert!(DosStatus::from_str("restock").is_err());
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&DosStatus::DeadStock).unwrap();
        assert_eq!(json, "\"Dead Stock (No Sales)\"");
    }

    #[test]
    fn test_days_of_stock() {
        assert_eq!(DaysOfStock::from_quantity(140, 10.0), DaysOfStock::Finite(14.0));
        assert_eq!(DaysOfStock::from_quantity(50, 0.0), DaysOfStock::Undefined);
        assert_eq!(DaysOfStock::Undefined.as_days(), 9999.0);
    }

    #[test]
    fn test_all_statuses() {
        assert_eq!(DosStatus::all().len(), 5);
    }
}
