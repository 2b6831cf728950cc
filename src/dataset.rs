// src/dataset.rs
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::config::DataConfig;
use crate::error::DataError;
use crate::import::{parse_sales, parse_stock, read_csv_file, read_workbook};
use crate::models::{SalesRecord, StockRecord};
use crate::time::DateRange;

// ==================== DATASET ====================

/// Normalized stock and sales tables loaded from one source.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub stock: Vec<StockRecord>,
    pub sales: Vec<SalesRecord>,
    pub loaded_at: DateTime<Utc>,
    pub source: String,
}

impl Dataset {
    pub fn new(stock: Vec<StockRecord>, sales: Vec<SalesRecord>) -> Self {
        Self {
            stock,
            sales,
            loaded_at: Utc::now(),
            source: "memory".to_string(),
        }
    }

    pub fn latest_sales_date(&self) -> Option<NaiveDate> {
        self.sales.iter().map(|s| s.date).max()
    }

    pub fn earliest_sales_date(&self) -> Option<NaiveDate> {
        self.sales.iter().map(|s| s.date).min()
    }

    /// Min/max sales dates present in the data.
    pub fn sales_bounds(&self) -> Option<DateRange> {
        Some(DateRange::new(self.earliest_sales_date()?, self.latest_sales_date()?))
    }

    pub fn warehouse_types(&self) -> Vec<String> {
        self.stock
            .iter()
            .map(|s| s.warehouse_type.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn sales_warehouses(&self) -> Vec<String> {
        self.sales
            .iter()
            .map(|s| s.warehouse.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            source: self.source.clone(),
            loaded_at: self.loaded_at,
            stock_rows: self.stock.len(),
            sales_rows: self.sales.len(),
            sales_bounds: self.sales_bounds(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DatasetInfo {
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub stock_rows: usize,
    pub sales_rows: usize,
    pub sales_bounds: Option<DateRange>,
}

// ==================== DATA SOURCE ====================

#[derive(Debug, Clone)]
pub enum DataSource {
    Workbook {
        path: PathBuf,
        stock_keyword: String,
        sales_keyword: String,
    },
    Csv {
        stock: PathBuf,
        sales: PathBuf,
    },
}

impl DataSource {
    pub fn from_config(config: &DataConfig) -> Result<Self, DataError> {
        match (&config.stock_csv, &config.sales_csv, &config.workbook_path) {
            (Some(stock), Some(sales), _) => Ok(DataSource::Csv {
                stock: stock.clone(),
                sales: sales.clone(),
            }),
            (_, _, Some(path)) => Ok(DataSource::Workbook {
                path: path.clone(),
                stock_keyword: config.stock_sheet_keyword.clone(),
                sales_keyword: config.sales_sheet_keyword.clone(),
            }),
            _ => Err(DataError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "No workbook or CSV pair configured",
            ))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DataSource::Workbook { path, .. } => path.display().to_string(),
            DataSource::Csv { stock, sales } => format!("{} + {}", stock.display(), sales.display()),
        }
    }

    pub fn load(&self) -> Result<Dataset, DataError> {
        let (stock_table, sales_table) = match self {
            DataSource::Workbook { path, stock_keyword, sales_keyword } => {
                read_workbook(path, stock_keyword, sales_keyword)?
            }
            DataSource::Csv { stock, sales } => (read_csv_file(stock)?, read_csv_file(sales)?),
        };

        let stock = parse_stock(&stock_table)?;
        let sales = parse_sales(&sales_table)?;

        log::info!(
            "Loaded {} stock rows and {} sales rows from {}",
            stock.len(),
            sales.len(),
            self.describe()
        );

        Ok(Dataset {
            stock,
            sales,
            loaded_at: Utc::now(),
            source: self.describe(),
        })
    }
}

// ==================== SHARED SNAPSHOT ====================

/// Current dataset snapshot shared between requests and the reloader.
#[derive(Clone)]
pub struct DatasetStore {
    source: DataSource,
    current: Arc<RwLock<Arc<Dataset>>>,
}

impl DatasetStore {
    pub fn new(source: DataSource, dataset: Dataset) -> Self {
        Self {
            source,
            current: Arc::new(RwLock::new(Arc::new(dataset))),
        }
    }

    pub fn snapshot(&self) -> Arc<Dataset> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, dataset: Dataset) {
        let dataset = Arc::new(dataset);
        match self.current.write() {
            Ok(mut guard) => *guard = dataset,
            Err(poisoned) => *poisoned.into_inner() = dataset,
        }
    }

    /// Reloads from the source; the old snapshot stays on failure.
    pub fn reload(&self) -> Result<Arc<Dataset>, DataError> {
        let dataset = self.source.load()?;
        self.replace(dataset);
        Ok(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn write_csv_pair(dir: &std::path::Path) -> (PathBuf, PathBuf) {
        let stock = dir.join("stock.csv");
        let sales = dir.join("sales.csv");
        fs::write(
            &stock,
            "Stock Code,Stock Name,Quantity,Warehouse Name,Warehouse Type\n\
             A,Widget,100,KL,Main\n\
             B,Gadget,50,PG,Outlet\n",
        ).unwrap();
        fs::write(
            &sales,
            "Date,Stock Code,Stock Name,Quantity,Sales,Warehouse\n\
             2024-03-01,A,Widget,3,30,KL\n\
             2024-03-20,A,Widget,2,20,PG\n",
        ).unwrap();
        (stock, sales)
    }

    #[test]
    fn test_load_csv_source() {
        let dir = tempfile::tempdir().unwrap();
        let (stock, sales) = write_csv_pair(dir.path());
        let dataset = DataSource::Csv { stock, sales }.load().unwrap();

        assert_eq!(dataset.stock.len(), 2);
        assert_eq!(dataset.sales.len(), 2);
        assert_eq!(dataset.sales_bounds(), Some(DateRange::new(d(2024, 3, 1), d(2024, 3, 20))));
        assert_eq!(dataset.warehouse_types(), vec!["Main".to_string(), "Outlet".to_string()]);
        assert_eq!(dataset.sales_warehouses(), vec!["KL".to_string(), "PG".to_string()]);
    }

    #[test]
    fn test_failed_reload_keeps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let (stock, sales) = write_csv_pair(dir.path());
        let source = DataSource::Csv { stock: stock.clone(), sales };
        let store = DatasetStore::new(source.clone(), source.load().unwrap());

        fs::write(&stock, "Stock Code,Quantity\nA,1\n").unwrap();
        assert!(matches!(store.reload(), Err(DataError::MissingColumn { .. })));
        assert_eq!(store.snapshot().stock.len(), 2);
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let (stock, sales) = write_csv_pair(dir.path());
        let source = DataSource::Csv { stock: stock.clone(), sales };
        let store = DatasetStore::new(source.clone(), source.load().unwrap());
        let before = store.snapshot();

        fs::write(&stock, "Stock Code,Stock Name,Quantity\nC,Knee wrap,7\n").unwrap();
        let after = store.reload().unwrap();
        assert_eq!(after.stock.len(), 1);
        // Старый снимок остаётся валидным для уже начатых запросов
        assert_eq!(before.stock.len(), 2);
    }

    #[test]
    fn test_source_from_config() {
        let mut config = DataConfig::default();
        assert!(matches!(DataSource::from_config(&config), Ok(DataSource::Workbook { .. })));

        config.workbook_path = None;
        assert!(DataSource::from_config(&config).is_err());

        config.stock_csv = Some(PathBuf::from("s.csv"));
        config.sales_csv = Some(PathBuf::from("t.csv"));
        assert!(matches!(DataSource::from_config(&config), Ok(DataSource::Csv { .. })));
    }
}
