// src/import.rs
//! Чтение stock/sales таблиц из Excel (calamine) или CSV и нормализация колонок

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::DataError;
use crate::models::{SalesRecord, StockRecord, UNKNOWN};

// ==================== COLUMN NAMES ====================

pub const COL_STOCK_CODE: &str = "Stock Code";
pub const COL_STOCK_NAME: &str = "Stock Name";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_WAREHOUSE_NAME: &str = "Warehouse Name";
pub const COL_WAREHOUSE_TYPE: &str = "Warehouse Type";
pub const COL_DATE: &str = "Date";
pub const COL_SALES: &str = "Sales";
pub const COL_WAREHOUSE: &str = "Warehouse";
pub const COL_AR_TYPE: &str = "AR Type";
pub const COL_AR_NAME: &str = "AR Name";

const STOCK: &str = "stock";
const SALES: &str = "sales";

// ==================== RAW TABLE ====================

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Cell {
    fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Sheet contents with trimmed headers, independent of the file format.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let headers = headers.into_iter().map(|h| h.trim().to_string()).collect();
        Self { headers, rows }
    }

    pub fn from_range(range: &calamine::Range<Data>) -> Self {
        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .unwrap_or_default();

        let rows = rows
            .map(|row| row.iter().map(cell_from_excel).collect())
            .collect();

        Table::new(headers, rows)
    }

    pub fn from_csv<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|v| if v.is_empty() { Cell::Empty } else { Cell::Text(v.to_string()) })
                    .collect(),
            );
        }

        Ok(Table::new(headers, rows))
    }

    fn columns(&self, dataset: &'static str) -> ColumnIndex<'_> {
        let index = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect();
        ColumnIndex { dataset, index }
    }

    /// Rows that carry at least one value, with 1-based sheet row numbers (header is row 1).
    fn data_rows(&self) -> impl Iterator<Item = (usize, &Vec<Cell>)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.iter().all(Cell::is_empty))
            .map(|(i, row)| (i + 2, row))
    }
}

fn cell_from_excel(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Empty),
    }
}

/// Excel serial day number (1900 date system) to a calendar date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

pub fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(value, "%d/%m/%Y").ok()
}

// ==================== COLUMN ACCESS ====================

struct ColumnIndex<'a> {
    dataset: &'static str,
    index: HashMap<&'a str, usize>,
}

impl ColumnIndex<'_> {
    fn required(&self, column: &'static str) -> Result<usize, DataError> {
        self.index
            .get(column)
            .copied()
            .ok_or(DataError::MissingColumn { dataset: self.dataset, column })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

struct RowReader<'a> {
    dataset: &'static str,
    row_number: usize,
    row: &'a [Cell],
}

impl RowReader<'_> {
    fn cell(&self, idx: usize) -> &Cell {
        self.row.get(idx).unwrap_or(&EMPTY_CELL)
    }

    /// Product code as written; blank stays blank.
    fn code(&self, idx: usize) -> String {
        self.cell(idx).display()
    }

    /// Blank text falls back to "Unknown".
    fn text(&self, idx: Option<usize>) -> String {
        let value = idx.map(|i| self.cell(i).display()).unwrap_or_default();
        if value.is_empty() { UNKNOWN.to_string() } else { value }
    }

    fn number(&self, idx: usize, column: &'static str) -> Result<f64, DataError> {
        match self.cell(idx) {
            Cell::Empty => Ok(0.0),
            Cell::Number(n) => Ok(*n),
            Cell::Text(s) if s.trim().is_empty() => Ok(0.0),
            Cell::Text(s) => s.trim().replace(',', "").parse::<f64>().map_err(|_| self.invalid(column, s)),
            other => Err(self.invalid(column, &other.display())),
        }
    }

    /// Stock balances are counted in whole units.
    fn whole_number(&self, idx: usize, column: &'static str) -> Result<i64, DataError> {
        let value = self.number(idx, column)?;
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(self.invalid(column, &format_number(value)));
        }
        Ok(value as i64)
    }

    fn date(&self, idx: usize, column: &'static str) -> Result<NaiveDate, DataError> {
        match self.cell(idx) {
            Cell::Date(d) => Ok(*d),
            Cell::Number(n) => excel_serial_to_date(*n).ok_or_else(|| self.invalid(column, &format_number(*n))),
            Cell::Text(s) => parse_date_text(s).ok_or_else(|| self.invalid(column, s)),
            Cell::Empty => Err(self.invalid(column, "")),
        }
    }

    fn invalid(&self, column: &'static str, value: &str) -> DataError {
        DataError::InvalidValue {
            dataset: self.dataset,
            row: self.row_number,
            column,
            value: value.to_string(),
        }
    }
}

// ==================== DATASET PARSING ====================

pub fn parse_stock(table: &Table) -> Result<Vec<StockRecord>, DataError> {
    let columns = table.columns(STOCK);
    let code_idx = columns.required(COL_STOCK_CODE)?;
    let name_idx = columns.required(COL_STOCK_NAME)?;
    let qty_idx = columns.required(COL_QUANTITY)?;
    let wh_name_idx = columns.optional(COL_WAREHOUSE_NAME);
    let wh_type_idx = columns.optional(COL_WAREHOUSE_TYPE);

    let mut records = Vec::new();
    for (row_number, row) in table.data_rows() {
        let reader = RowReader { dataset: STOCK, row_number, row: row.as_slice() };
        let quantity = reader.whole_number(qty_idx, COL_QUANTITY)?;
        records.push(
            StockRecord::new(reader.code(code_idx), reader.text(Some(name_idx)), quantity)
                .with_warehouse(reader.text(wh_name_idx), reader.text(wh_type_idx)),
        );
    }

    if records.is_empty() {
        return Err(DataError::Empty(STOCK));
    }
    Ok(records)
}

pub fn parse_sales(table: &Table) -> Result<Vec<SalesRecord>, DataError> {
    let columns = table.columns(SALES);
    let date_idx = columns.required(COL_DATE)?;
    let code_idx = columns.required(COL_STOCK_CODE)?;
    let name_idx = columns.required(COL_STOCK_NAME)?;
    let qty_idx = columns.required(COL_QUANTITY)?;
    let sales_idx = columns.required(COL_SALES)?;
    let warehouse_idx = columns.optional(COL_WAREHOUSE);
    let ar_type_idx = columns.optional(COL_AR_TYPE);
    let ar_name_idx = columns.optional(COL_AR_NAME);

    let mut records = Vec::new();
    for (row_number, row) in table.data_rows() {
        let reader = RowReader { dataset: SALES, row_number, row: row.as_slice() };
        let date = reader.date(date_idx, COL_DATE)?;
        let quantity = reader.number(qty_idx, COL_QUANTITY)?;
        records.push(
            SalesRecord::new(date, reader.code(code_idx), reader.text(Some(name_idx)), quantity)
                .with_sales(reader.number(sales_idx, COL_SALES)?)
                .with_warehouse(reader.text(warehouse_idx))
                .with_customer(reader.text(ar_type_idx), reader.text(ar_name_idx)),
        );
    }

    if records.is_empty() {
        return Err(DataError::Empty(SALES));
    }
    Ok(records)
}

// ==================== FILE SOURCES ====================

/// First sheet whose name contains `keyword`, case-insensitive.
pub fn find_sheet<'a>(sheet_names: &'a [String], keyword: &str) -> Option<&'a str> {
    let keyword = keyword.to_lowercase();
    sheet_names
        .iter()
        .find(|name| name.to_lowercase().contains(&keyword))
        .map(|s| s.as_str())
}

/// Reads the stock and sales sheets from one workbook (xlsx, xls, ods).
pub fn read_workbook(
    path: &Path,
    stock_keyword: &str,
    sales_keyword: &str,
) -> Result<(Table, Table), DataError> {
    if !path.exists() {
        return Err(DataError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Data file not found: {}", path.display()),
        )));
    }

    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names();

    let stock_sheet = find_sheet(&sheet_names, stock_keyword)
        .ok_or_else(|| DataError::MissingSheet { wanted: STOCK, found: sheet_names.clone() })?
        .to_string();
    let sales_sheet = find_sheet(&sheet_names, sales_keyword)
        .ok_or_else(|| DataError::MissingSheet { wanted: SALES, found: sheet_names.clone() })?
        .to_string();

    log::debug!("Using sheets '{}' (stock) and '{}' (sales)", stock_sheet, sales_sheet);

    let stock = Table::from_range(&workbook.worksheet_range(&stock_sheet)?);
    let sales = Table::from_range(&workbook.worksheet_range(&sales_sheet)?);
    Ok((stock, sales))
}

pub fn read_csv_file(path: &Path) -> Result<Table, DataError> {
    let file = std::fs::File::open(path)?;
    Table::from_csv(std::io::BufReader::new(file))
}
