// src/error.rs
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

// ==================== API ERRORS ====================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    ValidationError(String),
    DataUnavailable(String),
    InternalServerError(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::DataUnavailable(msg) => write!(f, "Data Unavailable: {}", msg),
            ApiError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse {
            success: false,
            message: self.to_string(),
        };

        match self {
            ApiError::BadRequest(_) => HttpResponse::BadRequest().json(error_response),
            ApiError::NotFound(_) => HttpResponse::NotFound().json(error_response),
            ApiError::ValidationError(_) => HttpResponse::UnprocessableEntity().json(error_response),
            ApiError::DataUnavailable(_) => HttpResponse::ServiceUnavailable().json(error_response),
            ApiError::InternalServerError(_) => HttpResponse::InternalServerError().json(error_response),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::InternalServerError(err.to_string())
    }
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl ApiError {
    pub fn bad_request(msg: &str) -> Self {
        ApiError::BadRequest(msg.to_string())
    }

    pub fn invalid_date_range(start: &str, end: &str) -> Self {
        ApiError::BadRequest(format!("Invalid date range: start {} is after end {}", start, end))
    }

    pub fn unknown_status(value: &str) -> Self {
        ApiError::BadRequest(format!("Unknown health status '{}'", value))
    }

    pub fn no_warehouse_type_selected() -> Self {
        ApiError::BadRequest("Please select at least one Warehouse Type".to_string())
    }
}

// ==================== DATA LOADING ERRORS ====================

/// Failure while reading or normalizing the stock/sales source.
#[derive(Debug)]
pub enum DataError {
    Io(std::io::Error),
    Workbook(String),
    Csv(csv::Error),
    MissingSheet { wanted: &'static str, found: Vec<String> },
    MissingColumn { dataset: &'static str, column: &'static str },
    InvalidValue { dataset: &'static str, row: usize, column: &'static str, value: String },
    Empty(&'static str),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataError::Io(err) => write!(f, "I/O error: {}", err),
            DataError::Workbook(msg) => write!(f, "Failed to read workbook: {}", msg),
            DataError::Csv(err) => write!(f, "Failed to read CSV: {}", err),
            DataError::MissingSheet { wanted, found } => write!(
                f,
                "No '{}' sheet found. Detected sheet names: {}",
                wanted,
                found.join(", ")
            ),
            DataError::MissingColumn { dataset, column } => {
                write!(f, "Missing column '{}' in {} data", column, dataset)
            }
            DataError::InvalidValue { dataset, row, column, value } => write!(
                f,
                "Invalid value '{}' in {} data, row {}, column '{}'",
                value, dataset, row, column
            ),
            DataError::Empty(dataset) => write!(f, "The {} dataset is empty", dataset),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io(err) => Some(err),
            DataError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::Io(err)
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::Csv(err)
    }
}

impl From<calamine::Error> for DataError {
    fn from(err: calamine::Error) -> Self {
        DataError::Workbook(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").error_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::DataUnavailable("x".into()).error_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(DataError::Empty("sales")).error_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_missing_column_message() {
        let err = DataError::MissingColumn { dataset: "stock", column: "Stock Code" };
        assert_eq!(err.to_string(), "Missing column 'Stock Code' in stock data");
    }

    #[test]
    fn test_missing_sheet_lists_found() {
        let err = DataError::MissingSheet {
            wanted: "sales",
            found: vec!["Stock Balance".into(), "Notes".into()],
        };
        assert!(err.to_string().contains("Stock Balance, Notes"));
    }
}
