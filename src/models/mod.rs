// src/models/mod.rs

pub mod dos;
pub mod sales;
pub mod stock;

// Ре-экспорт, чтобы структуры были доступны как crate::models::StructName
pub use dos::*;
pub use sales::*;
pub use stock::*;

/// Fill value for blank text cells.
pub const UNKNOWN: &str = "Unknown";
