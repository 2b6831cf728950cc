// src/export.rs
use crate::models::ProductDosEntry;

pub const DOS_EXPORT_HEADERS: [&str; 6] = ["Status", "Stock Code", "Stock Name", "Quantity", "ADS", "DOS (Days)"];

pub fn dos_export_filename(date: chrono::NaiveDate) -> String {
    format!("dos_report_{}.csv", date.format("%Y%m%d"))
}

/// DOS table as CSV bytes, rows in the given order.
pub fn dos_to_csv(entries: &[ProductDosEntry]) -> Result<Vec<u8>, csv::Error> {
    let mut csv_data = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut csv_data);
        writer.write_record(DOS_EXPORT_HEADERS)?;

        for entry in entries {
            writer.write_record(&[
                entry.status.to_string(),
                entry.stock_code.clone(),
                entry.stock_name.clone(),
                entry.quantity.to_string(),
                format!("{:.2}", entry.ads),
                format!("{:.1}", entry.dos_days),
            ])?;
        }

        writer.flush()?;
    }
    Ok(csv_data)
}
