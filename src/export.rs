use anyhow::{Context, Result};
use chrono::Local;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::models::JobRecord;

const CSV_HEADERS: [&str; 7] = [
    "Title",
    "Company",
    "Location",
    "Salary",
    "URL",
    "Date Captured",
    "Status",
];

/// Write the record list as CSV with the fixed column order above. Every
/// field is quoted; embedded quotes are escaped by the writer.
pub fn write_csv<W: Write>(records: &[JobRecord], writer: W) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    out.write_record(CSV_HEADERS)?;
    for record in records {
        out.write_record([
            record.title.as_str(),
            record.company.as_str(),
            record.location.as_str(),
            record.salary.as_str(),
            record.url.as_str(),
            record.date_captured.as_str(),
            record.status.as_str(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

pub fn export_to_file(records: &[JobRecord], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    write_csv(records, file)
}

/// Default export filename with the current date embedded.
pub fn default_filename() -> String {
    format!("job_applications_{}.csv", Local::now().format("%Y-%m-%d"))
}
