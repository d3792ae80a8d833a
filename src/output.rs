//! Writers for extracted records: pretty JSON, CSV with one column per
//! canonical field, and the plain list of discovered product names.

use chrono::Utc;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::OutputFormat;
use crate::error::Result;
use crate::pipeline::ingestion::catalog::ProductLink;
use crate::schema::CanonicalField;
use crate::types::ProductRecord;

const FIXED_COLUMNS: &[&str] = &["url", "name", "brand", "price", "image_url", "description", "technologies"];

pub fn write_json(records: &[ProductRecord], path: &Path) -> Result<()> {
    let json_content = serde_json::to_string_pretty(records)?;
    fs::write(path, json_content)?;
    info!("💾 Saved {} records to {}", records.len(), path.display());
    Ok(())
}

/// Reads records previously written by `write_json`.
pub fn read_json(path: &Path) -> Result<Vec<ProductRecord>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(w: &mut W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    write!(w, "\r\n")
}

/// Canonical fields present in any record, in canonical order.
fn spec_columns(records: &[ProductRecord]) -> Vec<CanonicalField> {
    records
        .iter()
        .flat_map(|record| record.canonical_specs().iter().map(|(field, _)| field))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn write_csv(records: &[ProductRecord], path: &Path) -> Result<()> {
    let columns = spec_columns(records);
    let mut w = BufWriter::new(File::create(path)?);

    let header: Vec<String> = FIXED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(columns.iter().map(|field| field.name().to_string()))
        .collect();
    write_row(&mut w, &header)?;

    for record in records {
        let mut row = vec![
            record.url().to_string(),
            record.name().to_string(),
            record.brand().unwrap_or_default().to_string(),
            record.price().map(|p| p.to_string()).unwrap_or_default(),
            record.image_url().unwrap_or_default().to_string(),
            record.description_text().to_string(),
            record
                .technologies()
                .iter()
                .map(|tech| tech.name.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        ];
        row.extend(
            columns
                .iter()
                .map(|field| record.canonical_specs().value(*field).unwrap_or_default().to_string()),
        );
        write_row(&mut w, &row)?;
    }

    w.flush()?;
    info!("💾 Saved {} records to {}", records.len(), path.display());
    Ok(())
}

/// Writes each requested format under `dir` as `rackets_<timestamp>.<ext>`.
pub fn persist(records: &[ProductRecord], dir: &Path, formats: &[OutputFormat]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");

    let mut written = Vec::new();
    for format in formats {
        let path = match format {
            OutputFormat::Json => {
                let path = dir.join(format!("rackets_{timestamp}.json"));
                write_json(records, &path)?;
                path
            }
            OutputFormat::Csv => {
                let path = dir.join(format!("rackets_{timestamp}.csv"));
                write_csv(records, &path)?;
                path
            }
        };
        written.push(path);
    }
    Ok(written)
}

/// One product name per line; links without a name are left out.
pub fn write_names(links: &[ProductLink], path: &Path) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    for link in links.iter().filter(|link| !link.name.is_empty()) {
        writeln!(w, "{}", link.name)?;
    }
    w.flush()?;
    Ok(())
}
