//! Spreadsheet decoding and column detection.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::ReconError;

use super::mapping::LedgerMapping;

/// Header aliases for the ledger-key column.
const KEY_HEADERS: &[&str] = &["Numer.Pelny", "Numer Pelny", "NumerPelny"];

/// Header aliases for the invoice-number column.
const TARGET_HEADERS: &[&str] = &["NumerDokumentu", "Numer Dokumentu", "numer"];

/// Load a ledger mapping from spreadsheet bytes.
///
/// `name` is only used to pick the decoder: `.csv` goes through the internal
/// CSV parser, everything else through calamine's workbook autodetection.
pub fn load_mapping(name: &str, bytes: &[u8]) -> Result<LedgerMapping, ReconError> {
    let rows = if name.to_lowercase().ends_with(".csv") {
        csv_rows(bytes)?
    } else {
        workbook_rows(bytes)?
    };
    mapping_from_rows(rows)
}

/// Build the mapping from string rows, the first of which is the header.
fn mapping_from_rows(rows: Vec<Vec<String>>) -> Result<LedgerMapping, ReconError> {
    let header = rows
        .first()
        .ok_or_else(|| ReconError::SheetUnreadable("sheet has no rows".to_string()))?;

    let key_col = find_column(header, KEY_HEADERS);
    let target_col = find_column(header, TARGET_HEADERS);
    let (key_col, target_col) = match (key_col, target_col) {
        (Some(k), Some(t)) => (k, t),
        _ => {
            return Err(ReconError::SheetUnreadable(format!(
                "could not locate ledger and invoice columns in header: {}",
                header.join(", ")
            )))
        }
    };

    let mut mapping = LedgerMapping::default();
    for row in rows.iter().skip(1) {
        let key = row.get(key_col).map(|c| c.trim()).unwrap_or("");
        let target = row.get(target_col).map(|c| c.trim()).unwrap_or("");
        // Rows missing either cell carry no pairing
        if key.is_empty() || target.is_empty() {
            continue;
        }
        mapping.push_row(key, target);
    }

    tracing::info!(rows = mapping.row_count(), "ledger sheet loaded");
    Ok(mapping)
}

fn find_column(header: &[String], aliases: &[&str]) -> Option<usize> {
    for alias in aliases {
        if let Some(idx) = header.iter().position(|h| h.trim() == *alias) {
            return Some(idx);
        }
    }
    // Case-insensitive second pass for sloppy exports
    for alias in aliases {
        if let Some(idx) = header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(alias))
        {
            return Some(idx);
        }
    }
    None
}

/// First worksheet of an xlsx/xls workbook, cells stringified.
fn workbook_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>, ReconError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ReconError::SheetUnreadable(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReconError::SheetUnreadable("workbook has no sheets".to_string()))?
        .map_err(|e| ReconError::SheetUnreadable(e.to_string()))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    Ok(rows)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Integral floats render without the trailing ".0" so numeric
            // ledger keys compare equal to their text form
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => cell.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}

/// Minimal CSV decoding: quoted fields, doubled quotes, comma or semicolon
/// delimiter (whichever dominates the header line).
///
/// Rows are split on newlines before quote handling, so a quoted field
/// cannot span lines and a row containing one comes out misaligned. The
/// number columns this loader reads never embed newlines; exports that do
/// embed them elsewhere should go through the workbook path instead.
fn csv_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>, ReconError> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| ReconError::SheetUnreadable("empty csv".to_string()))?;

    let delimiter = if header.matches(';').count() > header.matches(',').count() {
        ';'
    } else {
        ','
    };

    let mut rows = vec![split_csv_line(header, delimiter)];
    for line in lines {
        rows.push(split_csv_line(line, delimiter));
    }
    Ok(rows)
}

fn split_csv_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == delimiter {
            fields.push(std::mem::take(&mut field));
        } else {
            field.push(c);
        }
    }
    fields.push(field);
    fields
}
