//! Ledger spreadsheet loading.
//!
//! Reads the bookkeeping export (xlsx/xls via calamine, csv via a small
//! internal parser) and produces the [`LedgerMapping`] the reconciliation
//! engine consumes.

mod loader;
mod mapping;

pub use loader::load_mapping;
pub use mapping::LedgerMapping;
