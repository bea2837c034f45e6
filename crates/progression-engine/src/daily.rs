//! Deterministic daily pick.
//!
//! The item for a day is `catalog[YYYYMMDD % catalog.len()]`, so every client
//! evaluating the same catalog on the same calendar date agrees without any
//! shared storage.
//!
//! Known limitation: determinism only holds for a fixed catalog. Adding or
//! removing items shifts which item every date maps to.

use crate::error::{EngineError, Result};
use chrono::{Datelike, NaiveDate};
use tracing::trace;

/// `YYYYMMDD` as an integer, e.g. 2025-02-10 -> 20250210
pub fn date_key(date: NaiveDate) -> u64 {
    // Years before 0 CE have no YYYYMMDD form; clamp them to 0.
    let year = u64::try_from(date.year()).unwrap_or(0);
    year * 10_000 + date.month() as u64 * 100 + date.day() as u64
}

/// Index into a catalog of `len` items for `date`
pub fn select_daily_index(len: usize, date: NaiveDate) -> Result<usize> {
    if len == 0 {
        return Err(EngineError::EmptyCatalog);
    }
    let key = date_key(date);
    let index = (key % len as u64) as usize;
    trace!(key, len, index, "daily selection");
    Ok(index)
}

/// Pick today's item from a non-empty catalog
pub fn select_daily<T>(catalog: &[T], date: NaiveDate) -> Result<&T> {
    let index = select_daily_index(catalog.len(), date)?;
    Ok(&catalog[index])
}
