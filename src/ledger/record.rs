// src/ledger/record.rs

//! On-disk record format: `<source>|<destination>|<ISO-8601 timestamp>`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::{MirrorError, Result};
use crate::ledger::LedgerEntry;
use crate::watch::path_utils::normalize;

pub const FIELD_SEPARATOR: char = '|';

/// Canonical string form of a ledger key.
pub fn ledger_key(path: &Path) -> String {
    normalize(path).to_string_lossy().into_owned()
}

/// Timestamps keep full sub-second precision so they survive a round trip.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render one record, refusing paths that would break the line format.
pub fn format_record(entry: &LedgerEntry) -> Result<String> {
    let source = ledger_key(&entry.source);
    let destination = entry.destination.to_string_lossy();
    for field in [source.as_str(), destination.as_ref()] {
        if field.contains(FIELD_SEPARATOR) || field.contains('\n') || field.contains('\r') {
            return Err(MirrorError::Ledger(format!(
                "path {field:?} contains a record delimiter"
            )));
        }
    }
    Ok(format!(
        "{source}{sep}{destination}{sep}{ts}",
        sep = FIELD_SEPARATOR,
        ts = format_timestamp(&entry.last_backup)
    ))
}

/// Parse one line; `None` for blank or malformed lines.
pub fn parse_record(line: &str) -> Option<LedgerEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (rest, ts) = line.rsplit_once(FIELD_SEPARATOR)?;
    let (source, destination) = rest.rsplit_once(FIELD_SEPARATOR)?;
    if source.is_empty() {
        return None;
    }
    Some(LedgerEntry {
        source: PathBuf::from(source),
        destination: PathBuf::from(destination),
        last_backup: parse_timestamp(ts)?,
    })
}

/// Cheap key match without parsing the timestamp.
pub fn record_key(line: &str) -> Option<&str> {
    let (rest, _) = line.rsplit_once(FIELD_SEPARATOR)?;
    let (source, _) = rest.rsplit_once(FIELD_SEPARATOR)?;
    Some(source)
}
