//! EXIF date string parsing.

use crate::error::ExifError;
use chrono::{DateTime, NaiveDateTime};

/// Layouts without a UTC offset, tried in order
const LAYOUTS: &[&str] = &["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Layouts carrying a `±HH:MM` offset; the wall-clock time as written is kept
const OFFSET_LAYOUTS: &[&str] = &[
    "%Y:%m:%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
];

/// Parse an EXIF date string into local wall-clock time.
///
/// Cameras without a set clock write all-zero or all-blank dates; those are
/// [`ExifError::DateNotSet`], which callers must not escalate. Anything else
/// that fails to parse is [`ExifError::Unsupported`].
pub fn parse_exif_datetime(raw: &str) -> Result<NaiveDateTime, ExifError> {
    let value = raw.trim();
    if is_unset(raw) || is_unset(value) {
        return Err(ExifError::DateNotSet);
    }

    for layout in LAYOUTS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, layout) {
            return Ok(parsed);
        }
    }
    for layout in OFFSET_LAYOUTS {
        if let Ok(parsed) = DateTime::parse_from_str(value, layout) {
            return Ok(parsed.naive_local());
        }
    }

    Err(ExifError::unsupported(format!(
        "unknown date format '{value}'"
    )))
}

fn is_unset(value: &str) -> bool {
    value.len() < 10
        || value.starts_with("0000:00:00")
        || value.starts_with("0000-00-00")
        || value.starts_with("    :  :  ")
        || value.chars().all(|c| matches!(c, ' ' | ':' | '-'))
}
