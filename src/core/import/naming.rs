//! Destination path templates.

use crate::core::fingerprint::Fingerprint;
use crate::error::ImportError;
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::path::{Path, PathBuf};

pub const DEFAULT_TEMPLATE: &str = "{year}/{year}-{month}/{year}{month}{day}_{hour}{min}{sec}.{ext}";

/// A parsed naming template.
///
/// Tokens: `{year}` `{month}` `{day}` `{hour}` `{min}` `{sec}` `{filename}`
/// `{ext}` `{hash}`. Anything else, including unknown `{...}`, is literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingTemplate {
    template: String,
}

impl NamingTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, ImportError> {
        let template = template.into();
        if template.trim().is_empty() {
            return Err(ImportError::EmptyTemplate);
        }
        Ok(Self { template })
    }

    /// Render the relative destination path for one file
    pub fn render(&self, captured: NaiveDateTime, source: &Path, fingerprint: Fingerprint) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = source
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut out = String::with_capacity(self.template.len() + 16);
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open..];
            let Some(close) = after.find('}') else {
                out.push_str(after);
                rest = "";
                break;
            };

            let token = &after[1..close];
            match token {
                "year" => out.push_str(&format!("{:04}", captured.year())),
                "month" => out.push_str(&format!("{:02}", captured.month())),
                "day" => out.push_str(&format!("{:02}", captured.day())),
                "hour" => out.push_str(&format!("{:02}", captured.hour())),
                "min" => out.push_str(&format!("{:02}", captured.minute())),
                "sec" => out.push_str(&format!("{:02}", captured.second())),
                "filename" => out.push_str(&stem),
                "ext" => out.push_str(&ext),
                "hash" => out.push_str(&fingerprint.to_string()),
                _ => out.push_str(&after[..=close]),
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);

        // Extension-less sources would otherwise end in a bare dot
        if ext.is_empty() {
            while out.ends_with('.') {
                out.pop();
            }
        }

        // Keep the result relative so it always lands under the destination
        PathBuf::from(out.trim_start_matches(['/', '\\']))
    }
}

impl Default for NamingTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}
