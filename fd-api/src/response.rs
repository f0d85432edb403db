//! Backend response types.
//!
//! Row endpoints answer with bare JSON arrays; failures carry a small error
//! object:
//! ```json
//! { "code": "PGRST116", "message": "...", "details": null, "hint": null }
//! ```

use serde::{Deserialize, Serialize};

/// Error body returned by the row API and most edge functions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, alias = "error", alias = "msg")]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl BackendError {
    /// Parse an error body, falling back to the raw text when it is not JSON.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self {
            message: (!body.trim().is_empty()).then(|| body.trim().to_string()),
            ..Default::default()
        })
    }

    /// One-line description: "message (code) - details".
    pub fn describe(&self) -> String {
        let mut out = self.message.clone().unwrap_or_else(|| "unknown error".into());
        if let Some(code) = &self.code {
            out.push_str(&format!(" ({code})"));
        }
        if let Some(details) = &self.details {
            out.push_str(&format!(" - {details}"));
        }
        out
    }
}

/// Parsed `Content-Range` header, e.g. `0-24/3573` or `*/0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: Option<u64>,
    pub end: Option<u64>,
    /// `None` when the server answered `*` for the total.
    pub total: Option<u64>,
}

impl ContentRange {
    pub fn parse(header: &str) -> Option<Self> {
        let (range, total) = header.trim().split_once('/')?;
        let total = match total {
            "*" => None,
            n => Some(n.parse().ok()?),
        };
        let (start, end) = match range {
            "*" => (None, None),
            r => {
                let (s, e) = r.split_once('-')?;
                (Some(s.parse().ok()?), Some(e.parse().ok()?))
            }
        };
        Some(Self { start, end, total })
    }
}
