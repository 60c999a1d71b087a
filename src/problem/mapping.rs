// Host-owned status code -> (title, type link) table

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Title and documentation link for one status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientErrorData {
    pub title: String,
    pub link: String,
}

/// Read-only mapping consulted to fill a missing `title` or `type`.
///
/// The default mapping is empty; hosts opt into a table explicitly.
#[derive(Debug, Clone, Default)]
pub struct StatusCodeMapping {
    entries: HashMap<u16, ClientErrorData>,
}

static RFC9110: Lazy<StatusCodeMapping> = Lazy::new(|| {
    const SECTIONS: [(u16, &str, &str); 17] = [
        (400, "Bad Request", "15.5.1"),
        (401, "Unauthorized", "15.5.2"),
        (403, "Forbidden", "15.5.4"),
        (404, "Not Found", "15.5.5"),
        (405, "Method Not Allowed", "15.5.6"),
        (406, "Not Acceptable", "15.5.7"),
        (408, "Request Timeout", "15.5.9"),
        (409, "Conflict", "15.5.10"),
        (412, "Precondition Failed", "15.5.13"),
        (413, "Content Too Large", "15.5.14"),
        (415, "Unsupported Media Type", "15.5.16"),
        (422, "Unprocessable Content", "15.5.21"),
        (426, "Upgrade Required", "15.5.22"),
        (500, "Internal Server Error", "15.6.1"),
        (502, "Bad Gateway", "15.6.3"),
        (503, "Service Unavailable", "15.6.4"),
        (504, "Gateway Timeout", "15.6.5"),
    ];

    SECTIONS
        .iter()
        .fold(StatusCodeMapping::new(), |mapping, (status, title, section)| {
            mapping.with(
                *status,
                *title,
                format!("https://tools.ietf.org/html/rfc9110#section-{section}"),
            )
        })
});

impl StatusCodeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links every common client and server error to its RFC 9110 section.
    pub fn rfc9110() -> Self {
        RFC9110.clone()
    }

    /// Resolves a named preset as used by the `PROBLEM_TYPE_LINKS` setting.
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Some(Self::new()),
            "rfc9110" => Some(Self::rfc9110()),
            _ => None,
        }
    }

    pub fn with(mut self, status: u16, title: impl Into<String>, link: impl Into<String>) -> Self {
        self.entries.insert(
            status,
            ClientErrorData {
                title: title.into(),
                link: link.into(),
            },
        );
        self
    }

    pub fn get(&self, status: u16) -> Option<&ClientErrorData> {
        self.entries.get(&status)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
