//! Parsers for GPFS administrative command output.
//!
//! The `-Y` output of the `mm*` commands is colon-delimited, one record per
//! line, with `HEADER` in the third field of header rows. Parsers here are
//! tolerant: short rows and rows with bad percent-encoding are skipped, and
//! only output that is unusable as a whole is reported as a [`ParseError`].

use regex::Regex;

use crate::error::ParseError;

/// Marker in field 2 of `-Y` header rows.
const HEADER_MARKER: &str = "HEADER";

/// Rows with fewer fields than this are ignored.
const MMLSFS_MIN_FIELDS: usize = 7;
const MMLSFS_NAME_FIELD: usize = 6;
const MMLSFS_MOUNTPOINT_FIELD: usize = 8;

const MMGETSTATE_MIN_FIELDS: usize = 9;
const MMGETSTATE_STATE_FIELD: usize = 8;

/// A clustered filesystem reported by `mmlsfs all -Y -T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filesystem {
    pub name: String,
    pub mountpoint: String,
}

/// Value extracted from a `"<label> status: <value>"` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub status: String,
}

/// Parses `mmlsfs all -Y -T` output into filesystems.
///
/// Field 6 is the device name and field 8 the percent-encoded default
/// mountpoint. A row that has a name but no mountpoint field yields an
/// empty mountpoint.
pub fn parse_mmlsfs(out: &str) -> Vec<Filesystem> {
    let mut filesystems = Vec::new();

    for line in out.lines() {
        let items: Vec<&str> = line.split(':').collect();
        if items.len() < MMLSFS_MIN_FIELDS {
            continue;
        }
        if items[2] == HEADER_MARKER {
            continue;
        }

        let raw = items.get(MMLSFS_MOUNTPOINT_FIELD).copied().unwrap_or("");
        let mountpoint = match query_unescape(raw) {
            Ok(m) => m,
            Err(_) => continue,
        };

        filesystems.push(Filesystem {
            name: items[MMLSFS_NAME_FIELD].to_string(),
            mountpoint,
        });
    }

    filesystems
}

/// Parses `mmgetstate -Y` output and returns the local node state.
///
/// Fails when no data row is present.
pub fn parse_mmgetstate(out: &str) -> Result<StatusRecord, ParseError> {
    out.lines()
        .map(|line| line.split(':').collect::<Vec<&str>>())
        .filter(|items| items.len() >= MMGETSTATE_MIN_FIELDS && items[2] != HEADER_MARKER)
        .map(|items| StatusRecord {
            status: items[MMGETSTATE_STATE_FIELD].to_string(),
        })
        .next()
        .ok_or(ParseError::NoData("mmgetstate"))
}

/// Compiled matcher for `"<label> status: <value>"` lines.
///
/// The value must be on the same line as the label.
#[derive(Debug, Clone)]
pub struct StatusPattern {
    label: String,
    re: Regex,
}

impl StatusPattern {
    pub fn new(label: &str) -> Result<Self, ParseError> {
        let pattern = format!(r"{} status:[ \t]*(\S+)", regex::escape(label));
        let re = Regex::new(&pattern).map_err(|_| ParseError::PatternNotFound(pattern.clone()))?;
        Ok(Self {
            label: label.to_string(),
            re,
        })
    }

    /// Returns the value of the first matching line.
    pub fn parse(&self, out: &str) -> Result<StatusRecord, ParseError> {
        self.re
            .captures(out)
            .and_then(|caps| caps.get(1))
            .map(|m| StatusRecord {
                status: m.as_str().to_string(),
            })
            .ok_or_else(|| ParseError::PatternNotFound(format!("{} status:", self.label)))
    }
}

/// Scans `out` for `"<label> status: <value>"` and returns `<value>`.
pub fn parse_status(out: &str, label: &str) -> Result<StatusRecord, ParseError> {
    StatusPattern::new(label)?.parse(out)
}

/// Decodes a query-escaped string: `+` becomes a space and every `%` must
/// introduce two hex digits.
pub fn query_unescape(s: &str) -> Result<String, ParseError> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(ParseError::InvalidEscape(s.to_string()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced = s.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ParseError::InvalidEscape(s.to_string()))
}
