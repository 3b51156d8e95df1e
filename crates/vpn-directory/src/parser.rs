// ============================================
// File: crates/vpn-directory/src/parser.rs
// ============================================
//! # Directory Feed Parser
//!
//! ## Creation Reason
//! The public server feed is a loosely formatted CSV dump. This parser turns
//! it into `DirectoryRecord`s without ever failing the whole payload because
//! of one bad line.
//!
//! ## Feed Format
//! ```text
//! *vpn_servers
//! #HostName,IP,Score,Ping,Speed,CountryLong,CountryShort,...
//! host,1.2.3.4,0,0,5000000,Germany,DE,...
//! *
//! ```
//!
//! ## Line Policy
//! 1. Blank lines and lines whose first byte is `*` or `#` are skipped
//! 2. Lines with 7 or fewer comma-separated fields are dropped, so the
//!    7-field rows some feed samples show yield nothing
//! 3. Field 4 (speed, bit/s) must parse as an unsigned integer
//! 4. Field 1 (address) must be a valid server identifier
//! 5. Accepted records stop at `MAX_DIRECTORY_RECORDS`
//!
//! ## ⚠️ Important Note for Next Developer
//! - Duplicate addresses are kept, in source order
//! - Never log field contents above debug level, they are untrusted
//!
//! ## Last Modified
//! v0.1.0 - Initial parser

use tracing::trace;

use vpn_common::ServerId;

use crate::record::{DirectoryRecord, PUBLIC_QUALITY};

/// Hard cap on the number of records kept from one feed.
pub const MAX_DIRECTORY_RECORDS: usize = 10;

/// A data line must have strictly more fields than this.
const MIN_FIELDS_EXCLUSIVE: usize = 7;

const FIELD_ADDRESS: usize = 1;
const FIELD_SPEED: usize = 4;
const FIELD_REGION: usize = 5;

const BITS_PER_MEGABIT: u64 = 1_000_000;

// ============================================
// ParseOutcome
// ============================================

/// Result of parsing one feed payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Accepted records in source order.
    pub records: Vec<DirectoryRecord>,
    /// Blank, header and comment lines.
    pub skipped: usize,
    /// Data lines that were dropped.
    pub malformed: usize,
    /// Valid lines ignored because the cap was reached.
    pub truncated: usize,
}

// ============================================
// Parsing
// ============================================

/// Parses a feed payload, keeping at most [`MAX_DIRECTORY_RECORDS`] records.
#[must_use]
pub fn parse_directory(payload: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    for (index, raw) in payload.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || raw.starts_with('*') || raw.starts_with('#') {
            outcome.skipped += 1;
            continue;
        }

        let Some(record) = parse_line(line) else {
            trace!(line = index + 1, "Dropping malformed directory line");
            outcome.malformed += 1;
            continue;
        };

        if outcome.records.len() >= MAX_DIRECTORY_RECORDS {
            outcome.truncated += 1;
            continue;
        }
        outcome.records.push(record);
    }

    outcome
}

/// Parses a single data line, returning `None` if it must be dropped.
#[must_use]
pub fn parse_line(line: &str) -> Option<DirectoryRecord> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() <= MIN_FIELDS_EXCLUSIVE {
        return None;
    }

    let address = fields[FIELD_ADDRESS];
    let speed: u64 = fields[FIELD_SPEED].parse().ok()?;
    let region = fields[FIELD_REGION];

    let id = ServerId::parse(address).ok()?;
    let name = format!("{} ({} Mbps)", region, speed / BITS_PER_MEGABIT);

    Some(DirectoryRecord::new(id, name, address, PUBLIC_QUALITY))
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    const GERMANY: &str = "host,1.2.3.4,0,0,5000000,Germany,DE,x";

    #[test]
    fn test_cap_at_ten_records() {
        let payload = vec![GERMANY; 15].join("\n");
        let outcome = parse_directory(&payload);

        assert_eq!(outcome.records.len(), 10);
        assert_eq!(outcome.truncated, 5);
        for record in &outcome.records {
            assert_eq!(record.name(), "Germany (5 Mbps)");
            assert_eq!(record.id().as_str(), "1.2.3.4");
            assert_eq!(record.address(), "1.2.3.4");
            assert_eq!(record.quality(), "Public");
        }
    }

    #[test]
    fn test_short_line_dropped_without_aborting() {
        let payload = "\
host,9.9.9.9,0,0,1000000,Short,SH
host,1.1.1.1,0,0,2000000,Japan,JP,x
a,b
host,8.8.8.8,0,0,3000000,USA,US,x";
        let outcome = parse_directory(payload);

        let ids: Vec<&str> = outcome.records.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, ["1.1.1.1", "8.8.8.8"]);
        assert_eq!(outcome.malformed, 2);
    }

    #[test]
    fn test_seven_fields_is_not_enough() {
        assert!(parse_line("h,1.2.3.4,0,0,5000000,Germany,DE").is_none());
        assert!(parse_line("h,1.2.3.4,0,0,5000000,Germany,DE,").is_some());
    }

    #[test]
    fn test_comments_and_headers_skipped() {
        let payload = "\
*vpn_servers
#HostName,IP,Score,Ping,Speed,CountryLong,CountryShort,NumVpnSessions

host,1.2.3.4,0,0,5000000,Germany,DE,x
*";
        let outcome = parse_directory(payload);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.skipped, 4);
        assert_eq!(outcome.malformed, 0);
    }

    #[test]
    fn test_indented_marker_is_not_a_comment() {
        let payload = "  #HostName,IP\n *\n\t# note";
        let outcome = parse_directory(payload);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.malformed, 3);
    }

    #[test]
    fn test_seven_field_sample_rows_yield_nothing() {
        let payload = vec!["host,1.2.3.4,0,0,5000000,Germany,DE"; 15].join("\n");
        let outcome = parse_directory(&payload);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.malformed, 15);
    }

    #[test]
    fn test_non_numeric_speed_dropped() {
        assert!(parse_line("h,1.2.3.4,0,0,fast,Germany,DE,x").is_none());
        assert!(parse_line("h,1.2.3.4,0,0,-5,Germany,DE,x").is_none());
        assert!(parse_line("h,1.2.3.4,0,0,,Germany,DE,x").is_none());
    }

    #[test]
    fn test_speed_truncates() {
        let record = parse_line("h,1.2.3.4,0,0,1999999,Korea,KR,x").unwrap();
        assert_eq!(record.name(), "Korea (1 Mbps)");

        let record = parse_line("h,1.2.3.4,0,0,999999,Korea,KR,x").unwrap();
        assert_eq!(record.name(), "Korea (0 Mbps)");
    }

    #[test]
    fn test_unsafe_address_dropped() {
        assert!(parse_line("h,1.2.3.4;reboot,0,0,5000000,Germany,DE,x").is_none());
        assert!(parse_line("h,,0,0,5000000,Germany,DE,x").is_none());
    }

    #[test]
    fn test_crlf_and_padding() {
        let payload = "host, 1.2.3.4 ,0,0, 5000000 , Germany ,DE,x\r\n";
        let outcome = parse_directory(payload);
        assert_eq!(outcome.records[0].address(), "1.2.3.4");
        assert_eq!(outcome.records[0].name(), "Germany (5 Mbps)");
    }

    #[test]
    fn test_duplicates_kept_in_order() {
        let payload = "\
a,5.5.5.5,0,0,1000000,First,F,x
b,5.5.5.5,0,0,2000000,Second,S,x";
        let outcome = parse_directory(payload);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].name(), "First (1 Mbps)");
        assert_eq!(outcome.records[1].name(), "Second (2 Mbps)");
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(parse_directory(""), ParseOutcome::default());
    }
}
