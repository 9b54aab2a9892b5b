//! Conversion pipeline
//!
//! Turns the lines of a share-link list into named, deduplicated
//! [`ProxyEntry`] values:
//!
//! 1. every non-blank, non-comment line is decoded by the matching decoder;
//!    failures are recorded with their line number and skipped,
//! 2. entries are named `"{flag} {PROTOCOL} {index:02}"` in list order,
//! 3. later entries sharing a `(server, port)` with an earlier one are dropped.
//!
//! Names are assigned before deduplication, so numbering keeps gaps where
//! duplicates were removed.

use std::collections::{BTreeMap, HashSet};

use log::{error, info, warn};

use super::{ConvertError, ResourceKind};
use crate::models::{ProxyEntry, ProxyType};
use crate::parser::explodes::{explode, DecodeError};
use crate::utils::file::file_get;
use crate::utils::geo::GeoResolver;

/// Marker starting a comment line in the input list.
pub const COMMENT_PREFIX: char = '#';

/// A line that could not be turned into an entry.
#[derive(Debug)]
pub struct LineFailure {
    /// 1-based line number in the input
    pub line: usize,
    pub reason: DecodeError,
}

/// Outcome of one conversion run.
#[derive(Debug, Default)]
pub struct ConversionReport {
    /// All lines of the input, including blanks and comments
    pub total_lines: usize,
    /// Non-blank, non-comment lines, including skipped ones
    pub processed: usize,
    /// Entries decoded successfully, before deduplication
    pub converted: usize,
    /// Lines rejected by a decoder
    pub failures: Vec<LineFailure>,
    /// 1-based numbers of lines whose scheme has no decoder
    pub skipped: Vec<usize>,
    /// Names of the entries dropped as duplicates
    pub duplicates: Vec<String>,
    /// Final entries, deduplicated, in input order
    pub proxies: Vec<ProxyEntry>,
}

impl ConversionReport {
    pub fn names(&self) -> Vec<String> {
        self.proxies.iter().map(|p| p.name().to_string()).collect()
    }

    /// Final entry count per protocol.
    pub fn count_by_type(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for proxy in &self.proxies {
            *counts.entry(proxy.proxy_type.label()).or_insert(0) += 1;
        }
        counts
    }
}

/// Builds the display name of the entry at 1-based `index`.
pub fn display_name(emoji: &str, proxy_type: ProxyType, index: usize) -> String {
    format!("{} {} {:02}", emoji, proxy_type.label(), index)
}

/// Decodes every meaningful line, keeping successes in encounter order.
pub fn decode_lines<I, S>(lines: I, report: &mut ConversionReport) -> Vec<ProxyEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries = Vec::new();

    for (i, line) in lines.into_iter().enumerate() {
        let line_no = i + 1;
        report.total_lines += 1;

        let line = line.as_ref().trim();
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            continue;
        }
        report.processed += 1;

        match explode(line) {
            Ok(entry) => {
                info!(
                    "Line {}: Successfully converted {} proxy",
                    line_no, entry.proxy_type
                );
                entries.push(entry);
            }
            Err(reason @ DecodeError::UnsupportedScheme(_)) => {
                warn!("Line {}: {}, skipping", line_no, reason);
                report.skipped.push(line_no);
            }
            Err(reason) => {
                error!("Line {}: Failed to convert proxy: {}", line_no, reason);
                report.failures.push(LineFailure {
                    line: line_no,
                    reason,
                });
            }
        }
    }

    report.converted = entries.len();
    info!("Successfully converted {} proxies", entries.len());
    entries
}

/// Names entries in list order from the geolocation of their server.
pub fn assign_names(entries: &mut [ProxyEntry], resolver: &mut GeoResolver) {
    for (i, entry) in entries.iter_mut().enumerate() {
        let geo = resolver.resolve(&entry.server);
        let name = display_name(&geo.emoji, entry.proxy_type, i + 1);
        if !entry.assign_name(name) {
            warn!("Proxy {} already named {}", i + 1, entry.name());
        }
    }
}

/// Keeps the first entry of each `(server, port)` pair.
///
/// Returns the kept entries and the dropped ones, both in input order.
pub fn dedup_entries(entries: Vec<ProxyEntry>) -> (Vec<ProxyEntry>, Vec<ProxyEntry>) {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(entries.len());
    let mut dropped = Vec::new();

    for entry in entries {
        let (server, port) = entry.key();
        if seen.insert((server.to_string(), port)) {
            unique.push(entry);
        } else {
            info!("Removed duplicate proxy: {}", entry.name());
            dropped.push(entry);
        }
    }

    (unique, dropped)
}

/// Runs the whole pipeline over the lines of a share-link list.
pub fn convert_lines<I, S>(lines: I, resolver: &mut GeoResolver) -> ConversionReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = ConversionReport::default();

    let mut entries = decode_lines(lines, &mut report);
    assign_names(&mut entries, resolver);

    let (unique, dropped) = dedup_entries(entries);
    report.duplicates = dropped.iter().map(|p| p.name().to_string()).collect();
    report.proxies = unique;

    info!(
        "Final proxy count after deduplication: {}",
        report.proxies.len()
    );
    report
}

/// Reads a share-link list from disk and converts it.
///
/// A missing or unreadable file is reported as an error and nothing is
/// converted; the caller decides whether that ends the run.
pub fn convert_file(path: &str, resolver: &mut GeoResolver) -> Result<ConversionReport, ConvertError> {
    let content = file_get(path).map_err(|e| {
        error!("Config file {} could not be read: {}", path, e);
        ConvertError::from_read(ResourceKind::Input, path, e)
    })?;
    info!("Found {} lines in {}", content.lines().count(), path);
    Ok(convert_lines(content.lines(), resolver))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::geo::tests::StaticLookup;
    use crate::utils::geo::DisabledLookup;
    use std::rc::Rc;

    fn offline_resolver() -> GeoResolver {
        GeoResolver::new(Box::new(DisabledLookup))
    }

    #[test]
    fn test_convert_skips_comments_and_unsupported() {
        let lines = [
            "# my proxies",
            "",
            "trojan://pw@a.example.com:443",
            "ss://YWVzLTI1Ni1nY206cGFzcw@1.2.3.4:8388",
            "vless://@b.example.com:443",
            "vless://id@c.example.com:443?type=ws",
        ];
        let report = convert_lines(lines, &mut offline_resolver());

        assert_eq!(report.total_lines, 6);
        assert_eq!(report.processed, 4);
        assert_eq!(report.converted, 2);
        assert_eq!(report.skipped, vec![4]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].line, 5);
        assert_eq!(report.failures[0].reason.field(), Some("uuid"));
        assert_eq!(report.names(), vec!["🌍 TROJAN 01", "🌍 VLESS 02"]);
    }

    #[test]
    fn test_dedup_keeps_first_and_preserves_numbering() {
        let lines = [
            "trojan://one@dup.example.com:443",
            "vless://id@other.example.com:443",
            "vless://id2@dup.example.com:443",
            "trojan://two@dup.example.com:8443",
        ];
        let report = convert_lines(lines, &mut offline_resolver());

        assert_eq!(report.converted, 4);
        assert_eq!(report.proxies.len(), 3);
        assert_eq!(report.proxies[0].credential, "one");
        assert_eq!(
            report.names(),
            vec!["🌍 TROJAN 01", "🌍 VLESS 02", "🌍 TROJAN 04"]
        );
        assert_eq!(report.duplicates, vec!["🌍 VLESS 03"]);

        let keys: HashSet<_> = report.proxies.iter().map(|p| p.key()).collect();
        assert_eq!(keys.len(), report.proxies.len());
    }

    #[test]
    fn test_dedup_ignores_host_case_across_protocols() {
        let lookup = StaticLookup::new(&[("example.com", "US", "United States")]);
        let calls = Rc::clone(&lookup.calls);
        let mut resolver = GeoResolver::new(Box::new(lookup));

        let lines = [
            "vless://a@Example.com:443",
            "trojan://b@example.com:443",
            "trojan://c@EXAMPLE.COM:8443",
        ];
        let report = convert_lines(lines, &mut resolver);

        assert_eq!(report.proxies.len(), 2);
        assert_eq!(report.proxies[0].server, "example.com");
        assert_eq!(report.proxies[0].credential, "a");
        assert_eq!(report.proxies[1].port, 8443);
        assert_eq!(report.duplicates, vec!["🇺🇸 TROJAN 02"]);
        assert_eq!(calls.borrow().as_slice(), ["example.com"]);
    }

    #[test]
    fn test_names_use_geo_flags_and_cache() {
        let lookup = StaticLookup::new(&[("1.2.3.4", "IR", "Iran"), ("5.6.7.8", "NL", "Netherlands")]);
        let calls = Rc::clone(&lookup.calls);
        let mut resolver = GeoResolver::new(Box::new(lookup));

        let lines = [
            "trojan://pw@1.2.3.4:443",
            "trojan://pw@1.2.3.4:8443",
            "vless://id@5.6.7.8:443",
        ];
        let report = convert_lines(lines, &mut resolver);

        assert_eq!(
            report.names(),
            vec!["🇮🇷 TROJAN 01", "🇮🇷 TROJAN 02", "🇳🇱 VLESS 03"]
        );
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn test_count_by_type() {
        let lines = [
            "trojan://pw@a.com",
            "trojan://pw@b.com",
            "vless://id@c.com",
        ];
        let report = convert_lines(lines, &mut offline_resolver());
        let counts = report.count_by_type();
        assert_eq!(counts.get("TROJAN"), Some(&2));
        assert_eq!(counts.get("VLESS"), Some(&1));
        assert_eq!(counts.get("VMESS"), None);
    }

    #[test]
    fn test_convert_missing_file() {
        let err = convert_file("/nonexistent/V2RayConfigs", &mut offline_resolver()).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::ResourceMissing {
                kind: ResourceKind::Input,
                ..
            }
        ));
    }

    #[test]
    fn test_display_name_padding() {
        assert_eq!(display_name("🇯🇵", ProxyType::VMess, 7), "🇯🇵 VMESS 07");
        assert_eq!(display_name("🌍", ProxyType::Vless, 123), "🌍 VLESS 123");
    }
}
