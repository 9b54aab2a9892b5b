//! URL decoding and query helpers

use std::collections::HashMap;
use url::{Host, Url};

/// Decodes a URL-encoded string
///
/// # Arguments
/// * `input` - The URL-encoded string to decode
///
/// # Returns
/// * String containing the decoded input
/// * Returns the original string if decoding fails
///
/// # Examples
/// ```
/// use linkforge::utils::url::url_decode;
///
/// let decoded = url_decode("Hello%20World%21");
/// assert_eq!(decoded, "Hello World!");
/// ```
pub fn url_decode(input: &str) -> String {
    urlencoding::decode(input)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

/// Collects the query string of a URL into a map.
///
/// Keys keep their case. The first occurrence of a repeated key wins and
/// empty values are dropped, so `sni=` behaves like a missing `sni`.
pub fn query_params(url: &Url) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (key, value) in url.query_pairs() {
        if value.is_empty() {
            continue;
        }
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}

/// Returns the host of a URL in its readable form, or `None` when empty.
///
/// `vless://` and `trojan://` are not special schemes to the `url` crate, so
/// their hosts come back opaque: percent-encoded and with their original
/// case. Those are decoded and lowercased here, and IPv6 literals lose
/// their brackets. A host that does not decode to UTF-8 yields `None`.
pub fn bare_host(url: &Url) -> Option<String> {
    let host = match url.host()? {
        Host::Domain(domain) => urlencoding::decode(domain).ok()?.to_lowercase(),
        Host::Ipv4(addr) => addr.to_string(),
        Host::Ipv6(addr) => addr.to_string(),
    };
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Lowercases a host taken verbatim from a payload, trimming whitespace.
pub fn normalize_host(host: &str) -> String {
    host.trim().to_lowercase()
}

/// Splits a comma separated list, dropping blank items.
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_first_non_empty_wins() {
        let url = Url::parse("vless://id@host:1?sni=&type=ws&type=grpc&path=%2Fa%20b").unwrap();
        let params = query_params(&url);
        assert_eq!(params.get("type").map(String::as_str), Some("ws"));
        assert_eq!(params.get("path").map(String::as_str), Some("/a b"));
        assert!(!params.contains_key("sni"));
    }

    #[test]
    fn test_bare_host() {
        let url = Url::parse("trojan://pw@[2001:db8::1]:443").unwrap();
        assert_eq!(bare_host(&url).as_deref(), Some("2001:db8::1"));
        let url = Url::parse("trojan://pw@example.com").unwrap();
        assert_eq!(bare_host(&url).as_deref(), Some("example.com"));
    }

    #[test]
    fn test_bare_host_decodes_and_lowercases_domains() {
        let url = Url::parse("vless://id@例子.com:443").unwrap();
        assert_eq!(bare_host(&url).as_deref(), Some("例子.com"));
        let url = Url::parse("trojan://pw@München.DE:443").unwrap();
        assert_eq!(bare_host(&url).as_deref(), Some("münchen.de"));
        let url = Url::parse("vless://id@Example.COM").unwrap();
        assert_eq!(bare_host(&url).as_deref(), Some("example.com"));
    }

    #[test]
    fn test_bare_host_rejects_undecodable_domain() {
        let url = Url::parse("trojan://pw@bad%FFhost:443").unwrap();
        assert_eq!(bare_host(&url), None);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("h2, http/1.1,,"), vec!["h2", "http/1.1"]);
        assert!(split_list("").is_empty());
    }
}
