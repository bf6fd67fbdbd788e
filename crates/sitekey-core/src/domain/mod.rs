//! Site-identity extraction.
//!
//! Reduces a page URL to the string used as the per-site salt. The
//! identity is the registrable domain: every page under `example.co.uk`
//! (any subdomain, scheme, port, path, or query) maps to `example.co.uk`,
//! while unrelated registrable domains map to distinct identities.
//!
//! Multi-level effective TLDs (`co.uk`, `com.au`, `act.edu.au`, ...) come
//! from the table in [`suffixes`]; every other host keeps its last two
//! labels.

pub mod suffixes;

use url::Url;

use crate::error::CoreError;

/// Identity returned for `file://` URLs without a host.
pub const LOCAL_FILE_IDENTITY: &str = "localhost";

/// Extract the site identity from a page URL.
///
/// # Errors
///
/// Returns [`CoreError::InvalidUrl`] if `input` does not parse as a URL, or
/// if it parses but carries no host (`about:blank`, `data:`, `mailto:`)
/// and is not a local file.
pub fn extract(input: &str) -> Result<String, CoreError> {
    let url = Url::parse(input).map_err(|e| CoreError::InvalidUrl(e.to_string()))?;

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(identity_for_host(host)),
        _ if url.scheme() == "file" => Ok(LOCAL_FILE_IDENTITY.to_string()),
        _ => Err(CoreError::InvalidUrl(format!(
            "'{}' URL has no host",
            url.scheme()
        ))),
    }
}

/// Compute the site identity for an already-parsed host name.
///
/// IPv4 and bracketed IPv6 literals are returned unchanged. Hosts with a
/// single label are returned as-is.
#[must_use]
pub fn identity_for_host(host: &str) -> String {
    let host = host.strip_suffix('.').unwrap_or(host).to_ascii_lowercase();

    if host.starts_with('[') || is_ipv4_literal(&host) {
        return host;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return host;
    }

    // Longest candidate first: `act.edu.au` must win over `edu.au`.
    for suffix_labels in (2..=suffixes::longest_suffix_labels()).rev() {
        let Some(start) = labels.len().checked_sub(suffix_labels) else {
            continue;
        };
        // The host is the suffix itself; nothing to promote.
        let Some(owner) = start.checked_sub(1) else {
            continue;
        };
        if suffixes::is_multi_level_suffix(&labels[start..].join(".")) {
            return labels[owner..].join(".");
        }
    }

    labels[labels.len().saturating_sub(2)..].join(".")
}

/// Format-only IPv4 match: four dot-separated groups of one to three
/// ASCII digits. Group values are not range-checked.
#[must_use]
pub fn is_ipv4_literal(host: &str) -> bool {
    let groups: Vec<&str> = host.split('.').collect();
    groups.len() == 4
        && groups
            .iter()
            .all(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
