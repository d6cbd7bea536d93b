//! Wire version comparison between this client and the adapter firmware

use std::cmp::Ordering;

use semver::{BuildMetadata, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    Same,
    /// Firmware speaks a newer wire version, the client should be updated
    AdapterNewer,
    /// Firmware speaks an older wire version, the adapter should be reflashed
    AdapterOlder,
}

/// Parse `v1`, `v1.2`, `v1.2.3` and `v1.2.3-rc.1` style strings. The leading
/// `v` is optional and missing minor/patch components count as zero.
fn parse(version: &str) -> Option<Version> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);

    let core_end = version.find(['-', '+']).unwrap_or(version.len());
    let (core, rest) = version.split_at(core_end);
    let padded = match core.matches('.').count() {
        0 => format!("{}.0.0{}", core, rest),
        1 => format!("{}.0{}", core, rest),
        _ => version.to_string(),
    };

    let mut parsed = Version::parse(&padded).ok()?;
    parsed.build = BuildMetadata::EMPTY;
    Some(parsed)
}

/// Semantic version ordering. Unparseable versions sort below valid ones
/// and equal to each other.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

pub fn check(client: &str, adapter: &str) -> VersionCheck {
    match compare(client, adapter) {
        Ordering::Less => VersionCheck::AdapterNewer,
        Ordering::Greater => VersionCheck::AdapterOlder,
        Ordering::Equal => VersionCheck::Same,
    }
}
