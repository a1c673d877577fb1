//! Release version comparison

use semver::Version;
use std::cmp::Ordering;

/// Strip a leading `v` from a release tag
pub fn strip_tag_prefix(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}

/// Parse `major.minor.patch`; anything else is not comparable
pub fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let parsed = Version::parse(version.trim()).ok()?;
    Some((parsed.major, parsed.minor, parsed.patch))
}

/// Compare two versions by major, then minor, then patch.
///
/// `None` when either side does not parse.
pub fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
    Some(parse_version(a)?.cmp(&parse_version(b)?))
}
