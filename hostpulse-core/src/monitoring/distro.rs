//! Canonical distribution ids from `/etc/os-release` content

use std::sync::LazyLock;

use regex::Regex;

use super::metrics::DistroInfo;

/// Raw `ID` values that all denote Red Hat Enterprise Linux
const RHEL_ALIASES: &[&str] = &[
    "rhel",
    "redhat",
    "redhatenterpriseserver",
    "red hat enterprise linux",
];

/// Canonical id for the Red Hat family
const RHEL_ID: &str = "rhel";

static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(ID|ID_LIKE|VERSION_ID)=(?:"([^"]*)"|'([^']*)'|(\S*))\s*$"#)
        .expect("KEY_VALUE is a valid regex pattern")
});

/// Fields of interest extracted from os-release text
#[derive(Debug, Default)]
struct OsRelease {
    id: Option<String>,
    id_like: Option<String>,
    version_id: Option<String>,
}

fn extract(text: &str) -> OsRelease {
    let mut out = OsRelease::default();
    for caps in KEY_VALUE.captures_iter(text) {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        let slot = match &caps[1] {
            "ID" => &mut out.id,
            "ID_LIKE" => &mut out.id_like,
            _ => &mut out.version_id,
        };
        // first occurrence wins
        if slot.is_none() {
            *slot = Some(value);
        }
    }
    out
}

/// Maps a raw `ID` (plus `ID_LIKE`) to its canonical distribution id
#[must_use]
pub fn canonical_id(id: &str, id_like: Option<&str>) -> String {
    let lowered = id.to_lowercase();
    if RHEL_ALIASES.contains(&lowered.as_str()) {
        return RHEL_ID.to_string();
    }
    if lowered == "linux"
        && id_like.is_some_and(|like| {
            let like = like.to_lowercase();
            like.contains("rhel") || like.contains("redhat")
        })
    {
        return RHEL_ID.to_string();
    }
    id.to_string()
}

/// Normalizes the distribution identity found in `text`.
///
/// `text` may contain other command output around the os-release lines.
/// When no `ID=` line is present the `fallback` is returned unchanged, so
/// a garbled poll keeps showing the last confirmed identity.
#[must_use]
pub fn normalize_distro(text: &str, fallback: &DistroInfo) -> DistroInfo {
    let fields = extract(text);
    let Some(id) = fields.id.filter(|id| !id.is_empty()) else {
        tracing::trace!("No ID= line in os-release output, keeping previous distro");
        return fallback.clone();
    };

    DistroInfo {
        id: canonical_id(&id, fields.id_like.as_deref()),
        version_id: fields.version_id.unwrap_or_default(),
    }
}
