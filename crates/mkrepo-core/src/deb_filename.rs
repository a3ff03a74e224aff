// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Parsing of `.deb` pool paths into their (dist, component, arch) slot.

This is a from-scratch port grounded on this spec's own filename grammar
rather than the older `split_pkg_path` regex found in reference material for
this system — the two disagree on dist derivation, and the spec takes
priority. */

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches `<pkg>_<upstream_version>-<debian_revision>_<arch>.deb`.
static WITH_REVISION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<pkg>[A-Za-z0-9.+-]+)_(?P<upstream>[A-Za-z0-9.+~:]+)-(?P<rev>[A-Za-z0-9.+~]+)_(?P<arch>[A-Za-z0-9-]+)\.deb$").unwrap()
});

/// Matches `<pkg>_<upstream_version>_<arch>.deb` (no Debian revision).
static WITHOUT_REVISION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<pkg>[A-Za-z0-9.+-]+)_(?P<upstream>[A-Za-z0-9.+~:]+)_(?P<arch>[A-Za-z0-9-]+)\.deb$").unwrap()
});

static POOL_DIST_MAIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^pool/([^/]+)/main/").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebFilename {
    pub package: String,
    pub upstream_version: String,
    pub debian_revision: Option<String>,
    pub arch: String,
}

/// Parse a `.deb` basename per the grammar's two alternatives, with-revision
/// tried first.
pub fn parse_deb_filename(basename: &str) -> Option<DebFilename> {
    if let Some(caps) = WITH_REVISION.captures(basename) {
        return Some(DebFilename {
            package: caps["pkg"].to_string(),
            upstream_version: caps["upstream"].to_string(),
            debian_revision: Some(caps["rev"].to_string()),
            arch: caps["arch"].to_string(),
        });
    }
    if let Some(caps) = WITHOUT_REVISION.captures(basename) {
        return Some(DebFilename {
            package: caps["pkg"].to_string(),
            upstream_version: caps["upstream"].to_string(),
            debian_revision: None,
            arch: caps["arch"].to_string(),
        });
    }
    None
}

/// Derives `(dist, component, arch)` for a `.deb` stored at `pool_path`
/// (e.g. `pool/deb9/main/t/tarantool/libtarantool-dev_1.5.2-2_amd64.deb`).
///
/// `dist` is the path segment between `pool/` and `/main/` when that literal
/// three-segment prefix is present; otherwise it is `"all"`, even if a
/// differently-placed path segment happens to read `main` (see the `t`
/// pool/main/t/tarantool/... seed case, which resolves to `"all"`, not
/// `"main"`).
pub fn split_pool_path(pool_path: &str, filename: &DebFilename) -> (String, &'static str, String) {
    let dist = infer_dist_from_pool_path(pool_path);
    (dist, "main", filename.arch.clone())
}

/// Derives the `dist` segment of a pool path the same way [split_pool_path]
/// does, for inputs (malformed `.deb` names, `.dsc` files) that don't carry
/// an architecture to hand back alongside it.
pub fn infer_dist_from_pool_path(pool_path: &str) -> String {
    POOL_DIST_MAIN
        .captures(pool_path)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "all".to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn with_revision() {
        let path = "pool/deb9/main/t/tarantool/libtarantool-dev_1.5.2.20.g5f5d924-2_amd64.deb";
        let name = path.rsplit('/').next().unwrap();
        let parsed = parse_deb_filename(name).unwrap();
        assert_eq!(parsed.package, "libtarantool-dev");
        assert_eq!(parsed.upstream_version, "1.5.2.20.g5f5d924");
        assert_eq!(parsed.debian_revision.as_deref(), Some("2"));
        assert_eq!(parsed.arch, "amd64");
        let (dist, component, arch) = split_pool_path(path, &parsed);
        assert_eq!((dist.as_str(), component, arch.as_str()), ("deb9", "main", "amd64"));
    }

    #[test]
    fn falls_back_to_all_without_pool_dist_main_prefix() {
        let path = "pool/main/t/tarantool/tarantool-python_0.6.6-21_amd64.deb";
        let name = path.rsplit('/').next().unwrap();
        let parsed = parse_deb_filename(name).unwrap();
        let (dist, component, _arch) = split_pool_path(path, &parsed);
        assert_eq!(dist, "all");
        assert_eq!(component, "main");
    }

    #[test]
    fn without_revision() {
        let path = "pool/multiverse/a/astrometry/astrometry-data-2mass_1.1_all.deb";
        let name = path.rsplit('/').next().unwrap();
        let parsed = parse_deb_filename(name).unwrap();
        assert_eq!(parsed.package, "astrometry-data-2mass");
        assert_eq!(parsed.debian_revision, None);
        let (dist, _component, arch) = split_pool_path(path, &parsed);
        assert_eq!(dist, "all");
        assert_eq!(arch, "all");
    }
}
