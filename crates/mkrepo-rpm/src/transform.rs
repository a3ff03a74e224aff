// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Header -> repository-metadata transform: turns a decoded [`RpmPackage`]
into the primary/filelists/other records emitted by `xml.rs`. */

use crate::header::RpmPackage;
use crate::io::{ContentDigest, DigestFlavor};
use crate::model::{
    ChangelogEntry, DependencyEntry, FileRecord, FileType, FilelistsPackage, Nevra,
    OtherPackage, PrimaryPackage,
};
use crate::tags::*;
use std::collections::HashSet;

const S_IFMT: i32 = 0o170000;
const S_IFDIR: i32 = 0o040000;
const S_IFLNK: i32 = 0o120000;
const S_IFREG: i32 = 0o100000;

fn nevra(pkg: &RpmPackage, arch: String) -> Nevra {
    Nevra {
        name: pkg.header.get_string(TAG_NAME).unwrap_or_default().to_string(),
        epoch: pkg.header.get_i32(TAG_EPOCH).map(|e| e.to_string()),
        version: pkg
            .header
            .get_string(TAG_VERSION)
            .unwrap_or_default()
            .to_string(),
        release: pkg
            .header
            .get_string(TAG_RELEASE)
            .unwrap_or_default()
            .to_string(),
        arch,
    }
}

/// Matches rpmrepo.py's `get_arch_from_header`: source packages are reported
/// as arch `src` regardless of what the header's own ARCH tag says.
pub fn arch_from_header(pkg: &RpmPackage) -> String {
    let is_source = pkg.header.get_i32(TAG_SOURCEPACKAGE) == Some(1)
        || pkg
            .header
            .get_string(TAG_SOURCERPM)
            .map(|s| s.is_empty())
            .unwrap_or(true);
    if is_source {
        "src".to_string()
    } else {
        pkg.header.get_string(TAG_ARCH).unwrap_or("noarch").to_string()
    }
}

fn dependency_entries(
    names: Vec<String>,
    flags: Vec<i32>,
    versions: Vec<String>,
    with_pre: bool,
) -> Vec<DependencyEntry> {
    names
        .into_iter()
        .enumerate()
        .filter_map(|(i, name)| {
            let flag_bits = flags.get(i).copied().unwrap_or(0) as u32;
            if is_rpmlib_dependency(flag_bits) {
                return None;
            }
            let version = versions.get(i).cloned().unwrap_or_default();
            let (epoch, ver, rel) = split_evr(&version);
            Some(DependencyEntry {
                name,
                flags: SenseOperator::from_flags(flag_bits)
                    .as_str()
                    .map(|s| s.to_string()),
                epoch,
                version: ver,
                release: rel,
                pre: with_pre && is_prereq(flag_bits),
            })
        })
        .collect()
}

/// Splits a dependency's combined EVR string against
/// `^(\d+:)?([^-]*)(-[^-]*)?$`: missing epoch defaults to `"0"`, missing
/// release stays `None`. An empty string yields `(None, None, None)` since
/// there is no version token to attach a default epoch to.
fn split_evr(evr: &str) -> (Option<String>, Option<String>, Option<String>) {
    if evr.is_empty() {
        return (None, None, None);
    }
    let (epoch, rest) = match evr.split_once(':') {
        Some((e, r)) => (Some(e.to_string()), r),
        None => (Some("0".to_string()), evr),
    };
    match rest.split_once('-') {
        Some((v, r)) => (epoch, Some(v.to_string()), Some(r.to_string())),
        None => (epoch, Some(rest.to_string()), None),
    }
}

fn get_files(pkg: &RpmPackage) -> Vec<FileRecord> {
    let basenames = pkg.header.get_string_array(TAG_BASENAMES);
    let dirnames = pkg.header.get_string_array(TAG_DIRNAMES);
    let dirindexes = pkg.header.get_i32_array(TAG_DIRINDEXES);
    let modes = pkg.header.get_i32_array(TAG_FILEMODES);

    let mut files = Vec::with_capacity(basenames.len() + dirnames.len());
    let mut seen: HashSet<String> = HashSet::new();

    for i in 0..basenames.len() {
        let dir_idx = dirindexes.get(i).copied().unwrap_or(0) as usize;
        let dir = dirnames.get(dir_idx).map(|s| s.as_str()).unwrap_or("");
        let name = format!("{}{}", dir, basenames[i]);
        let mode = modes.get(i).copied().unwrap_or(0);
        let file_type = match mode & S_IFMT {
            S_IFDIR => FileType::Dir,
            S_IFREG | S_IFLNK => FileType::File,
            _ => continue,
        };
        seen.insert(name.clone());
        files.push(FileRecord { name, file_type });
    }

    // Every directory named in DIRNAMES is itself a filelists/primary entry,
    // independent of whether any BASENAMES/FILEMODES triple happened to mark
    // it as a dir (an rpm can own a directory with no direct file in it).
    for dir in &dirnames {
        if seen.insert(dir.clone()) {
            files.push(FileRecord {
                name: dir.clone(),
                file_type: FileType::Dir,
            });
        }
    }

    files
}

fn changelog_entries(pkg: &RpmPackage) -> Vec<ChangelogEntry> {
    let times = pkg.header.get_i32_array(TAG_CHANGELOGTIME);
    let names = pkg.header.get_string_array(TAG_CHANGELOGNAME);
    let texts = pkg.header.get_string_array(TAG_CHANGELOGTEXT);

    let len = times.len().min(names.len()).min(texts.len());
    let all: Vec<ChangelogEntry> = (0..len)
        .map(|i| ChangelogEntry {
            author: names[i].clone(),
            date: times[i] as i64,
            text: texts[i].clone(),
        })
        .collect();

    let start = all.len().saturating_sub(10);
    let mut kept: Vec<ChangelogEntry> = all[start..].to_vec();
    kept.reverse();
    kept
}

/// True for paths whose presence is implied by package installation itself
/// (so a requirement on them is redundant and excluded from repository
/// metadata): config directories, the sendmail alternative, or any path
/// under a `bin/` directory.
pub fn is_primary_file(file_name: &str) -> bool {
    file_name.starts_with("/etc/") || file_name == "/usr/lib/sendmail" || file_name.contains("bin/")
}

/// Removes requires entries that the package already satisfies for itself:
/// either an exact match against one of its own provides (auto-generated
/// soname/self provides), or a path requirement on one of its own regular
/// files where that path is a [`is_primary_file`] path.
fn filter_self_requires(
    requires: Vec<DependencyEntry>,
    provides: &[DependencyEntry],
    own_files: &HashSet<String>,
) -> Vec<DependencyEntry> {
    let provide_keys: HashSet<(String, Option<String>, Option<String>, Option<String>, Option<String>)> =
        provides
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    p.epoch.clone(),
                    p.release.clone(),
                    p.version.clone(),
                    p.flags.clone(),
                )
            })
            .collect();

    requires
        .into_iter()
        .filter(|r| {
            let key = (
                r.name.clone(),
                r.epoch.clone(),
                r.release.clone(),
                r.version.clone(),
                r.flags.clone(),
            );
            if provide_keys.contains(&key) {
                return false;
            }
            if own_files.contains(&r.name) && is_primary_file(&r.name) {
                return false;
            }
            true
        })
        .collect()
}

pub fn header_to_primary(
    pkg: &RpmPackage,
    location: String,
    package_size: u64,
    file_time: f64,
    pkg_checksum: ContentDigest,
) -> PrimaryPackage {
    let arch = arch_from_header(pkg);
    let files = get_files(pkg);
    let own_file_names: HashSet<String> = files
        .iter()
        .filter(|f| f.file_type == FileType::File)
        .map(|f| f.name.clone())
        .collect();

    let provides = dependency_entries(
        pkg.header.get_string_array(TAG_PROVIDENAME),
        pkg.header.get_i32_array(TAG_PROVIDEFLAGS),
        pkg.header.get_string_array(TAG_PROVIDEVERSION),
        false,
    );
    let requires = filter_self_requires(
        dependency_entries(
            pkg.header.get_string_array(TAG_REQUIRENAME),
            pkg.header.get_i32_array(TAG_REQUIREFLAGS),
            pkg.header.get_string_array(TAG_REQUIREVERSION),
            true,
        ),
        &provides,
        &own_file_names,
    );
    let conflicts = dependency_entries(
        pkg.header.get_string_array(TAG_CONFLICTNAME),
        pkg.header.get_i32_array(TAG_CONFLICTFLAGS),
        pkg.header.get_string_array(TAG_CONFLICTVERSION),
        false,
    );
    let obsoletes = dependency_entries(
        pkg.header.get_string_array(TAG_OBSOLETENAME),
        pkg.header.get_i32_array(TAG_OBSOLETEFLAGS),
        pkg.header.get_string_array(TAG_OBSOLETEVERSION),
        false,
    );

    let archive_size = pkg
        .signature
        .get_i64(SIG_TAG_PAYLOADSIZE)
        .or_else(|| pkg.header.get_i64(TAG_ARCHIVESIZE))
        .unwrap_or(0) as u64;

    PrimaryPackage {
        nevra: nevra(pkg, arch),
        checksum: pkg_checksum,
        checksum_is_pkg_id: true,
        summary: pkg.header.get_string(TAG_SUMMARY).unwrap_or_default().to_string(),
        description: pkg
            .header
            .get_string(TAG_DESCRIPTION)
            .unwrap_or_default()
            .to_string(),
        packager: pkg.header.get_string(TAG_PACKAGER).unwrap_or_default().to_string(),
        url: pkg.header.get_string(TAG_URL).unwrap_or_default().to_string(),
        license: pkg.header.get_string(TAG_LICENSE).unwrap_or_default().to_string(),
        vendor: pkg.header.get_string(TAG_VENDOR).unwrap_or_default().to_string(),
        group: pkg.header.get_string(TAG_GROUP).unwrap_or_default().to_string(),
        buildhost: pkg.header.get_string(TAG_BUILDHOST).unwrap_or_default().to_string(),
        sourcerpm: pkg.header.get_string(TAG_SOURCERPM).unwrap_or_default().to_string(),
        header_start: pkg.header_start as u64,
        header_end: pkg.header_end as u64,
        build_time: pkg.header.get_i64(TAG_BUILDTIME).unwrap_or(0),
        file_time,
        package_size,
        installed_size: pkg.header.get_i64(TAG_SIZE).unwrap_or(0) as u64,
        archive_size,
        location,
        provides,
        requires,
        conflicts,
        obsoletes,
        files,
        changelog: changelog_entries(pkg),
    }
}

pub fn header_to_filelists(pkg: &RpmPackage, pkg_id: String) -> FilelistsPackage {
    let arch = arch_from_header(pkg);
    FilelistsPackage {
        nevra: nevra(pkg, arch),
        pkg_id,
        files: get_files(pkg),
    }
}

pub fn header_to_other(pkg: &RpmPackage, pkg_id: String) -> OtherPackage {
    let arch = arch_from_header(pkg);
    OtherPackage {
        nevra: nevra(pkg, arch),
        pkg_id,
        changelog: changelog_entries(pkg),
    }
}

/// Port of rpm's `rpmvercmp`: compares version/release strings segment by
/// segment, alternating numeric and alphabetic runs; a `~` sorts before
/// everything, including the end of the string.
pub fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    let mut a = a.as_bytes();
    let mut b = b.as_bytes();

    loop {
        while a.first().is_some_and(|c| !c.is_ascii_alphanumeric() && *c != b'~') {
            a = &a[1..];
        }
        while b.first().is_some_and(|c| !c.is_ascii_alphanumeric() && *c != b'~') {
            b = &b[1..];
        }

        if a.first() == Some(&b'~') || b.first() == Some(&b'~') {
            if a.first() != Some(&b'~') {
                return Ordering::Greater;
            }
            if b.first() != Some(&b'~') {
                return Ordering::Less;
            }
            a = &a[1..];
            b = &b[1..];
            continue;
        }

        if a.is_empty() || b.is_empty() {
            break;
        }

        let a_digit = a[0].is_ascii_digit();
        let (a_seg, a_rest) = take_run(a, a_digit);
        let (b_seg, b_rest) = take_run(b, a_digit);

        if b_seg.is_empty() {
            return if a_digit { Ordering::Greater } else { Ordering::Less };
        }

        let ord = if a_digit {
            let a_trim = trim_leading_zeros(a_seg);
            let b_trim = trim_leading_zeros(b_seg);
            a_trim.len().cmp(&b_trim.len()).then_with(|| a_trim.cmp(b_trim))
        } else {
            a_seg.cmp(b_seg)
        };
        if ord != Ordering::Equal {
            return ord;
        }

        a = a_rest;
        b = b_rest;
    }

    a.len().cmp(&b.len())
}

fn take_run(s: &[u8], digit: bool) -> (&[u8], &[u8]) {
    let end = s
        .iter()
        .position(|c| c.is_ascii_digit() != digit)
        .unwrap_or(s.len());
    s.split_at(end)
}

fn trim_leading_zeros(s: &[u8]) -> &[u8] {
    match s.iter().position(|c| *c != b'0') {
        Some(i) => &s[i..],
        None => &s[s.len().saturating_sub(1)..],
    }
}

/// Returns the version content embedded in a dependency's `(FLAGS VER)`-style
/// display string, if present. A dependency with no parenthesized version
/// sorts lower than one that has one.
pub fn compare_dependency_versions(a: Option<&str>, b: Option<&str>) -> std::cmp::Ordering {
    match (a, b) {
        (None, None) => std::cmp::Ordering::Equal,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (Some(_), None) => std::cmp::Ordering::Greater,
        (Some(a), Some(b)) => compare_versions(a, b),
    }
}
