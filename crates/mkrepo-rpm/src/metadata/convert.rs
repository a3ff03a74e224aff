// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Bridges the parse-only `metadata::{primary,filelists,other}` structs back
into the [crate::model] records used for re-emission.

Existing, unchanged packages are carried forward from a repository's current
`primary.xml`/`filelists.xml`/`other.xml` rather than being re-derived from
the `.rpm` header on every reconcile; this module is that carry-forward
path. */

use crate::{
    metadata::{filelists, other, primary},
    model::{ChangelogEntry, DependencyEntry, FileRecord, FileType, FilelistsPackage, Nevra, OtherPackage, PrimaryPackage},
    Result,
};

fn nevra_of(name: &str, arch: &str, version: &primary::PackageVersion) -> Nevra {
    Nevra {
        name: name.to_string(),
        epoch: if version.epoch == 0 {
            None
        } else {
            Some(version.epoch.to_string())
        },
        version: version.version.clone(),
        release: version.release.clone(),
        arch: arch.to_string(),
    }
}

fn entries_from(entries: &Option<primary::Entries>) -> Vec<DependencyEntry> {
    entries
        .as_ref()
        .map(|e| {
            e.entries
                .iter()
                .map(|entry| DependencyEntry {
                    name: entry.name.clone(),
                    flags: entry.flags.clone(),
                    epoch: entry.epoch.map(|e| e.to_string()),
                    version: entry.version.clone(),
                    release: entry.release.clone(),
                    pre: entry.pre.map(|p| p != 0).unwrap_or(false),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn file_type_from(t: Option<&str>) -> FileType {
    match t {
        Some("dir") => FileType::Dir,
        Some("ghost") => FileType::Ghost,
        _ => FileType::File,
    }
}

/// Convert a parsed `primary.xml` package back into a [PrimaryPackage].
pub fn primary_from_parsed(pkg: &primary::Package) -> Result<PrimaryPackage> {
    let checksum = pkg.checksum.clone().try_into()?;
    let format = pkg.format.clone().unwrap_or(primary::PackageFormat {
        license: None,
        vendor: None,
        group: None,
        build_host: None,
        source_rpm: None,
        header_range: None,
        provides: None,
        obsoletes: None,
        requires: None,
        conflicts: None,
        suggests: None,
        recommends: None,
        supplements: None,
        files: Vec::new(),
    });

    Ok(PrimaryPackage {
        nevra: nevra_of(&pkg.name, &pkg.arch, &pkg.version),
        checksum,
        checksum_is_pkg_id: true,
        summary: pkg.summary.clone(),
        description: pkg.description.clone(),
        packager: pkg.packager.clone().unwrap_or_default(),
        url: pkg.url.clone().unwrap_or_default(),
        license: format.license.unwrap_or_default(),
        vendor: format.vendor.unwrap_or_default(),
        group: format.group.unwrap_or_default(),
        buildhost: format.build_host.unwrap_or_default(),
        sourcerpm: format.source_rpm.unwrap_or_default(),
        header_start: format.header_range.as_ref().map(|r| r.start).unwrap_or(0),
        header_end: format.header_range.as_ref().map(|r| r.end).unwrap_or(0),
        build_time: pkg.time.build as i64,
        file_time: pkg.time.file as f64,
        package_size: pkg.size.package,
        installed_size: pkg.size.installed,
        archive_size: pkg.size.archive,
        location: pkg.location.href.clone(),
        provides: entries_from(&format.provides),
        requires: entries_from(&format.requires),
        conflicts: entries_from(&format.conflicts),
        obsoletes: entries_from(&format.obsoletes),
        files: format
            .files
            .iter()
            .map(|f| FileRecord {
                name: f.value.clone(),
                file_type: file_type_from(f.file_type.as_deref()),
            })
            .collect(),
        changelog: Vec::new(),
    })
}

fn nevra_fl(pkg: &filelists::Package) -> Nevra {
    Nevra {
        name: pkg.name.clone(),
        epoch: if pkg.version.epoch == 0 {
            None
        } else {
            Some(pkg.version.epoch.to_string())
        },
        version: pkg.version.version.clone(),
        release: pkg.version.release.clone(),
        arch: pkg.arch.clone(),
    }
}

/// Convert a parsed `filelists.xml` package back into a [FilelistsPackage].
pub fn filelists_from_parsed(pkg: &filelists::Package) -> FilelistsPackage {
    FilelistsPackage {
        nevra: nevra_fl(pkg),
        pkg_id: pkg.pkgid.clone(),
        files: pkg
            .files
            .iter()
            .map(|f| FileRecord {
                name: f.value.clone(),
                file_type: file_type_from(f.file_type.as_deref()),
            })
            .collect(),
    }
}

fn nevra_other(pkg: &other::Package) -> Nevra {
    Nevra {
        name: pkg.name.clone(),
        epoch: if pkg.version.epoch == 0 {
            None
        } else {
            Some(pkg.version.epoch.to_string())
        },
        version: pkg.version.version.clone(),
        release: pkg.version.release.clone(),
        arch: pkg.arch.clone(),
    }
}

/// Convert a parsed `other.xml` package back into an [OtherPackage].
pub fn other_from_parsed(pkg: &other::Package) -> OtherPackage {
    OtherPackage {
        nevra: nevra_other(pkg),
        pkg_id: pkg.pkgid.clone(),
        changelog: pkg
            .changelog
            .iter()
            .map(|c| ChangelogEntry {
                author: c.author.clone(),
                date: c.date,
                text: c.text.clone(),
            })
            .collect(),
    }
}
