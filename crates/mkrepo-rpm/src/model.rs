// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! In-memory representation of a package's repository metadata, shared by
the header transform and the XML emitters. */

use crate::io::ContentDigest;

/// The (name, epoch, version, release) tuple that identifies an RPM package
/// for sorting and deduplication purposes across primary/filelists/other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nevra {
    pub name: String,
    pub epoch: Option<String>,
    pub version: String,
    pub release: String,
    pub arch: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    pub name: String,
    pub flags: Option<String>,
    pub epoch: Option<String>,
    pub version: Option<String>,
    pub release: Option<String>,
    /// Only meaningful for `requires`: whether this is a prereq/scriptlet
    /// ordering dependency (`pre="1"` in the emitted XML).
    pub pre: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileType {
    File,
    Dir,
    Ghost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub file_type: FileType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub author: String,
    pub date: i64,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PrimaryPackage {
    pub nevra: Nevra,
    pub checksum: ContentDigest,
    pub checksum_is_pkg_id: bool,
    pub summary: String,
    pub description: String,
    pub packager: String,
    pub url: String,
    pub license: String,
    pub vendor: String,
    pub group: String,
    pub buildhost: String,
    pub sourcerpm: String,
    pub header_start: u64,
    pub header_end: u64,
    pub build_time: i64,
    pub file_time: f64,
    pub package_size: u64,
    pub installed_size: u64,
    pub archive_size: u64,
    pub location: String,
    pub provides: Vec<DependencyEntry>,
    pub requires: Vec<DependencyEntry>,
    pub conflicts: Vec<DependencyEntry>,
    pub obsoletes: Vec<DependencyEntry>,
    pub files: Vec<FileRecord>,
    pub changelog: Vec<ChangelogEntry>,
}

#[derive(Debug, Clone)]
pub struct FilelistsPackage {
    pub nevra: Nevra,
    pub pkg_id: String,
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Clone)]
pub struct OtherPackage {
    pub nevra: Nevra,
    pub pkg_id: String,
    pub changelog: Vec<ChangelogEntry>,
}

/// One `<data>` block of `repomd.xml`: the content-addressed location of a
/// gzip-compressed metadata file plus its compressed/uncompressed checksums
/// and sizes.
#[derive(Debug, Clone)]
pub struct RepomdDataEntry {
    pub data_type: String,
    pub location: String,
    pub checksum: ContentDigest,
    pub size: u64,
    pub open_checksum: ContentDigest,
    pub open_size: u64,
    pub timestamp: i64,
}
