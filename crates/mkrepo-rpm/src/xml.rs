// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Hand-built emission of primary.xml, filelists.xml, other.xml and
repomd.xml. These formats require exact attribute ordering and presence
rules that a generic serializer can't guarantee, so each is built with a
plain string buffer, matching the reference `createrepo`-style generators
this crate's layout is ported from. */

use crate::model::{
    DependencyEntry, FileRecord, FileType, FilelistsPackage, Nevra, OtherPackage,
    PrimaryPackage, RepomdDataEntry,
};
use crate::transform::{compare_versions, is_primary_file};

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

fn push_version_attr(out: &mut String, nevra: &Nevra) {
    out.push_str(&format!(
        "<version epoch=\"{}\" ver=\"{}\" rel=\"{}\"/>",
        escape_attr(nevra.epoch.as_deref().unwrap_or("0")),
        escape_attr(&nevra.version),
        escape_attr(&nevra.release),
    ));
}

fn push_dependency_entries(out: &mut String, tag: &str, entries: &[DependencyEntry]) {
    if entries.is_empty() {
        return;
    }
    out.push_str(&format!("<rpm:{}>", tag));
    for entry in entries {
        out.push_str("<rpm:entry name=\"");
        out.push_str(&escape_attr(&entry.name));
        out.push('"');
        if let Some(flags) = &entry.flags {
            out.push_str(&format!(" flags=\"{}\"", escape_attr(flags)));
            if let Some(epoch) = &entry.epoch {
                out.push_str(&format!(" epoch=\"{}\"", escape_attr(epoch)));
            }
            if let Some(ver) = &entry.version {
                out.push_str(&format!(" ver=\"{}\"", escape_attr(ver)));
            }
            if let Some(rel) = &entry.release {
                out.push_str(&format!(" rel=\"{}\"", escape_attr(rel)));
            }
        }
        if entry.pre {
            out.push_str(" pre=\"1\"");
        }
        out.push_str("/>");
    }
    out.push_str(&format!("</rpm:{}>", tag));
}

/// The soname version `libc.so.6` carries lives in the parenthesized token
/// of the dependency *name* (e.g. `libc.so.6(GLIBC_2.4)(64bit)`), not in
/// `REQUIREVERSION` — every libc entry has `version: None`. Returns the
/// content of the first `(...)` group, or `""` for a bare `libc.so.6`/
/// `libc.so.6()(64bit)`-style entry, which sorts lower than any versioned one.
fn libc_paren_token(name: &str) -> &str {
    match name.find('(') {
        Some(start) => {
            let rest = &name[start + 1..];
            match rest.find(')') {
                Some(end) => &rest[..end],
                None => "",
            }
        }
        None => "",
    }
}

/// Folds consecutive `libc.so.6`-prefixed requires entries down to the one
/// with the highest parenthesized version, the same way the repository
/// generator this is ported from avoids flooding `rpm:requires` with every
/// individual libc symbol version a package happens to need. Expects
/// `requires` already sorted by identity tuple, so matching entries are
/// contiguous.
fn fold_libc_requires(requires: &[DependencyEntry]) -> Vec<DependencyEntry> {
    let mut out: Vec<DependencyEntry> = Vec::with_capacity(requires.len());
    let mut libc_highest: Option<&DependencyEntry> = None;

    for entry in requires {
        if entry.name.starts_with("libc.so.6") {
            libc_highest = match libc_highest {
                None => Some(entry),
                Some(current) => {
                    if compare_versions(libc_paren_token(&entry.name), libc_paren_token(&current.name))
                        == std::cmp::Ordering::Greater
                    {
                        Some(entry)
                    } else {
                        Some(current)
                    }
                }
            };
            continue;
        }
        if let Some(highest) = libc_highest.take() {
            out.push(highest.clone());
        }
        out.push(entry.clone());
    }
    if let Some(highest) = libc_highest.take() {
        out.push(highest.clone());
    }
    out
}

/// Sorts a dependency list by the `(name, epoch, release, version)` identity
/// tuple, `None` treated as `""`, matching the reference generator's
/// deterministic ordering for `provides`/`requires`/`conflicts`/`obsoletes`.
fn sort_dependencies(entries: &mut [DependencyEntry]) {
    entries.sort_by(|a, b| {
        let ka = (
            a.name.as_str(),
            a.epoch.as_deref().unwrap_or(""),
            a.release.as_deref().unwrap_or(""),
            a.version.as_deref().unwrap_or(""),
        );
        let kb = (
            b.name.as_str(),
            b.epoch.as_deref().unwrap_or(""),
            b.release.as_deref().unwrap_or(""),
            b.version.as_deref().unwrap_or(""),
        );
        ka.cmp(&kb)
    });
}

fn push_files(out: &mut String, files: &[FileRecord], only_primary: bool) {
    for file in files {
        if only_primary {
            if file.file_type != FileType::File || !is_primary_file(&file.name) {
                continue;
            }
            out.push_str(&format!("<file>{}</file>", escape_text(&file.name)));
        } else {
            match file.file_type {
                FileType::Dir => out.push_str(&format!(
                    "<file type=\"dir\">{}</file>",
                    escape_text(&file.name)
                )),
                FileType::Ghost => out.push_str(&format!(
                    "<file type=\"ghost\">{}</file>",
                    escape_text(&file.name)
                )),
                FileType::File => out.push_str(&format!("<file>{}</file>", escape_text(&file.name))),
            }
        }
    }
}

pub fn emit_primary(packages: &[PrimaryPackage]) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<metadata xmlns=\"http://linux.duke.edu/metadata/common\" xmlns:rpm=\"http://linux.duke.edu/metadata/rpm\" packages=\"{}\">",
        packages.len()
    ));

    for pkg in packages {
        out.push_str("<package type=\"rpm\">");
        out.push_str(&format!("<name>{}</name>", escape_text(&pkg.nevra.name)));
        out.push_str(&format!("<arch>{}</arch>", escape_text(&pkg.nevra.arch)));
        push_version_attr(&mut out, &pkg.nevra);
        out.push_str(&format!(
            "<checksum type=\"{}\" pkgid=\"{}\">{}</checksum>",
            digest_type_name(&pkg.checksum),
            if pkg.checksum_is_pkg_id { "YES" } else { "NO" },
            pkg.checksum.digest_hex(),
        ));
        out.push_str(&format!("<summary>{}</summary>", escape_text(&pkg.summary)));
        out.push_str(&format!(
            "<description>{}</description>",
            escape_text(&pkg.description)
        ));
        out.push_str(&format!("<packager>{}</packager>", escape_text(&pkg.packager)));
        out.push_str(&format!("<url>{}</url>", escape_text(&pkg.url)));
        out.push_str(&format!(
            "<time file=\"{}\" build=\"{}\"/>",
            pkg.file_time as i64, pkg.build_time
        ));
        out.push_str(&format!(
            "<size package=\"{}\" installed=\"{}\" archive=\"{}\"/>",
            pkg.package_size, pkg.installed_size, pkg.archive_size
        ));
        out.push_str(&format!(
            "<location href=\"{}\"/>",
            escape_attr(&pkg.location)
        ));
        out.push_str("<format>");
        out.push_str(&format!(
            "<rpm:license>{}</rpm:license>",
            escape_text(&pkg.license)
        ));
        if !pkg.vendor.is_empty() {
            out.push_str(&format!("<rpm:vendor>{}</rpm:vendor>", escape_text(&pkg.vendor)));
        }
        out.push_str(&format!("<rpm:group>{}</rpm:group>", escape_text(&pkg.group)));
        out.push_str(&format!(
            "<rpm:buildhost>{}</rpm:buildhost>",
            escape_text(&pkg.buildhost)
        ));
        out.push_str(&format!(
            "<rpm:sourcerpm>{}</rpm:sourcerpm>",
            escape_text(&pkg.sourcerpm)
        ));
        out.push_str(&format!(
            "<rpm:header-range start=\"{}\" end=\"{}\"/>",
            pkg.header_start, pkg.header_end
        ));
        let mut provides = pkg.provides.clone();
        sort_dependencies(&mut provides);
        let mut requires = pkg.requires.clone();
        sort_dependencies(&mut requires);
        let requires = fold_libc_requires(&requires);
        let mut conflicts = pkg.conflicts.clone();
        sort_dependencies(&mut conflicts);
        let mut obsoletes = pkg.obsoletes.clone();
        sort_dependencies(&mut obsoletes);

        push_dependency_entries(&mut out, "provides", &provides);
        push_dependency_entries(&mut out, "requires", &requires);
        if !conflicts.is_empty() {
            push_dependency_entries(&mut out, "conflicts", &conflicts);
        }
        if !obsoletes.is_empty() {
            push_dependency_entries(&mut out, "obsoletes", &obsoletes);
        }
        push_files(&mut out, &pkg.files, true);
        out.push_str("</format>");
        out.push_str("</package>");
    }

    out.push_str("</metadata>\n");
    out
}

pub fn emit_filelists(packages: &[FilelistsPackage]) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<filelists xmlns=\"http://linux.duke.edu/metadata/filelists\" packages=\"{}\">",
        packages.len()
    ));

    for pkg in packages {
        out.push_str(&format!(
            "<package pkgid=\"{}\" name=\"{}\" arch=\"{}\">",
            escape_attr(&pkg.pkg_id),
            escape_attr(&pkg.nevra.name),
            escape_attr(&pkg.nevra.arch),
        ));
        push_version_attr(&mut out, &pkg.nevra);
        push_files(&mut out, &pkg.files, false);
        out.push_str("</package>");
    }

    out.push_str("</filelists>\n");
    out
}

pub fn emit_other(packages: &[OtherPackage]) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<otherdata xmlns=\"http://linux.duke.edu/metadata/other\" packages=\"{}\">",
        packages.len()
    ));

    for pkg in packages {
        out.push_str(&format!(
            "<package pkgid=\"{}\" name=\"{}\" arch=\"{}\">",
            escape_attr(&pkg.pkg_id),
            escape_attr(&pkg.nevra.name),
            escape_attr(&pkg.nevra.arch),
        ));
        push_version_attr(&mut out, &pkg.nevra);
        for entry in &pkg.changelog {
            out.push_str(&format!(
                "<changelog author=\"{}\" date=\"{}\">{}</changelog>",
                escape_attr(&entry.author),
                entry.date,
                escape_text(&entry.text),
            ));
        }
        out.push_str("</package>");
    }

    out.push_str("</otherdata>");
    out
}

pub fn emit_repomd(revision: &str, entries: &[RepomdDataEntry]) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<repomd xmlns=\"http://linux.duke.edu/metadata/repo\">");
    out.push_str(&format!("<revision>{}</revision>", escape_text(revision)));

    for entry in entries {
        out.push_str(&format!("<data type=\"{}\">", escape_attr(&entry.data_type)));
        out.push_str(&format!(
            "<checksum type=\"{}\">{}</checksum>",
            digest_type_name(&entry.checksum),
            entry.checksum.digest_hex(),
        ));
        out.push_str(&format!(
            "<open-checksum type=\"{}\">{}</open-checksum>",
            digest_type_name(&entry.open_checksum),
            entry.open_checksum.digest_hex(),
        ));
        out.push_str(&format!(
            "<location href=\"{}\"/>",
            escape_attr(&entry.location)
        ));
        out.push_str(&format!("<timestamp>{}</timestamp>", entry.timestamp));
        out.push_str(&format!("<size>{}</size>", entry.size));
        out.push_str(&format!("<open-size>{}</open-size>", entry.open_size));
        out.push_str("</data>");
    }

    out.push_str("</repomd>\n");
    out
}

fn digest_type_name(digest: &crate::io::ContentDigest) -> &'static str {
    use crate::io::ContentDigest;
    match digest {
        ContentDigest::Sha1(_) => "sha1",
        ContentDigest::Sha256(_) => "sha256",
    }
}
