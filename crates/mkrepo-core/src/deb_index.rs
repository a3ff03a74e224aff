// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! In-memory `PackageIndex`/`SourceIndex` collections and the `Packages`/
`Sources`/`Release` emission they feed, grounded on
`original_source/debrepo.py`'s `PkgRepo`/`SourceRepo`/`Release` classes and
dump_string methods. */

use {
    crate::error::{MkrepoError, Result},
    mkrepo_deb::{ChecksumType, ControlField, ControlFieldValue, ControlFile, ControlParagraph},
    std::{borrow::Cow, collections::BTreeMap},
};

/// (Package, Version, Architecture).
pub type BinaryIdentity = (String, String, String);
/// (Package, Version).
pub type SourceIdentity = (String, String);

fn field(p: &ControlParagraph, name: &str) -> String {
    p.first_field_str(name).unwrap_or_default().to_string()
}

/// A `(distribution, component, architecture)` slot's set of binary units.
#[derive(Default)]
pub struct PackageIndex {
    units: BTreeMap<BinaryIdentity, ControlParagraph<'static>>,
}

impl PackageIndex {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn insert(&mut self, paragraph: ControlParagraph<'static>) {
        let identity = (
            field(&paragraph, "Package"),
            field(&paragraph, "Version"),
            field(&paragraph, "Architecture"),
        );
        self.units.insert(identity, paragraph);
    }

    pub fn get(&self, identity: &BinaryIdentity) -> Option<&ControlParagraph<'static>> {
        self.units.get(identity)
    }

    pub fn units(&self) -> impl Iterator<Item = &ControlParagraph<'static>> {
        self.units.values()
    }

    /// Parse a `Packages` file's contents into an index.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(data);
        let control = ControlFile::parse_str(&text).map_err(|e| MkrepoError::MalformedIndex {
            path: "Packages".to_string(),
            reason: e.to_string(),
        })?;

        let mut index = Self::default();
        for paragraph in control.into_paragraphs() {
            index.insert(paragraph);
        }
        Ok(index)
    }
}

/// A `(distribution, component)` slot's set of source units.
#[derive(Default)]
pub struct SourceIndex {
    units: BTreeMap<SourceIdentity, ControlParagraph<'static>>,
}

impl SourceIndex {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn insert(&mut self, paragraph: ControlParagraph<'static>) {
        let identity = (field(&paragraph, "Package"), field(&paragraph, "Version"));
        self.units.insert(identity, paragraph);
    }

    pub fn units(&self) -> impl Iterator<Item = &ControlParagraph<'static>> {
        self.units.values()
    }

    /// Parse a `Sources` file's contents into an index.
    ///
    /// The paragraphs already key on `Package` (the rename from `Source`
    /// happens once, at `.dsc` parse time), so this reads like an ordinary
    /// control file rather than going through `SourceControl`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(data);
        let control = ControlFile::parse_str(&text).map_err(|e| MkrepoError::MalformedIndex {
            path: "Sources".to_string(),
            reason: e.to_string(),
        })?;

        let mut index = Self::default();
        for paragraph in control.into_paragraphs() {
            index.insert(paragraph);
        }
        Ok(index)
    }
}

fn paragraph_field_bytes(p: &ControlParagraph) -> Vec<u8> {
    let mut buf = Vec::new();
    for f in p.iter_fields() {
        f.write(&mut buf).expect("writing to a Vec cannot fail");
    }
    buf
}

fn dump_units<'a>(units: impl Iterator<Item = &'a ControlParagraph<'static>>) -> Vec<u8> {
    let mut buf = Vec::new();
    for (i, unit) in units.enumerate() {
        if i > 0 {
            buf.push(b'\n');
        }
        buf.extend_from_slice(&paragraph_field_bytes(unit));
    }
    buf.push(b'\n');
    buf
}

/// Emit the plain-text `Packages` form (§4.6).
pub fn dump_packages(index: &PackageIndex) -> Vec<u8> {
    dump_units(index.units())
}

/// Emit the plain-text `Sources` form (§4.6).
pub fn dump_sources(index: &SourceIndex) -> Vec<u8> {
    dump_units(index.units())
}

/// Gzip-compress `data`, matching `debrepo.py`'s `gzip_string`.
pub fn gzip_bytes(data: &[u8]) -> Vec<u8> {
    use std::io::Write;
    let mut encoder = libflate::gzip::Encoder::new(Vec::new()).expect("gzip encoder init");
    encoder.write_all(data).expect("writing to a Vec cannot fail");
    encoder.finish().into_result().expect("gzip finish cannot fail")
}

/// Bzip2-compress `data`, matching `debrepo.py`'s `bz2_string`.
pub fn bz2_bytes(data: &[u8]) -> Vec<u8> {
    use {bzip2::write::BzEncoder, std::io::Write};
    let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(data).expect("writing to a Vec cannot fail");
    encoder.finish().expect("bzip2 finish cannot fail")
}

/// One emitted file's manifest entry: relative path, size, and digests.
pub struct ManifestEntry {
    pub relative_path: String,
    pub size: u64,
    pub md5: Vec<u8>,
    pub sha1: Vec<u8>,
    pub sha256: Vec<u8>,
}

impl ManifestEntry {
    pub fn new(relative_path: String, data: &[u8]) -> Self {
        Self {
            relative_path,
            size: data.len() as u64,
            md5: ChecksumType::Md5.digest_bytes(data).digest_bytes().to_vec(),
            sha1: ChecksumType::Sha1.digest_bytes(data).digest_bytes().to_vec(),
            sha256: ChecksumType::Sha256.digest_bytes(data).digest_bytes().to_vec(),
        }
    }
}

/// Construct the `dists/<dist>/Release` control paragraph (§4.7).
#[allow(clippy::too_many_arguments)]
pub fn build_release(
    origin: &str,
    label: &str,
    codename: &str,
    date_rfc2822: &str,
    architectures: &[String],
    components: &[String],
    description: &str,
    entries: &[ManifestEntry],
) -> ControlParagraph<'static> {
    let mut p = ControlParagraph::default();
    let mut add = |name: &'static str, value: String| {
        p.add_field(ControlField::new(
            Cow::Borrowed(name),
            ControlFieldValue::from(Cow::Owned(value)),
        ));
    };

    add("Origin", origin.to_string());
    add("Label", label.to_string());
    add("Codename", codename.to_string());
    add("Date", date_rfc2822.to_string());
    add("Architectures", architectures.join(" "));
    add("Components", components.join(" "));
    add("Description", description.to_string());

    for entry in entries {
        p.append_field_line(
            "MD5Sum",
            &format!("{} {:>16} {}", hex::encode(&entry.md5), entry.size, entry.relative_path),
        );
    }
    for entry in entries {
        p.append_field_line(
            "SHA1",
            &format!("{} {:>16} {}", hex::encode(&entry.sha1), entry.size, entry.relative_path),
        );
    }
    for entry in entries {
        p.append_field_line(
            "SHA256",
            &format!("{} {:>16} {}", hex::encode(&entry.sha256), entry.size, entry.relative_path),
        );
    }

    p
}

/// RFC-2822 rendering of "now", matching `debrepo.py`'s `rfc_2822_now_str`.
pub fn rfc2822_now() -> String {
    chrono::Utc::now().to_rfc2822()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(fields: &[(&str, &str)]) -> ControlParagraph<'static> {
        let mut p = ControlParagraph::default();
        for (k, v) in fields {
            p.add_field(ControlField::new(
                Cow::Owned((*k).to_string()),
                ControlFieldValue::from(Cow::Owned((*v).to_string())),
            ));
        }
        p
    }

    #[test]
    fn dump_packages_joins_with_single_blank_line_and_trailing_newline() {
        let mut index = PackageIndex::default();
        index.insert(paragraph(&[("Package", "a"), ("Version", "1"), ("Architecture", "amd64")]));
        index.insert(paragraph(&[("Package", "b"), ("Version", "1"), ("Architecture", "amd64")]));

        let dump = dump_packages(&index);
        let text = String::from_utf8(dump).unwrap();
        assert_eq!(text.matches("\n\n").count(), 1);
        assert!(text.ends_with('\n'));
        assert!(!text.ends_with("\n\n"));
    }

    #[test]
    fn parse_roundtrips_identity() {
        let mut index = PackageIndex::default();
        index.insert(paragraph(&[("Package", "a"), ("Version", "1"), ("Architecture", "amd64")]));
        let dump = dump_packages(&index);

        let parsed = PackageIndex::parse(&dump).unwrap();
        assert!(parsed
            .get(&("a".to_string(), "1".to_string(), "amd64".to_string()))
            .is_some());
    }
}
