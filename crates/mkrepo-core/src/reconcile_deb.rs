// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! The APT reconciliation driver (§4.9 DEB flow), grounded on
`original_source/debrepo.py`'s `update_repo`. */

use {
    crate::{
        deb_filename::{infer_dist_from_pool_path, parse_deb_filename},
        deb_index::{
            bz2_bytes, build_release, dump_packages, dump_sources, gzip_bytes, rfc2822_now,
            ManifestEntry, PackageIndex, SourceIndex,
        },
        error::MkrepoError,
        traits::{SignMode, SignOptions, Signer, Storage},
        Result,
    },
    mkrepo_deb::{ChecksumType, ControlParagraph, DebPackageReference, InMemoryDebFile, SourceControl},
    std::{
        borrow::Cow,
        collections::{BTreeMap, BTreeSet},
    },
};

/// Configuration for one `reconcile_deb` call, sourced from §6.4's
/// environment options.
pub struct DebReconcileOptions {
    /// Record malformed artifacts and continue, rather than aborting.
    pub force: bool,
    pub origin: String,
    pub label: String,
    pub description: String,
}

impl Default for DebReconcileOptions {
    fn default() -> Self {
        Self {
            force: false,
            origin: "Repo generator".to_string(),
            label: "Repo generator".to_string(),
            description: "Repo generator".to_string(),
        }
    }
}

/// Summary of one reconcile pass, for the CLI's progress reporting.
#[derive(Default)]
pub struct DebReconcileReport {
    pub distributions: Vec<String>,
    pub malformed: BTreeMap<String, Vec<String>>,
}

fn field(p: &ControlParagraph, name: &str) -> String {
    p.first_field_str(name).unwrap_or_default().to_string()
}

fn set_field(p: &mut ControlParagraph<'static>, name: &'static str, value: String) {
    p.set_field(Cow::Borrowed(name), Cow::Owned(value));
}

/// Build a complete BinaryPackage unit (§3) from a `.deb`'s raw bytes, its
/// pool path and its storage mtime.
fn build_binary_unit(
    pool_path: &str,
    data: Vec<u8>,
    mtime: f64,
) -> std::result::Result<ControlParagraph<'static>, MkrepoError> {
    let filename = pool_path.rsplit('/').next().unwrap_or(pool_path).to_string();
    let deb = InMemoryDebFile::new(filename.clone(), data);

    let mut unit = deb.control_file()?;

    set_field(&mut unit, "Filename", pool_path.to_string());
    set_field(&mut unit, "Size", deb.size_bytes().to_string());
    set_field(&mut unit, "FileTime", mtime.to_string());
    set_field(
        &mut unit,
        "MD5Sum",
        hex::encode(deb.digest(ChecksumType::Md5)?),
    );
    set_field(
        &mut unit,
        "SHA1",
        hex::encode(deb.digest(ChecksumType::Sha1)?),
    );
    set_field(
        &mut unit,
        "SHA256",
        hex::encode(deb.digest(ChecksumType::Sha256)?),
    );

    Ok(unit)
}

/// Build a complete SourcePackage unit (§3) from a `.dsc`'s raw bytes and
/// pool path.
fn build_source_unit(
    pool_path: &str,
    data: &[u8],
) -> std::result::Result<ControlParagraph<'static>, MkrepoError> {
    let text = String::from_utf8_lossy(data);
    let source = SourceControl::parse_str(&text).map_err(|e| MkrepoError::MalformedArtifact {
        path: pool_path.to_string(),
        reason: e.to_string(),
    })?;
    let mut unit = source.general_paragraph().clone();

    let directory = pool_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let basename = pool_path.rsplit('/').next().unwrap_or(pool_path);

    set_field(&mut unit, "Directory", directory.to_string());

    let size = data.len();
    unit.append_field_line(
        "Files",
        &format!(
            "{} {} {}",
            hex::encode(ChecksumType::Md5.digest_bytes(data).digest_bytes()),
            size,
            basename
        ),
    );
    unit.append_field_line(
        "Checksums-Sha1",
        &format!(
            "{} {} {}",
            hex::encode(ChecksumType::Sha1.digest_bytes(data).digest_bytes()),
            size,
            basename
        ),
    );
    unit.append_field_line(
        "Checksums-Sha256",
        &format!(
            "{} {} {}",
            hex::encode(ChecksumType::Sha256.digest_bytes(data).digest_bytes()),
            size,
            basename
        ),
    );

    Ok(unit)
}

fn parse_mtime(s: &str) -> Option<f64> {
    s.parse().ok()
}

/// Write one emitted `Packages`/`Sources` family (plain + gz + bz2) and
/// return its manifest entries (§4.6).
fn emit_family(
    storage: &dyn Storage,
    plain: Vec<u8>,
    base_key: &str,
    base_relative: &str,
) -> Result<Vec<ManifestEntry>> {
    let gz = gzip_bytes(&plain);
    let bz2 = bz2_bytes(&plain);

    let files: [(&str, &str, &[u8]); 3] = [
        ("", base_relative, &plain),
        (".gz", base_relative, &gz),
        (".bz2", base_relative, &bz2),
    ];

    let mut entries = Vec::new();
    for (ext, relative, bytes) in files {
        let key = format!("{base_key}{ext}");
        storage.write(&key, bytes)?;
        entries.push(ManifestEntry::new(format!("{relative}{ext}"), bytes));
    }
    Ok(entries)
}

/// Run one full DEB reconcile pass over `storage`.
pub fn reconcile_deb(
    storage: &dyn Storage,
    signer: Option<&dyn Signer>,
    options: &DebReconcileOptions,
) -> Result<DebReconcileReport> {
    // Step 1: discover existing distributions and their indices.
    let mut binary_indices: BTreeMap<(String, String), PackageIndex> = BTreeMap::new();
    let mut source_indices: BTreeMap<String, SourceIndex> = BTreeMap::new();
    let mut known_dists: BTreeSet<String> = BTreeSet::new();

    for key in storage.list("dists/")? {
        let Some(rest) = key.strip_prefix("dists/") else {
            continue;
        };
        let Some(dist) = rest.strip_suffix("/Release") else {
            continue;
        };
        if dist.contains('/') {
            continue;
        }
        known_dists.insert(dist.to_string());
    }

    for dist in &known_dists {
        for arch_key in storage.list(&format!("dists/{dist}/main/"))? {
            if let Some(rest) = arch_key.strip_prefix(&format!("dists/{dist}/main/binary-")) {
                if let Some(arch) = rest.strip_suffix("/Packages") {
                    let data = storage.read(&arch_key)?;
                    let index = PackageIndex::parse(&data)?;
                    binary_indices.insert((dist.to_string(), arch.to_string()), index);
                }
            }
        }

        let sources_key = format!("dists/{dist}/main/source/Sources");
        if storage.exists(&sources_key)? {
            let data = storage.read(&sources_key)?;
            source_indices.insert(dist.to_string(), SourceIndex::parse(&data)?);
        }
    }

    // Step 2: mtime map keyed by Filename.
    let mut binary_mtimes: BTreeMap<String, f64> = BTreeMap::new();
    for index in binary_indices.values() {
        for unit in index.units() {
            let filename = field(unit, "Filename");
            if let Some(mtime) = unit.first_field_str("FileTime").and_then(parse_mtime) {
                if !filename.is_empty() {
                    binary_mtimes.insert(filename, mtime);
                }
            }
        }
    }

    let mut malformed: BTreeMap<String, Vec<String>> = BTreeMap::new();

    // Steps 3-4: binary packages.
    for path in storage.list("pool/")? {
        if !path.ends_with(".deb") {
            continue;
        }
        let basename = path.rsplit('/').next().unwrap_or(&path);

        let Some(filename) = parse_deb_filename(basename) else {
            let dist = infer_dist_from_pool_path(&path);
            if options.force {
                malformed.entry(dist).or_default().push(path.clone());
                continue;
            }
            return Err(MkrepoError::FilenameUnparseable(path));
        };

        let (dist, _component, arch) = crate::deb_filename::split_pool_path(&path, &filename);
        known_dists.insert(dist.clone());

        let current_mtime = storage.mtime(&path)?;
        if binary_mtimes.get(&path).copied() == Some(current_mtime) {
            continue;
        }

        let data = storage.read(&path)?;
        match build_binary_unit(&path, data, current_mtime) {
            Ok(unit) => {
                binary_indices
                    .entry((dist, arch))
                    .or_default()
                    .insert(unit);
            }
            Err(e) => {
                if options.force {
                    malformed.entry(dist).or_default().push(path);
                } else {
                    return Err(e.into());
                }
            }
        }
    }

    // Step 5: source packages.
    for path in storage.list("pool/")? {
        if !path.ends_with(".dsc") {
            continue;
        }
        let dist = infer_dist_from_pool_path(&path);
        known_dists.insert(dist.clone());

        let data = storage.read(&path)?;
        match build_source_unit(&path, &data) {
            Ok(unit) => {
                source_indices.entry(dist).or_default().insert(unit);
            }
            Err(e) => {
                if options.force {
                    malformed.entry(dist).or_default().push(path);
                } else {
                    return Err(e.into());
                }
            }
        }
    }

    // Step 6: emit.
    let date = rfc2822_now();
    for dist in &known_dists {
        let mut entries = Vec::new();
        let mut architectures = BTreeSet::new();

        for ((d, arch), index) in &binary_indices {
            if d != dist || index.is_empty() {
                continue;
            }
            architectures.insert(arch.clone());
            let relative = format!("main/binary-{arch}/Packages");
            let key = format!("dists/{dist}/{relative}");
            entries.extend(emit_family(storage, dump_packages(index), &key, &relative)?);
        }

        if let Some(index) = source_indices.get(dist) {
            if !index.is_empty() {
                let relative = "main/source/Sources".to_string();
                let key = format!("dists/{dist}/{relative}");
                entries.extend(emit_family(storage, dump_sources(index), &key, &relative)?);
            }
        }

        let release = build_release(
            &options.origin,
            &options.label,
            dist,
            &date,
            &architectures.into_iter().collect::<Vec<_>>(),
            &["main".to_string()],
            &options.description,
            &entries,
        );

        let mut release_bytes = Vec::new();
        release
            .write(&mut release_bytes)
            .map_err(MkrepoError::Io)?;
        storage.write(&format!("dists/{dist}/Release"), &release_bytes)?;

        if let Some(signer) = signer {
            let detached = signer.sign(&release_bytes, SignMode::Detached, &SignOptions::default())?;
            storage.write(&format!("dists/{dist}/Release.gpg"), &detached)?;
            let cleartext = signer.sign(&release_bytes, SignMode::Cleartext, &SignOptions::default())?;
            storage.write(&format!("dists/{dist}/InRelease"), &cleartext)?;
        }

        let malformed_key = format!("dists/{dist}/malformed_list.txt");
        match malformed.get(dist) {
            Some(paths) if !paths.is_empty() => {
                storage.write(&malformed_key, paths.join("\n").as_bytes())?;
            }
            _ => {
                storage.delete(&malformed_key)?;
            }
        }
    }

    Ok(DebReconcileReport {
        distributions: known_dists.into_iter().collect(),
        malformed,
    })
}
