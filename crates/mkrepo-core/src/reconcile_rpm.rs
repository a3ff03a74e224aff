// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! The YUM reconciliation driver (§4.9 RPM flow), grounded on
`original_source/rpmrepo.py`'s `update_repo`. */

use {
    crate::{
        error::MkrepoError,
        rpm_manifest::{build_repomd, metadata_filename, render_metadata},
        traits::{SignMode, SignOptions, Signer, Storage},
        Result,
    },
    mkrepo_rpm::{
        io::{ContentDigest, DigestFlavor},
        metadata::{
            convert::{filelists_from_parsed, other_from_parsed, primary_from_parsed},
            filelists::Filelists,
            other::Other,
            primary::Primary,
            repomd::RepoMd,
        },
        model::{FilelistsPackage, Nevra, OtherPackage, PrimaryPackage},
        parse_rpm,
        transform::{header_to_filelists, header_to_other, header_to_primary},
    },
    std::collections::{BTreeMap, BTreeSet},
};

#[derive(Default)]
pub struct RpmReconcileOptions {
    pub force: bool,
}

#[derive(Default)]
pub struct RpmReconcileReport {
    pub revision: String,
    pub malformed: Vec<String>,
}

fn location_of(pkg: &PrimaryPackage) -> &str {
    &pkg.location
}

/// Parse the repository's current `repomd.xml` and the metadata files it
/// references, defaulting to empty collections on anything missing or
/// unparseable per §4.9 step 1 / §7's `MalformedIndex` treatment.
fn load_existing(
    storage: &dyn Storage,
) -> Result<(
    String,
    Vec<PrimaryPackage>,
    Vec<FilelistsPackage>,
    Vec<OtherPackage>,
)> {
    let repomd_key = "repodata/repomd.xml";
    if !storage.exists(repomd_key)? {
        return Ok((String::from("0"), Vec::new(), Vec::new(), Vec::new()));
    }

    let repomd_bytes = storage.read(repomd_key)?;
    let repomd = match RepoMd::from_xml(&String::from_utf8_lossy(&repomd_bytes)) {
        Ok(r) => r,
        Err(_) => return Ok((String::from("0"), Vec::new(), Vec::new(), Vec::new())),
    };

    let mut primary = Vec::new();
    let mut filelists = Vec::new();
    let mut other = Vec::new();

    for entry in &repomd.data {
        let location = entry.location.href.clone();
        if !storage.exists(&location)? {
            continue;
        }
        let gz = storage.read(&location)?;
        let mut decoder = libflate::gzip::Decoder::new(std::io::Cursor::new(gz))
            .map_err(|e| MkrepoError::MalformedIndex {
                path: location.clone(),
                reason: e.to_string(),
            })?;
        let mut plain = String::new();
        std::io::Read::read_to_string(&mut decoder, &mut plain).map_err(|e| {
            MkrepoError::MalformedIndex {
                path: location.clone(),
                reason: e.to_string(),
            }
        })?;

        match entry.data_type.as_str() {
            "primary" => {
                if let Ok(parsed) = Primary::from_xml(&plain) {
                    for pkg in &parsed.packages {
                        if let Ok(converted) = primary_from_parsed(pkg) {
                            primary.push(converted);
                        }
                    }
                }
            }
            "filelists" => {
                if let Ok(parsed) = Filelists::from_xml(&plain) {
                    filelists.extend(parsed.packages.iter().map(filelists_from_parsed));
                }
            }
            "other" => {
                if let Ok(parsed) = Other::from_xml(&plain) {
                    other.extend(parsed.packages.iter().map(other_from_parsed));
                }
            }
            _ => {}
        }
    }

    Ok((repomd.revision, primary, filelists, other))
}

/// Run one full RPM reconcile pass over `storage`. `package_root` is the
/// prefix under which `.rpm` files are listed (e.g. `"Packages/"`).
pub fn reconcile_rpm(
    storage: &dyn Storage,
    package_root: &str,
    signer: Option<&dyn Signer>,
    options: &RpmReconcileOptions,
) -> Result<RpmReconcileReport> {
    let (old_revision, mut primary, mut filelists, mut other) = load_existing(storage)?;

    // Step 2: recorded_files keyed by location.
    let recorded: BTreeMap<String, f64> = primary
        .iter()
        .map(|p| (location_of(p).to_string(), p.file_time))
        .collect();

    // Step 3: current files on disk.
    let mut existing: BTreeMap<String, f64> = BTreeMap::new();
    for path in storage.list(package_root)? {
        if path.ends_with(".rpm") {
            let mtime = storage.mtime(&path)?;
            existing.insert(path, mtime);
        }
    }

    // Step 4: deletions — entries recorded but no longer present (or whose
    // mtime changed, which is treated as delete-then-add).
    let mut to_delete: Vec<String> = Vec::new();
    for (location, recorded_mtime) in &recorded {
        let stale = match existing.get(location) {
            None => true,
            Some(current_mtime) => current_mtime != recorded_mtime,
        };
        if stale {
            to_delete.push(location.clone());
        }
    }

    let delete_set: BTreeSet<&str> = to_delete.iter().map(|s| s.as_str()).collect();
    let mut removed_nevras: BTreeSet<Nevra> = BTreeSet::new();
    primary.retain(|p| {
        if delete_set.contains(location_of(p)) {
            removed_nevras.insert(p.nevra.clone());
            false
        } else {
            true
        }
    });
    filelists.retain(|p| !removed_nevras.contains(&p.nevra));
    other.retain(|p| !removed_nevras.contains(&p.nevra));

    // Step 5: additions — new or changed files.
    let mut to_add: Vec<String> = Vec::new();
    for (location, current_mtime) in &existing {
        let fresh = match recorded.get(location) {
            None => true,
            Some(recorded_mtime) => recorded_mtime != current_mtime,
        };
        if fresh {
            to_add.push(location.clone());
        }
    }

    let mut malformed = Vec::new();

    for location in to_add {
        let mtime = existing[&location];
        let data = storage.read(&location)?;

        let parsed = match parse_rpm(&data) {
            Ok(p) => p,
            Err(e) => {
                if options.force {
                    malformed.push(location);
                    continue;
                }
                return Err(MkrepoError::MalformedArtifact {
                    path: location,
                    reason: e.to_string(),
                });
            }
        };

        let pkg_checksum = ContentDigest::of_bytes(DigestFlavor::Sha256, &data);
        let pkg_id = pkg_checksum.digest_hex();

        let new_primary = header_to_primary(&parsed, location.clone(), data.len() as u64, mtime, pkg_checksum);
        let new_filelists = header_to_filelists(&parsed, pkg_id.clone());
        let new_other = header_to_other(&parsed, pkg_id);

        let nevra = new_primary.nevra.clone();
        primary.retain(|p| p.nevra != nevra);
        filelists.retain(|p| p.nevra != nevra);
        other.retain(|p| p.nevra != nevra);

        primary.push(new_primary);
        filelists.push(new_filelists);
        other.push(new_other);
    }

    // Canonicalize emission order by identity tuple, as recommended in §9.
    primary.sort_by(|a, b| a.nevra.cmp(&b.nevra));
    filelists.sort_by(|a, b| a.nevra.cmp(&b.nevra));
    other.sort_by(|a, b| a.nevra.cmp(&b.nevra));

    // Step 6: bump revision.
    let new_revision = old_revision.parse::<u64>().unwrap_or(0) + 1;

    // Step 7: emit.
    let rendered = render_metadata(&primary, &filelists, &other);

    let mut old_locations = Vec::new();
    if storage.exists("repodata/repomd.xml")? {
        if let Ok(old_repomd) = RepoMd::from_xml(&String::from_utf8_lossy(
            &storage.read("repodata/repomd.xml")?,
        )) {
            old_locations = old_repomd.data.into_iter().map(|d| d.location.href).collect();
        }
    }

    let mut new_locations = Vec::new();
    for r in &rendered {
        let filename = metadata_filename(r);
        let key = format!("repodata/{filename}");
        storage.write(&key, &r.gz)?;
        new_locations.push(key);
    }

    let repomd_xml = build_repomd(&new_revision.to_string(), &rendered, 0);
    storage.write("repodata/repomd.xml", repomd_xml.as_bytes())?;

    if let Some(signer) = signer {
        let signature = signer.sign(
            repomd_xml.as_bytes(),
            SignMode::Detached,
            &SignOptions::default(),
        )?;
        storage.write("repodata/repomd.xml.asc", &signature)?;
    } else if storage.exists("repodata/repomd.xml.asc")? {
        storage.delete("repodata/repomd.xml.asc")?;
    }

    for old in &old_locations {
        if !new_locations.contains(old) {
            storage.delete(old)?;
        }
    }

    let malformed_key = "repodata/malformed_list.txt";
    if malformed.is_empty() {
        if storage.exists(malformed_key)? {
            storage.delete(malformed_key)?;
        }
    } else {
        storage.write(malformed_key, malformed.join("\n").as_bytes())?;
    }

    Ok(RpmReconcileReport {
        revision: new_revision.to_string(),
        malformed,
    })
}
