// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end reconcile passes over a `tempfile`-backed `FilesystemStorage`,
//! exercising the seed scenarios from this project's testable-properties
//! notes: fresh indexing, idempotent re-runs, and malformed-artifact
//! isolation under `force`.

use {
    mkrepo_core::{reconcile_deb, traits::Storage, DebReconcileOptions, MkrepoError},
    mkrepo_fs::FilesystemStorage,
};

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = libflate::gzip::Encoder::new(Vec::new()).unwrap();
    std::io::Write::write_all(&mut encoder, data).unwrap();
    encoder.finish().into_result().unwrap()
}

fn tar_with_single_file(path: &str, data: &[u8]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_path(path).unwrap();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append(&header, data).unwrap();
    builder.into_inner().unwrap()
}

fn ar_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = ar::Builder::new(Vec::new());
    for (name, data) in entries {
        let header = ar::Header::new(name.as_bytes().to_vec(), data.len() as u64);
        builder.append(&header, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

/// Build a minimal but structurally valid `.deb`: an `ar` archive holding
/// `debian-binary`, a gzipped `control.tar` with a single `./control` member,
/// and an empty gzipped `data.tar`.
fn build_deb(package: &str, version: &str, arch: &str) -> Vec<u8> {
    let control_text = format!(
        "Package: {package}\nVersion: {version}\nArchitecture: {arch}\nMaintainer: Test <test@example.com>\nDescription: test package\n"
    );
    let control_tar_gz = gzip(&tar_with_single_file("./control", control_text.as_bytes()));
    let data_tar_gz = gzip(&tar::Builder::new(Vec::new()).into_inner().unwrap());

    ar_archive(&[
        ("debian-binary", b"2.0\n"),
        ("control.tar.gz", &control_tar_gz),
        ("data.tar.gz", &data_tar_gz),
    ])
}

#[test]
fn fresh_repo_indexes_pool_contents() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FilesystemStorage::new(dir.path());

    let deb = build_deb("foo", "1.0-1", "amd64");
    storage
        .write("pool/deb9/main/f/foo/foo_1.0-1_amd64.deb", &deb)
        .unwrap();

    let report = reconcile_deb(&storage, None, &DebReconcileOptions::default()).unwrap();
    assert_eq!(report.distributions, vec!["deb9".to_string()]);

    let packages = storage
        .read("dists/deb9/main/binary-amd64/Packages")
        .unwrap();
    let text = String::from_utf8(packages).unwrap();
    assert!(text.contains("Package: foo"));
    assert!(text.contains("Filename: pool/deb9/main/f/foo/foo_1.0-1_amd64.deb"));
    assert!(text.ends_with('\n'));
    assert!(!text.ends_with("\n\n"));

    assert!(storage.exists("dists/deb9/main/binary-amd64/Packages.gz").unwrap());
    assert!(storage.exists("dists/deb9/main/binary-amd64/Packages.bz2").unwrap());
    assert!(storage.exists("dists/deb9/Release").unwrap());

    let release = String::from_utf8(storage.read("dists/deb9/Release").unwrap()).unwrap();
    assert!(release.contains("Codename: deb9"));
    assert!(release.contains("Architectures: amd64"));
}

#[test]
fn rerun_without_changes_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FilesystemStorage::new(dir.path());

    let deb = build_deb("foo", "1.0-1", "amd64");
    storage
        .write("pool/deb9/main/f/foo/foo_1.0-1_amd64.deb", &deb)
        .unwrap();

    reconcile_deb(&storage, None, &DebReconcileOptions::default()).unwrap();
    let first = storage.read("dists/deb9/main/binary-amd64/Packages").unwrap();

    reconcile_deb(&storage, None, &DebReconcileOptions::default()).unwrap();
    let second = storage.read("dists/deb9/main/binary-amd64/Packages").unwrap();

    assert_eq!(first, second);
}

#[test]
fn malformed_artifact_is_fatal_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FilesystemStorage::new(dir.path());

    storage
        .write("pool/deb9/main/f/foo/foo_1.0-1_amd64.deb", b"not a deb file")
        .unwrap();

    let err = reconcile_deb(&storage, None, &DebReconcileOptions::default()).unwrap_err();
    assert!(matches!(err, MkrepoError::Deb(_)));
}

#[test]
fn malformed_artifact_is_isolated_under_force() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FilesystemStorage::new(dir.path());

    storage
        .write("pool/deb9/main/f/foo/foo_1.0-1_amd64.deb", b"not a deb file")
        .unwrap();
    storage
        .write(
            "pool/deb9/main/b/bar/bar_2.0-1_amd64.deb",
            &build_deb("bar", "2.0-1", "amd64"),
        )
        .unwrap();

    let options = DebReconcileOptions {
        force: true,
        ..DebReconcileOptions::default()
    };
    let report = reconcile_deb(&storage, None, &options).unwrap();

    let malformed = report.malformed.get("deb9").cloned().unwrap_or_default();
    assert_eq!(malformed.len(), 1);
    assert!(malformed[0].ends_with("foo_1.0-1_amd64.deb"));

    let packages = String::from_utf8(
        storage
            .read("dists/deb9/main/binary-amd64/Packages")
            .unwrap(),
    )
    .unwrap();
    assert!(packages.contains("Package: bar"));
    assert!(!packages.contains("Package: foo"));

    let malformed_list =
        String::from_utf8(storage.read("dists/deb9/malformed_list.txt").unwrap()).unwrap();
    assert!(malformed_list.ends_with("foo_1.0-1_amd64.deb"));
}
