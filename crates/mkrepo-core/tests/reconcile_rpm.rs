// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end reconcile passes over a `tempfile`-backed `FilesystemStorage`.
//! Building a byte-perfect RPM header is out of scope for a unit-level
//! fixture (see DESIGN.md), so these exercise the parts of the driver that
//! don't require one: empty-repo bootstrap, revision monotonicity across
//! reruns, and malformed-artifact isolation under `force`.

use {
    mkrepo_core::{reconcile_rpm, traits::Storage, MkrepoError, RpmReconcileOptions},
    mkrepo_fs::FilesystemStorage,
};

#[test]
fn empty_repo_bootstraps_revision_one() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FilesystemStorage::new(dir.path());

    let report = reconcile_rpm(&storage, "Packages/", None, &RpmReconcileOptions::default()).unwrap();
    assert_eq!(report.revision, "1");
    assert!(storage.exists("repodata/repomd.xml").unwrap());
}

#[test]
fn revision_is_bumped_on_every_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FilesystemStorage::new(dir.path());

    let first = reconcile_rpm(&storage, "Packages/", None, &RpmReconcileOptions::default()).unwrap();
    let second = reconcile_rpm(&storage, "Packages/", None, &RpmReconcileOptions::default()).unwrap();
    let third = reconcile_rpm(&storage, "Packages/", None, &RpmReconcileOptions::default()).unwrap();

    assert_eq!(first.revision, "1");
    assert_eq!(second.revision, "2");
    assert_eq!(third.revision, "3");
}

#[test]
fn malformed_artifact_is_fatal_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FilesystemStorage::new(dir.path());

    storage.write("Packages/foo.rpm", b"not an rpm file").unwrap();

    let err = reconcile_rpm(&storage, "Packages/", None, &RpmReconcileOptions::default()).unwrap_err();
    assert!(matches!(err, MkrepoError::MalformedArtifact { .. }));
}

#[test]
fn malformed_artifact_is_isolated_under_force() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FilesystemStorage::new(dir.path());

    storage.write("Packages/foo.rpm", b"not an rpm file").unwrap();

    let options = RpmReconcileOptions { force: true };
    let report = reconcile_rpm(&storage, "Packages/", None, &options).unwrap();

    assert_eq!(report.malformed, vec!["Packages/foo.rpm".to_string()]);
    assert!(storage.exists("repodata/repomd.xml").unwrap());

    let malformed_list =
        String::from_utf8(storage.read("repodata/malformed_list.txt").unwrap()).unwrap();
    assert_eq!(malformed_list, "Packages/foo.rpm");
}
