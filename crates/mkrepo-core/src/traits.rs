// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Capability traits the reconciler consumes.

The core is parametric over these and performs no type checks on the
concrete implementation (`Storage` over a local filesystem, `Signer`
shelling out to `gpg`, or any in-process test double). */

use std::path::Path;

/// Uniform key -> bytes abstraction over a repository's backing store.
///
/// Keys are opaque, slash-separated strings; the core treats them purely as
/// an ordered path and never interprets them beyond that.
pub trait Storage {
    /// Read the full contents addressed by `key`.
    fn read(&self, key: &str) -> crate::Result<Vec<u8>>;

    /// Write `data` to `key`, creating any missing parent directories.
    fn write(&self, key: &str, data: &[u8]) -> crate::Result<()>;

    /// Delete the object addressed by `key`. Not an error if absent.
    fn delete(&self, key: &str) -> crate::Result<()>;

    /// Whether an object exists at `key`.
    fn exists(&self, key: &str) -> crate::Result<bool>;

    /// Modification time of `key`, in floating point seconds since epoch.
    fn mtime(&self, key: &str) -> crate::Result<f64>;

    /// Stream the object at `key` down to a local scratch path.
    fn download(&self, key: &str, local_path: &Path) -> crate::Result<()>;

    /// List keys under `prefix`, relative to the storage root.
    fn list(&self, prefix: &str) -> crate::Result<Vec<String>>;
}

/// Whether a signature should be detached from its payload or wrap it
/// cleartext.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignMode {
    /// ASCII-armored detached signature (`Release.gpg`).
    Detached,
    /// Cleartext-signed form with the payload inlined (`InRelease`).
    Cleartext,
}

/// Options controlling a single `sign` call.
#[derive(Clone, Debug, Default)]
pub struct SignOptions {
    /// Key identifier to sign with. Falls back to `GPG_SIGN_KEY` when unset.
    pub key_name: Option<String>,
}

/// External capability producing OpenPGP signatures over bytes.
pub trait Signer {
    /// Produce an armored signature over `data` per `mode`.
    fn sign(&self, data: &[u8], mode: SignMode, options: &SignOptions) -> crate::Result<Vec<u8>>;
}
