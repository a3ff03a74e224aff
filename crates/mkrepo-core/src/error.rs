// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Top-level error type for the reconciliation engine.
#[derive(Debug, Error)]
pub enum MkrepoError {
    /// An individual artifact (`.deb`/`.dsc`/`.rpm`) could not be parsed.
    #[error("malformed artifact at {path}: {reason}")]
    MalformedArtifact { path: String, reason: String },

    /// An existing index (`Packages`/`Sources`/`repomd.xml` or a referenced
    /// child) could not be parsed; treated as empty rather than fatal except
    /// where noted at the call site.
    #[error("malformed index at {path}: {reason}")]
    MalformedIndex { path: String, reason: String },

    /// A `.deb` path matched neither filename grammar alternative.
    #[error("unparseable deb filename: {0}")]
    FilenameUnparseable(String),

    #[error("storage failure on {key}: {source}")]
    StorageFailure {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("signer failure: {0}")]
    SignerFailure(String),

    #[error(transparent)]
    Deb(#[from] mkrepo_deb::DebError),

    #[error(transparent)]
    Rpm(#[from] mkrepo_rpm::RpmRepositoryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MkrepoError>;
