// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Error type for this crate.
#[derive(Debug, Error)]
pub enum RpmRepositoryError {
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0:?}")]
    Xml(#[from] serde_xml_rs::Error),

    #[error("repository I/O error on path {0}: {1:?}")]
    IoPath(String, std::io::Error),

    #[error("invalid hex in content digest: {0}; {1:?}")]
    ContentDigestBadHex(String, hex::FromHexError),

    #[error("unknown content digest format: {0}")]
    UnknownDigestFormat(String),

    #[error("repository metadata entry not found: {0}")]
    MetadataFileNotFound(&'static str),

    #[error("unexpected data path: {0}")]
    UnexpectedDataPath(String),

    #[error("content size missing from metadata entry")]
    MetadataMissingSize,

    #[error("RPM lead magic mismatch: expected 0xEDABEEDB, got {0:#010x}")]
    BadLeadMagic(u32),

    #[error("RPM format version {0}.{1} is older than the minimum supported 3.0")]
    UnsupportedVersion(u8, u8),

    #[error("RPM header magic mismatch: expected 0x8EADE8, got {0:#08x}")]
    BadHeaderMagic(u32),

    #[error("truncated RPM file: needed {needed} bytes at offset {offset}, had {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("unknown RPM header tag data type {0}")]
    UnknownTagType(u32),

    #[error("RPM header string data is not valid UTF-8 or Latin-1")]
    StringDecode,

    #[error("RPM header is missing required tag {0}")]
    MissingTag(&'static str),
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, RpmRepositoryError>;
