// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Content digests and decompression for RPM repository data files. */

use crate::error::{Result, RpmRepositoryError};

/// Compression format of a repository data file.
pub enum Compression {
    None,
    Gzip,
    Xz,
    Zstd,
}

impl Compression {
    /// Infer compression from a data file's location suffix.
    pub fn from_path(path: &str) -> Self {
        if path.ends_with(".gz") {
            Self::Gzip
        } else if path.ends_with(".xz") {
            Self::Xz
        } else if path.ends_with(".zst") {
            Self::Zstd
        } else {
            Self::None
        }
    }
}

/// Decompress a buffer fully according to `compression`.
pub fn read_decompressed(data: &[u8], compression: Compression) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match compression {
        Compression::None => out.extend_from_slice(data),
        Compression::Gzip => {
            let mut decoder = libflate::gzip::Decoder::new(data)?;
            std::io::copy(&mut decoder, &mut out)?;
        }
        Compression::Xz => {
            let mut decoder = xz2::read::XzDecoder::new(data);
            std::io::copy(&mut decoder, &mut out)?;
        }
        Compression::Zstd => {
            let mut decoder = zstd::Decoder::new(data)?;
            std::io::copy(&mut decoder, &mut out)?;
        }
    }
    Ok(out)
}

pub enum DigestFlavor {
    Sha1,
    Sha256,
}

/// A content digest tagged with its algorithm.
#[derive(Clone, Eq, PartialEq, PartialOrd)]
pub enum ContentDigest {
    Sha1(Vec<u8>),
    Sha256(Vec<u8>),
}

impl std::fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha1(data) => write!(f, "Sha1({})", hex::encode(data)),
            Self::Sha256(data) => write!(f, "Sha256({})", hex::encode(data)),
        }
    }
}

impl ContentDigest {
    pub fn sha1_hex(digest: &str) -> Result<Self> {
        Self::from_hex_digest(DigestFlavor::Sha1, digest)
    }

    pub fn sha256_hex(digest: &str) -> Result<Self> {
        Self::from_hex_digest(DigestFlavor::Sha256, digest)
    }

    pub fn from_hex_digest(flavor: DigestFlavor, digest: &str) -> Result<Self> {
        let digest = hex::decode(digest)
            .map_err(|e| RpmRepositoryError::ContentDigestBadHex(digest.to_string(), e))?;

        Ok(match flavor {
            DigestFlavor::Sha1 => Self::Sha1(digest),
            DigestFlavor::Sha256 => Self::Sha256(digest),
        })
    }

    /// Compute the digest of `data` matching this instance's algorithm.
    pub fn of_bytes(flavor: DigestFlavor, data: &[u8]) -> Self {
        match flavor {
            DigestFlavor::Sha1 => {
                use sha1::{Digest, Sha1};
                Self::Sha1(Sha1::digest(data).to_vec())
            }
            DigestFlavor::Sha256 => {
                use sha2::{Digest, Sha256};
                Self::Sha256(Sha256::digest(data).to_vec())
            }
        }
    }

    pub fn digest_bytes(&self) -> &[u8] {
        match self {
            Self::Sha1(x) => x,
            Self::Sha256(x) => x,
        }
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest_bytes())
    }

    pub fn digest_type(&self) -> DigestFlavor {
        match self {
            Self::Sha1(_) => DigestFlavor::Sha1,
            Self::Sha256(_) => DigestFlavor::Sha256,
        }
    }

    /// Verify `data` matches this digest.
    pub fn matches(&self, data: &[u8]) -> bool {
        Self::of_bytes(self.digest_type(), data).digest_bytes() == self.digest_bytes()
    }
}
