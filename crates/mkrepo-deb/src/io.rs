// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! I/O helpers.

Content digests are computed synchronously over in-memory or file-backed
byte streams: the reconciliation engine reads whole artifacts into memory
before deriving index records from them, so there is no streaming/async
path to support here.
*/

use {digest::Digest, std::io::Read};

/// Represents a content digest.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContentDigest {
    /// An MD5 digest.
    Md5(Vec<u8>),
    /// A SHA-1 digest.
    Sha1(Vec<u8>),
    /// A SHA-256 digest.
    Sha256(Vec<u8>),
}

impl ContentDigest {
    /// Obtain the digest bytes for this content digest.
    pub fn digest_bytes(&self) -> &[u8] {
        match self {
            Self::Md5(x) => x,
            Self::Sha1(x) => x,
            Self::Sha256(x) => x,
        }
    }

    /// Obtain the hex encoded content digest.
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest_bytes())
    }
}

/// Compression format used by Debian primitives.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Compression {
    /// No compression (no extension).
    None,

    /// XZ compression (.xz extension).
    Xz,

    /// Gzip compression (.gz extension).
    Gzip,

    /// Bzip2 compression (.bz2 extension).
    Bzip2,

    /// LZMA compression (.lzma extension).
    Lzma,
}

impl Compression {
    /// Filename extension for files compressed in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Xz => ".xz",
            Self::Gzip => ".gz",
            Self::Bzip2 => ".bz2",
            Self::Lzma => ".lzma",
        }
    }

    /// The default retrieval preference order for clients.
    pub fn default_preferred_order() -> impl Iterator<Item = Compression> {
        [Self::Xz, Self::Lzma, Self::Gzip, Self::Bzip2, Self::None].into_iter()
    }
}

/// Which checksum flavor to compute or compare.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChecksumType {
    Md5,
    Sha1,
    Sha256,
}

impl ChecksumType {
    /// Compute this checksum flavor over a full byte slice.
    pub fn digest_bytes(&self, data: &[u8]) -> ContentDigest {
        match self {
            Self::Md5 => ContentDigest::Md5(md5::Md5::digest(data).to_vec()),
            Self::Sha1 => ContentDigest::Sha1(sha1::Sha1::digest(data).to_vec()),
            Self::Sha256 => ContentDigest::Sha256(sha2::Sha256::digest(data).to_vec()),
        }
    }
}

/// Holds all three checksum flavors used by Debian indices simultaneously.
pub struct MultiContentDigest {
    pub md5: ContentDigest,
    pub sha1: ContentDigest,
    pub sha256: ContentDigest,
}

/// A content digester that computes MD5, SHA-1 and SHA-256 in one pass.
#[derive(Default)]
pub struct MultiDigester {
    md5: md5::Md5,
    sha1: sha1::Sha1,
    sha256: sha2::Sha256,
}

impl MultiDigester {
    /// Write content into the digesters.
    pub fn update(&mut self, data: &[u8]) {
        self.md5.update(data);
        self.sha1.update(data);
        self.sha256.update(data);
    }

    /// Digest an entire reader, draining it to completion.
    pub fn digest_reader(mut reader: impl Read) -> std::io::Result<MultiContentDigest> {
        let mut digester = Self::default();
        let mut buf = [0u8; 8192];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            digester.update(&buf[..n]);
        }
        Ok(digester.finish())
    }

    /// Finish digesting content, consuming the instance.
    pub fn finish(self) -> MultiContentDigest {
        MultiContentDigest {
            md5: ContentDigest::Md5(self.md5.finalize().to_vec()),
            sha1: ContentDigest::Sha1(self.sha1.finalize().to_vec()),
            sha256: ContentDigest::Sha256(self.sha256.finalize().to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_digest_matches_single_flavors() {
        let data = b"hello world";
        let multi = MultiDigester::digest_reader(std::io::Cursor::new(data)).unwrap();
        assert_eq!(multi.md5, ChecksumType::Md5.digest_bytes(data));
        assert_eq!(multi.sha1, ChecksumType::Sha1.digest_bytes(data));
        assert_eq!(multi.sha256, ChecksumType::Sha256.digest_bytes(data));
    }
}
