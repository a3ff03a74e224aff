// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian packaging primitives.

This crate defines pure Rust implementations of Debian packaging primitives.
*/

mod control;
mod deb;
pub mod io;

pub use {
    control::{
        ControlError, ControlField, ControlFieldValue, ControlFile, ControlParagraph, SourceControl,
    },
    deb::{
        reader::{BinaryPackageEntry, BinaryPackageReader},
        DebCompression, DebError, DebPackageReference, InMemoryDebFile,
    },
    io::{ChecksumType, Compression, ContentDigest},
};
