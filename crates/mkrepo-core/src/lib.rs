// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Metadata reconciliation engine for APT and YUM package repositories.

This crate is parametric over a [traits::Storage] capability and an optional
[traits::Signer] capability; it never touches a filesystem, network socket or
subprocess directly. [reconcile_deb::reconcile_deb] and
[reconcile_rpm::reconcile_rpm] are the two entry points, one per repository
family. Everything else — the `.deb`/`.dsc`/`.rpm` parsers this crate
delegates to live in [mkrepo_deb] and [mkrepo_rpm] — is wiring: filename
grammar, index collections, and the driver loops described in this project's
design notes.
*/

pub mod deb_filename;
pub mod deb_index;
pub mod error;
pub mod reconcile_deb;
pub mod reconcile_rpm;
pub mod rpm_manifest;
pub mod traits;

pub use error::{MkrepoError, Result};
pub use reconcile_deb::{reconcile_deb, DebReconcileOptions, DebReconcileReport};
pub use reconcile_rpm::{reconcile_rpm, RpmReconcileOptions, RpmReconcileReport};
pub use traits::{SignMode, SignOptions, Signer, Storage};
