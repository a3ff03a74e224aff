// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Flat CLI surface over [mkrepo_core]'s two reconciler drivers, grounded on
`original_source/mkrepo.py`'s `is_deb_repo`/`is_rpm_repo`/`update_repo`/`main`.
S3 destinations are out of scope (see DESIGN.md); every path is treated as a
local directory. */

use {
    clap::{Arg, ArgMatches, Command},
    mkrepo_core::{
        reconcile_deb, reconcile_rpm, traits::Storage, DebReconcileOptions, MkrepoError,
        RpmReconcileOptions, Signer,
    },
    mkrepo_fs::FilesystemStorage,
    mkrepo_gpg::GpgSigner,
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Mkrepo(#[from] MkrepoError),

    #[error("unrecognized repository at {0}: found neither pool/ nor Packages/")]
    UnknownRepository(String),

    #[error("failed to create temp dir {path}: {source}")]
    TempDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// True when `storage` has at least one key under `pool/`, the layout marker
/// for an APT repository.
fn is_deb_repo(storage: &dyn Storage) -> Result<bool, CliError> {
    Ok(!storage.list("pool/")?.is_empty())
}

/// True when `storage` has at least one key under `Packages/`, the layout
/// marker for the RPM package root this tool expects artifacts to live under.
fn is_rpm_repo(storage: &dyn Storage) -> Result<bool, CliError> {
    Ok(!storage.list("Packages/")?.is_empty())
}

fn build_matches() -> ArgMatches {
    Command::new("mkrepo")
        .about("Reconciles APT/YUM repository metadata against a tree of package artifacts")
        .arg(
            Arg::new("temp_dir")
                .long("temp-dir")
                .takes_value(true)
                .default_value(".mkrepo")
                .help("directory used to store temporary artifacts"),
        )
        .arg(
            Arg::new("sign")
                .long("sign")
                .takes_value(false)
                .help("sign package metadata with gpg"),
        )
        .arg(
            Arg::new("gpg_key")
                .long("gpg-key")
                .takes_value(true)
                .help("gpg key identifier to sign with"),
        )
        .arg(
            Arg::new("path")
                .required(true)
                .multiple_values(true)
                .help("paths to repositories to reconcile"),
        )
        .get_matches()
}

pub fn run_cli() -> Result<(), CliError> {
    let matches = build_matches();

    let temp_dir = matches.value_of("temp_dir").unwrap_or(".mkrepo");
    if !std::path::Path::new(temp_dir).exists() {
        std::fs::create_dir(temp_dir).map_err(|e| CliError::TempDir {
            path: temp_dir.to_string(),
            source: e,
        })?;
    }

    let sign = matches.is_present("sign");
    let gpg_key = matches.value_of("gpg_key").map(str::to_string);
    let signer = sign.then(|| GpgSigner::new(gpg_key));

    for path in matches.values_of("path").unwrap_or_default() {
        update_repo(path, signer.as_ref())?;
    }

    Ok(())
}

fn update_repo(path: &str, signer: Option<&GpgSigner>) -> Result<(), CliError> {
    let storage = FilesystemStorage::new(path);

    let signer: Option<&dyn Signer> = signer.map(|s| s as &dyn Signer);

    if is_deb_repo(&storage)? {
        println!("Updating deb repository: {path}");
        reconcile_deb(&storage, signer, &DebReconcileOptions::default())?;
    } else if is_rpm_repo(&storage)? {
        println!("Updating rpm repository: {path}");
        reconcile_rpm(&storage, "Packages/", signer, &RpmReconcileOptions::default())?;
    } else {
        return Err(CliError::UnknownRepository(path.to_string()));
    }

    Ok(())
}
