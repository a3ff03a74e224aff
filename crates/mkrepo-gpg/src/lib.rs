// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! A [mkrepo_core::traits::Signer] that shells out to `gpg(1)`, grounded on
`original_source/debrepo.py` and `original_source/rpmrepo.py`'s
`gpg_sign_string`.

The two originals disagree on which flag selects the signing key
(`--default-key` vs `--local-user`); this implementation standardizes on
`--local-user`, which works whether the identifier is a key ID or a `uid`
substring, unlike `--default-key`. */

use {
    mkrepo_core::{
        traits::{SignMode, SignOptions, Signer},
        MkrepoError, Result,
    },
    std::{
        io::Write,
        process::{Command, Stdio},
    },
};

/// Signs by invoking a `gpg` binary as a subprocess, optionally scoped to a
/// default signing key.
pub struct GpgSigner {
    gpg_path: String,
    default_key: Option<String>,
}

impl GpgSigner {
    pub fn new(default_key: Option<String>) -> Self {
        Self {
            gpg_path: "gpg".to_string(),
            default_key,
        }
    }

    /// Override the `gpg` binary to invoke, for tests or non-standard
    /// installs.
    pub fn with_binary(gpg_path: impl Into<String>, default_key: Option<String>) -> Self {
        Self {
            gpg_path: gpg_path.into(),
            default_key,
        }
    }
}

impl Signer for GpgSigner {
    fn sign(&self, data: &[u8], mode: SignMode, options: &SignOptions) -> Result<Vec<u8>> {
        let mut cmd = Command::new(&self.gpg_path);
        cmd.arg("--armor").arg("--digest-algo").arg("SHA256");

        match mode {
            SignMode::Detached => {
                cmd.arg("--detach-sign");
            }
            SignMode::Cleartext => {
                cmd.arg("--clearsign");
            }
        }

        if let Some(key) = options.key_name.as_ref().or(self.default_key.as_ref()) {
            cmd.arg("--local-user").arg(key);
        }

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| MkrepoError::SignerFailure(format!("failed to spawn gpg: {e}")))?;

        child
            .stdin
            .take()
            .expect("stdin was requested as piped")
            .write_all(data)
            .map_err(|e| MkrepoError::SignerFailure(format!("failed to write to gpg stdin: {e}")))?;

        let output = child
            .wait_with_output()
            .map_err(|e| MkrepoError::SignerFailure(format!("failed to wait on gpg: {e}")))?;

        if !output.status.success() {
            return Err(MkrepoError::SignerFailure(format!(
                "gpg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_reports_signer_failure() {
        let signer = GpgSigner::with_binary("mkrepo-gpg-does-not-exist", None);
        let err = signer
            .sign(b"hello", SignMode::Detached, &SignOptions::default())
            .unwrap_err();
        assert!(matches!(err, MkrepoError::SignerFailure(_)));
    }
}
