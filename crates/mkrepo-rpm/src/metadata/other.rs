// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! `other.xml` file format. */

use {
    crate::error::Result,
    serde::{Deserialize, Serialize},
    std::io::Read,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Other {
    #[serde(rename = "packages")]
    pub count: usize,

    #[serde(rename = "package")]
    pub packages: Vec<Package>,
}

impl Other {
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_xml_rs::from_reader(reader)?)
    }

    pub fn from_xml(s: &str) -> Result<Self> {
        Ok(serde_xml_rs::from_str(s)?)
    }
}

/// A package as advertised in an `other.xml` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub pkgid: String,
    pub name: String,
    pub arch: String,
    pub version: PackageVersion,

    #[serde(default, rename = "changelog")]
    pub changelog: Vec<ChangelogEntry>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PackageVersion {
    pub epoch: u64,
    #[serde(rename = "ver")]
    pub version: String,
    #[serde(rename = "rel")]
    pub release: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChangelogEntry {
    pub author: String,
    pub date: i64,
    #[serde(rename = "$value")]
    pub text: String,
}
