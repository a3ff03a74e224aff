// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Numeric RPM header tag identifiers and the RPMSENSE dependency flag bits. */

pub const TAG_NAME: u32 = 1000;
pub const TAG_VERSION: u32 = 1001;
pub const TAG_RELEASE: u32 = 1002;
pub const TAG_EPOCH: u32 = 1003;
pub const TAG_SUMMARY: u32 = 1004;
pub const TAG_DESCRIPTION: u32 = 1005;
pub const TAG_BUILDTIME: u32 = 1006;
pub const TAG_BUILDHOST: u32 = 1007;
pub const TAG_SIZE: u32 = 1009;
pub const TAG_VENDOR: u32 = 1011;
pub const TAG_LICENSE: u32 = 1014;
pub const TAG_PACKAGER: u32 = 1015;
pub const TAG_GROUP: u32 = 1016;
pub const TAG_URL: u32 = 1020;
pub const TAG_ARCH: u32 = 1022;
pub const TAG_FILESIZES: u32 = 1028;
pub const TAG_FILEMODES: u32 = 1030;
pub const TAG_SOURCERPM: u32 = 1044;
pub const TAG_ARCHIVESIZE: u32 = 1046;
pub const TAG_PROVIDENAME: u32 = 1047;
pub const TAG_REQUIREFLAGS: u32 = 1048;
pub const TAG_REQUIRENAME: u32 = 1049;
pub const TAG_REQUIREVERSION: u32 = 1050;
pub const TAG_CONFLICTFLAGS: u32 = 1053;
pub const TAG_CONFLICTNAME: u32 = 1054;
pub const TAG_CONFLICTVERSION: u32 = 1055;
pub const TAG_CHANGELOGTIME: u32 = 1080;
pub const TAG_CHANGELOGNAME: u32 = 1081;
pub const TAG_CHANGELOGTEXT: u32 = 1082;
pub const TAG_OBSOLETENAME: u32 = 1090;
pub const TAG_SOURCEPACKAGE: u32 = 1106;
pub const TAG_PROVIDEFLAGS: u32 = 1112;
pub const TAG_PROVIDEVERSION: u32 = 1113;
pub const TAG_OBSOLETEFLAGS: u32 = 1114;
pub const TAG_OBSOLETEVERSION: u32 = 1115;
pub const TAG_DIRINDEXES: u32 = 1116;
pub const TAG_BASENAMES: u32 = 1117;
pub const TAG_DIRNAMES: u32 = 1118;

/// Signature header tag for the size of the (possibly compressed) payload.
///
/// Numbered independently of the main header's tag namespace; `1007` here is
/// unrelated to [`TAG_BUILDHOST`], which is a main-header tag sharing the same
/// number. `header_to_primary`'s `archive_size` field reads this one.
pub const SIG_TAG_PAYLOADSIZE: u32 = 1007;
pub const SIG_TAG_SHA1: u32 = 269;

/// RPMSENSE bits used to reconstruct a dependency's comparison operator and
/// whether it should be filtered out of repository metadata entirely.
pub const RPMSENSE_LESS: u32 = 0x02;
pub const RPMSENSE_GREATER: u32 = 0x04;
pub const RPMSENSE_EQUAL: u32 = 0x08;
pub const RPMSENSE_RPMLIB: u32 = 0x0100_0000;
/// Mask identifying "pre" (scriptlet-ordering) dependencies: prereq or the
/// interpreter/script-ordering bits set together.
pub const RPMSENSE_PREREQ_MASK: u32 = 0x1000 | 0x0100;

/// Comparison operator encoded in a dependency's RPMSENSE flags.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SenseOperator {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    None,
}

impl SenseOperator {
    /// Matches rpmrepo.py's `flags_to_str`: derive the comparison operator
    /// from the low-order comparison bits of a dependency's RPMSENSE flags.
    pub fn from_flags(flags: u32) -> Self {
        let bits = flags & (RPMSENSE_LESS | RPMSENSE_GREATER | RPMSENSE_EQUAL);
        match bits {
            b if b == RPMSENSE_LESS => Self::Less,
            b if b == RPMSENSE_GREATER => Self::Greater,
            b if b == RPMSENSE_EQUAL => Self::Equal,
            b if b == (RPMSENSE_LESS | RPMSENSE_EQUAL) => Self::LessEqual,
            b if b == (RPMSENSE_GREATER | RPMSENSE_EQUAL) => Self::GreaterEqual,
            b if b == (RPMSENSE_EQUAL ^ 0x0E) => Self::NotEqual,
            _ => Self::None,
        }
    }

    /// The string rendered into a `<rpm:entry flags="...">` attribute.
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Self::Less => Some("LT"),
            Self::LessEqual => Some("LE"),
            Self::Greater => Some("GT"),
            Self::GreaterEqual => Some("GE"),
            Self::Equal => Some("EQ"),
            Self::NotEqual => Some("NE"),
            Self::None => None,
        }
    }
}

/// True if `flags` marks a dependency that repository metadata must not
/// advertise (an internal rpmlib feature requirement).
pub fn is_rpmlib_dependency(flags: u32) -> bool {
    flags & RPMSENSE_RPMLIB != 0
}

pub fn is_prereq(flags: u32) -> bool {
    flags & RPMSENSE_PREREQ_MASK != 0
}
