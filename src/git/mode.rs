// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mode translation between user notation and tree-entry modes.
//!
//! ```text
//! "755"    --user_mode_to_store_mode--> Mode { File, 0o755 } --> "100755"
//! "120000" --user_mode_to_store_mode--> Mode { Symlink, 0 }  --> "120000"
//! "100755" --store_mode_to_display-->   "755 (executable)"
//! ```
//!
//! | Prefix | Kind      | Entry type |
//! |--------|-----------|------------|
//! | `100`  | File      | blob       |
//! | `120`  | Symlink   | blob       |
//! | `040`  | Tree      | tree       |
//! | `160`  | Submodule | commit     |

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;
use crate::git::tree::EntryKind;

/// The type half of a tree-entry mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    File,
    Symlink,
    Tree,
    Submodule,
}

impl ModeKind {
    /// Three-digit type code as it appears in the store.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::File => "100",
            Self::Symlink => "120",
            Self::Tree => "040",
            Self::Submodule => "160",
        }
    }

    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "100" => Some(Self::File),
            "120" => Some(Self::Symlink),
            "040" => Some(Self::Tree),
            "160" => Some(Self::Submodule),
            _ => None,
        }
    }

    /// Entry type a mode of this kind must be paired with.
    #[must_use]
    pub const fn entry_kind(self) -> EntryKind {
        match self {
            Self::File | Self::Symlink => EntryKind::Blob,
            Self::Tree => EntryKind::Tree,
            Self::Submodule => EntryKind::Commit,
        }
    }
}

/// A tree-entry mode: type code plus permission bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode {
    kind: ModeKind,
    perms: u16,
}

impl Mode {
    pub const REGULAR: Self = Self::file(0o644);
    pub const EXECUTABLE: Self = Self::file(0o755);
    pub const SYMLINK: Self = Self {
        kind: ModeKind::Symlink,
        perms: 0,
    };
    pub const TREE: Self = Self {
        kind: ModeKind::Tree,
        perms: 0,
    };
    pub const SUBMODULE: Self = Self {
        kind: ModeKind::Submodule,
        perms: 0,
    };

    const fn file(perms: u16) -> Self {
        Self {
            kind: ModeKind::File,
            perms,
        }
    }

    #[must_use]
    pub const fn kind(self) -> ModeKind {
        self.kind
    }

    /// Permission bits, `0o000..=0o777`.
    #[must_use]
    pub const fn perms(self) -> u16 {
        self.perms
    }

    #[must_use]
    pub const fn entry_kind(self) -> EntryKind {
        self.kind.entry_kind()
    }

    #[must_use]
    pub const fn is_file(self) -> bool {
        matches!(self.kind, ModeKind::File)
    }

    /// The mode as written inside a git tree object (`40000` for trees).
    #[must_use]
    pub fn object_form(self) -> String {
        let full = self.to_string();
        full.trim_start_matches('0').to_string()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03o}", self.kind.prefix(), self.perms)
    }
}

impl FromStr for Mode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        user_mode_to_store_mode(s)
    }
}

impl Serialize for Mode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_store_mode(&raw).map_err(serde::de::Error::custom)
    }
}

fn parse_perms(digits: &str) -> Option<u16> {
    if digits.len() == 3 && digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        u16::from_str_radix(digits, 8).ok()
    } else {
        None
    }
}

fn parse_store_mode(input: &str) -> Result<Mode, ApiError> {
    if input.len() != 6 || !input.is_ascii() {
        return Err(invalid_mode(input, "expected 6 digits"));
    }
    let (prefix, digits) = input.split_at(3);
    let kind = ModeKind::from_prefix(prefix)
        .ok_or_else(|| invalid_mode(input, "unrecognized type prefix"))?;
    let perms = parse_perms(digits).ok_or_else(|| invalid_mode(input, "non-octal digits"))?;
    Ok(Mode { kind, perms })
}

fn invalid_mode(input: &str, reason: &str) -> ApiError {
    ApiError::Validation {
        message: format!("invalid mode '{input}'"),
        details: vec![
            reason.to_string(),
            "use 3-digit octal like 755 or 644, or a full mode like 100755".to_string(),
        ],
    }
}

/// Convert user notation to a store mode.
///
/// `"755"` becomes `100755`; a recognized six-digit mode passes through
/// unchanged.
///
/// # Errors
///
/// Returns `ApiError::Validation` for any other length, non-octal digits,
/// or an unrecognized type prefix.
pub fn user_mode_to_store_mode(input: &str) -> Result<Mode, ApiError> {
    let input = input.trim();
    match input.len() {
        3 => parse_perms(input)
            .map(Mode::file)
            .ok_or_else(|| invalid_mode(input, "non-octal digits")),
        6 => parse_store_mode(input),
        _ => Err(invalid_mode(input, "expected 3 or 6 digits")),
    }
}

/// Human label for a store mode. Unknown codes are echoed verbatim.
#[must_use]
pub fn store_mode_to_display(store_mode: &str) -> String {
    let Ok(mode) = parse_store_mode(store_mode) else {
        return store_mode.to_string();
    };
    match mode.kind {
        ModeKind::File => {
            let label = if mode.perms & 0o111 == 0 {
                "regular file"
            } else {
                "executable"
            };
            format!("{:03o} ({label})", mode.perms)
        }
        ModeKind::Symlink if mode.perms == 0 => "symlink".to_string(),
        ModeKind::Tree if mode.perms == 0 => "directory".to_string(),
        ModeKind::Submodule if mode.perms == 0 => "submodule".to_string(),
        _ => store_mode.to_string(),
    }
}

