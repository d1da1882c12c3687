// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tree mutation engine.
//!
//! ```text
//!                 ops (workflows)
//!     change_modes  write_files  delete_files
//!                       |
//!   +---------+---------+---------+----------+
//!   v         v         v         v          v
//! refs      tree      patch     commit      mode
//! branch/   listing   validate  create +    755 <-> 100755
//! tag/sha             + create  advance
//!                       |
//!                     index --> object
//!                   local merge  sha1 ids
//!                       |
//!   ,-------------------------------------------,
//!   |          store::GitStore (trait)          |
//!   '-------------------------------------------'
//!            |                       |
//!     api::ApiClient           MemoryStore
//!       (HTTP)                  (tests)
//! ```

pub mod commit;
pub mod index;
pub mod mode;
pub mod object;
pub mod ops;
pub mod patch;
pub mod refs;
pub mod store;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_utils;
