// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

//! Small functions with real dependency graphs (allocator, seekable stream, checksum) used as the
//! functions under test. Every dependency is reached through a [`fh_spy::CallRecorder`]; helpers
//! local to a function are called directly and are never spied.

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  fh_test_helpers::test_global_init();
}

pub mod header;
pub mod list;
pub mod table;

pub use header::{ChunkHeader, HeaderStatus, parse_header, read_header};
pub use list::{DupError, DupList, dup_list, pop_front};
pub use table::{TableError, write_position_table};
