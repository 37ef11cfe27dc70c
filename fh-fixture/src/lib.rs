// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  fh_test_helpers::test_global_init();
}

pub mod arena;
pub mod heap;
pub mod spies;
pub mod stream;

pub use arena::{
  Fixture,
  FixtureBuilder,
  NodeData,
  NodeId,
  Ownership,
  Shape,
  TeardownReport,
  TeardownWatch,
};
pub use heap::{HeapError, TrackingHeap};
pub use spies::{Shared, shared};
pub use stream::MemoryStream;
