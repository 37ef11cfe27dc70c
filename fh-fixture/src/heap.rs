// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./heap_test.rs"]
mod heap_test;

use std::collections::BTreeMap;

const FIRST_BLOCK: usize = 0x1000;
const BLOCK_STRIDE: usize = 0x10;

/// Largest block the `alloc` spy will hand out. Bigger requests fail the way a real allocator
/// returns NULL.
pub const MAX_BLOCK_SIZE: usize = 64 << 20;

//
// HeapError
//

#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapError {
  #[error("double free of block {0:#x}")]
  DoubleFree(usize),
  #[error("free of unknown block {0:#x}")]
  UnknownBlock(usize),
}

#[derive(Debug)]
struct Block {
  bytes: Vec<u8>,
  live: bool,
}

//
// TrackingHeap
//

/// A fake allocator that hands out distinct non-null handles and remembers every block it ever
/// handed out, so leaks, double frees and frees of foreign pointers can be asserted on.
#[derive(Debug)]
pub struct TrackingHeap {
  blocks: BTreeMap<usize, Block>,
  next: usize,
  frees: usize,
  errors: Vec<HeapError>,
}

impl Default for TrackingHeap {
  fn default() -> Self {
    Self {
      blocks: BTreeMap::new(),
      next: FIRST_BLOCK,
      frees: 0,
      errors: Vec::new(),
    }
  }
}

impl TrackingHeap {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Allocates a block holding a copy of `bytes`.
  pub fn alloc(&mut self, bytes: impl Into<Vec<u8>>) -> usize {
    let handle = self.next;
    self.next += BLOCK_STRIDE;
    self.blocks.insert(
      handle,
      Block {
        bytes: bytes.into(),
        live: true,
      },
    );
    log::trace!("alloc {handle:#x}");
    handle
  }

  pub fn alloc_zeroed(&mut self, size: usize) -> usize {
    self.alloc(vec![0; size])
  }

  /// Frees a block. Freeing the null handle is a no-op.
  pub fn free(&mut self, handle: usize) -> Result<(), HeapError> {
    if handle == 0 {
      return Ok(());
    }

    let result = match self.blocks.get_mut(&handle) {
      Some(block) if block.live => {
        block.live = false;
        block.bytes.clear();
        self.frees += 1;
        Ok(())
      },
      Some(_) => Err(HeapError::DoubleFree(handle)),
      None => Err(HeapError::UnknownBlock(handle)),
    };

    if let Err(e) = result {
      log::debug!("heap misuse: {e}");
      self.errors.push(e);
    }
    result
  }

  /// Contents of a live block.
  #[must_use]
  pub fn get(&self, handle: usize) -> Option<&[u8]> {
    self
      .blocks
      .get(&handle)
      .filter(|block| block.live)
      .map(|block| block.bytes.as_slice())
  }

  pub fn get_mut(&mut self, handle: usize) -> Option<&mut Vec<u8>> {
    self
      .blocks
      .get_mut(&handle)
      .filter(|block| block.live)
      .map(|block| &mut block.bytes)
  }

  #[must_use]
  pub fn is_live(&self, handle: usize) -> bool {
    self.get(handle).is_some()
  }

  #[must_use]
  pub fn live_count(&self) -> usize {
    self.blocks.values().filter(|block| block.live).count()
  }

  #[must_use]
  pub fn live_blocks(&self) -> Vec<usize> {
    self
      .blocks
      .iter()
      .filter(|(_, block)| block.live)
      .map(|(handle, _)| *handle)
      .collect()
  }

  #[must_use]
  pub fn allocations(&self) -> usize {
    self.blocks.len()
  }

  #[must_use]
  pub const fn frees(&self) -> usize {
    self.frees
  }

  /// Every misuse seen so far, in order.
  #[must_use]
  pub fn errors(&self) -> &[HeapError] {
    &self.errors
  }
}
