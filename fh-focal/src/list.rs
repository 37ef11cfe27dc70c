// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./list_test.rs"]
mod list_test;

use fh_error::ConfigurationError;
use fh_fixture::spies::{ALLOC, FREE};
use fh_fixture::{Fixture, NodeData};
use fh_spy::{CallRecorder, Value};

//
// DupError
//

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DupError {
  #[error("allocation failed while copying node {0}")]
  AllocationFailed(usize),
  #[error(transparent)]
  Dependency(#[from] ConfigurationError),
}

//
// DupList
//

/// A copy of a linked list: one allocated block per node, in list order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DupList {
  pub blocks: Vec<usize>,
  pub values: Vec<i64>,
}

impl DupList {
  /// Frees every block of the copy.
  pub fn free(self, deps: &CallRecorder) -> Result<(), ConfigurationError> {
    free_blocks(deps, &self.blocks)
  }
}

/// Copies the list held by `source` node by node. If anything fails part way, the nodes copied
/// so far are freed before returning, so a failed copy owns nothing.
pub fn dup_list(deps: &CallRecorder, source: &Fixture) -> Result<DupList, DupError> {
  let mut copy = DupList::default();
  match copy_nodes(deps, source, &mut copy) {
    Ok(()) => Ok(copy),
    Err(e) => {
      log::debug!("copy failed after {} nodes: {e}", copy.blocks.len());
      free_blocks(deps, &copy.blocks)?;
      Err(e)
    },
  }
}

fn copy_nodes(deps: &CallRecorder, source: &Fixture, copy: &mut DupList) -> Result<(), DupError> {
  let mut cursor = source.head();
  while let Some(id) = cursor {
    let NodeData::ListNode { value, next } = source.node(id)? else {
      break;
    };

    let payload = Value::Bytes(value.to_le_bytes().to_vec());
    let Some(block) = deps.invoke(ALLOC, &[payload])?.as_ptr() else {
      return Err(DupError::AllocationFailed(copy.blocks.len()));
    };

    copy.blocks.push(block);
    copy.values.push(*value);
    cursor = *next;
  }

  Ok(())
}

fn free_blocks(deps: &CallRecorder, blocks: &[usize]) -> Result<(), ConfigurationError> {
  for block in blocks.iter().rev() {
    deps.invoke(FREE, &[Value::Ptr(*block)])?;
  }
  Ok(())
}

/// Removes the first node of the list and frees it. The fixture no longer owns that node
/// afterwards. Returns the removed value, or `None` for an empty list.
pub fn pop_front(deps: &CallRecorder, list: &mut Fixture) -> Result<Option<i64>, ConfigurationError> {
  let Some((id, value)) = list.unlink_head()? else {
    return Ok(None);
  };

  deps.invoke(FREE, &[Value::Ptr(id.ptr())])?;
  Ok(Some(value))
}
