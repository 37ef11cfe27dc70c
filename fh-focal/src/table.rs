// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./table_test.rs"]
mod table_test;

use fh_error::ConfigurationError;
use fh_fixture::spies::{ALLOC, FREE, SEEK, TELL, WRITE};
use fh_spy::{CallRecorder, Value};

// Each directory slot is an offset followed by a size, both little-endian u32.
const SLOT_LEN: usize = 8;

//
// TableError
//

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TableError {
  #[error("could not allocate the {0} table")]
  AllocationFailed(&'static str),
  #[error("tell failed")]
  TellFailed,
  #[error("seek to {0} failed")]
  SeekFailed(u32),
  #[error("directory write failed")]
  WriteFailed,
  #[error("element {0} could not be written")]
  ElementFailed(u32),
  #[error(transparent)]
  Dependency(#[from] ConfigurationError),
}

#[derive(Clone, Copy, Default)]
struct Entry {
  offset: u32,
  size: u32,
}

/// Writes `count` elements preceded by a directory of `(offset, size)` slots. Offsets are
/// relative to `base_offset`. The directory is first written as zeros, then rewritten once every
/// element's position and size are known, and the stream is left at the end of the last element.
///
/// `element(deps, i)` writes element `i` through the same dependencies and reports success.
pub fn write_position_table(
  deps: &CallRecorder,
  count: u32,
  base_offset: u32,
  mut element: impl FnMut(&CallRecorder, u32) -> bool,
) -> Result<(), TableError> {
  let table_len = Value::UInt(u64::from(count) * 4);

  let Some(offsets) = deps.invoke(ALLOC, &[table_len.clone()])?.as_ptr() else {
    return Err(TableError::AllocationFailed("offset"));
  };
  let Some(sizes) = deps.invoke(ALLOC, &[table_len])?.as_ptr() else {
    deps.invoke(FREE, &[Value::Ptr(offsets)])?;
    return Err(TableError::AllocationFailed("size"));
  };

  let result = write_entries(deps, count, base_offset, &mut element);

  deps.invoke(FREE, &[Value::Ptr(offsets)])?;
  deps.invoke(FREE, &[Value::Ptr(sizes)])?;
  if let Err(e) = &result {
    log::debug!("position table not written: {e}");
  }
  result
}

fn write_entries(
  deps: &CallRecorder,
  count: u32,
  base_offset: u32,
  element: &mut impl FnMut(&CallRecorder, u32) -> bool,
) -> Result<(), TableError> {
  let directory = tell(deps)?;
  for _ in 0 .. count {
    write_slot(deps, Entry::default())?;
  }

  let mut entries = Vec::with_capacity(count as usize);
  for i in 0 .. count {
    let before = tell(deps)?;
    if !element(deps, i) {
      return Err(TableError::ElementFailed(i));
    }
    entries.push(Entry {
      offset: before.wrapping_sub(base_offset),
      size: tell(deps)?.wrapping_sub(before),
    });
  }

  let end = tell(deps)?;
  seek(deps, directory)?;
  for entry in entries {
    write_slot(deps, entry)?;
  }
  seek(deps, end)
}

fn tell(deps: &CallRecorder) -> Result<u32, TableError> {
  deps
    .invoke(TELL, &[])?
    .as_u64()
    .and_then(|position| u32::try_from(position).ok())
    .ok_or(TableError::TellFailed)
}

fn seek(deps: &CallRecorder, position: u32) -> Result<(), TableError> {
  if succeeded(&deps.invoke(SEEK, &[Value::UInt(u64::from(position))])?) {
    Ok(())
  } else {
    Err(TableError::SeekFailed(position))
  }
}

fn write_slot(deps: &CallRecorder, entry: Entry) -> Result<(), TableError> {
  let mut slot = Vec::with_capacity(SLOT_LEN);
  slot.extend_from_slice(&entry.offset.to_le_bytes());
  slot.extend_from_slice(&entry.size.to_le_bytes());

  if succeeded(&deps.invoke(WRITE, &[Value::Bytes(slot)])?) {
    Ok(())
  } else {
    Err(TableError::WriteFailed)
  }
}

fn succeeded(result: &Value) -> bool {
  result.as_bool().unwrap_or(false)
}
