// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

//! Default spy behaviors that route the usual allocator and stream dependencies to a
//! [`TrackingHeap`] or [`MemoryStream`]. Cases install these first and then layer fault rules on
//! top.

#[cfg(test)]
#[path = "./spies_test.rs"]
mod spies_test;

use crate::heap::{MAX_BLOCK_SIZE, TrackingHeap};
use crate::stream::{MAX_STREAM_LEN, MemoryStream};
use fh_spy::{CallRecorder, Value};
use parking_lot::Mutex;
use std::sync::Arc;

pub const ALLOC: &str = "alloc";
pub const FREE: &str = "free";
pub const TELL: &str = "tell";
pub const SEEK: &str = "seek";
pub const WRITE: &str = "write";
pub const READ: &str = "read";

pub type Shared<T> = Arc<Mutex<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
  Arc::new(Mutex::new(value))
}

/// Installs `alloc` and `free`.
///
/// `alloc` takes either the initial block contents as `Bytes` or a size as `UInt` and returns a
/// `Ptr`. A negative size, a size that is not a number, or one above [`MAX_BLOCK_SIZE`] returns
/// `Null`. `free` takes a `Ptr` (or `Null`) and returns `Bool(false)` on a double free or a free
/// of a handle the heap never handed out.
pub fn install_heap(recorder: &CallRecorder, heap: &Shared<TrackingHeap>) {
  let alloc_heap = heap.clone();
  recorder.install(ALLOC, move |args| {
    let mut heap = alloc_heap.lock();
    let handle = match args.first() {
      Some(Value::Bytes(bytes)) => heap.alloc(bytes.clone()),
      Some(size) => match argument_usize(size).filter(|size| *size <= MAX_BLOCK_SIZE) {
        Some(size) => heap.alloc_zeroed(size),
        None => {
          log::debug!("refusing alloc of {size:?}");
          return Value::Null;
        },
      },
      None => heap.alloc_zeroed(0),
    };
    Value::Ptr(handle)
  });

  let free_heap = heap.clone();
  recorder.install(FREE, move |args| {
    let handle = args.first().and_then(Value::as_ptr).unwrap_or_default();
    Value::Bool(free_heap.lock().free(handle).is_ok())
  });
}

/// Installs `tell`, `seek`, `write` and `read`.
///
/// `tell` returns the position as `UInt`. `seek` takes a `UInt` position. `write` takes `Bytes`
/// and returns `Bool(true)` once they are stored. Both return `Bool(false)` for a bad argument or
/// a position past [`MAX_STREAM_LEN`]. `read` takes a `UInt` length and returns the `Bytes`
/// actually read.
pub fn install_stream(recorder: &CallRecorder, stream: &Shared<MemoryStream>) {
  let tell_stream = stream.clone();
  recorder.install(TELL, move |_| Value::from(tell_stream.lock().tell()));

  let seek_stream = stream.clone();
  recorder.install(SEEK, move |args| {
    match args.first().and_then(argument_usize) {
      Some(position) => Value::Bool(seek_stream.lock().seek(position)),
      None => Value::Bool(false),
    }
  });

  let write_stream = stream.clone();
  recorder.install(WRITE, move |args| {
    match args.first().and_then(Value::as_bytes) {
      Some(bytes) => Value::Bool(write_stream.lock().write(bytes).is_some()),
      None => Value::Bool(false),
    }
  });

  let read_stream = stream.clone();
  recorder.install(READ, move |args| {
    let len = args.first().and_then(argument_usize).unwrap_or_default();
    Value::Bytes(read_stream.lock().read(len))
  });
}

fn argument_usize(value: &Value) -> Option<usize> {
  value.as_u64().and_then(|value| usize::try_from(value).ok())
}
