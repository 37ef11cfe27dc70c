// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

//! The registered cases, in run order.

#[cfg(test)]
#[path = "./cases_test.rs"]
mod cases_test;

use fh_assert::{expect, expect_eq, expect_matches};
use fh_fixture::spies::{ALLOC, FREE, READ, WRITE, install_heap, install_stream};
use fh_fixture::{MemoryStream, Shape, TrackingHeap, shared};
use fh_focal::header::{CRC32, encode_chunk, install_crc32};
use fh_focal::{
  DupError,
  HeaderStatus,
  TableError,
  dup_list,
  parse_header,
  pop_front,
  read_header,
  write_position_table,
};
use fh_runner::{Case, CaseContext};
use fh_spy::{CallRecorder, Fault, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[must_use]
pub fn all() -> Vec<Case> {
  vec![
    Case::new("dup_list_copies_every_node", dup_list_copies_every_node),
    Case::new(
      "dup_list_alloc_failure_leaves_no_partial_copy",
      dup_list_alloc_failure_leaves_no_partial_copy,
    ),
    Case::new(
      "pop_front_teardown_skips_released_node",
      pop_front_teardown_skips_released_node,
    ),
    Case::new(
      "write_position_table_directory_before_payload",
      write_position_table_directory_before_payload,
    ),
    Case::new(
      "write_position_table_element_failure_frees_tables",
      write_position_table_element_failure_frees_tables,
    ),
    Case::new(
      "parse_header_empty_buffer_is_invalid_input",
      parse_header_empty_buffer_is_invalid_input,
    ),
    Case::new(
      "parse_header_detects_corrupted_crc",
      parse_header_detects_corrupted_crc,
    ),
    Case::new(
      "read_header_short_read_is_truncated",
      read_header_short_read_is_truncated,
    ),
    Case::new(
      "fault_at_index_hits_only_that_call",
      fault_at_index_hits_only_that_call,
    ),
  ]
}

/// Cases that exercise the harness's own failure reporting: one assertion failure, one setup
/// error, one crash, and one case whose outcome changes after its first run. Only registered
/// when the binary is asked for them.
#[must_use]
pub fn selftest() -> Vec<Case> {
  let runs = Arc::new(AtomicUsize::new(0));
  vec![
    Case::new("selftest_assertion_failure", |ctx| {
      expect_eq!(ctx, 2 + 2, 5);
    }),
    Case::new("selftest_setup_error", |ctx| {
      let _ = ctx.calls().invoke("unregistered", &[]);
    }),
    Case::new("selftest_crash", |_| {
      panic!("selftest crash");
    }),
    Case::new("selftest_nondeterministic", move |ctx| {
      let run = runs.fetch_add(1, Ordering::SeqCst);
      expect_eq!(ctx, run, 0);
    }),
  ]
}

//
// dup_list
//

fn dup_list_copies_every_node(ctx: &mut CaseContext<'_>) {
  let heap = shared(TrackingHeap::new());
  install_heap(ctx.calls(), &heap);
  let Some(source) = ctx.fixture(Shape::linked_list([4, 5, 6])) else {
    return;
  };

  let copy = dup_list(ctx.calls(), &source);

  expect_matches!(ctx, copy, Ok(list) if list.values == [4, 5, 6]);
  expect_eq!(ctx, ctx.calls().call_count(ALLOC), 3);
  expect_eq!(ctx, heap.lock().live_count(), 3);
  if let Ok(copy) = copy {
    let freed = copy.free(ctx.calls());
    ctx.require(freed);
  }
  expect_eq!(ctx, heap.lock().live_count(), 0);
  expect!(ctx, heap.lock().errors().is_empty());
}

fn dup_list_alloc_failure_leaves_no_partial_copy(ctx: &mut CaseContext<'_>) {
  let heap = shared(TrackingHeap::new());
  install_heap(ctx.calls(), &heap);
  ctx.faults().set_failure_at(ALLOC, 1, Fault::Null);
  let Some(source) = ctx.fixture(Shape::linked_list([1, 2, 3])) else {
    return;
  };

  let result = dup_list(ctx.calls(), &source);

  expect_eq!(ctx, result, Err(DupError::AllocationFailed(1)));
  let live = heap.lock().live_count();
  expect!(ctx, live <= 1, "{live} duplicate nodes survived the failed copy");
  expect_eq!(ctx, live, 0);
  expect_eq!(ctx, ctx.calls().call_count(FREE), 1);
  expect_eq!(ctx, source.values(), vec![1, 2, 3]);
}

fn pop_front_teardown_skips_released_node(ctx: &mut CaseContext<'_>) {
  ctx.calls().install_returning(FREE, true);
  let Some(mut list) = ctx.fixture(Shape::linked_list([10, 20, 30])) else {
    return;
  };

  let popped = pop_front(ctx.calls(), &mut list);

  expect_eq!(ctx, popped, Ok(Some(10)));
  expect_eq!(ctx, list.values(), vec![20, 30]);
  let report = list.teardown();
  expect_eq!(ctx, report.freed, 2);
  expect_eq!(ctx, report.skipped, 1);
  expect_eq!(ctx, list.teardown().freed, 0);
}

//
// write_position_table
//

fn write_element(deps: &CallRecorder, i: u32) -> bool {
  let payload = Value::Bytes(i.to_le_bytes().to_vec());
  deps
    .invoke(WRITE, &[payload])
    .is_ok_and(|written| written == Value::Bool(true))
}

fn write_position_table_directory_before_payload(ctx: &mut CaseContext<'_>) {
  let heap = shared(TrackingHeap::new());
  let stream = shared(MemoryStream::new());
  install_heap(ctx.calls(), &heap);
  install_stream(ctx.calls(), &stream);
  ctx.calls().install_returning(WRITE, true);

  let result = write_position_table(ctx.calls(), 2, 0, write_element);
  expect_eq!(ctx, result, Ok(()));

  let expected = [
    Value::Bytes(vec![0; 8]),
    Value::Bytes(vec![0; 8]),
    Value::Bytes(vec![0, 0, 0, 0]),
    Value::Bytes(vec![1, 0, 0, 0]),
  ];
  for (index, expected) in expected.into_iter().enumerate() {
    let call = ctx.calls().call_at(WRITE, index);
    if let Some(call) = ctx.require(call) {
      expect_eq!(ctx, call.args, vec![expected]);
    }
  }
  expect_eq!(ctx, ctx.calls().call_count(WRITE), 6);
  expect_eq!(ctx, heap.lock().live_count(), 0);
}

fn write_position_table_element_failure_frees_tables(ctx: &mut CaseContext<'_>) {
  let heap = shared(TrackingHeap::new());
  let stream = shared(MemoryStream::new());
  install_heap(ctx.calls(), &heap);
  install_stream(ctx.calls(), &stream);

  let result = write_position_table(ctx.calls(), 3, 0, |deps, i| {
    i != 2 && write_element(deps, i)
  });

  expect_eq!(ctx, result, Err(TableError::ElementFailed(2)));
  expect_eq!(ctx, ctx.calls().call_count(FREE), 2);
  expect_eq!(ctx, heap.lock().live_count(), 0);
  // Directory placeholders and the first two elements only.
  expect_eq!(ctx, stream.lock().len(), 3 * 8 + 2 * 4);
}

//
// parse_header
//

fn parse_header_empty_buffer_is_invalid_input(ctx: &mut CaseContext<'_>) {
  install_crc32(ctx.calls());

  let result = parse_header(ctx.calls(), &[]);

  expect_eq!(ctx, result, Err(HeaderStatus::InvalidInput));
  expect_eq!(ctx, ctx.calls().call_count(CRC32), 0);
}

fn parse_header_detects_corrupted_crc(ctx: &mut CaseContext<'_>) {
  install_crc32(ctx.calls());
  ctx.faults().set_failure_at(CRC32, 1, Fault::Corrupt);
  let chunk = encode_chunk(*b"IHDR", &[0, 0, 0, 16, 0, 0, 0, 16, 8, 6, 0, 0, 0]);

  let first = parse_header(ctx.calls(), &chunk);
  let second = parse_header(ctx.calls(), &chunk);

  expect_matches!(ctx, first, Ok(header) if header.length == 13);
  expect_matches!(ctx, second, Err(HeaderStatus::CrcMismatch { .. }));
  expect_eq!(ctx, ctx.faults().triggered(), 1);
}

fn read_header_short_read_is_truncated(ctx: &mut CaseContext<'_>) {
  install_crc32(ctx.calls());
  let chunk = encode_chunk(*b"IEND", &[]);
  let len = chunk.len();
  let stream = shared(MemoryStream::from_bytes(chunk));
  install_stream(ctx.calls(), &stream);
  ctx.faults().set_failure_at(READ, 0, Fault::Truncate(len - 1));

  let result = read_header(ctx.calls(), len);

  expect_matches!(ctx, result, Err(HeaderStatus::Truncated { .. }));
  expect_eq!(ctx, ctx.calls().call_count(CRC32), 0);
}

//
// Fault injection
//

fn fault_at_index_hits_only_that_call(ctx: &mut CaseContext<'_>) {
  ctx.calls().install_returning(ALLOC, Value::Ptr(0x40));
  ctx.faults().set_failure_at(ALLOC, 2, Fault::Null);

  let results: Vec<_> = (0 .. 3)
    .map(|size| ctx.calls().invoke(ALLOC, &[Value::UInt(size)]))
    .collect();

  expect_eq!(
    ctx,
    results,
    vec![Ok(Value::Ptr(0x40)), Ok(Value::Ptr(0x40)), Ok(Value::Null)]
  );
  for (index, size) in (0 .. 3_u64).enumerate() {
    let call = ctx.calls().call_at(ALLOC, index);
    if let Some(call) = ctx.require(call) {
      expect_eq!(ctx, call.args, vec![Value::UInt(size)]);
    }
  }
}
