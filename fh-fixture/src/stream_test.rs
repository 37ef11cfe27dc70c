// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use super::{MAX_STREAM_LEN, MemoryStream};
use pretty_assertions::assert_eq;

#[test]
fn write_advances_and_overwrites() {
  let mut stream = MemoryStream::new();
  assert_eq!(Some(3), stream.write(b"abc"));
  assert_eq!(3, stream.tell());

  stream.seek(1);
  stream.write(b"Z");
  assert_eq!(b"aZc", stream.as_bytes());
  assert_eq!(2, stream.tell());
}

#[test]
fn seek_past_end_zero_fills() {
  let mut stream = MemoryStream::new();
  stream.seek(4);
  assert!(stream.is_empty());

  stream.write(&[0xFF]);
  assert_eq!(&[0, 0, 0, 0, 0xFF], stream.as_bytes());
  assert_eq!(5, stream.len());
}

#[test]
fn reads_are_short_at_the_end() {
  let mut stream = MemoryStream::from_bytes(b"hello".to_vec());
  assert_eq!(b"hel".to_vec(), stream.read(3));
  assert_eq!(b"lo".to_vec(), stream.read(10));
  assert!(stream.read(1).is_empty());
  assert_eq!(5, stream.tell());

  stream.seek(9);
  assert!(stream.read(1).is_empty());
  assert_eq!(9, stream.tell());
}

#[test]
fn u32_words() {
  let mut stream = MemoryStream::new();
  stream.write(&42_u32.to_le_bytes());
  assert_eq!(Some(42), stream.u32_le_at(0));
  assert_eq!(None, stream.u32_le_at(1));
}

#[test]
fn huge_read_after_a_partial_read_is_short() {
  let mut stream = MemoryStream::from_bytes(b"abc".to_vec());
  assert_eq!(b"a".to_vec(), stream.read(1));
  assert_eq!(b"bc".to_vec(), stream.read(usize::MAX));
  assert_eq!(3, stream.tell());
}

#[test]
fn seeks_and_writes_past_the_cap_are_refused() {
  let mut stream = MemoryStream::new();
  assert!(!stream.seek(usize::MAX));
  assert!(!stream.seek(MAX_STREAM_LEN + 1));
  assert_eq!(0, stream.tell());

  assert!(stream.seek(MAX_STREAM_LEN));
  assert_eq!(None, stream.write(b"x"));
  assert_eq!(Some(0), stream.write(b""));
  assert!(stream.is_empty());
}

#[test]
fn u32_near_the_end_of_the_address_space() {
  let stream = MemoryStream::from_bytes(vec![0; 8]);
  assert_eq!(None, stream.u32_le_at(usize::MAX - 1));
}
