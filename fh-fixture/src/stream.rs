// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./stream_test.rs"]
mod stream_test;

/// Largest position or length a [`MemoryStream`] will grow to. Seeks and writes beyond it are
/// refused rather than attempted, so an absurd size from the function under test shows up as a
/// failed dependency call.
pub const MAX_STREAM_LEN: usize = 64 << 20;

//
// MemoryStream
//

/// An in-memory seekable byte stream. Seeking past the end and writing there zero-fills the gap,
/// the way a sparse file would read back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStream {
  data: Vec<u8>,
  position: usize,
}

impl MemoryStream {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
    Self {
      data: bytes.into(),
      position: 0,
    }
  }

  #[must_use]
  pub const fn tell(&self) -> usize {
    self.position
  }

  /// Moves to `position`. Returns false, leaving the position alone, past [`MAX_STREAM_LEN`].
  pub fn seek(&mut self, position: usize) -> bool {
    if position > MAX_STREAM_LEN {
      log::debug!("refusing seek to {position}");
      return false;
    }
    self.position = position;
    true
  }

  /// Writes `bytes` at the current position, overwriting or extending, and advances. Returns
  /// `None` without writing anything if the stream would grow past [`MAX_STREAM_LEN`].
  pub fn write(&mut self, bytes: &[u8]) -> Option<usize> {
    let end = self
      .position
      .checked_add(bytes.len())
      .filter(|end| *end <= MAX_STREAM_LEN)?;
    if self.data.len() < end {
      self.data.resize(end, 0);
    }
    self.data[self.position .. end].copy_from_slice(bytes);
    self.position = end;
    Some(bytes.len())
  }

  /// Reads up to `len` bytes. Near the end the result is short; past the end it is empty.
  pub fn read(&mut self, len: usize) -> Vec<u8> {
    let start = self.position.min(self.data.len());
    let end = start.saturating_add(len).min(self.data.len());
    self.position = start.max(self.position) + (end - start);
    self.data[start .. end].to_vec()
  }

  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    &self.data
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.data.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// Little-endian `u32` stored at `offset`, if the stream is long enough.
  #[must_use]
  pub fn u32_le_at(&self, offset: usize) -> Option<u32> {
    let bytes = self.data.get(offset .. offset.checked_add(4)?)?;
    let mut word = [0; 4];
    word.copy_from_slice(bytes);
    Some(u32::from_le_bytes(word))
  }
}
