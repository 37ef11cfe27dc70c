// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./header_test.rs"]
mod header_test;

use fh_error::ConfigurationError;
use fh_fixture::spies::READ;
use fh_spy::{CallRecorder, Value};

pub const CRC32: &str = "crc32";

pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

// Length and type precede the data, the CRC follows it.
const CHUNK_PREFIX_LEN: usize = 8;
const CRC_LEN: usize = 4;

//
// HeaderStatus
//

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum HeaderStatus {
  #[error("input is empty or shorter than the signature")]
  InvalidInput,
  #[error("signature mismatch")]
  BadSignature,
  #[error("chunk truncated: need {needed} bytes, have {available}")]
  Truncated { needed: usize, available: usize },
  #[error("invalid chunk type {0:02x?}")]
  InvalidChunkType([u8; 4]),
  #[error("CRC mismatch: stored {stored:#010x}, computed {computed:#010x}")]
  CrcMismatch { stored: u32, computed: u32 },
  #[error("checksum dependency returned {0:?}")]
  ChecksumUnavailable(Value),
  #[error(transparent)]
  Dependency(#[from] ConfigurationError),
}

//
// ChunkHeader
//

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
  pub length: u32,
  pub chunk_type: [u8; 4],
  pub crc: u32,
}

impl ChunkHeader {
  #[must_use]
  pub fn type_name(&self) -> String {
    String::from_utf8_lossy(&self.chunk_type).into_owned()
  }
}

/// Installs the normal `crc32` behavior: the CRC-32 of the `Bytes` argument.
pub fn install_crc32(deps: &CallRecorder) {
  deps.install(CRC32, |args| {
    let bytes = args.first().and_then(Value::as_bytes).unwrap_or_default();
    Value::UInt(u64::from(crc32fast::hash(bytes)))
  });
}

/// Encodes a signature followed by one chunk, for building inputs.
#[must_use]
pub fn encode_chunk(chunk_type: [u8; 4], data: &[u8]) -> Vec<u8> {
  let mut crc_input = chunk_type.to_vec();
  crc_input.extend_from_slice(data);

  let mut bytes = SIGNATURE.to_vec();
  bytes.extend_from_slice(&u32::try_from(data.len()).unwrap_or(u32::MAX).to_be_bytes());
  bytes.extend_from_slice(&crc_input);
  bytes.extend_from_slice(&crc32fast::hash(&crc_input).to_be_bytes());
  bytes
}

/// Parses the signature and the first chunk of `bytes`. The CRC covers the chunk type and data
/// and is computed through the `crc32` dependency.
pub fn parse_header(deps: &CallRecorder, bytes: &[u8]) -> Result<ChunkHeader, HeaderStatus> {
  let Some((signature, rest)) = bytes.split_first_chunk::<8>() else {
    return Err(HeaderStatus::InvalidInput);
  };
  if *signature != SIGNATURE {
    return Err(HeaderStatus::BadSignature);
  }

  let Some((prefix, rest)) = rest.split_first_chunk::<CHUNK_PREFIX_LEN>() else {
    return Err(HeaderStatus::Truncated {
      needed: CHUNK_PREFIX_LEN,
      available: rest.len(),
    });
  };
  let length = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
  let chunk_type = [prefix[4], prefix[5], prefix[6], prefix[7]];
  if !chunk_type.iter().all(u8::is_ascii_alphabetic) {
    return Err(HeaderStatus::InvalidChunkType(chunk_type));
  }

  let needed = usize::try_from(length)
    .unwrap_or(usize::MAX)
    .saturating_add(CRC_LEN);
  if rest.len() < needed {
    return Err(HeaderStatus::Truncated {
      needed,
      available: rest.len(),
    });
  }
  let (data, crc) = rest[.. needed].split_at(needed - CRC_LEN);
  let stored = u32::from_be_bytes([crc[0], crc[1], crc[2], crc[3]]);

  let mut crc_input = chunk_type.to_vec();
  crc_input.extend_from_slice(data);
  let computed = deps.invoke(CRC32, &[Value::Bytes(crc_input)])?;
  let Some(computed) = computed.as_u64().and_then(|crc| u32::try_from(crc).ok()) else {
    return Err(HeaderStatus::ChecksumUnavailable(computed));
  };
  if computed != stored {
    return Err(HeaderStatus::CrcMismatch { stored, computed });
  }

  Ok(ChunkHeader {
    length,
    chunk_type,
    crc: stored,
  })
}

/// Reads `len` bytes through the `read` dependency and parses them.
pub fn read_header(deps: &CallRecorder, len: usize) -> Result<ChunkHeader, HeaderStatus> {
  let read = deps.invoke(READ, &[Value::from(len)])?;
  let bytes = read.as_bytes().unwrap_or_default();
  if bytes.len() < len {
    log::debug!("short read: wanted {len} bytes, got {}", bytes.len());
  }
  parse_header(deps, bytes)
}
