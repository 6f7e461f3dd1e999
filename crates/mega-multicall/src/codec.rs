//! Compact call encoding, packed result encoding and revert reason decoding.
//!
//! # Compact calls
//!
//! ```text
//! count: 32 bytes, big-endian
//! per call:
//!   flags: 1 byte (bit 0: same target as previous, bit 1: same calldata as previous)
//!   target: 20 bytes, omitted when bit 0 is set
//!   length: 2 bytes big-endian + calldata, omitted when bit 1 is set
//! ```
//!
//! # Packed results
//!
//! ```text
//! per result:
//!   length: 2 bytes big-endian, covering the whole record including itself
//!   success: 1 byte
//!   gas used: 4 bytes big-endian, saturated at u32::MAX
//!   return data
//! ```

use alloy_primitives::{hex, Address, Bytes, U256};
use alloy_sol_types::{Panic, Revert, SolError};

use crate::{
    constants::compact::{
        CALL_COUNT_LEN, MAX_RECORD_DATA_LEN, RECORD_HEADER_LEN, RECORD_LENGTH_LEN,
        SAME_CALLDATA_FLAG, SAME_TARGET_FLAG,
    },
    Call, ResultGas,
};

/// Errors of the compact encodings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The input ended in the middle of an item.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof {
        /// Offset of the truncated item.
        offset: usize,
    },
    /// The call count header does not fit the platform's address space.
    #[error("call count {0} is too large")]
    CallCountOverflow(U256),
    /// The first call refers to a previous call.
    #[error("call {index} reuses a field of a previous call, but none exists")]
    MissingPrevious {
        /// Index of the offending call.
        index: usize,
    },
    /// Calldata does not fit the 16-bit length prefix.
    #[error("calldata of call {index} is {len} bytes, limit is 65535")]
    CalldataTooLarge {
        /// Index of the offending call.
        index: usize,
        /// Calldata length.
        len: usize,
    },
    /// Return data does not fit a packed record.
    #[error("return data of result {index} is {len} bytes, limit is 65528")]
    ReturnDataTooLarge {
        /// Index of the offending result.
        index: usize,
        /// Return data length.
        len: usize,
    },
    /// A packed record declares a length shorter than its header or longer than the input.
    #[error("malformed packed result at offset {offset}")]
    MalformedRecord {
        /// Offset of the record.
        offset: usize,
    },
    /// Input continues after the last declared call.
    #[error("{0} trailing bytes after the last call")]
    TrailingBytes(usize),
}

/// A cursor over the compact input.
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(CodecError::UnexpectedEof { offset: self.offset })?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn take_u16(&mut self) -> Result<u16, CodecError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    const fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }
}

/// Encodes `calls` in the compact call encoding, eliding targets and calldata repeated from
/// the previous call.
pub fn encode_compact_calls(calls: &[Call]) -> Result<Bytes, CodecError> {
    let mut out = Vec::with_capacity(CALL_COUNT_LEN + calls.len() * 24);
    out.extend_from_slice(&U256::from(calls.len()).to_be_bytes::<CALL_COUNT_LEN>());

    let mut previous: Option<&Call> = None;
    for (index, call) in calls.iter().enumerate() {
        let same_target = previous.is_some_and(|prev| prev.target == call.target);
        let same_calldata = previous.is_some_and(|prev| prev.payload == call.payload);

        let mut flags = 0u8;
        if same_target {
            flags |= SAME_TARGET_FLAG;
        }
        if same_calldata {
            flags |= SAME_CALLDATA_FLAG;
        }
        out.push(flags);

        if !same_target {
            out.extend_from_slice(call.target.as_slice());
        }
        if !same_calldata {
            let len = u16::try_from(call.payload.len())
                .map_err(|_| CodecError::CalldataTooLarge { index, len: call.payload.len() })?;
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(&call.payload);
        }
        previous = Some(call);
    }
    Ok(out.into())
}

/// Decodes a compact call encoding.
pub fn decode_compact_calls(data: &[u8]) -> Result<Vec<Call>, CodecError> {
    let mut reader = Reader::new(data);
    let count = U256::from_be_slice(reader.take(CALL_COUNT_LEN)?);
    let count: usize = count.try_into().map_err(|_| CodecError::CallCountOverflow(count))?;

    // every call takes at least its flag byte
    let mut calls: Vec<Call> = Vec::with_capacity(count.min(reader.remaining()));
    for index in 0..count {
        let flags = reader.take_u8()?;
        let previous = calls.last();
        let reuses_previous = flags & (SAME_TARGET_FLAG | SAME_CALLDATA_FLAG) != 0;
        if reuses_previous && previous.is_none() {
            return Err(CodecError::MissingPrevious { index });
        }

        let target = match previous {
            Some(prev) if flags & SAME_TARGET_FLAG != 0 => prev.target,
            _ => Address::from_slice(reader.take(20)?),
        };
        let payload = match previous {
            Some(prev) if flags & SAME_CALLDATA_FLAG != 0 => prev.payload.clone(),
            _ => {
                let len = reader.take_u16()? as usize;
                Bytes::copy_from_slice(reader.take(len)?)
            }
        };
        calls.push(Call { target, payload });
    }

    match reader.remaining() {
        0 => Ok(calls),
        trailing => Err(CodecError::TrailingBytes(trailing)),
    }
}

/// Encodes results in the packed result encoding.
pub fn encode_packed_results(results: &[ResultGas]) -> Result<Bytes, CodecError> {
    let capacity =
        results.iter().map(|result| RECORD_HEADER_LEN + result.return_data.len()).sum::<usize>();
    let mut out = Vec::with_capacity(capacity);
    for (index, result) in results.iter().enumerate() {
        let len = result.return_data.len();
        if len > MAX_RECORD_DATA_LEN {
            return Err(CodecError::ReturnDataTooLarge { index, len });
        }
        // bounded by the check above
        let record_len = (RECORD_HEADER_LEN + len) as u16;
        let gas_used = u32::try_from(result.gas_used).unwrap_or(u32::MAX);

        out.extend_from_slice(&record_len.to_be_bytes());
        out.push(u8::from(result.success));
        out.extend_from_slice(&gas_used.to_be_bytes());
        out.extend_from_slice(&result.return_data);
    }
    Ok(out.into())
}

/// Decodes the packed result encoding.
pub fn decode_packed_results(data: &[u8]) -> Result<Vec<ResultGas>, CodecError> {
    let mut reader = Reader::new(data);
    let mut results = Vec::new();
    while reader.remaining() > 0 {
        let offset = reader.offset;
        let record_len = reader.take_u16()? as usize;
        if record_len < RECORD_HEADER_LEN {
            return Err(CodecError::MalformedRecord { offset });
        }
        let body = reader
            .take(record_len - RECORD_LENGTH_LEN)
            .map_err(|_| CodecError::MalformedRecord { offset })?;

        let gas_used = u32::from_be_bytes([body[1], body[2], body[3], body[4]]);
        results.push(ResultGas {
            success: body[0] == 1,
            gas_used: gas_used.into(),
            return_data: Bytes::copy_from_slice(&body[5..]),
        });
    }
    Ok(results)
}

/// Renders revert data as a human-readable reason.
///
/// `Error(string)` yields its message, `Panic(uint256)` its code, empty data `"unknown"` and
/// anything else the hex of the raw data.
pub fn decode_revert_reason(data: &[u8]) -> String {
    if data.is_empty() {
        return "unknown".to_string();
    }
    if let Ok(revert) = Revert::abi_decode(data) {
        return revert.reason;
    }
    if let Ok(panic) = Panic::abi_decode(data) {
        return format!("panic code 0x{:x}", panic.code);
    }
    hex::encode_prefixed(data)
}
