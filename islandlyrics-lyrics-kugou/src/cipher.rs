//! Decoding of Kugou's encrypted KRC payloads.
//!
//! A payload is base64 text wrapping a 4-byte `krc1` header followed by a
//! DEFLATE stream XORed with a fixed 16-byte key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::{Decompress, DecompressError, FlushDecompress, Status};
use islandlyrics_core::CoreError;
use tracing::warn;

use crate::LOG_TARGET;

const HEADER_LEN: usize = 4;

const KEY: [u8; 16] = [
    0x40, 0x47, 0x61, 0x77, 0x5e, 0x32, 0x74, 0x47, 0x51, 0x36, 0x31, 0x2d, 0xce, 0xd2, 0x6e, 0x69,
];

const INFLATE_CHUNK: usize = 16 * 1024;

/// Decode a KRC payload, returning `encoded` unchanged if any step fails
#[must_use]
pub fn decode_krc(encoded: &str) -> String {
    match try_decode_krc(encoded) {
        Ok(text) => text,
        Err(e) => {
            warn!(target: LOG_TARGET, "{}; keeping the payload as received", e);
            encoded.to_string()
        }
    }
}

/// Decode a KRC payload.
///
/// The stream is inflated as zlib first and as raw DEFLATE if that fails. A
/// stream that stops short yields whatever was inflated so far. The first
/// character of the decoded text is a marker and is dropped.
///
/// # Errors
///
/// Returns [`CoreError::Decode`] for invalid base64, a payload shorter than
/// its header, an unreadable DEFLATE stream or non-UTF-8 output.
pub fn try_decode_krc(encoded: &str) -> Result<String, CoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let data = STANDARD
        .decode(compact)
        .map_err(|e| decode_error(format!("invalid base64: {e}")))?;

    let body = data
        .get(HEADER_LEN..)
        .ok_or_else(|| decode_error("payload is shorter than its header"))?;
    let deflated: Vec<u8> = body
        .iter()
        .zip(KEY.iter().cycle())
        .map(|(byte, key)| byte ^ key)
        .collect();

    let inflated = inflate(&deflated, true)
        .or_else(|_| inflate(&deflated, false))
        .map_err(|e| decode_error(format!("inflate failed: {e}")))?;
    let text = String::from_utf8(inflated)
        .map_err(|e| decode_error(format!("payload is not UTF-8: {e}")))?;

    let mut chars = text.chars();
    chars.next();
    Ok(chars.as_str().to_string())
}

fn decode_error(reason: impl Into<String>) -> CoreError {
    CoreError::Decode {
        reason: reason.into(),
    }
}

/// Inflate until the stream ends or stops making progress
fn inflate(data: &[u8], zlib_header: bool) -> Result<Vec<u8>, DecompressError> {
    let mut inflater = Decompress::new(zlib_header);
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).max(INFLATE_CHUNK));

    loop {
        if out.len() == out.capacity() {
            out.reserve(INFLATE_CHUNK);
        }

        let consumed_before = consumed(&inflater, data.len());
        let produced = out.len();
        let status = inflater.decompress_vec(
            &data[consumed_before..],
            &mut out,
            FlushDecompress::None,
        )?;

        if status == Status::StreamEnd {
            break;
        }
        if out.len() == produced && consumed(&inflater, data.len()) == consumed_before {
            break;
        }
    }

    Ok(out)
}

fn consumed(inflater: &Decompress, len: usize) -> usize {
    usize::try_from(inflater.total_in()).map_or(len, |n| n.min(len))
}
