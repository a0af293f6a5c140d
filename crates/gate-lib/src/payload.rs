//! Ingestion payload decoding
//!
//! Payloads are short decimal literals such as those written by
//! `echo 42 > data_in`: an optional sign, digits, and at most one trailing
//! newline. The length check happens before anything else looks at the bytes.

use crate::error::InputError;

/// Decode a bounded payload into a sample
///
/// `max_payload_len` is the largest accepted payload size in bytes.
pub fn parse_sample(payload: &[u8], max_payload_len: usize) -> Result<i64, InputError> {
    if payload.len() > max_payload_len {
        return Err(InputError::TooLong {
            len: payload.len(),
            max: max_payload_len,
        });
    }

    let digits = payload.strip_suffix(b"\n").unwrap_or(payload);
    if digits.is_empty() {
        return Err(InputError::Empty);
    }

    std::str::from_utf8(digits)
        .ok()
        .and_then(|text| text.parse::<i64>().ok())
        .ok_or_else(|| InputError::NotAnInteger(String::from_utf8_lossy(digits).into_owned()))
}
