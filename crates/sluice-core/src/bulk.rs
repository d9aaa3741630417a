//! Bulk encoding — length-prefixed records on top of `Transport`.
//!
//! Wire format, byte-exact:
//!
//! ```text
//! count record   <tag><decimal>\r\n
//! bulk string    $<len>\r\n<bytes>\r\n
//! ```
//!
//! Integers and doubles travel as bulk strings holding their decimal
//! rendering. The encoder only calls `Transport::write` and the decoder
//! only `Transport::read`, so both work over any backend and feed the
//! checksum.
//!
//! An error part-way through a record leaves the fragments already written
//! in place. The stream must then be treated as broken.

use std::io::Write as _;

use crate::error::TransportError;
use crate::transport::Transport;

/// Record terminator.
pub const CRLF: &[u8; 2] = b"\r\n";

/// Tag for a bulk string header.
pub const BULK_STRING_TAG: u8 = b'$';

/// Tag for a multi-bulk (array) count.
pub const MULTI_BULK_TAG: u8 = b'*';

/// Longest header line the decoder accepts, terminator excluded.
pub const MAX_HEADER_LEN: usize = 32;

/// Largest slice of a bulk payload the decoder reads at once.
const PAYLOAD_READ_STEP: usize = 64 * 1024;

/// Canonical text for a double.
///
/// Plain decimal for zero and magnitudes in [1e-5, 1e17), scientific
/// otherwise. Both forms are the shortest text that parses back to the
/// same bits. Non-finite values use the tokens `inf`, `-inf` and `nan`.
pub fn format_double(d: f64) -> String {
    if d.is_nan() {
        "nan".to_string()
    } else if d == f64::INFINITY {
        "inf".to_string()
    } else if d == f64::NEG_INFINITY {
        "-inf".to_string()
    } else if d == 0.0 || (1e-5..1e17).contains(&d.abs()) {
        format!("{d}")
    } else {
        format!("{d:e}")
    }
}

/// Inverse of [`format_double`].
pub fn parse_double(text: &str) -> Option<f64> {
    match text {
        "nan" => Some(f64::NAN),
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        other => other.parse().ok(),
    }
}

// ── Encoder ───────────────────────────────────────────────────────────────────

impl Transport {
    /// Write `<prefix><count>\r\n`. Returns the bytes written.
    pub fn write_bulk_count(&mut self, prefix: u8, count: u64) -> Result<usize, TransportError> {
        let mut header = Vec::with_capacity(MAX_HEADER_LEN);
        header.push(prefix);
        write!(header, "{count}")?;
        header.extend_from_slice(CRLF);
        self.write(&header)?;
        Ok(header.len())
    }

    /// Write `$<len>\r\n<payload>\r\n`. Returns the bytes written.
    pub fn write_bulk_string(&mut self, payload: &[u8]) -> Result<usize, TransportError> {
        let mut written = self.write_bulk_count(BULK_STRING_TAG, payload.len() as u64)?;
        if !payload.is_empty() {
            self.write(payload)?;
            written += payload.len();
        }
        self.write(CRLF)?;
        Ok(written + CRLF.len())
    }

    /// Write an integer as a bulk string of its decimal digits.
    pub fn write_bulk_i64(&mut self, value: i64) -> Result<usize, TransportError> {
        self.write_bulk_string(value.to_string().as_bytes())
    }

    /// Write a double as a bulk string, see [`format_double`].
    pub fn write_bulk_f64(&mut self, value: f64) -> Result<usize, TransportError> {
        self.write_bulk_string(format_double(value).as_bytes())
    }
}

// ── Decoder ───────────────────────────────────────────────────────────────────

impl Transport {
    /// Read one header line up to and excluding `\r\n`.
    fn read_header_line(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut line = Vec::with_capacity(MAX_HEADER_LEN);
        let mut byte = [0u8; 1];
        loop {
            self.read(&mut byte)?;
            if byte[0] == b'\r' {
                self.read(&mut byte)?;
                if byte[0] != b'\n' {
                    return Err(TransportError::Malformed("CR not followed by LF"));
                }
                return Ok(line);
            }
            if line.len() == MAX_HEADER_LEN {
                return Err(TransportError::Malformed("header line too long"));
            }
            line.push(byte[0]);
        }
    }

    /// Read `<prefix><count>\r\n` and return the count.
    pub fn read_bulk_count(&mut self, prefix: u8) -> Result<u64, TransportError> {
        let line = self.read_header_line()?;
        let Some((&tag, digits)) = line.split_first() else {
            return Err(TransportError::Malformed("empty header"));
        };
        if tag != prefix {
            return Err(TransportError::Malformed("unexpected record tag"));
        }
        parse_count(digits)
    }

    /// Read one bulk string payload.
    pub fn read_bulk_string(&mut self) -> Result<Vec<u8>, TransportError> {
        let len = self.read_bulk_count(BULK_STRING_TAG)?;
        let len = usize::try_from(len).map_err(|_| TransportError::Malformed("length overflow"))?;
        // The declared length is untrusted: grow only as bytes arrive.
        let mut payload = Vec::new();
        while payload.len() < len {
            let start = payload.len();
            let step = (len - start).min(PAYLOAD_READ_STEP);
            payload.try_reserve_exact(step)?;
            payload.resize(start + step, 0);
            self.read(&mut payload[start..])?;
        }

        let mut end = [0u8; 2];
        self.read(&mut end)?;
        if &end != CRLF {
            return Err(TransportError::Malformed("payload not terminated by CRLF"));
        }
        Ok(payload)
    }

    pub fn read_bulk_i64(&mut self) -> Result<i64, TransportError> {
        let payload = self.read_bulk_string()?;
        std::str::from_utf8(&payload)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(TransportError::Malformed("invalid integer"))
    }

    pub fn read_bulk_f64(&mut self) -> Result<f64, TransportError> {
        let payload = self.read_bulk_string()?;
        std::str::from_utf8(&payload)
            .ok()
            .and_then(parse_double)
            .ok_or(TransportError::Malformed("invalid double"))
    }
}

fn parse_count(digits: &[u8]) -> Result<u64, TransportError> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(TransportError::Malformed("count is not a decimal number"));
    }
    digits.iter().try_fold(0u64, |acc, d| {
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(u64::from(d - b'0')))
            .ok_or(TransportError::Malformed("count overflow"))
    })
}
