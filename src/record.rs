//! Fixed-offset parsing of the miner's `efficient_addresses.txt` log.
//!
//! Every line is written by the miner as
//! `0x<salt:64> => 0x<address:40> => <reward>`, so fields sit at fixed byte
//! offsets rather than being split on the `=>` separators. The offsets below
//! are the log's wire format; a change on the miner side is a format break.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// End of the `0x`-prefixed salt.
pub const SALT_END: usize = 66;
/// Start of the `0x`-prefixed address.
pub const ADDRESS_START: usize = 70;
/// Start of the address payload (after `0x`).
pub const PAYLOAD_START: usize = 72;
/// End of the address (exclusive).
pub const ADDRESS_END: usize = 112;
/// Start of the reward score.
pub const SCORE_START: usize = 116;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("line is {len} bytes, need at least 116")]
    TooShort { len: usize },

    #[error("byte offset {offset} splits a multi-byte character")]
    NotCharBoundary { offset: usize },
}

/// One candidate reported by the miner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// 1-based line number in the log.
    pub line: usize,
    pub salt: String,
    pub address: String,
    pub score: u128,
    pub leading_zero_bytes: u8,
    pub total_zero_bytes: u8,
}

/// Result of parsing a whole log: the well-formed records in file order and
/// how many non-blank lines were rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLog {
    pub records: Vec<Record>,
    pub skipped: usize,
}

/// Parse a single log line. `line_number` is carried through to the record.
pub fn extract(line: &str, line_number: usize) -> Result<Record, ExtractError> {
    if line.len() < SCORE_START {
        return Err(ExtractError::TooShort { len: line.len() });
    }

    let salt = slice(line, 0, SALT_END)?;
    let address = slice(line, ADDRESS_START, ADDRESS_END)?;
    let payload = slice(line, PAYLOAD_START, ADDRESS_END)?;
    let score = parse_score(slice(line, SCORE_START, line.len())?);
    let (leading_zero_bytes, total_zero_bytes) = zero_byte_counts(payload);

    Ok(Record {
        line: line_number,
        salt: salt.to_string(),
        address: address.to_string(),
        score,
        leading_zero_bytes,
        total_zero_bytes,
    })
}

/// Parse every line of `content`. Malformed lines are counted in
/// [`ParsedLog::skipped`]. Blank lines carry no salt or address, so they are
/// neither records nor malformed and are dropped without being counted.
pub fn parse_log(content: &str) -> ParsedLog {
    let mut parsed = ParsedLog::default();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match extract(line, idx + 1) {
            Ok(record) => parsed.records.push(record),
            Err(err) => {
                debug!(line = idx + 1, error = %err, "skipping malformed line");
                parsed.skipped += 1;
            }
        }
    }
    parsed
}

/// Anything that does not parse as an unsigned integer scores zero.
pub fn parse_score(text: &str) -> u128 {
    text.trim().parse().unwrap_or(0)
}

/// Count `(leading, total)` zero bytes in a hex payload, one byte per pair of
/// characters. A trailing odd character is ignored.
pub fn zero_byte_counts(payload: &str) -> (u8, u8) {
    let mut leading = 0u8;
    let mut total = 0u8;
    let mut in_prefix = true;
    for pair in payload.as_bytes().chunks_exact(2) {
        if pair == b"00" {
            total = total.saturating_add(1);
            if in_prefix {
                leading = leading.saturating_add(1);
            }
        } else {
            in_prefix = false;
        }
    }
    (leading, total)
}

fn slice(line: &str, start: usize, end: usize) -> Result<&str, ExtractError> {
    line.get(start..end).ok_or_else(|| {
        let offset = if line.is_char_boundary(start) { end } else { start };
        ExtractError::NotCharBoundary { offset }
    })
}
