//! Delimited-text decoding: encoding sniffing, delimiter sniffing, parsing
//!
//! Exports from ranking sites come as UTF-8, UTF-8 with BOM, UTF-16 from
//! spreadsheet tools, or Windows-1252. Separators are `,` or `;` depending
//! on the locale of whoever configured the export.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use serde_json::Value;
use tracing::debug;

use super::error::AcquisitionError;
use crate::model::{HeaderSet, Record};
use crate::normalize::normalize;

/// Candidate field separators, in tie-break order
pub const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Lines inspected when sniffing the delimiter
const SNIFF_LINES: usize = 10;

/// Leading bytes inspected by the binary check
const BINARY_SNIFF_BYTES: usize = 4096;

/// Control characters (other than tab, CR, LF) tolerated per thousand bytes
const MAX_CONTROL_PER_MILLE: usize = 10;

/// Container formats spreadsheet exports ship in: OLE2 (`.xls`) and ZIP (`.xlsx`, `.ods`)
const BINARY_MAGIC: [&[u8]; 2] = [&[0xD0, 0xCF, 0x11, 0xE0], b"PK\x03\x04"];

/// A parsed delimited file
#[derive(Debug, Clone, PartialEq)]
pub struct DelimitedTable {
    pub headers: HeaderSet,
    pub records: Vec<Record>,
    pub encoding: &'static str,
    pub delimiter: char,
}

/// Encoding from the byte-order mark, if any, with the BOM length
#[must_use]
pub fn bom_encoding(bytes: &[u8]) -> Option<(&'static Encoding, usize)> {
    Encoding::for_bom(bytes)
}

/// BOM first, then UTF-8 validity, else Windows-1252
#[must_use]
pub fn sniff_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = bom_encoding(bytes) {
        return encoding;
    }
    if std::str::from_utf8(bytes).is_ok() {
        UTF_8
    } else {
        WINDOWS_1252
    }
}

/// Decode `bytes`, trying the sniffed encoding, then the declared one, then
/// UTF-8, then Windows-1252. The first strict decode wins.
pub fn decode(
    bytes: &[u8],
    declared: Option<&'static Encoding>,
) -> Result<(String, &'static Encoding), AcquisitionError> {
    let (body, from_bom) = match bom_encoding(bytes) {
        Some((encoding, len)) => (&bytes[len..], Some(encoding)),
        None => (bytes, None),
    };

    let mut candidates: Vec<&'static Encoding> = Vec::with_capacity(4);
    for encoding in [from_bom, declared, Some(sniff_encoding(body)), Some(UTF_8), Some(WINDOWS_1252)]
        .into_iter()
        .flatten()
    {
        if !candidates.contains(&encoding) {
            candidates.push(encoding);
        }
    }

    for encoding in candidates {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body) {
            debug!(encoding = encoding.name(), "Decoded delimited payload");
            return Ok((text.into_owned(), encoding));
        }
        debug!(encoding = encoding.name(), "Strict decode failed, trying next encoding");
    }

    Err(AcquisitionError::Decode(
        "payload does not decode with any candidate encoding".to_string(),
    ))
}

/// Reject payloads that are not text: spreadsheet containers, NUL bytes, or
/// a high share of control characters.
///
/// UTF-16 payloads announced by a BOM legitimately carry NULs and are
/// exempt from the byte checks.
pub fn reject_binary(bytes: &[u8]) -> Result<(), AcquisitionError> {
    if let Some(magic) = BINARY_MAGIC.iter().find(|magic| bytes.starts_with(magic)) {
        return Err(AcquisitionError::Decode(format!(
            "binary spreadsheet container (magic {magic:02X?}), not delimited text"
        )));
    }
    if matches!(bom_encoding(bytes), Some((encoding, _)) if encoding == UTF_16LE || encoding == UTF_16BE)
    {
        return Ok(());
    }

    let sample = &bytes[..bytes.len().min(BINARY_SNIFF_BYTES)];
    if sample.contains(&0) {
        return Err(AcquisitionError::Decode(
            "payload contains NUL bytes, not delimited text".to_string(),
        ));
    }
    let control = sample
        .iter()
        .filter(|&&b| (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r')) || b == 0x7F)
        .count();
    if control * 1000 > sample.len() * MAX_CONTROL_PER_MILLE {
        return Err(AcquisitionError::Decode(format!(
            "{control} control bytes in the first {} bytes, not delimited text",
            sample.len()
        )));
    }
    Ok(())
}

/// Occurrences of `delimiter` outside double-quoted sections
fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for byte in line.bytes() {
        match byte {
            b'"' => in_quotes = !in_quotes,
            b if b == delimiter && !in_quotes => count += 1,
            _ => {}
        }
    }
    count
}

/// Pick the field separator.
///
/// A delimiter with the same non-zero count on every sampled line wins
/// (highest count first). Otherwise the one most frequent in the header
/// line is used. `None` when no candidate appears at all.
#[must_use]
pub fn sniff_delimiter(text: &str) -> Option<u8> {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    let header = lines.first()?;

    let consistent = DELIMITERS
        .iter()
        .filter_map(|&delimiter| {
            let expected = count_unquoted(header, delimiter);
            (expected > 0
                && lines
                    .iter()
                    .all(|line| count_unquoted(line, delimiter) == expected))
            .then_some((delimiter, expected))
        })
        .fold(None::<(u8, usize)>, |best, candidate| match best {
            Some((_, count)) if count >= candidate.1 => best,
            _ => Some(candidate),
        });
    if let Some((delimiter, _)) = consistent {
        return Some(delimiter);
    }

    DELIMITERS
        .iter()
        .map(|&delimiter| (delimiter, count_unquoted(header, delimiter)))
        .filter(|(_, count)| *count > 0)
        .fold(None::<(u8, usize)>, |best, candidate| match best {
            Some((_, count)) if count >= candidate.1 => best,
            _ => Some(candidate),
        })
        .map(|(delimiter, _)| delimiter)
}

/// Parse decoded text into records keyed by the trimmed header row
pub fn parse_text(text: &str, delimiter: u8) -> Result<(HeaderSet, Vec<Record>), AcquisitionError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let raw_headers = reader
        .headers()
        .map_err(|e| AcquisitionError::Decode(format!("unreadable header row: {e}")))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect::<Vec<_>>();
    let headers = HeaderSet::from_raw(&raw_headers);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| AcquisitionError::Decode(format!("malformed row: {e}")))?;
        let mut record = Record::new();
        for (index, field) in row.iter().enumerate() {
            let Some(header) = headers.get(index) else {
                break;
            };
            let field = field.trim();
            if field.is_empty() {
                continue;
            }
            let (scalar, _) = normalize(field);
            record.insert(header.to_string(), Value::from(scalar));
        }
        if !record.is_empty() {
            records.push(record);
        }
    }

    Ok((headers, records))
}

/// Decode and parse a downloaded delimited file
pub fn parse_bytes(
    bytes: &[u8],
    declared: Option<&'static Encoding>,
) -> Result<DelimitedTable, AcquisitionError> {
    reject_binary(bytes)?;
    let (text, encoding) = decode(bytes, declared)?;
    let delimiter = sniff_delimiter(&text)
        .ok_or_else(|| AcquisitionError::Decode("no supported delimiter detected".to_string()))?;
    let (headers, records) = parse_text(&text, delimiter)?;

    Ok(DelimitedTable {
        headers,
        records,
        encoding: encoding.name(),
        delimiter: char::from(delimiter),
    })
}
