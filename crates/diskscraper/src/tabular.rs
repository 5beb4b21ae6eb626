//! Output file codec
//!
//! The on-disk format is fixed so that older output files stay resumable:
//! UTF-16 little endian with a BOM at the start of the file, `;` between
//! fields, `|` as the quote character (doubled inside quoted fields), quotes
//! only where a field needs them, CRLF after every row.

use crate::error::{Result, ScraperError};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

pub const DELIMITER: u8 = b';';
pub const QUOTE: u8 = b'|';

const BOM_LE: [u8; 2] = [0xFF, 0xFE];
const BOM_BE: [u8; 2] = [0xFE, 0xFF];

/// Encode one row as UTF-16LE bytes, terminator included.
pub fn encode_row<I, T>(fields: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut writer = WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote(QUOTE)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .terminator(Terminator::CRLF)
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(fields.into_iter().map(|f| f.as_ref().to_string()))?;
    let utf8 = writer.into_inner().map_err(|e| e.into_error())?;

    // Every field came in as &str, so the buffer is valid UTF-8.
    let text = String::from_utf8_lossy(&utf8);
    Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect())
}

/// Decode a whole output file.
pub fn decode(bytes: &[u8], path: &Path) -> Result<String> {
    let encoding_error = |reason: String| ScraperError::Encoding {
        path: path.to_path_buf(),
        reason,
    };

    let (body, big_endian) = if bytes.starts_with(&BOM_LE) {
        (&bytes[2..], false)
    } else if bytes.starts_with(&BOM_BE) {
        (&bytes[2..], true)
    } else {
        (bytes, false)
    };
    if body.len() % 2 != 0 {
        return Err(encoding_error(format!("odd byte length {}", bytes.len())));
    }

    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            let pair = [pair[0], pair[1]];
            if big_endian {
                u16::from_be_bytes(pair)
            } else {
                u16::from_le_bytes(pair)
            }
        })
        .collect();
    String::from_utf16(&units).map_err(|e| encoding_error(e.to_string()))
}

/// Split decoded text into rows. Rows may have differing lengths.
pub fn parse_rows(text: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .quote(QUOTE)
        .double_quote(true)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Read and parse every row of the file at `path`, header included.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let bytes = std::fs::read(path)?;
    let text = decode(&bytes, path)?;
    parse_rows(&text)
}

/// Create (or truncate) `path` and write a BOM followed by `rows` in a
/// single write.
pub fn write_file<R, T>(path: &Path, rows: impl IntoIterator<Item = R>) -> Result<()>
where
    R: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut bytes = BOM_LE.to_vec();
    for row in rows {
        bytes.extend(encode_row(row)?);
    }
    let mut file = File::create(path)?;
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(())
}

/// Open `path` for append, write one row, close it again.
pub fn append_row<I, T>(path: &Path, fields: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let bytes = encode_row(fields)?;
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(())
}
