//! I/O helpers shared by the reader: encoding resolution, whole-file decoding,
//! and delimiter detection.
//!
//! Source extracts are read into memory in one go, decoded to UTF-8 with
//! `encoding_rs` (a byte-order mark wins over the requested encoding), and
//! then handed to a `csv::Reader` configured for the detected delimiter.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use log::warn;

pub const COMMA_DELIMITER: u8 = b',';
pub const TAB_DELIMITER: u8 = b'\t';

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn read_to_string(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Reading input file {path:?}"))?;
    decode_bytes(&bytes, encoding)
}

/// Undecodable byte sequences become U+FFFD so a stray byte never sinks a file.
pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(
            "Input contained byte sequences that are not valid {}; they were replaced",
            used.name()
        );
    }
    Ok(text.into_owned())
}

/// Tab when the first line contains one, comma otherwise.
pub fn detect_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.contains('\t') {
        TAB_DELIMITER
    } else {
        COMMA_DELIMITER
    }
}

pub fn open_csv_reader(text: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(text.as_bytes())
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn detect_delimiter_only_inspects_first_line() {
        assert_eq!(detect_delimiter("a\tb\n1,2\n"), TAB_DELIMITER);
        assert_eq!(detect_delimiter("a,b\n1\t2\n"), COMMA_DELIMITER);
        assert_eq!(detect_delimiter(""), COMMA_DELIMITER);
    }

    #[test]
    fn decode_bytes_strips_utf8_bom() {
        let bytes = b"\xEF\xBB\xBFcode,usage\n";
        let text = decode_bytes(bytes, UTF_8).unwrap();
        assert_eq!(text, "code,usage\n");
    }

    #[test]
    fn decode_bytes_honours_legacy_encodings() {
        let text = decode_bytes(b"caf\xE9", WINDOWS_1252).unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn decode_bytes_replaces_invalid_sequences() {
        let text = decode_bytes(b"ab\xFFc", UTF_8).unwrap();
        assert_eq!(text, "ab\u{FFFD}c");
    }

    #[test]
    fn resolve_encoding_rejects_unknown_labels() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(resolve_encoding(Some(" latin1 ")).unwrap(), WINDOWS_1252);
        assert!(resolve_encoding(Some("klingon")).is_err());
    }
}
