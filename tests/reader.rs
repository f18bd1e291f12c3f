mod common;

use common::TestWorkspace;
use encoding_rs::{UTF_8, WINDOWS_1252};
use proptest::prelude::*;
use snomed_usage_loader::{
    error::LoadError,
    reader::{parse_delimited, read_delimited},
};

#[test]
fn read_delimited_reports_missing_header_with_path() {
    let ws = TestWorkspace::new();
    let path = ws.write("SNOMED_code_usage_2023-24.txt", "");
    let err = read_delimited(&path, UTF_8).unwrap_err();
    match err.downcast_ref::<LoadError>() {
        Some(LoadError::MissingHeader { path: reported }) => assert_eq!(reported, &path),
        other => panic!("expected missing header, got {other:?}"),
    }
}

#[test]
fn read_delimited_decodes_requested_encoding() {
    let ws = TestWorkspace::new();
    let path = ws.path().join("latin.csv");
    std::fs::write(&path, b"code,term\n1,Caf\xE9 au lait\n").unwrap();
    let file = read_delimited(&path, WINDOWS_1252).unwrap();
    assert_eq!(file.records[0].get("term"), Some(Some("Café au lait")));
}

#[test]
fn quoted_fields_keep_embedded_delimiters() {
    let file = parse_delimited("code,term\n1,\"Pain, chest\"\n").unwrap();
    assert_eq!(file.records[0].get("term"), Some(Some("Pain, chest")));
}

#[test]
fn crlf_line_endings_are_handled() {
    let file = parse_delimited("code\tusage\r\n1\t2\r\n3\t\r\n").unwrap();
    assert_eq!(file.records.len(), 2);
    assert_eq!(file.records[0].get("usage"), Some(Some("2")));
    assert_eq!(file.records[1].get("usage"), Some(None));
}

fn cell() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9]{1,8}",
        Just(String::new()),
        "[ ]{1,3}",
    ]
}

fn table() -> impl Strategy<Value = (bool, usize, Vec<Vec<String>>)> {
    (any::<bool>(), 2usize..6).prop_flat_map(|(tabs, width)| {
        let row = prop::collection::vec(cell(), 0..=width + 1);
        (
            Just(tabs),
            Just(width),
            prop::collection::vec(row, 0..20),
        )
    })
}

proptest! {
    #[test]
    fn one_record_per_line_with_header_width_and_no_blank_strings(
        (tabs, width, rows) in table()
    ) {
        let delimiter = if tabs { "\t" } else { "," };
        let header = (1..=width).map(|idx| format!("col{idx}")).collect::<Vec<_>>();
        let mut text = header.join(delimiter);
        text.push('\n');
        for row in &rows {
            // Blank lines are skipped by the tokenizer; keep one delimiter so
            // every generated row is a real line.
            let joined = row.join(delimiter);
            let line = if joined.is_empty() { delimiter.to_string() } else { joined };
            text.push_str(&line);
            text.push('\n');
        }

        let file = parse_delimited(&text).unwrap();
        prop_assert_eq!(file.delimiter, if tabs { b'\t' } else { b',' });
        prop_assert_eq!(file.records.len(), rows.len());
        for (record, source) in file.records.iter().zip(&rows) {
            prop_assert_eq!(record.len(), width);
            for (idx, (_, value)) in record.iter().enumerate() {
                match value {
                    Some(text) => {
                        prop_assert!(!text.trim().is_empty());
                        prop_assert_eq!(Some(text), source.get(idx).map(String::as_str));
                    }
                    None => {
                        let original = source.get(idx).map(String::as_str).unwrap_or("");
                        prop_assert!(original.trim().is_empty());
                    }
                }
            }
        }
    }
}
