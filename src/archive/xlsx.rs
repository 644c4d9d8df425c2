//! Bounded row extraction from xlsx members.
//!
//! An xlsx member is itself a zip container; cell values live in the first
//! worksheet's XML with string cells indirected through `xl/sharedStrings.xml`.
//! Rows are reconstructed with their column positions (from cell references
//! like `B2`) so the output is a rectangular grid, and scanning stops as soon
//! as the requested number of rows has been collected.

use quick_xml::events::Event;

use crate::error::{Result, TabragError};

/// Maximum decompressed bytes read from a single inner zip entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Read up to `max_rows` rows from the first worksheet of an xlsx blob.
///
/// Each row is a vector of raw cell strings; gaps between referenced cells are
/// filled with empty strings. Numbers come back in their serialized form and
/// are retyped later by column classification.
pub fn read_rows(xlsx_bytes: &[u8], max_rows: usize) -> Result<Vec<Vec<String>>> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(xlsx_bytes))
        .map_err(|e| TabragError::Parse(format!("not a valid xlsx container: {}", e)))?;
    let shared = read_shared_strings(&mut archive)?;
    let sheet_name = first_worksheet_name(&mut archive)?;
    let sheet_xml = read_entry_bounded(&mut archive, &sheet_name)?;
    parse_sheet_rows(&sheet_xml, &shared, max_rows)
}

fn read_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<u8>> {
    use std::io::Read;
    let entry = archive
        .by_name(name)
        .map_err(|e| TabragError::Parse(format!("xlsx entry {} missing: {}", name, e)))?;
    let mut buf = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut buf)
        .map_err(TabragError::Io)?;
    Ok(buf)
}

/// Shared-string table, in order. Missing table (no string cells) is fine.
fn read_shared_strings(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Vec<String>> {
    if archive.by_name("xl/sharedStrings.xml").is_err() {
        return Ok(Vec::new());
    }
    let xml = read_entry_bounded(archive, "xl/sharedStrings.xml")?;
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_si = false;
    let mut current = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = true;
                    current.clear();
                } else if in_si && e.local_name().as_ref() == b"t" {
                    let mut text_buf = Vec::new();
                    if let Ok(Event::Text(te)) = reader.read_event_into(&mut text_buf) {
                        current.push_str(&te.unescape().unwrap_or_default());
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = false;
                    strings.push(std::mem::take(&mut current));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TabragError::Parse(format!("sharedStrings.xml: {}", e))),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Lowest-numbered worksheet entry (sheet1.xml before sheet2.xml).
fn first_worksheet_name(archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>) -> Result<String> {
    archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .min_by_key(|name| {
            name.trim_start_matches("xl/worksheets/sheet")
                .trim_end_matches(".xml")
                .parse::<u32>()
                .unwrap_or(u32::MAX)
        })
        .ok_or_else(|| TabragError::Parse("xlsx has no worksheets".to_string()))
}

/// Column index (0-based) from a cell reference like `B2` or `AA10`.
fn column_index(cell_ref: &str) -> Option<usize> {
    let letters: String = cell_ref.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    if letters.is_empty() {
        return None;
    }
    let mut idx: usize = 0;
    for c in letters.chars() {
        idx = idx * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(idx - 1)
}

/// Value kind of the current `<c>` element.
#[derive(Clone, Copy, PartialEq)]
enum CellKind {
    Raw,
    Shared,
    Inline,
}

fn parse_sheet_rows(xml: &[u8], shared: &[String], max_rows: usize) -> Result<Vec<Vec<String>>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut current_row: Vec<String> = Vec::new();
    let mut in_row = false;
    let mut in_value = false;
    let mut cell_kind = CellKind::Raw;
    let mut cell_col: Option<usize> = None;

    loop {
        if rows.len() >= max_rows {
            break;
        }
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    in_row = true;
                    current_row.clear();
                }
                b"c" if in_row => {
                    cell_kind = CellKind::Raw;
                    cell_col = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"r" => {
                                let r = String::from_utf8_lossy(&attr.value);
                                cell_col = column_index(&r);
                            }
                            b"t" => {
                                cell_kind = match attr.value.as_ref() {
                                    b"s" => CellKind::Shared,
                                    b"inlineStr" => CellKind::Inline,
                                    _ => CellKind::Raw,
                                };
                            }
                            _ => {}
                        }
                    }
                }
                b"v" if in_row => in_value = true,
                b"t" if in_row && cell_kind == CellKind::Inline => in_value = true,
                _ => {}
            },
            Ok(Event::Text(te)) if in_value => {
                let raw = te.unescape().unwrap_or_default().into_owned();
                let value = if cell_kind == CellKind::Shared {
                    raw.trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| shared.get(i).cloned())
                        .unwrap_or_default()
                } else {
                    raw
                };
                let col = cell_col.unwrap_or(current_row.len());
                if current_row.len() <= col {
                    current_row.resize(col + 1, String::new());
                }
                current_row[col] = value;
                in_value = false;
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"row" => {
                    in_row = false;
                    rows.push(std::mem::take(&mut current_row));
                }
                b"v" | b"t" => in_value = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(TabragError::Parse(format!("worksheet xml: {}", e))),
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::testutil::build_xlsx;

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("B2"), Some(1));
        assert_eq!(column_index("Z9"), Some(25));
        assert_eq!(column_index("AA10"), Some(26));
        assert_eq!(column_index("123"), None);
    }

    #[test]
    fn test_read_rows_roundtrip() {
        let blob = build_xlsx(&[&["NAME", "AGE"], &["Ana", "30"], &["Bo", "41"]]);
        let rows = read_rows(&blob, usize::MAX).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["NAME".to_string(), "AGE".to_string()]);
        assert_eq!(rows[2], vec!["Bo".to_string(), "41".to_string()]);
    }

    #[test]
    fn test_shared_strings_decode_entities() {
        let blob = build_xlsx(&[&["NOTES"], &["salt &amp; pepper"]]);
        let rows = read_rows(&blob, usize::MAX).unwrap();
        assert_eq!(rows[1], vec!["salt & pepper".to_string()]);
    }

    #[test]
    fn test_read_rows_bounded() {
        let blob = build_xlsx(&[&["H"], &["1"], &["2"], &["3"]]);
        let rows = read_rows(&blob, 2).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_read_rows_rejects_garbage() {
        assert!(read_rows(b"not a zip at all", 10).is_err());
    }
}
