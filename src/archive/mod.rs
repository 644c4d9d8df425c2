//! Container inspection: enumerate tabular members of an uploaded zip archive
//! and probe each one's header without materializing full contents.

pub mod dialect;
pub mod xlsx;

pub use dialect::{infer_dialect, split_line, Dialect};

use sha2::{Digest, Sha256};
use std::io::Read;

use crate::error::{Result, TabragError};

/// Recognized tabular member formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularFormat {
    Csv,
    Xlsx,
    Txt,
}

impl TabularFormat {
    /// Determine the format from a member path, by extension (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = name.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(TabularFormat::Csv),
            "xlsx" => Some(TabularFormat::Xlsx),
            "txt" => Some(TabularFormat::Txt),
            _ => None,
        }
    }

    /// Whether row counts can be taken from line counts.
    pub fn is_line_oriented(self) -> bool {
        !matches!(self, TabularFormat::Xlsx)
    }
}

/// One candidate tabular member inside the archive. Immutable after inspection.
#[derive(Debug, Clone)]
pub struct ArchiveMember {
    /// Path inside the container (unique).
    pub name: String,
    pub format: TabularFormat,
    /// Column names from the first line (raw, not yet normalized). For `.txt`
    /// members these are synthesized positional names (`COL_1..COL_N`).
    pub header: Vec<String>,
    pub column_count: usize,
}

impl ArchiveMember {
    /// Comma-joined header, for prompts and listings.
    pub fn schema_text(&self) -> String {
        self.header.join(", ")
    }
}

/// SHA256 hex digest of the whole archive blob. Half of the resumability key.
pub fn archive_hash(zip_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(zip_bytes);
    format!("{:x}", hasher.finalize())
}

/// Enumerate tabular members of the archive and probe their headers.
///
/// Directories, `__MACOSX/` packaging artifacts, and members with unrecognized
/// extensions are skipped. A member that fails to parse as tabular is excluded
/// from the result (debug-logged), not fatal: heterogeneous, partially corrupt
/// archives are expected input.
pub fn inspect_archive(zip_bytes: &[u8]) -> Result<Vec<ArchiveMember>> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes))
        .map_err(|e| TabragError::Archive(format!("unreadable zip container: {}", e)))?;

    let names: Vec<String> = archive.file_names().map(|s| s.to_string()).collect();
    let mut members = Vec::new();

    for name in names {
        if name.starts_with("__MACOSX/") || name.ends_with('/') {
            continue;
        }
        let format = match TabularFormat::from_name(&name) {
            Some(f) => f,
            None => continue,
        };
        match probe_member(&mut archive, &name, format) {
            Ok(member) => members.push(member),
            Err(e) => {
                log::debug!("skipping member {}: {}", name, e);
            }
        }
    }

    Ok(members)
}

/// Locate one named tabular member, probing the whole archive.
pub fn find_member(zip_bytes: &[u8], member_name: &str) -> Result<ArchiveMember> {
    inspect_archive(zip_bytes)?
        .into_iter()
        .find(|m| m.name == member_name)
        .ok_or_else(|| {
            TabragError::Archive(format!(
                "member {} not found or not tabular",
                member_name
            ))
        })
}

/// Read one member's raw bytes out of the archive.
pub fn read_member_bytes(zip_bytes: &[u8], member_name: &str) -> Result<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes))
        .map_err(|e| TabragError::Archive(format!("unreadable zip container: {}", e)))?;
    let mut entry = archive
        .by_name(member_name)
        .map_err(|e| TabragError::Archive(format!("member {} not found: {}", member_name, e)))?;
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf).map_err(TabragError::Io)?;
    Ok(buf)
}

/// Exact data-row count for a line-oriented member (total lines minus header).
///
/// Blank trailing lines are not counted.
pub fn count_data_rows(zip_bytes: &[u8], member_name: &str) -> Result<usize> {
    let bytes = read_member_bytes(zip_bytes, member_name)?;
    let text = String::from_utf8_lossy(&bytes);
    let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    Ok(lines.saturating_sub(1))
}

fn probe_member(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    format: TabularFormat,
) -> Result<ArchiveMember> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| TabragError::Archive(format!("cannot open member: {}", e)))?;
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).map_err(TabragError::Io)?;
    drop(entry);

    let header = match format {
        TabularFormat::Csv => {
            // Quoted fields must split the same way the chunk reader splits
            // them, so the header line goes through the `csv` crate too.
            let first = first_line(&bytes)
                .ok_or_else(|| TabragError::Parse("empty member".to_string()))?;
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .from_reader(first.as_bytes());
            let record = reader
                .records()
                .next()
                .transpose()
                .map_err(|e| TabragError::Parse(format!("header line: {}", e)))?
                .ok_or_else(|| TabragError::Parse("empty member".to_string()))?;
            record.iter().map(|f| f.trim().to_string()).collect()
        }
        TabularFormat::Xlsx => {
            let rows = xlsx::read_rows(&bytes, 1)?;
            rows.into_iter()
                .next()
                .ok_or_else(|| TabragError::Parse("empty worksheet".to_string()))?
        }
        TabularFormat::Txt => {
            // No header row can be assumed; synthesize positional names from
            // the field count of the first line.
            let first = first_line(&bytes)
                .ok_or_else(|| TabragError::Parse("empty member".to_string()))?;
            let dialect = infer_dialect(&first);
            let count = split_line(&first, dialect).len().max(1);
            (1..=count).map(|i| format!("COL_{}", i)).collect()
        }
    };

    if header.is_empty() {
        return Err(TabragError::Parse("no columns detected".to_string()));
    }

    Ok(ArchiveMember {
        name: name.to_string(),
        format,
        column_count: header.len(),
        header,
    })
}

fn first_line(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    text.lines()
        .map(|l| l.trim_end_matches('\r').to_string())
        .find(|l| !l.trim().is_empty())
}

/// Test fixtures shared across unit tests: in-memory zip and xlsx builders.
#[cfg(test)]
pub(crate) mod testutil {
    use std::io::Write;

    /// Build an in-memory zip archive from (member name, content) pairs.
    pub fn build_zip(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::SimpleFileOptions::default();
            for (name, content) in members {
                writer.start_file(name.to_string(), options).unwrap();
                writer.write_all(content).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    /// Build a minimal xlsx blob with one sheet and the given rows of strings.
    pub fn build_xlsx(rows: &[&[&str]]) -> Vec<u8> {
        let mut strings: Vec<String> = Vec::new();
        let mut sheet = String::from(
            r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (ri, row) in rows.iter().enumerate() {
            sheet.push_str(&format!(r#"<row r="{}">"#, ri + 1));
            for (ci, value) in row.iter().enumerate() {
                let col_letter = (b'A' + ci as u8) as char;
                let si = strings.len();
                strings.push((*value).to_string());
                sheet.push_str(&format!(
                    r#"<c r="{}{}" t="s"><v>{}</v></c>"#,
                    col_letter,
                    ri + 1,
                    si
                ));
            }
            sheet.push_str("</row>");
        }
        sheet.push_str("</sheetData></worksheet>");

        let mut shared = String::from(
            r#"<?xml version="1.0"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        for s in &strings {
            shared.push_str(&format!("<si><t>{}</t></si>", s));
        }
        shared.push_str("</sst>");

        build_zip(&[
            ("xl/sharedStrings.xml", shared.as_bytes()),
            ("xl/worksheets/sheet1.xml", sheet.as_bytes()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::{build_xlsx, build_zip};
    use super::*;

    #[test]
    fn test_inspect_lists_tabular_members_only() {
        let zip = build_zip(&[
            ("data/people.csv", b"name,age\nAna,30\n".as_slice()),
            ("readme.md", b"# not tabular".as_slice()),
            ("__MACOSX/data/._people.csv", b"junk".as_slice()),
            ("notes.txt", b"a b c\n1 2 3\n".as_slice()),
        ]);
        let members = inspect_archive(&zip).unwrap();
        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["data/people.csv", "notes.txt"]);
    }

    #[test]
    fn test_inspect_csv_header() {
        let zip = build_zip(&[("t.csv", b"NAME,AGE\nAna,30\n".as_slice())]);
        let members = inspect_archive(&zip).unwrap();
        assert_eq!(members[0].header, vec!["NAME", "AGE"]);
        assert_eq!(members[0].column_count, 2);
        assert_eq!(members[0].schema_text(), "NAME, AGE");
    }

    #[test]
    fn test_inspect_csv_header_respects_quoting() {
        let zip = build_zip(&[("q.csv", b"\"CITY, STATE\",POP\nRecife,1600000\n".as_slice())]);
        let members = inspect_archive(&zip).unwrap();
        assert_eq!(members[0].header, vec!["CITY, STATE", "POP"]);
        assert_eq!(members[0].column_count, 2);
    }

    #[test]
    fn test_inspect_txt_synthesizes_positional_names() {
        let zip = build_zip(&[("t.txt", b"1;2;3\n4;5;6\n".as_slice())]);
        let members = inspect_archive(&zip).unwrap();
        assert_eq!(members[0].header, vec!["COL_1", "COL_2", "COL_3"]);
        assert_eq!(members[0].format, TabularFormat::Txt);
    }

    #[test]
    fn test_inspect_xlsx_header() {
        let xlsx = build_xlsx(&[&["CITY", "POP"], &["Recife", "1600000"]]);
        let zip = build_zip(&[("cities.xlsx", xlsx.as_slice())]);
        let members = inspect_archive(&zip).unwrap();
        assert_eq!(members[0].header, vec!["CITY", "POP"]);
        assert_eq!(members[0].format, TabularFormat::Xlsx);
    }

    #[test]
    fn test_inspect_excludes_corrupt_member() {
        let zip = build_zip(&[
            ("broken.xlsx", b"this is not an xlsx".as_slice()),
            ("good.csv", b"a,b\n1,2\n".as_slice()),
        ]);
        let members = inspect_archive(&zip).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "good.csv");
    }

    #[test]
    fn test_inspect_rejects_non_zip() {
        assert!(inspect_archive(b"definitely not a zip").is_err());
    }

    #[test]
    fn test_find_member_by_name() {
        let zip = build_zip(&[
            ("a.csv", b"x\n1\n".as_slice()),
            ("b.csv", b"y\n2\n".as_slice()),
        ]);
        assert_eq!(find_member(&zip, "b.csv").unwrap().name, "b.csv");
        assert!(find_member(&zip, "c.csv").is_err());
    }

    #[test]
    fn test_archive_hash_is_stable() {
        let zip = build_zip(&[("t.csv", b"a,b\n".as_slice())]);
        assert_eq!(archive_hash(&zip), archive_hash(&zip));
        assert_ne!(archive_hash(&zip), archive_hash(b"other"));
    }

    #[test]
    fn test_count_data_rows_subtracts_header() {
        let zip = build_zip(&[("t.csv", b"a,b\n1,2\n3,4\n\n".as_slice())]);
        assert_eq!(count_data_rows(&zip, "t.csv").unwrap(), 2);
    }
}
