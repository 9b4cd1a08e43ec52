//! Fixed-width table parsing with per-row offset correction
//!
//! Column starts come from the header's label offsets. Data rows can
//! drift left of those offsets when the Name column contains glyphs whose
//! visual width differs from their UTF-16 length, so every row re-anchors
//! itself by walking back from the nominal Id offset to the preceding
//! space.

use crate::schema::{ColumnLabels, TableRow, TableSchema};

const SPACE: u16 = b' ' as u16;

/// Column start offsets, in UTF-16 code units of the header line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    id: usize,
    version: usize,
    available: Option<usize>,
    source: Option<usize>,
}

/// Incremental parser for one stream of CLI output
///
/// Feed lines in order; data rows come back as [`TableRow`]s. A blank
/// line ends the current table, so output that prints several tables in
/// one invocation is handled by the same parser instance.
#[derive(Debug)]
pub struct TableParser<'a> {
    schema: &'a TableSchema,
    previous_line: String,
    columns: Option<Columns>,
}

impl<'a> TableParser<'a> {
    #[must_use]
    pub fn new(schema: &'a TableSchema) -> Self {
        Self {
            schema,
            previous_line: String::new(),
            columns: None,
        }
    }

    /// Consume one output line, returning a data row if it produced one
    pub fn feed(&mut self, line: &str) -> Option<TableRow> {
        if self.schema.is_noise(line) {
            return None;
        }

        if self.columns.is_none() && line.contains("---") {
            // The line before the dashes is the header
            self.columns = self.locate_columns(&self.previous_line);
            self.previous_line = line.to_string();
            return None;
        }

        if line.trim().is_empty() {
            // Blank line ends the table; a new header may follow
            self.columns = None;
            self.previous_line.clear();
            return None;
        }

        let row = self.columns.and_then(|columns| self.parse_row(line, columns));
        self.previous_line = line.to_string();
        row
    }

    /// Whether a header and separator have been seen and not yet reset
    #[must_use]
    pub fn in_table(&self) -> bool {
        self.columns.is_some()
    }

    fn active_labels(&self, header: &str) -> Option<&ColumnLabels> {
        if let Some(search) = &self.schema.search_labels {
            if utf16_find(&utf16(header), &search.id).is_some() {
                return Some(search);
            }
        }
        self.schema.labels.as_ref()
    }

    fn locate_columns(&self, header: &str) -> Option<Columns> {
        let labels = self.active_labels(header)?;
        let units = utf16(header);

        let id = utf16_find(&units, &labels.id)?;
        let version = utf16_find(&units, &labels.version)?;
        let available = labels
            .available
            .as_deref()
            .and_then(|label| utf16_find(&units, label));
        let source = labels
            .source
            .as_deref()
            .and_then(|label| utf16_find(&units, label));

        // A Name column must precede Id, and the columns must be ordered
        if id == 0 || version <= id {
            return None;
        }
        if available.is_some_and(|a| a <= version) {
            return None;
        }
        if source.is_some_and(|s| s <= available.unwrap_or(version)) {
            return None;
        }

        Some(Columns {
            id,
            version,
            available,
            source,
        })
    }

    fn parse_row(&self, line: &str, columns: Columns) -> Option<TableRow> {
        let units = utf16(line);
        let len = units.len();

        // Rows that do not reach the version column carry no data
        if columns.version >= len {
            return None;
        }

        let offset = correction(&units, columns.id)?;
        let id_start = columns.id - offset;
        let version_start = columns.version - offset;
        let available_start = columns.available.map(|a| a - offset);
        let source_start = columns.source.map(|s| s - offset);

        let name = utf16_slice(&units, 0, id_start).trim().to_string();
        let id = first_token(&utf16_slice(&units, id_start, len));
        if id.is_empty() {
            return None;
        }

        let version_end = available_start
            .filter(|&a| a < len)
            .or(source_start.filter(|&s| s < len))
            .unwrap_or(len);
        let version = utf16_slice(&units, version_start, version_end)
            .trim()
            .to_string();
        if version.is_empty() {
            return None;
        }

        let available = available_start.filter(|&a| a < len).map(|a| {
            match source_start.filter(|&s| s < len && s > a) {
                Some(end) => utf16_slice(&units, a, end).trim().to_string(),
                // No trailing column: the first token is the value
                None => first_token(&utf16_slice(&units, a, len)),
            }
        });

        let source = source_start
            .filter(|&s| s < len)
            .map(|s| first_token(&utf16_slice(&units, s, len)));

        if self
            .schema
            .is_sentinel_row(&id, &version, available.as_deref())
        {
            return None;
        }

        Some(TableRow {
            name,
            id,
            version,
            available,
            source,
        })
    }
}

/// How far the row has drifted left of the header's column starts
///
/// Walks back from the nominal Id offset to the nearest preceding space.
/// Returns `None` when no space exists before the Id column, which means
/// the Name text ran into it and the row cannot be sliced reliably.
fn correction(units: &[u16], id_offset: usize) -> Option<usize> {
    let mut offset = 0;
    while id_offset - offset > 0
        && units
            .get(id_offset - offset - 1)
            .is_some_and(|&unit| unit != SPACE)
    {
        offset += 1;
    }
    if id_offset - offset == 0 {
        return None;
    }
    Some(offset)
}

fn first_token(text: &str) -> String {
    text.split_whitespace().next().unwrap_or_default().to_string()
}

fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

fn utf16_find(units: &[u16], needle: &str) -> Option<usize> {
    let needle: Vec<u16> = needle.encode_utf16().collect();
    if needle.is_empty() || needle.len() > units.len() {
        return None;
    }
    units.windows(needle.len()).position(|w| w == needle)
}

fn utf16_slice(units: &[u16], start: usize, end: usize) -> String {
    let start = start.min(units.len());
    let end = end.min(units.len());
    if start >= end {
        return String::new();
    }
    String::from_utf16_lossy(&units[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnLabels, TableSchema};

    fn winget_schema() -> TableSchema {
        TableSchema::new(
            ColumnLabels::new("Id", "Version")
                .with_available("Available")
                .with_source("Source"),
        )
        .with_search_labels(
            ColumnLabels::new("SearchId", "SearchVersion")
                .with_available("AvailableHeader")
                .with_source("SearchSource"),
        )
        .with_noise_phrases(&["have pins"])
    }

    const HEADER: &str = "Name    Id        Version  Available  Source";
    const DASHES: &str = "-----------------------------------------------";

    #[test]
    fn test_round_trip() {
        let schema = winget_schema();
        let mut parser = TableParser::new(&schema);

        assert!(parser.feed(HEADER).is_none());
        assert!(parser.feed(DASHES).is_none());
        let row = parser
            .feed("7-Zip   7zip.7zip 22.01    23.01      winget")
            .unwrap();

        assert_eq!(row.name, "7-Zip");
        assert_eq!(row.id, "7zip.7zip");
        assert_eq!(row.version, "22.01");
        assert_eq!(row.available.as_deref(), Some("23.01"));
        assert_eq!(row.source.as_deref(), Some("winget"));
    }

    #[test]
    fn test_offset_correction_shifted_row() {
        let schema = winget_schema();
        let mut parser = TableParser::new(&schema);
        parser.feed(HEADER);
        parser.feed(DASHES);

        // Every column starts two units left of the header's offsets, as
        // a wide glyph in Name would cause
        let row = parser
            .feed("7-Zip 7zip.7zip 22.01    23.01      winget")
            .unwrap();
        assert_eq!(row.id, "7zip.7zip");
        assert_eq!(row.version, "22.01");
        assert_eq!(row.available.as_deref(), Some("23.01"));
        assert_eq!(row.source.as_deref(), Some("winget"));
    }

    #[test]
    fn test_wide_glyph_name() {
        let schema = winget_schema();
        let mut parser = TableParser::new(&schema);
        parser.feed(HEADER);
        parser.feed(DASHES);

        // Four CJK units in Name displace the row by four columns
        let row = parser
            .feed("七五三四 7zip.7zip 22.01    23.01      winget")
            .unwrap();
        assert_eq!(row.name, "七五三四");
        assert_eq!(row.id, "7zip.7zip");
    }

    #[test]
    fn test_missing_source_column_text() {
        let schema = winget_schema();
        let mut parser = TableParser::new(&schema);
        parser.feed(HEADER);
        parser.feed(DASHES);

        // Row ends before the Source column
        let row = parser.feed("7-Zip   7zip.7zip 22.01    23.01").unwrap();
        assert_eq!(row.available.as_deref(), Some("23.01"));
        assert_eq!(row.source, None);
    }

    #[test]
    fn test_blank_line_resets_table() {
        let schema = winget_schema();
        let mut parser = TableParser::new(&schema);
        parser.feed(HEADER);
        parser.feed(DASHES);
        assert!(parser.in_table());

        assert!(parser.feed("").is_none());
        assert!(!parser.in_table());

        // Text after the blank line is not parsed as a row
        assert!(parser.feed("2 upgrades available.").is_none());

        // A second table in the same output works again
        parser.feed(HEADER);
        parser.feed(DASHES);
        let row = parser
            .feed("Git     Git.Git   2.44.0   2.45.0     winget")
            .unwrap();
        assert_eq!(row.id, "Git.Git");
    }

    #[test]
    fn test_search_mode_header() {
        let schema = winget_schema();
        let mut parser = TableParser::new(&schema);

        parser.feed("SearchName    SearchId        SearchVersion  AvailableHeader  SearchSource");
        parser.feed("--------------------------------------------------------------------------");
        let row = parser
            .feed("7-Zip         7zip.7zip       22.01          23.01            winget")
            .unwrap();
        assert_eq!(row.id, "7zip.7zip");
        assert_eq!(row.version, "22.01");
    }

    #[test]
    fn test_noise_line_skipped() {
        let schema = winget_schema();
        let mut parser = TableParser::new(&schema);
        parser.feed(HEADER);
        // Noise between header and dashes must not replace the header
        assert!(parser.feed("3 packages have pins that prevent upgrade").is_none());
        parser.feed(DASHES);
        assert!(parser
            .feed("7-Zip   7zip.7zip 22.01    23.01      winget")
            .is_some());
    }

    #[test]
    fn test_sentinel_row_dropped() {
        let schema = winget_schema().with_sentinels(&["No"], &["Matches"]);
        let mut parser = TableParser::new(&schema);
        parser.feed(HEADER);
        parser.feed(DASHES);
        assert!(parser
            .feed("No      No        Matches  Matches    found")
            .is_none());
    }

    #[test]
    fn test_short_row_rejected() {
        let schema = winget_schema();
        let mut parser = TableParser::new(&schema);
        parser.feed(HEADER);
        parser.feed(DASHES);
        assert!(parser.feed("7-Zip").is_none());
    }

    #[test]
    fn test_name_overrunning_id_column_rejected() {
        let schema = winget_schema();
        let mut parser = TableParser::new(&schema);
        parser.feed(HEADER);
        parser.feed(DASHES);
        // No space anywhere before the version column
        assert!(parser.feed("aaaaaaaaaaaaaaaaaaaaaaaa 22.01").is_none());
    }
}
