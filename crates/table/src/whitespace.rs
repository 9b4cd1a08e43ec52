//! Whitespace-separated table parsing
//!
//! Some managers (Scoop among them) print tables whose columns are
//! separated by runs of spaces rather than aligned at fixed offsets.
//! Collapsing the runs and splitting is enough, provided sentinel rows
//! are still filtered.

use crate::schema::TableSchema;

/// Split a data row into its columns
///
/// Runs of whitespace collapse into a single separator, so column text
/// itself must not contain spaces (true for the id/version/source tables
/// this mode is used with).
#[must_use]
pub fn split_columns(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Incremental parser for whitespace tables
///
/// Tracks the dashed-separator state the same way the fixed-width parser
/// does and yields the split columns of each data row.
#[derive(Debug)]
pub struct WhitespaceParser<'a> {
    schema: &'a TableSchema,
    dashes_passed: bool,
}

impl<'a> WhitespaceParser<'a> {
    #[must_use]
    pub fn new(schema: &'a TableSchema) -> Self {
        Self {
            schema,
            dashes_passed: false,
        }
    }

    /// Consume one output line, returning the columns of a data row
    ///
    /// `min_columns` guards against footers and wrapped lines; shorter
    /// rows are dropped.
    pub fn feed(&mut self, line: &str, min_columns: usize) -> Option<Vec<String>> {
        if !self.dashes_passed {
            if line.contains("---") {
                self.dashes_passed = true;
            }
            return None;
        }

        if line.trim().is_empty() {
            self.dashes_passed = false;
            return None;
        }

        let columns: Vec<String> = split_columns(line)
            .into_iter()
            .map(ToString::to_string)
            .collect();
        if columns.len() < min_columns {
            return None;
        }

        let available = columns.get(2).map(String::as_str);
        if self
            .schema
            .is_sentinel_row(&columns[0], &columns[1], available)
        {
            return None;
        }

        Some(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableSchema;

    fn scoop_schema() -> TableSchema {
        TableSchema::default().with_sentinels(
            &["No"],
            &["Matches", "Install", "failed", "failed,", "Manifest", "removed", "removed,"],
        )
    }

    #[test]
    fn test_rows_after_dashes() {
        let schema = scoop_schema();
        let mut parser = WhitespaceParser::new(&schema);

        assert!(parser.feed("Installed apps:", 3).is_none());
        assert!(parser.feed("Name    Version  Source   Updated", 3).is_none());
        assert!(parser.feed("----    -------  ------   -------", 3).is_none());

        let row = parser.feed("7zip    23.01    main     2024-01-02", 3).unwrap();
        assert_eq!(row, ["7zip", "23.01", "main", "2024-01-02"]);
    }

    #[test]
    fn test_sentinel_row_dropped() {
        let schema = scoop_schema();
        let mut parser = WhitespaceParser::new(&schema);
        parser.feed("----", 2);
        assert!(parser.feed("No  Matches  found", 2).is_none());
    }

    #[test]
    fn test_short_row_dropped() {
        let schema = scoop_schema();
        let mut parser = WhitespaceParser::new(&schema);
        parser.feed("----", 3);
        assert!(parser.feed("7zip 23.01", 3).is_none());
    }

    #[test]
    fn test_blank_line_resets() {
        let schema = scoop_schema();
        let mut parser = WhitespaceParser::new(&schema);
        parser.feed("----", 2);
        assert!(parser.feed("7zip 23.01", 2).is_some());
        parser.feed("", 2);
        assert!(parser.feed("7zip 23.01", 2).is_none());
    }
}
