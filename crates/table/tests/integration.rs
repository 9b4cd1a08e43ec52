//! Integration tests for table parsing

use proptest::prelude::*;
use upm_table::{ColumnLabels, TableParser, TableSchema};

fn schema() -> TableSchema {
    TableSchema::new(
        ColumnLabels::new("Id", "Version")
            .with_available("Available")
            .with_source("Source"),
    )
}

fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

#[test]
fn test_multiple_tables_in_one_invocation() {
    let schema = schema();
    let mut parser = TableParser::new(&schema);

    let output = [
        "The following packages have an update available:",
        "Name        Id                  Version     Available   Source",
        "---------------------------------------------------------------",
        "7-Zip       7zip.7zip           22.01       23.01       winget",
        "Git         Git.Git             2.44.0      2.45.0      winget",
        "",
        "The following packages could not be checked:",
        "Name        Id                  Version     Available   Source",
        "---------------------------------------------------------------",
        "Some Tool   Vendor.SomeTool     1.0         1.1         msstore",
    ];

    let rows: Vec<_> = output.iter().filter_map(|line| parser.feed(line)).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].id, "7zip.7zip");
    assert_eq!(rows[1].id, "Git.Git");
    assert_eq!(rows[2].id, "Vendor.SomeTool");
    assert_eq!(rows[2].source.as_deref(), Some("msstore"));
}

proptest! {
    /// Aligned rows round-trip through the parser for arbitrary tokens
    #[test]
    fn prop_aligned_row_round_trips(
        name in "[A-Za-z][A-Za-z0-9-]{0,10}",
        id in "[a-z]{1,9}\\.[a-z]{1,9}",
        version in "[0-9]{1,3}\\.[0-9]{1,3}",
        available in "[0-9]{1,3}\\.[0-9]{1,3}",
        source in "[a-z]{1,8}",
    ) {
        let header = format!(
            "{}{}{}{}Source",
            pad("Name", 12),
            pad("Id", 20),
            pad("Version", 12),
            pad("Available", 12),
        );
        let row_line = format!(
            "{}{}{}{}{}",
            pad(&name, 12),
            pad(&id, 20),
            pad(&version, 12),
            pad(&available, 12),
            source,
        );

        let schema = schema();
        let mut parser = TableParser::new(&schema);
        parser.feed(&header);
        parser.feed("----------------------------------------------------------------");
        let row = parser.feed(&row_line).unwrap();

        prop_assert_eq!(row.name, name);
        prop_assert_eq!(row.id, id);
        prop_assert_eq!(row.version, version);
        prop_assert_eq!(row.available, Some(available));
        prop_assert_eq!(row.source, Some(source));
    }
}
