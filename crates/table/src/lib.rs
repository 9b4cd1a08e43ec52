#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! CLI table output parsing for upm
//!
//! Package-manager CLIs print human-oriented tables: a header row, a
//! dashed separator, then data rows whose column boundaries are defined by
//! the header's text offsets rather than any delimiter. This crate turns
//! those tables into structured rows.
//!
//! Two modes cover the managers upm drives:
//! - [`fixed::TableParser`] for fixed-width tables (WinGet style), where
//!   column starts are discovered from the header and corrected per row
//!   for wide glyphs;
//! - [`whitespace::split_columns`] for tables whose columns are simply
//!   separated by runs of spaces (Scoop style).
//!
//! All offsets are measured in UTF-16 code units, matching how the
//! manager CLIs align their output.

pub mod fixed;
pub mod schema;
pub mod whitespace;

pub use fixed::TableParser;
pub use schema::{ColumnLabels, TableRow, TableSchema};
pub use whitespace::{split_columns, WhitespaceParser};
