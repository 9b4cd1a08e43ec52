//! Output rendering for listings

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use std::io;
use upm_types::{ManagerSource, Package};

/// Renders listing results as tables or JSON
#[derive(Clone, Copy)]
pub struct OutputRenderer {
    json_output: bool,
}

impl OutputRenderer {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render an installed-packages listing
    pub fn render_packages(&self, packages: &[Package]) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(packages).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }
        if packages.is_empty() {
            println!("No packages found.");
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Name", "Id", "Version", "Source"]);
        for package in packages {
            table.add_row(vec![
                package.name.clone(),
                package.id.clone(),
                package.installed_version.clone(),
                package.source_name.clone(),
            ]);
        }
        println!("{table}");
        println!("{} package(s)", packages.len());
        Ok(())
    }

    /// Render an available-updates listing
    pub fn render_updates(&self, packages: &[Package]) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(packages).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }
        if packages.is_empty() {
            println!("Everything is up to date.");
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Name", "Id", "Version", "Available", "Source"]);
        for package in packages {
            table.add_row(vec![
                package.name.clone(),
                package.id.clone(),
                package.installed_version.clone(),
                package.new_version.clone().unwrap_or_default(),
                package.source_name.clone(),
            ]);
        }
        println!("{table}");
        println!("{} update(s) available", packages.len());
        Ok(())
    }

    /// Render a sources listing
    pub fn render_sources(&self, sources: &[ManagerSource]) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(sources).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }
        if sources.is_empty() {
            println!("No sources configured.");
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Name", "Url", "Packages", "Updated"]);
        for source in sources {
            table.add_row(vec![
                source.name.clone(),
                source.url.clone(),
                source
                    .package_count
                    .map_or_else(String::new, |count| count.to_string()),
                source.last_updated.clone().unwrap_or_default(),
            ]);
        }
        println!("{table}");
        Ok(())
    }
}
