//! Table formatting for device listings using tabled
//!
//! Devices are laid out one row per device with one column per EPC seen in
//! any row, so devices of different classes share a table.

use serde::{Deserialize, Serialize};
use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Color, Modify, Style, object::Columns, object::Rows, width::Width},
};

use crate::device::{Epc, IpAndEoj};
use crate::error::Result;
use crate::executor::{DeviceRow, ResultData};

/// Maximum width for a single column (characters)
const DEFAULT_MAX_COLUMN_WIDTH: usize = 32;

/// Table formatter for result data
pub struct TableFormatter {
    /// Maximum column width
    max_column_width: usize,

    /// Table style
    style: TableStyle,

    /// Enable colored output
    use_colors: bool,
}

/// Available table styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStyle {
    /// Modern style with box drawing characters
    Modern,
    /// ASCII style with basic characters
    Ascii,
    /// Rounded style
    Rounded,
    /// Markdown style
    Markdown,
    /// Psql style
    Psql,
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl TableFormatter {
    /// Create a new table formatter with default settings
    ///
    /// # Returns
    /// * `Self` - New table formatter
    pub fn new() -> Self {
        Self {
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            style: TableStyle::Modern,
            use_colors: false,
        }
    }

    /// Enable or disable colored headers
    ///
    /// # Arguments
    /// * `use_colors` - Enable colored output
    ///
    /// # Returns
    /// * `Self` - Modified formatter
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Set the table style
    ///
    /// # Arguments
    /// * `style` - Table style to use
    ///
    /// # Returns
    /// * `Self` - Modified formatter
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    /// Set maximum column width
    ///
    /// # Arguments
    /// * `width` - Maximum column width
    ///
    /// # Returns
    /// * `Self` - Modified formatter
    pub fn with_max_column_width(mut self, width: usize) -> Self {
        self.max_column_width = width;
        self
    }

    /// Format result data as table
    ///
    /// # Arguments
    /// * `data` - Result data to format
    ///
    /// # Returns
    /// * `Result<String>` - Table string or error
    pub fn format(&self, data: &ResultData) -> Result<String> {
        match data {
            ResultData::Devices(rows) => Ok(self.format_devices(rows)),
            ResultData::GroupedDevices { epc, groups } => {
                let sections: Vec<String> = groups
                    .iter()
                    .map(|(key, rows)| format!("{epc} = {key}\n{}", self.format_devices(rows)))
                    .collect();
                if sections.is_empty() {
                    Ok("(no devices)".to_string())
                } else {
                    Ok(sections.join("\n\n"))
                }
            }
            ResultData::Aliases(aliases) => {
                if aliases.is_empty() {
                    return Ok("(no aliases)".to_string());
                }
                let rows = aliases
                    .iter()
                    .map(|(alias, device)| vec![alias.clone(), device.ip.to_string(), device.eoj.to_string()])
                    .collect();
                Ok(self.build(vec!["Alias".into(), "IP".into(), "EOJ".into()], rows))
            }
            ResultData::Groups(groups) => {
                if groups.is_empty() {
                    return Ok("(no groups)".to_string());
                }
                let rows = groups
                    .iter()
                    .map(|(name, members)| vec![name.clone(), member_list(members)])
                    .collect();
                Ok(self.build(vec!["Group".into(), "Devices".into()], rows))
            }
            ResultData::Message(msg) => Ok(msg.clone()),
            ResultData::None => Ok(String::new()),
        }
    }

    /// Format devices, one column per EPC
    fn format_devices(&self, rows: &[DeviceRow]) -> String {
        if rows.is_empty() {
            return "(no devices)".to_string();
        }

        let epcs = collect_epcs(rows);
        let mut header = vec!["IP".to_string(), "EOJ".to_string(), "Alias".to_string()];
        header.extend(epcs.iter().map(|(epc, name)| match name {
            Some(name) => format!("{epc} {name}"),
            None => epc.to_string(),
        }));

        let records = rows
            .iter()
            .map(|row| {
                let mut record = vec![
                    row.device.ip.to_string(),
                    row.device.eoj.to_string(),
                    row.alias.clone().unwrap_or_default(),
                ];
                record.extend(epcs.iter().map(|(epc, _)| {
                    row.properties
                        .iter()
                        .find(|p| p.epc == *epc)
                        .map(|p| p.value.clone())
                        .unwrap_or_default()
                }));
                record
            })
            .collect();

        self.build(header, records)
    }

    fn build(&self, header: Vec<String>, records: Vec<Vec<String>>) -> String {
        let columns = header.len();
        let mut builder = Builder::default();
        builder.push_record(header);
        for record in records {
            builder.push_record(record);
        }

        let mut table = builder.build();
        self.apply_style(&mut table);
        for i in 0..columns {
            table.with(Modify::new(Columns::new(i..=i)).with(Width::wrap(self.max_column_width)));
        }
        table.with(Modify::new(Rows::first()).with(Alignment::center()));
        if self.use_colors {
            table.modify(Rows::first(), Color::FG_CYAN | Color::BOLD);
        }
        table.to_string()
    }

    fn apply_style(&self, table: &mut Table) {
        match self.style {
            TableStyle::Modern => table.with(Style::modern()),
            TableStyle::Ascii => table.with(Style::ascii()),
            TableStyle::Rounded => table.with(Style::rounded()),
            TableStyle::Markdown => table.with(Style::markdown()),
            TableStyle::Psql => table.with(Style::psql()),
        };
    }
}

/// EPCs in order of first appearance, with the first name seen for each
fn collect_epcs(rows: &[DeviceRow]) -> Vec<(Epc, Option<&'static str>)> {
    let mut epcs: Vec<(Epc, Option<&'static str>)> = Vec::new();
    for property in rows.iter().flat_map(|row| &row.properties) {
        if !epcs.iter().any(|(epc, _)| *epc == property.epc) {
            epcs.push((property.epc, property.name));
        }
    }
    epcs
}

fn member_list(members: &[IpAndEoj]) -> String {
    members
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ClassCode, Eoj};
    use crate::executor::PropertyRow;

    fn row(ip: &str, value: &str) -> DeviceRow {
        DeviceRow {
            device: IpAndEoj::new(ip.parse().unwrap(), Eoj::new(ClassCode(0x0130), 1)),
            alias: Some("ac".to_string()),
            properties: vec![PropertyRow {
                epc: Epc(0x80),
                name: Some("Operation status"),
                value: value.to_string(),
            }],
            updated_at: None,
        }
    }

    #[test]
    fn test_devices_table() {
        let formatter = TableFormatter::new().with_style(TableStyle::Ascii);
        let output = formatter
            .format(&ResultData::Devices(vec![row("192.168.0.3", "on")]))
            .unwrap();
        assert!(output.contains("192.168.0.3"));
        assert!(output.contains("0130:1"));
        assert!(output.contains("80 Operation status"));
        assert!(output.contains("on"));
    }

    #[test]
    fn test_empty_tables() {
        let formatter = TableFormatter::new();
        assert_eq!(
            formatter.format(&ResultData::Devices(vec![])).unwrap(),
            "(no devices)"
        );
        assert_eq!(
            formatter.format(&ResultData::Aliases(vec![])).unwrap(),
            "(no aliases)"
        );
    }

    #[test]
    fn test_grouped_devices() {
        let formatter = TableFormatter::new();
        let data = ResultData::GroupedDevices {
            epc: Epc(0x80),
            groups: vec![
                ("on".to_string(), vec![row("192.168.0.3", "on")]),
                ("off".to_string(), vec![row("192.168.0.4", "off")]),
            ],
        };
        let output = formatter.format(&data).unwrap();
        let on = output.find("80 = on").unwrap();
        let off = output.find("80 = off").unwrap();
        assert!(on < off);
    }
}
