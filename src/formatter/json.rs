//! JSON formatting for execution results
//!
//! Output shape:
//! - devices: `[{"ip", "eoj", "alias", "properties": {"80": {"name", "value"}}, "updated"}]`
//! - aliases: `{"alias": {"ip", "eoj"}}`
//! - groups: `{"@group": ["ip eoj", ...]}`

use colored_json::prelude::*;
use serde_json::{Map, Value, json};

use crate::device::IpAndEoj;
use crate::error::Result;
use crate::executor::{DeviceRow, ResultData};

/// JSON formatter with pretty printing support
pub struct JsonFormatter {
    /// Enable pretty printing
    pretty: bool,

    /// Indentation level
    indent: usize,

    /// Enable colored output
    use_colors: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    ///
    /// # Arguments
    /// * `pretty` - Enable pretty printing
    /// * `use_colors` - Enable colored output
    /// * `indent` - Spaces per indentation level when pretty printing
    ///
    /// # Returns
    /// * `Self` - New formatter
    pub fn new(pretty: bool, use_colors: bool, indent: usize) -> Self {
        Self {
            pretty,
            indent,
            use_colors,
        }
    }

    /// Format result data as JSON
    ///
    /// # Arguments
    /// * `data` - Result data to format
    ///
    /// # Returns
    /// * `Result<String>` - JSON string or error
    pub fn format(&self, data: &ResultData) -> Result<String> {
        let value = match data {
            ResultData::Devices(rows) => devices_json(rows),
            ResultData::GroupedDevices { epc, groups } => {
                let mut object = Map::new();
                for (key, rows) in groups {
                    object.insert(key.clone(), devices_json(rows));
                }
                json!({ "group_by": epc.to_string(), "groups": object })
            }
            ResultData::Aliases(aliases) => {
                let mut object = Map::new();
                for (alias, device) in aliases {
                    object.insert(alias.clone(), device_json(device));
                }
                Value::Object(object)
            }
            ResultData::Groups(groups) => {
                let mut object = Map::new();
                for (name, members) in groups {
                    let members = members.iter().map(|m| Value::String(m.to_string())).collect();
                    object.insert(name.clone(), Value::Array(members));
                }
                Value::Object(object)
            }
            ResultData::Message(msg) => Value::String(msg.clone()),
            ResultData::None => Value::Null,
        };
        self.render(&value)
    }

    fn render(&self, value: &Value) -> Result<String> {
        let text = if self.pretty {
            self.to_pretty_string(value)?
        } else {
            serde_json::to_string(value)?
        };

        // Compact JSON stays plain for piping
        if self.use_colors && self.pretty {
            Ok(text.to_colored_json_auto().unwrap_or(text))
        } else {
            Ok(text)
        }
    }

    /// Convert a value to pretty-printed JSON with custom indentation
    fn to_pretty_string(&self, value: &Value) -> Result<String> {
        use serde::Serialize;

        let mut buf = Vec::new();
        let indent = " ".repeat(self.indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new(true, false, 2)
    }
}

fn device_json(device: &IpAndEoj) -> Value {
    json!({ "ip": device.ip.to_string(), "eoj": device.eoj.to_string() })
}

fn devices_json(rows: &[DeviceRow]) -> Value {
    rows.iter()
        .map(|row| {
            let mut properties = Map::new();
            for property in &row.properties {
                properties.insert(
                    property.epc.to_string(),
                    json!({ "name": property.name, "value": property.value }),
                );
            }
            json!({
                "ip": row.device.ip.to_string(),
                "eoj": row.device.eoj.to_string(),
                "alias": row.alias,
                "properties": properties,
                "updated": row.updated_at.map(|at| at.to_rfc3339()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ClassCode, Eoj, Epc};
    use crate::executor::PropertyRow;

    fn device() -> IpAndEoj {
        IpAndEoj::new("192.168.0.3".parse().unwrap(), Eoj::new(ClassCode(0x0130), 1))
    }

    #[test]
    fn test_devices_json() {
        let formatter = JsonFormatter::new(false, false, 2);
        let rows = vec![DeviceRow {
            device: device(),
            alias: None,
            properties: vec![PropertyRow {
                epc: Epc(0xB0),
                name: Some("Operation mode setting"),
                value: "cooling".to_string(),
            }],
            updated_at: None,
        }];
        let output = formatter.format(&ResultData::Devices(rows)).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["eoj"], "0130:1");
        assert_eq!(value[0]["properties"]["B0"]["value"], "cooling");
        assert!(value[0]["alias"].is_null());
    }

    #[test]
    fn test_aliases_json() {
        let formatter = JsonFormatter::new(true, false, 2);
        let output = formatter
            .format(&ResultData::Aliases(vec![("ac".to_string(), device())]))
            .unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["ac"]["ip"], "192.168.0.3");
    }

    #[test]
    fn test_message_json() {
        let formatter = JsonFormatter::new(false, false, 2);
        let output = formatter.format(&ResultData::Message("done".into())).unwrap();
        assert_eq!(output, "\"done\"");
    }
}
