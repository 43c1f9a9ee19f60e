//! ECHONET Lite value types shared by the grammar, the parser and the backend
//!
//! - `ClassCode`, `Eoj`: object identifiers (`0130`, `0130:1`)
//! - `Epc`, `Property`: property codes and values (`80`, `80:30`)
//! - `DeviceSpecifier`: a partial device address used to select devices
//! - name validation for device aliases and group names

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Class group and class code packed into two bytes (e.g. `0x0130`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassCode(pub u16);

/// One-byte property code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Epc(pub u8);

/// Object identifier: class code plus instance code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Eoj {
    pub class_code: ClassCode,
    pub instance_code: u8,
}

/// A property code together with its value bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
    pub epc: Epc,
    #[serde(with = "hex_bytes")]
    pub edt: Vec<u8>,
}

/// Fully qualified device endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IpAndEoj {
    pub ip: IpAddr,
    pub eoj: Eoj,
}

/// Partial device address; every absent field matches anything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceSpecifier {
    pub ip: Option<IpAddr>,
    pub class_code: Option<ClassCode>,
    pub instance_code: Option<u8>,
}

/// Which properties a device listing shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PropertyMode {
    /// A small set of commonly useful properties
    #[default]
    Default,
    /// Every property with a known description
    Known,
    /// Every cached property
    All,
    /// Only the EPCs named on the command line
    Epc,
}

/// Device selection used by listing, update and alias registration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub device: DeviceSpecifier,
    pub properties: Vec<Property>,
}

impl ClassCode {
    pub const NODE_PROFILE: ClassCode = ClassCode(0x0EF0);
    pub const HOME_AIR_CONDITIONER: ClassCode = ClassCode(0x0130);
    pub const SINGLE_FUNCTION_LIGHTING: ClassCode = ClassCode(0x0291);

    /// Parse exactly four hex digits
    pub fn parse_hex(text: &str) -> Option<Self> {
        if text.len() != 4 || !text.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u16::from_str_radix(text, 16).ok().map(ClassCode)
    }
}

impl Epc {
    /// Parse exactly two hex digits
    pub fn parse_hex(text: &str) -> Option<Self> {
        if text.len() != 2 || !text.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u8::from_str_radix(text, 16).ok().map(Epc)
    }
}

impl Eoj {
    pub fn new(class_code: ClassCode, instance_code: u8) -> Self {
        Self {
            class_code,
            instance_code,
        }
    }
}

impl Property {
    pub fn new(epc: Epc, edt: Vec<u8>) -> Self {
        Self { epc, edt }
    }
}

impl IpAndEoj {
    pub fn new(ip: IpAddr, eoj: Eoj) -> Self {
        Self { ip, eoj }
    }
}

/// Decode a non-empty, even-length hex string into bytes
pub fn parse_edt(text: &str) -> Option<Vec<u8>> {
    if text.is_empty() || text.len() % 2 != 0 {
        return None;
    }
    hex::decode(text).ok()
}

impl DeviceSpecifier {
    /// Specifier that selects exactly the given endpoint
    pub fn exact(device: &IpAndEoj) -> Self {
        Self {
            ip: Some(device.ip),
            class_code: Some(device.eoj.class_code),
            instance_code: Some(device.eoj.instance_code),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ip.is_none() && self.class_code.is_none() && self.instance_code.is_none()
    }

    pub fn matches(&self, device: &IpAndEoj) -> bool {
        self.ip.is_none_or(|ip| ip == device.ip)
            && self
                .class_code
                .is_none_or(|code| code == device.eoj.class_code)
            && self
                .instance_code
                .is_none_or(|code| code == device.eoj.instance_code)
    }
}

/// Check a device alias name.
///
/// A valid alias is non-empty, starts with neither a digit nor a symbol,
/// and cannot be mistaken for a class code.
pub fn validate_alias_name(alias: &str) -> std::result::Result<(), String> {
    let Some(first) = alias.chars().next() else {
        return Err("alias name must not be empty".to_string());
    };
    if first.is_ascii_digit() {
        return Err(format!("alias '{alias}' must not start with a digit"));
    }
    if !first.is_alphanumeric() && first != '_' {
        return Err(format!("alias '{alias}' must not start with a symbol"));
    }
    if ClassCode::parse_hex(alias).is_some() {
        return Err(format!("alias '{alias}' looks like a class code"));
    }
    if alias.contains(':') || alias.contains(char::is_whitespace) {
        return Err(format!("alias '{alias}' must not contain ':' or whitespace"));
    }
    Ok(())
}

/// Check a group name: `@` followed by at least one non-whitespace character.
pub fn validate_group_name(group: &str) -> std::result::Result<(), String> {
    let Some(rest) = group.strip_prefix('@') else {
        return Err(format!("group name '{group}' must start with '@'"));
    };
    if rest.is_empty() {
        return Err("group name needs at least one character after '@'".to_string());
    }
    if group.contains(char::is_whitespace) {
        return Err(format!("group name '{group}' must not contain whitespace"));
    }
    Ok(())
}

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

impl fmt::Display for Epc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}", self.0)
    }
}

impl fmt::Display for Eoj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class_code, self.instance_code)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.epc, hex::encode_upper(&self.edt))
    }
}

impl fmt::Display for IpAndEoj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ip, self.eoj)
    }
}

impl fmt::Display for DeviceSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ip) = self.ip {
            parts.push(ip.to_string());
        }
        match (self.class_code, self.instance_code) {
            (Some(class), Some(instance)) => parts.push(format!("{class}:{instance}")),
            (Some(class), None) => parts.push(class.to_string()),
            (None, Some(instance)) => parts.push(format!("*:{instance}")),
            (None, None) => {}
        }
        if parts.is_empty() {
            write!(f, "(all devices)")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

impl FromStr for Eoj {
    type Err = String;

    /// Parse `cccc:i` or `cccc` (instance defaults to 1)
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (class, instance) = match s.split_once(':') {
            Some((class, instance)) => (class, Some(instance)),
            None => (s, None),
        };
        let class_code =
            ClassCode::parse_hex(class).ok_or_else(|| format!("invalid class code '{class}'"))?;
        let instance_code = match instance {
            Some(text) => match text.parse::<u8>() {
                Ok(code) if code >= 1 => code,
                _ => return Err(format!("instance code must be between 1 and 255: '{text}'")),
            },
            None => 1,
        };
        Ok(Eoj::new(class_code, instance_code))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode_upper(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_class_code() {
        assert_eq!(ClassCode::parse_hex("0130"), Some(ClassCode(0x0130)));
        assert_eq!(ClassCode::parse_hex("0eF0"), Some(ClassCode(0x0EF0)));
        assert_eq!(ClassCode::parse_hex("130"), None);
        assert_eq!(ClassCode::parse_hex("01300"), None);
        assert_eq!(ClassCode::parse_hex("01g0"), None);
    }

    #[test]
    fn test_parse_epc() {
        assert_eq!(Epc::parse_hex("80"), Some(Epc(0x80)));
        assert_eq!(Epc::parse_hex("8"), None);
        assert_eq!(Epc::parse_hex("+8"), None);
    }

    #[test]
    fn test_parse_edt() {
        assert_eq!(parse_edt("30"), Some(vec![0x30]));
        assert_eq!(parse_edt("0a1B"), Some(vec![0x0A, 0x1B]));
        assert_eq!(parse_edt("3"), None);
        assert_eq!(parse_edt(""), None);
        assert_eq!(parse_edt("zz"), None);
    }

    #[test]
    fn test_eoj_from_str() {
        assert_eq!("0130:2".parse::<Eoj>(), Ok(Eoj::new(ClassCode(0x0130), 2)));
        assert_eq!("0291".parse::<Eoj>(), Ok(Eoj::new(ClassCode(0x0291), 1)));
        assert!("0130:0".parse::<Eoj>().is_err());
        assert!("xyz".parse::<Eoj>().is_err());
    }

    #[test]
    fn test_specifier_matches() {
        let device = IpAndEoj::new(
            "192.168.0.3".parse().unwrap(),
            Eoj::new(ClassCode(0x0130), 1),
        );
        assert!(DeviceSpecifier::default().matches(&device));
        assert!(DeviceSpecifier::exact(&device).matches(&device));

        let other_class = DeviceSpecifier {
            class_code: Some(ClassCode(0x0291)),
            ..Default::default()
        };
        assert!(!other_class.matches(&device));
    }

    #[test]
    fn test_display() {
        let property = Property::new(Epc(0x80), vec![0x30]);
        assert_eq!(property.to_string(), "80:30");
        assert_eq!(Eoj::new(ClassCode(0x0130), 1).to_string(), "0130:1");

        let spec = DeviceSpecifier {
            ip: Some("192.168.0.212".parse().unwrap()),
            class_code: Some(ClassCode(0x0130)),
            instance_code: None,
        };
        assert_eq!(spec.to_string(), "192.168.0.212 0130");
    }

    #[test]
    fn test_validate_alias_name() {
        assert!(validate_alias_name("ac").is_ok());
        assert!(validate_alias_name("living_light").is_ok());
        assert!(validate_alias_name("").is_err());
        assert!(validate_alias_name("1st").is_err());
        assert!(validate_alias_name("-delete").is_err());
        assert!(validate_alias_name("@group").is_err());
        assert!(validate_alias_name("cafe").is_err());
    }

    #[test]
    fn test_validate_group_name() {
        assert!(validate_group_name("@living").is_ok());
        assert!(validate_group_name("living").is_err());
        assert!(validate_group_name("@").is_err());
    }
}
