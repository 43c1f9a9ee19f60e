//! Built-in property descriptions for common device classes

use super::PropertyDescriptionProvider;
use crate::device::{ClassCode, Epc, Property};

struct PropertyDesc {
    epc: u8,
    name: &'static str,
    aliases: &'static [(&'static str, &'static [u8])],
}

struct ClassDesc {
    class_code: u16,
    properties: &'static [PropertyDesc],
    /// Shown by default in device listings, after the common ones
    primary: &'static [u8],
}

const COMMON_PRIMARY: &[u8] = &[0x80, 0x81];

static COMMON: &[PropertyDesc] = &[
    PropertyDesc {
        epc: 0x80,
        name: "Operation status",
        aliases: &[("on", &[0x30]), ("off", &[0x31])],
    },
    PropertyDesc {
        epc: 0x81,
        name: "Installation location",
        aliases: &[
            ("living", &[0x08]),
            ("dining", &[0x10]),
            ("kitchen", &[0x18]),
            ("bathroom", &[0x20]),
            ("washroom", &[0x30]),
            ("hallway", &[0x38]),
            ("room", &[0x40]),
            ("entrance", &[0x50]),
            ("garden", &[0x60]),
            ("unspecified", &[0x00]),
        ],
    },
    PropertyDesc {
        epc: 0x88,
        name: "Fault status",
        aliases: &[("fault", &[0x41]), ("no_fault", &[0x42])],
    },
    PropertyDesc {
        epc: 0x8A,
        name: "Manufacturer code",
        aliases: &[],
    },
    PropertyDesc {
        epc: 0x9D,
        name: "Status change announcement property map",
        aliases: &[],
    },
    PropertyDesc {
        epc: 0x9E,
        name: "Set property map",
        aliases: &[],
    },
    PropertyDesc {
        epc: 0x9F,
        name: "Get property map",
        aliases: &[],
    },
];

static CLASSES: &[ClassDesc] = &[
    ClassDesc {
        class_code: 0x0130,
        properties: &[
            PropertyDesc {
                epc: 0xA0,
                name: "Air flow rate setting",
                aliases: &[("flow_auto", &[0x41])],
            },
            PropertyDesc {
                epc: 0xB0,
                name: "Operation mode setting",
                aliases: &[
                    ("auto", &[0x41]),
                    ("cooling", &[0x42]),
                    ("heating", &[0x43]),
                    ("dry", &[0x44]),
                    ("fan", &[0x45]),
                ],
            },
            PropertyDesc {
                epc: 0xB3,
                name: "Temperature setting",
                aliases: &[],
            },
            PropertyDesc {
                epc: 0xBB,
                name: "Measured room temperature",
                aliases: &[],
            },
        ],
        primary: &[0xB0, 0xB3, 0xBB],
    },
    ClassDesc {
        class_code: 0x0291,
        properties: &[PropertyDesc {
            epc: 0xB0,
            name: "Illuminance level",
            aliases: &[],
        }],
        primary: &[0xB0],
    },
    ClassDesc {
        class_code: 0x0EF0,
        properties: &[
            PropertyDesc {
                epc: 0x83,
                name: "Identification number",
                aliases: &[],
            },
            PropertyDesc {
                epc: 0xD6,
                name: "Self-node instance list S",
                aliases: &[],
            },
        ],
        primary: &[0xD6],
    },
];

/// Static [`PropertyDescriptionProvider`] covering air conditioners,
/// single function lighting and node profiles
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyTable;

impl PropertyTable {
    pub fn new() -> Self {
        Self
    }

    fn class(class_code: ClassCode) -> Option<&'static ClassDesc> {
        CLASSES.iter().find(|class| class.class_code == class_code.0)
    }

    /// Class specific descriptions first, then the common ones
    fn descriptions(class_code: Option<ClassCode>) -> impl Iterator<Item = &'static PropertyDesc> {
        class_code
            .and_then(Self::class)
            .map(|class| class.properties)
            .unwrap_or_default()
            .iter()
            .chain(COMMON.iter())
    }

    fn find(class_code: Option<ClassCode>, epc: Epc) -> Option<&'static PropertyDesc> {
        Self::descriptions(class_code).find(|desc| desc.epc == epc.0)
    }
}

impl PropertyDescriptionProvider for PropertyTable {
    fn value_alias_edt(&self, class_code: Option<ClassCode>, epc: Epc, alias: &str) -> Option<Vec<u8>> {
        Self::find(class_code, epc)?
            .aliases
            .iter()
            .find(|(name, _)| *name == alias)
            .map(|(_, edt)| edt.to_vec())
    }

    fn value_aliases(&self, class_code: Option<ClassCode>, epc: Epc) -> Vec<String> {
        Self::find(class_code, epc)
            .map(|desc| desc.aliases.iter().map(|(name, _)| name.to_string()).collect())
            .unwrap_or_default()
    }

    fn property_alias(&self, class_code: Option<ClassCode>, alias: &str) -> Option<Property> {
        Self::descriptions(class_code).find_map(|desc| {
            desc.aliases
                .iter()
                .find(|(name, _)| *name == alias)
                .map(|(_, edt)| Property::new(Epc(desc.epc), edt.to_vec()))
        })
    }

    fn property_aliases(&self, class_code: Option<ClassCode>) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for desc in Self::descriptions(class_code) {
            for (name, _) in desc.aliases {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    fn epc_name(&self, class_code: ClassCode, epc: Epc) -> Option<&'static str> {
        Self::find(Some(class_code), epc).map(|desc| desc.name)
    }

    fn known_epcs(&self, class_code: ClassCode) -> Vec<Epc> {
        let mut epcs: Vec<Epc> = Self::descriptions(Some(class_code))
            .map(|desc| Epc(desc.epc))
            .collect();
        epcs.sort();
        epcs.dedup();
        epcs
    }

    fn default_epcs(&self, class_code: ClassCode) -> Vec<Epc> {
        let primary = Self::class(class_code)
            .map(|class| class.primary)
            .unwrap_or_default();
        COMMON_PRIMARY
            .iter()
            .chain(primary.iter())
            .map(|epc| Epc(*epc))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AIRCON: ClassCode = ClassCode::HOME_AIR_CONDITIONER;

    #[test]
    fn test_value_alias() {
        let table = PropertyTable::new();
        assert_eq!(
            table.value_alias_edt(Some(AIRCON), Epc(0x80), "on"),
            Some(vec![0x30])
        );
        assert_eq!(
            table.value_alias_edt(Some(AIRCON), Epc(0xB0), "cooling"),
            Some(vec![0x42])
        );
        assert_eq!(table.value_alias_edt(None, Epc(0xB0), "cooling"), None);
        assert_eq!(table.value_alias_edt(Some(AIRCON), Epc(0x80), "up"), None);
    }

    #[test]
    fn test_property_alias_prefers_class_table() {
        let table = PropertyTable::new();
        assert_eq!(
            table.property_alias(Some(AIRCON), "heating"),
            Some(Property::new(Epc(0xB0), vec![0x43]))
        );
        assert_eq!(
            table.property_alias(None, "off"),
            Some(Property::new(Epc(0x80), vec![0x31]))
        );
        assert_eq!(table.property_alias(None, "heating"), None);
    }

    #[test]
    fn test_property_aliases_are_unique() {
        let table = PropertyTable::new();
        let names = table.property_aliases(Some(AIRCON));
        assert!(names.contains(&"cooling".to_string()));
        assert!(names.contains(&"on".to_string()));
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len());
    }

    #[test]
    fn test_describe_value() {
        let table = PropertyTable::new();
        let on = Property::new(Epc(0x80), vec![0x30]);
        assert_eq!(table.describe_value(AIRCON, &on), "on");
        let temperature = Property::new(Epc(0xB3), vec![0x1A]);
        assert_eq!(table.describe_value(AIRCON, &temperature), "1A");
    }

    #[test]
    fn test_default_epcs() {
        let table = PropertyTable::new();
        assert_eq!(
            table.default_epcs(AIRCON),
            vec![Epc(0x80), Epc(0x81), Epc(0xB0), Epc(0xB3), Epc(0xBB)]
        );
        assert_eq!(
            table.default_epcs(ClassCode(0x0602)),
            vec![Epc(0x80), Epc(0x81)]
        );
    }

    #[test]
    fn test_epc_name() {
        let table = PropertyTable::new();
        assert_eq!(table.epc_name(AIRCON, Epc(0xB3)), Some("Temperature setting"));
        assert_eq!(
            table.epc_name(ClassCode::SINGLE_FUNCTION_LIGHTING, Epc(0x80)),
            Some("Operation status")
        );
        assert_eq!(table.epc_name(AIRCON, Epc(0xF0)), None);
    }
}
