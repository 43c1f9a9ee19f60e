//! Collaborators of the console core
//!
//! The parser resolves names through the lookup traits
//! ([`PropertyDescriptionProvider`], [`AliasManager`], [`GroupManager`]) and
//! the dispatcher executes commands through [`DeviceHandler`].
//! [`MemoryBackend`] implements all of them over simulated devices.

mod memory;
mod properties;

pub use memory::MemoryBackend;
pub use properties::PropertyTable;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::device::{ClassCode, DeviceSpecifier, Epc, FilterCriteria, IpAndEoj, Property};
use crate::error::Result;

/// Property names and value aliases per device class
pub trait PropertyDescriptionProvider: Send + Sync {
    /// Value bytes for `EPC:alias`
    fn value_alias_edt(&self, class_code: Option<ClassCode>, epc: Epc, alias: &str) -> Option<Vec<u8>>;

    /// Value aliases of one property, in table order
    fn value_aliases(&self, class_code: Option<ClassCode>, epc: Epc) -> Vec<String>;

    /// Property for a standalone alias such as `on`
    fn property_alias(&self, class_code: Option<ClassCode>, alias: &str) -> Option<Property>;

    /// Every standalone property alias usable with the class
    fn property_aliases(&self, class_code: Option<ClassCode>) -> Vec<String>;

    /// Human readable property name
    fn epc_name(&self, class_code: ClassCode, epc: Epc) -> Option<&'static str>;

    /// EPCs with a description for the class
    fn known_epcs(&self, class_code: ClassCode) -> Vec<Epc>;

    /// EPCs shown by a plain `devices`
    fn default_epcs(&self, class_code: ClassCode) -> Vec<Epc>;

    /// Value rendered as its alias when one exists, hex otherwise
    fn describe_value(&self, class_code: ClassCode, property: &Property) -> String {
        let aliases = self.value_aliases(Some(class_code), property.epc);
        aliases
            .into_iter()
            .find(|alias| {
                self.value_alias_edt(Some(class_code), property.epc, alias)
                    .is_some_and(|edt| edt == property.edt)
            })
            .unwrap_or_else(|| hex::encode_upper(&property.edt))
    }
}

/// Device alias lookups
pub trait AliasManager: Send + Sync {
    fn resolve_alias(&self, alias: &str) -> Option<IpAndEoj>;
    fn alias_names(&self) -> Vec<String>;
}

/// Device group lookups
pub trait GroupManager: Send + Sync {
    fn group_members(&self, group: &str) -> Option<Vec<IpAndEoj>>;
    fn group_names(&self) -> Vec<String>;
}

/// Cached state of one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProperties {
    pub device: IpAndEoj,
    pub alias: Option<String>,
    pub properties: Vec<Property>,
    pub updated_at: Option<DateTime<Local>>,
}

impl DeviceProperties {
    pub fn property(&self, epc: Epc) -> Option<&Property> {
        self.properties.iter().find(|p| p.epc == epc)
    }
}

/// Operations executed on behalf of dispatched commands
#[async_trait]
pub trait DeviceHandler: Send + Sync {
    /// Search the network for devices, returning how many are known afterwards
    async fn discover(&self) -> Result<usize>;

    /// Known devices matching a specifier
    fn find_devices(&self, spec: &DeviceSpecifier) -> Vec<IpAndEoj>;

    async fn list_devices(&self, criteria: &FilterCriteria) -> Result<Vec<DeviceProperties>>;

    async fn get_properties(
        &self,
        device: &IpAndEoj,
        epcs: &[Epc],
        skip_validation: bool,
    ) -> Result<DeviceProperties>;

    async fn set_properties(
        &self,
        device: &IpAndEoj,
        properties: &[Property],
    ) -> Result<DeviceProperties>;

    /// Refresh cached properties, returning how many devices were refreshed
    async fn update_properties(&self, criteria: &FilterCriteria, force: bool) -> Result<usize>;

    async fn alias_set(&self, alias: &str, criteria: &FilterCriteria) -> Result<IpAndEoj>;
    async fn alias_get(&self, alias: &str) -> Result<IpAndEoj>;
    async fn alias_delete(&self, alias: &str) -> Result<IpAndEoj>;
    async fn alias_list(&self) -> Result<Vec<(String, IpAndEoj)>>;

    async fn group_add(&self, group: &str, devices: &[IpAndEoj]) -> Result<()>;
    async fn group_remove(&self, group: &str, devices: &[IpAndEoj]) -> Result<()>;
    async fn group_delete(&self, group: &str) -> Result<()>;
    async fn group_list(&self, group: Option<&str>) -> Result<Vec<(String, Vec<IpAndEoj>)>>;

    fn is_debug(&self) -> bool;
    fn set_debug(&self, enabled: bool);
}
