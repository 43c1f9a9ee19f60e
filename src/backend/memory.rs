//! Simulated ECHONET Lite network
//!
//! Devices "on the network" answer requests; devices become known to the
//! console once discovered. Aliases and groups refer to known devices.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use super::{
    AliasManager, DeviceHandler, DeviceProperties, GroupManager, PropertyDescriptionProvider,
    PropertyTable,
};
use crate::config::DeviceConfig;
use crate::device::{
    ClassCode, DeviceSpecifier, Eoj, Epc, FilterCriteria, IpAndEoj, Property, parse_edt,
};
use crate::error::{ConfigError, ExecutionError, Result};

/// Cached properties older than this are refreshed by `update`
const STALE_AFTER_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct KnownDevice {
    properties: Vec<Property>,
    updated_at: DateTime<Local>,
}

#[derive(Debug, Default)]
struct BackendState {
    network: BTreeMap<IpAndEoj, Vec<Property>>,
    known: BTreeMap<IpAndEoj, KnownDevice>,
    aliases: BTreeMap<String, IpAndEoj>,
    groups: BTreeMap<String, Vec<IpAndEoj>>,
}

impl BackendState {
    fn alias_of(&self, device: &IpAndEoj) -> Option<String> {
        self.aliases
            .iter()
            .find(|(_, target)| *target == device)
            .map(|(alias, _)| alias.clone())
    }

    fn snapshot(&self, device: &IpAndEoj, known: &KnownDevice) -> DeviceProperties {
        DeviceProperties {
            device: *device,
            alias: self.alias_of(device),
            properties: known.properties.clone(),
            updated_at: Some(known.updated_at),
        }
    }
}

/// In-memory implementation of every backend trait
pub struct MemoryBackend {
    state: RwLock<BackendState>,
    debug: AtomicBool,
    table: PropertyTable,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BackendState::default()),
            debug: AtomicBool::new(false),
            table: PropertyTable::new(),
        }
    }

    /// Put a device on the simulated network
    pub fn with_device(self, device: IpAndEoj, properties: Vec<Property>) -> Self {
        self.write().network.insert(device, properties);
        self
    }

    /// Build the simulated network from `[[devices]]` config entries.
    ///
    /// # Arguments
    /// * `devices` - Device entries, each with an address, an EOJ and `EPC:EDT` values
    ///
    /// # Returns
    /// * `Result<Self>` - The backend, or the first invalid entry
    pub fn from_config(devices: &[DeviceConfig]) -> Result<Self> {
        let mut backend = Self::new();
        for entry in devices {
            let ip: IpAddr = entry.ip.parse().map_err(|_| ConfigError::InvalidValue {
                field: "devices.ip".to_string(),
                value: entry.ip.clone(),
            })?;
            let eoj: Eoj = entry.eoj.parse().map_err(|_| ConfigError::InvalidValue {
                field: "devices.eoj".to_string(),
                value: entry.eoj.clone(),
            })?;
            let properties = entry
                .properties
                .iter()
                .map(|text| {
                    parse_property(text).ok_or_else(|| ConfigError::InvalidValue {
                        field: "devices.properties".to_string(),
                        value: text.clone(),
                    })
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            backend = backend.with_device(IpAndEoj::new(ip, eoj), properties);
        }
        Ok(backend)
    }

    /// Property descriptions used to render values
    pub fn property_table(&self) -> &PropertyTable {
        &self.table
    }

    fn read(&self) -> RwLockReadGuard<'_, BackendState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BackendState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn no_response(device: &IpAndEoj) -> ExecutionError {
        ExecutionError::Failed(format!("No response from {device}"))
    }

    fn matching_known(state: &BackendState, criteria: &FilterCriteria) -> Vec<IpAndEoj> {
        state
            .known
            .iter()
            .filter(|(device, known)| {
                criteria.device.matches(device)
                    && criteria
                        .properties
                        .iter()
                        .all(|wanted| known.properties.contains(wanted))
            })
            .map(|(device, _)| *device)
            .collect()
    }
}

/// `EPC:EDT` in hex, as written in the config file
fn parse_property(text: &str) -> Option<Property> {
    let (epc, edt) = text.split_once(':')?;
    Some(Property::new(Epc::parse_hex(epc)?, parse_edt(edt)?))
}

impl AliasManager for MemoryBackend {
    fn resolve_alias(&self, alias: &str) -> Option<IpAndEoj> {
        self.read().aliases.get(alias).copied()
    }

    fn alias_names(&self) -> Vec<String> {
        self.read().aliases.keys().cloned().collect()
    }
}

impl GroupManager for MemoryBackend {
    fn group_members(&self, group: &str) -> Option<Vec<IpAndEoj>> {
        self.read().groups.get(group).cloned()
    }

    fn group_names(&self) -> Vec<String> {
        self.read().groups.keys().cloned().collect()
    }
}

#[async_trait]
impl DeviceHandler for MemoryBackend {
    async fn discover(&self) -> Result<usize> {
        let mut state = self.write();
        let now = Local::now();
        let found: Vec<(IpAndEoj, Vec<Property>)> = state
            .network
            .iter()
            .map(|(device, properties)| (*device, properties.clone()))
            .collect();
        for (device, properties) in found {
            debug!("Discovered {}", device);
            state.known.insert(
                device,
                KnownDevice {
                    properties,
                    updated_at: now,
                },
            );
        }
        info!("{} devices known after discovery", state.known.len());
        Ok(state.known.len())
    }

    fn find_devices(&self, spec: &DeviceSpecifier) -> Vec<IpAndEoj> {
        self.read()
            .known
            .keys()
            .filter(|device| spec.matches(device))
            .copied()
            .collect()
    }

    async fn list_devices(&self, criteria: &FilterCriteria) -> Result<Vec<DeviceProperties>> {
        let state = self.read();
        Ok(Self::matching_known(&state, criteria)
            .iter()
            .filter_map(|device| {
                state
                    .known
                    .get(device)
                    .map(|known| state.snapshot(device, known))
            })
            .collect())
    }

    async fn get_properties(
        &self,
        device: &IpAndEoj,
        epcs: &[Epc],
        skip_validation: bool,
    ) -> Result<DeviceProperties> {
        let mut state = self.write();
        if !skip_validation && !state.known.contains_key(device) {
            return Err(ExecutionError::DeviceNotFound(device.to_string()).into());
        }
        let on_network = state
            .network
            .get(device)
            .ok_or_else(|| Self::no_response(device))?;

        let mut answered = Vec::with_capacity(epcs.len());
        let mut unsupported = Vec::new();
        for epc in epcs {
            match on_network.iter().find(|p| p.epc == *epc) {
                Some(property) => answered.push(property.clone()),
                None => unsupported.push(epc.to_string()),
            }
        }
        if !unsupported.is_empty() {
            return Err(ExecutionError::Failed(format!(
                "{device} does not support EPC {}",
                unsupported.join(", ")
            ))
            .into());
        }

        let now = Local::now();
        let known = state.known.entry(*device).or_insert_with(|| KnownDevice {
            properties: Vec::new(),
            updated_at: now,
        });
        for property in &answered {
            match known.properties.iter_mut().find(|p| p.epc == property.epc) {
                Some(cached) => cached.edt = property.edt.clone(),
                None => known.properties.push(property.clone()),
            }
        }
        known.updated_at = now;

        Ok(DeviceProperties {
            device: *device,
            alias: state.alias_of(device),
            properties: answered,
            updated_at: Some(now),
        })
    }

    async fn set_properties(
        &self,
        device: &IpAndEoj,
        properties: &[Property],
    ) -> Result<DeviceProperties> {
        let mut state = self.write();
        if !state.known.contains_key(device) {
            return Err(ExecutionError::DeviceNotFound(device.to_string()).into());
        }
        let on_network = state
            .network
            .get_mut(device)
            .ok_or_else(|| Self::no_response(device))?;

        if let Some(missing) = properties
            .iter()
            .find(|wanted| !on_network.iter().any(|p| p.epc == wanted.epc))
        {
            return Err(ExecutionError::Failed(format!(
                "{device} does not support setting EPC {}",
                missing.epc
            ))
            .into());
        }
        for wanted in properties {
            if let Some(current) = on_network.iter_mut().find(|p| p.epc == wanted.epc) {
                current.edt = wanted.edt.clone();
            }
        }

        let now = Local::now();
        if let Some(known) = state.known.get_mut(device) {
            for wanted in properties {
                match known.properties.iter_mut().find(|p| p.epc == wanted.epc) {
                    Some(cached) => cached.edt = wanted.edt.clone(),
                    None => known.properties.push(wanted.clone()),
                }
            }
            known.updated_at = now;
        }

        Ok(DeviceProperties {
            device: *device,
            alias: state.alias_of(device),
            properties: properties.to_vec(),
            updated_at: Some(now),
        })
    }

    async fn update_properties(&self, criteria: &FilterCriteria, force: bool) -> Result<usize> {
        let mut state = self.write();
        let now = Local::now();
        let stale_before = now - Duration::seconds(STALE_AFTER_SECS);
        let mut refreshed = 0;
        for device in Self::matching_known(&state, criteria) {
            let Some(current) = state.network.get(&device).cloned() else {
                debug!("{} did not respond to update", device);
                continue;
            };
            if let Some(known) = state.known.get_mut(&device)
                && (force || known.updated_at <= stale_before)
            {
                known.properties = current;
                known.updated_at = now;
                refreshed += 1;
            }
        }
        Ok(refreshed)
    }

    async fn alias_set(&self, alias: &str, criteria: &FilterCriteria) -> Result<IpAndEoj> {
        let mut state = self.write();
        let matches = Self::matching_known(&state, criteria);
        let device = match matches.as_slice() {
            [device] => *device,
            [] => return Err(ExecutionError::DeviceNotFound(criteria.device.to_string()).into()),
            many => {
                return Err(ExecutionError::AmbiguousDevice {
                    specifier: criteria.device.to_string(),
                    count: many.len(),
                }
                .into());
            }
        };
        state.aliases.insert(alias.to_string(), device);
        Ok(device)
    }

    async fn alias_get(&self, alias: &str) -> Result<IpAndEoj> {
        self.resolve_alias(alias)
            .ok_or_else(|| ExecutionError::Failed(format!("Alias '{alias}' is not defined")).into())
    }

    async fn alias_delete(&self, alias: &str) -> Result<IpAndEoj> {
        self.write()
            .aliases
            .remove(alias)
            .ok_or_else(|| ExecutionError::Failed(format!("Alias '{alias}' is not defined")).into())
    }

    async fn alias_list(&self) -> Result<Vec<(String, IpAndEoj)>> {
        Ok(self
            .read()
            .aliases
            .iter()
            .map(|(alias, device)| (alias.clone(), *device))
            .collect())
    }

    async fn group_add(&self, group: &str, devices: &[IpAndEoj]) -> Result<()> {
        let mut state = self.write();
        let members = state.groups.entry(group.to_string()).or_default();
        for device in devices {
            if !members.contains(device) {
                members.push(*device);
            }
        }
        Ok(())
    }

    async fn group_remove(&self, group: &str, devices: &[IpAndEoj]) -> Result<()> {
        let mut state = self.write();
        let members = state
            .groups
            .get_mut(group)
            .ok_or_else(|| ExecutionError::Failed(format!("Group '{group}' is not defined")))?;
        members.retain(|member| !devices.contains(member));
        if members.is_empty() {
            state.groups.remove(group);
        }
        Ok(())
    }

    async fn group_delete(&self, group: &str) -> Result<()> {
        self.write()
            .groups
            .remove(group)
            .map(|_| ())
            .ok_or_else(|| ExecutionError::Failed(format!("Group '{group}' is not defined")).into())
    }

    async fn group_list(&self, group: Option<&str>) -> Result<Vec<(String, Vec<IpAndEoj>)>> {
        let state = self.read();
        match group {
            Some(name) => state
                .groups
                .get(name)
                .map(|members| vec![(name.to_string(), members.clone())])
                .ok_or_else(|| ExecutionError::Failed(format!("Group '{name}' is not defined")).into()),
            None => Ok(state
                .groups
                .iter()
                .map(|(name, members)| (name.clone(), members.clone()))
                .collect()),
        }
    }

    fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
    }
}

impl PropertyDescriptionProvider for MemoryBackend {
    fn value_alias_edt(
        &self,
        class_code: Option<ClassCode>,
        epc: Epc,
        alias: &str,
    ) -> Option<Vec<u8>> {
        self.table.value_alias_edt(class_code, epc, alias)
    }

    fn value_aliases(&self, class_code: Option<ClassCode>, epc: Epc) -> Vec<String> {
        self.table.value_aliases(class_code, epc)
    }

    fn property_alias(
        &self,
        class_code: Option<ClassCode>,
        alias: &str,
    ) -> Option<Property> {
        self.table.property_alias(class_code, alias)
    }

    fn property_aliases(&self, class_code: Option<ClassCode>) -> Vec<String> {
        self.table.property_aliases(class_code)
    }

    fn epc_name(&self, class_code: ClassCode, epc: Epc) -> Option<&'static str> {
        self.table.epc_name(class_code, epc)
    }

    fn known_epcs(&self, class_code: ClassCode) -> Vec<Epc> {
        self.table.known_epcs(class_code)
    }

    fn default_epcs(&self, class_code: ClassCode) -> Vec<Epc> {
        self.table.default_epcs(class_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsoleError;

    fn aircon(ip: &str) -> IpAndEoj {
        IpAndEoj::new(ip.parse().unwrap(), Eoj::new(ClassCode::HOME_AIR_CONDITIONER, 1))
    }

    fn light(ip: &str) -> IpAndEoj {
        IpAndEoj::new(
            ip.parse().unwrap(),
            Eoj::new(ClassCode::SINGLE_FUNCTION_LIGHTING, 1),
        )
    }

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_device(
                aircon("192.168.0.3"),
                vec![
                    Property::new(Epc(0x80), vec![0x30]),
                    Property::new(Epc(0xB0), vec![0x42]),
                    Property::new(Epc(0xB3), vec![0x1A]),
                ],
            )
            .with_device(
                light("192.168.0.4"),
                vec![Property::new(Epc(0x80), vec![0x31])],
            )
    }

    #[tokio::test]
    async fn test_discover_makes_devices_known() {
        let backend = backend();
        assert!(backend.find_devices(&DeviceSpecifier::default()).is_empty());
        assert_eq!(backend.discover().await.unwrap(), 2);
        assert_eq!(backend.find_devices(&DeviceSpecifier::default()).len(), 2);
    }

    #[tokio::test]
    async fn test_get_unknown_device() {
        let backend = backend();
        let err = backend
            .get_properties(&aircon("192.168.0.3"), &[Epc(0x80)], false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Execution(ExecutionError::DeviceNotFound(_))
        ));

        // Skipping validation asks the device directly
        let props = backend
            .get_properties(&aircon("192.168.0.3"), &[Epc(0x80)], true)
            .await
            .unwrap();
        assert_eq!(props.properties, vec![Property::new(Epc(0x80), vec![0x30])]);
    }

    #[tokio::test]
    async fn test_get_without_response() {
        let backend = backend();
        let err = backend
            .get_properties(&aircon("192.168.0.99"), &[Epc(0x80)], true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No response"));
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let backend = backend();
        backend.discover().await.unwrap();
        let device = aircon("192.168.0.3");
        backend
            .set_properties(&device, &[Property::new(Epc(0x80), vec![0x31])])
            .await
            .unwrap();
        let props = backend
            .get_properties(&device, &[Epc(0x80)], false)
            .await
            .unwrap();
        assert_eq!(props.property(Epc(0x80)).unwrap().edt, vec![0x31]);
    }

    #[tokio::test]
    async fn test_set_unsupported_epc() {
        let backend = backend();
        backend.discover().await.unwrap();
        let result = backend
            .set_properties(&light("192.168.0.4"), &[Property::new(Epc(0xB0), vec![0x42])])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_filters_by_property() {
        let backend = backend();
        backend.discover().await.unwrap();
        let criteria = FilterCriteria {
            device: DeviceSpecifier::default(),
            properties: vec![Property::new(Epc(0x80), vec![0x30])],
        };
        let listed = backend.list_devices(&criteria).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].device, aircon("192.168.0.3"));
    }

    #[tokio::test]
    async fn test_update_respects_staleness() {
        let backend = backend();
        backend.discover().await.unwrap();
        let all = FilterCriteria::default();
        assert_eq!(backend.update_properties(&all, false).await.unwrap(), 0);
        assert_eq!(backend.update_properties(&all, true).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_alias_set_requires_one_device() {
        let backend = backend();
        backend.discover().await.unwrap();

        let everything = FilterCriteria::default();
        let err = backend.alias_set("x", &everything).await.unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Execution(ExecutionError::AmbiguousDevice { count: 2, .. })
        ));

        let aircons = FilterCriteria {
            device: DeviceSpecifier {
                class_code: Some(ClassCode::HOME_AIR_CONDITIONER),
                ..Default::default()
            },
            properties: vec![],
        };
        let device = backend.alias_set("ac", &aircons).await.unwrap();
        assert_eq!(device, aircon("192.168.0.3"));
        assert_eq!(backend.resolve_alias("ac"), Some(device));
        assert_eq!(backend.alias_names(), vec!["ac".to_string()]);

        backend.alias_delete("ac").await.unwrap();
        assert!(backend.alias_get("ac").await.is_err());
    }

    #[tokio::test]
    async fn test_group_lifecycle() {
        let backend = backend();
        let ac = aircon("192.168.0.3");
        let lamp = light("192.168.0.4");

        backend.group_add("@living", &[ac, lamp]).await.unwrap();
        backend.group_add("@living", &[ac]).await.unwrap();
        assert_eq!(backend.group_members("@living"), Some(vec![ac, lamp]));

        backend.group_remove("@living", &[ac]).await.unwrap();
        assert_eq!(backend.group_members("@living"), Some(vec![lamp]));

        // Removing the last member deletes the group
        backend.group_remove("@living", &[lamp]).await.unwrap();
        assert!(backend.group_names().is_empty());
        assert!(backend.group_delete("@living").await.is_err());
    }

    #[test]
    fn test_debug_flag() {
        let backend = MemoryBackend::new();
        assert!(!backend.is_debug());
        backend.set_debug(true);
        assert!(backend.is_debug());
    }

    #[test]
    fn test_from_config() {
        let devices = vec![DeviceConfig {
            ip: "192.168.0.3".to_string(),
            eoj: "0130:1".to_string(),
            properties: vec!["80:30".to_string(), "b3:1a".to_string()],
        }];
        let backend = MemoryBackend::from_config(&devices).unwrap();
        let state = backend.read();
        let props = state.network.get(&aircon("192.168.0.3")).unwrap();
        assert_eq!(props[1], Property::new(Epc(0xB3), vec![0x1A]));
        drop(state);
        assert_eq!(tokio_test::block_on(backend.discover()).unwrap(), 1);

        let bad = vec![DeviceConfig {
            ip: "192.168.0.3".to_string(),
            eoj: "0130".to_string(),
            properties: vec!["80".to_string()],
        }];
        assert!(MemoryBackend::from_config(&bad).is_err());
    }
}
