//! Command router executing parsed commands against a device handler
//!
//! This module provides the CommandRouter which turns each [`Command`] into
//! calls on the [`DeviceHandler`] and shapes the answers for display.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::backend::{DeviceHandler, DeviceProperties, PropertyDescriptionProvider};
use crate::device::{DeviceSpecifier, Eoj, Epc, FilterCriteria, IpAndEoj, PropertyMode};
use crate::dispatcher::CommandExecutor;
use crate::error::{ExecutionError, Result};
use crate::grammar::Grammar;
use crate::parser::{
    AliasCommand, Command, DevicesCommand, GetCommand, GroupCommand, SetCommand, Target,
    UpdateCommand,
};

use super::help;
use super::result::{DeviceRow, ExecutionResult, ExecutionStats, PropertyRow, ResultData};

/// Command router that dispatches commands to the device handler
pub struct CommandRouter {
    handler: Arc<dyn DeviceHandler>,
    properties: Arc<dyn PropertyDescriptionProvider>,
    grammar: Arc<Grammar>,
}

impl CommandRouter {
    pub fn new(
        handler: Arc<dyn DeviceHandler>,
        properties: Arc<dyn PropertyDescriptionProvider>,
        grammar: Arc<Grammar>,
    ) -> Self {
        Self {
            handler,
            properties,
            grammar,
        }
    }

    /// Route command to the matching handler calls
    ///
    /// # Arguments
    /// * `command` - Parsed command
    ///
    /// # Returns
    /// * `Result<ExecutionResult>` - Execution result or error
    pub async fn route(&self, command: Command) -> Result<ExecutionResult> {
        debug!("Routing command: {:?}", command);
        let start = Instant::now();

        let mut result = match command {
            Command::Discover => {
                let count = self.handler.discover().await?;
                ExecutionResult::success(
                    ResultData::Message(format!("{count} device(s) found")),
                    ExecutionStats {
                        devices: count,
                        ..Default::default()
                    },
                )
            }
            Command::Devices(cmd) => self.devices(cmd).await?,
            Command::Get(cmd) => self.get(cmd).await?,
            Command::Set(cmd) => self.set(cmd).await?,
            Command::Update(cmd) => self.update(cmd).await?,
            Command::Alias(cmd) => self.alias(cmd).await?,
            Command::Group(cmd) => self.group(cmd).await?,
            Command::Debug(None) => {
                let state = if self.handler.is_debug() { "on" } else { "off" };
                ExecutionResult::message(format!("Debug mode is {state}"))
            }
            Command::Debug(Some(enabled)) => {
                self.handler.set_debug(enabled);
                let state = if enabled { "on" } else { "off" };
                ExecutionResult::message(format!("Debug mode turned {state}"))
            }
            Command::Help(topic) => {
                ExecutionResult::message(help::render(&self.grammar, topic.as_deref())?)
            }
            Command::Quit => ExecutionResult::message("Bye"),
        };

        let elapsed = start.elapsed().as_millis() as u64;
        debug!("Command executed in {}ms", elapsed);
        result.stats.execution_time_ms = elapsed;
        Ok(result)
    }

    /* ========================= Devices ========================= */

    async fn devices(&self, cmd: DevicesCommand) -> Result<ExecutionResult> {
        let (device, members) = match &cmd.target {
            Some(Target::Device(spec)) => (*spec, None),
            Some(Target::Group(name)) => (DeviceSpecifier::default(), Some(self.members(name).await?)),
            None => (DeviceSpecifier::default(), None),
        };
        let criteria = FilterCriteria {
            device,
            properties: cmd.properties.clone(),
        };

        let listed: Vec<DeviceProperties> = self
            .handler
            .list_devices(&criteria)
            .await?
            .into_iter()
            .filter(|entry| {
                members
                    .as_ref()
                    .is_none_or(|members| members.contains(&entry.device))
            })
            .collect();

        let stats = ExecutionStats {
            devices: listed.len(),
            ..Default::default()
        };

        let Some(group_epc) = cmd.group_by else {
            let rows = listed
                .iter()
                .map(|entry| self.row(entry, &self.shown_epcs(&cmd, entry)))
                .collect();
            return Ok(ExecutionResult::success(ResultData::Devices(rows), stats));
        };

        let mut groups: Vec<(String, Vec<DeviceRow>)> = Vec::new();
        for entry in &listed {
            let key = entry
                .property(group_epc)
                .map(|p| self.properties.describe_value(entry.device.eoj.class_code, p))
                .unwrap_or_else(|| "(none)".to_string());
            let row = self.row(entry, &self.shown_epcs(&cmd, entry));
            match groups.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, rows)) => rows.push(row),
                None => groups.push((key, vec![row])),
            }
        }
        Ok(ExecutionResult::success(
            ResultData::GroupedDevices {
                epc: group_epc,
                groups,
            },
            stats,
        ))
    }

    /// EPCs displayed for one device in a listing
    fn shown_epcs(&self, cmd: &DevicesCommand, entry: &DeviceProperties) -> Vec<Epc> {
        let class_code = entry.device.eoj.class_code;
        match cmd.mode {
            PropertyMode::Default => self.properties.default_epcs(class_code),
            PropertyMode::Known => self.properties.known_epcs(class_code),
            PropertyMode::All => entry.properties.iter().map(|p| p.epc).collect(),
            PropertyMode::Epc => cmd.epcs.clone(),
        }
    }

    fn row(&self, entry: &DeviceProperties, epcs: &[Epc]) -> DeviceRow {
        let class_code = entry.device.eoj.class_code;
        DeviceRow {
            device: entry.device,
            alias: entry.alias.clone(),
            properties: epcs
                .iter()
                .filter_map(|epc| entry.property(*epc))
                .map(|property| PropertyRow {
                    epc: property.epc,
                    name: self.properties.epc_name(class_code, property.epc),
                    value: self.properties.describe_value(class_code, property),
                })
                .collect(),
            updated_at: entry.updated_at,
        }
    }

    /* ========================= Device access ========================= */

    async fn members(&self, group: &str) -> Result<Vec<IpAndEoj>> {
        Ok(self
            .handler
            .group_list(Some(group))
            .await?
            .into_iter()
            .flat_map(|(_, members)| members)
            .collect())
    }

    /// Devices a get or set acts on.
    ///
    /// A device specifier must match exactly one known device. With
    /// `allow_unknown`, a specifier naming an address and a class selects
    /// that endpoint even if discovery never saw it.
    async fn resolve(&self, target: &Target, allow_unknown: bool) -> Result<Vec<IpAndEoj>> {
        let spec = match target {
            Target::Group(name) => return self.members(name).await,
            Target::Device(spec) => spec,
        };
        let found = self.handler.find_devices(spec);
        match found.len() {
            1 => Ok(found),
            0 => match (allow_unknown, spec.ip, spec.class_code) {
                (true, Some(ip), Some(class_code)) => Ok(vec![IpAndEoj::new(
                    ip,
                    Eoj::new(class_code, spec.instance_code.unwrap_or(1)),
                )]),
                _ => Err(ExecutionError::DeviceNotFound(spec.to_string()).into()),
            },
            count => Err(ExecutionError::AmbiguousDevice {
                specifier: spec.to_string(),
                count,
            }
            .into()),
        }
    }

    async fn get(&self, cmd: GetCommand) -> Result<ExecutionResult> {
        let devices = self.resolve(&cmd.target, cmd.skip_validation).await?;
        // Group members are queried concurrently; rows keep member order
        let answers = try_join_all(devices.iter().map(|device| {
            self.handler
                .get_properties(device, &cmd.epcs, cmd.skip_validation)
        }))
        .await?;
        let rows = answers
            .iter()
            .map(|answered| self.row(answered, &cmd.epcs))
            .collect();
        Ok(ExecutionResult::success(
            ResultData::Devices(rows),
            ExecutionStats {
                devices: devices.len(),
                ..Default::default()
            },
        ))
    }

    async fn set(&self, cmd: SetCommand) -> Result<ExecutionResult> {
        let devices = self.resolve(&cmd.target, false).await?;
        let epcs: Vec<Epc> = cmd.properties.iter().map(|p| p.epc).collect();
        let written = try_join_all(
            devices
                .iter()
                .map(|device| self.handler.set_properties(device, &cmd.properties)),
        )
        .await?;
        let rows = written.iter().map(|entry| self.row(entry, &epcs)).collect();
        Ok(ExecutionResult::success(
            ResultData::Devices(rows),
            ExecutionStats {
                devices: devices.len(),
                ..Default::default()
            },
        ))
    }

    async fn update(&self, cmd: UpdateCommand) -> Result<ExecutionResult> {
        let specs = match &cmd.target {
            None => vec![DeviceSpecifier::default()],
            Some(Target::Device(spec)) => vec![*spec],
            Some(Target::Group(name)) => self
                .members(name)
                .await?
                .iter()
                .map(DeviceSpecifier::exact)
                .collect(),
        };

        let mut refreshed = 0;
        for device in specs {
            let criteria = FilterCriteria {
                device,
                properties: Vec::new(),
            };
            refreshed += self.handler.update_properties(&criteria, cmd.force).await?;
        }
        Ok(ExecutionResult::success(
            ResultData::Message(format!("{refreshed} device(s) updated")),
            ExecutionStats {
                devices: refreshed,
                ..Default::default()
            },
        ))
    }

    /* ========================= Aliases & groups ========================= */

    async fn alias(&self, cmd: AliasCommand) -> Result<ExecutionResult> {
        let data = match cmd {
            AliasCommand::List => ResultData::Aliases(self.handler.alias_list().await?),
            AliasCommand::Get(alias) => {
                let device = self.handler.alias_get(&alias).await?;
                ResultData::Aliases(vec![(alias, device)])
            }
            AliasCommand::Set { alias, criteria } => {
                let device = self.handler.alias_set(&alias, &criteria).await?;
                ResultData::Message(format!("Alias '{alias}' now refers to {device}"))
            }
            AliasCommand::Delete(alias) => {
                let device = self.handler.alias_delete(&alias).await?;
                ResultData::Message(format!("Alias '{alias}' ({device}) deleted"))
            }
        };
        Ok(ExecutionResult::success(data, ExecutionStats::default()))
    }

    /// Every known device matched by any of the specifiers
    fn expand(&self, specs: &[DeviceSpecifier]) -> Result<Vec<IpAndEoj>> {
        let mut devices = Vec::new();
        for spec in specs {
            let found = self.handler.find_devices(spec);
            if found.is_empty() {
                return Err(ExecutionError::DeviceNotFound(spec.to_string()).into());
            }
            for device in found {
                if !devices.contains(&device) {
                    devices.push(device);
                }
            }
        }
        Ok(devices)
    }

    async fn group(&self, cmd: GroupCommand) -> Result<ExecutionResult> {
        let data = match cmd {
            GroupCommand::Add { group, devices } => {
                let devices = self.expand(&devices)?;
                self.handler.group_add(&group, &devices).await?;
                ResultData::Message(format!("{} device(s) added to {group}", devices.len()))
            }
            GroupCommand::Remove { group, devices } => {
                let devices = self.expand(&devices)?;
                self.handler.group_remove(&group, &devices).await?;
                ResultData::Message(format!("{} device(s) removed from {group}", devices.len()))
            }
            GroupCommand::Delete(group) => {
                self.handler.group_delete(&group).await?;
                ResultData::Message(format!("Group {group} deleted"))
            }
            GroupCommand::List(group) => {
                ResultData::Groups(self.handler.group_list(group.as_deref()).await?)
            }
        };
        Ok(ExecutionResult::success(data, ExecutionStats::default()))
    }
}

#[async_trait]
impl CommandExecutor for CommandRouter {
    async fn execute(&self, command: Command) -> Result<ExecutionResult> {
        self.route(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, PropertyTable};
    use crate::device::{ClassCode, Property};
    use crate::error::ConsoleError;

    fn aircon(ip: &str) -> IpAndEoj {
        IpAndEoj::new(ip.parse().unwrap(), Eoj::new(ClassCode::HOME_AIR_CONDITIONER, 1))
    }

    async fn router() -> (CommandRouter, Arc<MemoryBackend>) {
        let backend = Arc::new(
            MemoryBackend::new()
                .with_device(
                    aircon("192.168.0.3"),
                    vec![
                        Property::new(Epc(0x80), vec![0x30]),
                        Property::new(Epc(0x81), vec![0x08]),
                        Property::new(Epc(0xB0), vec![0x42]),
                        Property::new(Epc(0x9F), vec![0x01, 0x80]),
                    ],
                )
                .with_device(
                    aircon("192.168.0.4"),
                    vec![
                        Property::new(Epc(0x80), vec![0x31]),
                        Property::new(Epc(0x81), vec![0x08]),
                    ],
                ),
        );
        backend.discover().await.unwrap();
        let router = CommandRouter::new(
            backend.clone(),
            Arc::new(PropertyTable::new()),
            Arc::new(Grammar::new()),
        );
        (router, backend)
    }

    fn rows(result: ExecutionResult) -> Vec<DeviceRow> {
        match result.data {
            ResultData::Devices(rows) => rows,
            other => panic!("expected devices, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_devices_default_mode() {
        let (router, _) = router().await;
        let rows = rows(router.route(Command::Devices(DevicesCommand::default())).await.unwrap());
        assert_eq!(rows.len(), 2);
        let first = &rows[0];
        let epcs: Vec<Epc> = first.properties.iter().map(|p| p.epc).collect();
        assert_eq!(epcs, vec![Epc(0x80), Epc(0x81), Epc(0xB0)]);
        assert_eq!(first.properties[0].value, "on");
        assert_eq!(first.properties[2].value, "cooling");
    }

    #[tokio::test]
    async fn test_devices_all_mode() {
        let (router, _) = router().await;
        let cmd = DevicesCommand {
            mode: PropertyMode::All,
            ..Default::default()
        };
        let rows = rows(router.route(Command::Devices(cmd)).await.unwrap());
        assert_eq!(rows[0].properties.len(), 4);
    }

    #[tokio::test]
    async fn test_devices_group_by() {
        let (router, _) = router().await;
        let cmd = DevicesCommand {
            group_by: Some(Epc(0x80)),
            ..Default::default()
        };
        let result = router.route(Command::Devices(cmd)).await.unwrap();
        let ResultData::GroupedDevices { groups, .. } = result.data else {
            panic!("expected grouped devices");
        };
        let keys: Vec<&str> = groups.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["on", "off"]);
    }

    #[tokio::test]
    async fn test_get_requires_single_device() {
        let (router, _) = router().await;
        let cmd = GetCommand {
            target: Target::Device(DeviceSpecifier {
                class_code: Some(ClassCode::HOME_AIR_CONDITIONER),
                ..Default::default()
            }),
            epcs: vec![Epc(0x80)],
            skip_validation: false,
        };
        let err = router.route(Command::Get(cmd)).await.unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Execution(ExecutionError::AmbiguousDevice { count: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_set_group() {
        let (router, backend) = router().await;
        backend
            .group_add("@all", &[aircon("192.168.0.3"), aircon("192.168.0.4")])
            .await
            .unwrap();
        let cmd = SetCommand {
            target: Target::Group("@all".to_string()),
            properties: vec![Property::new(Epc(0x80), vec![0x31])],
        };
        let result = router.route(Command::Set(cmd)).await.unwrap();
        assert_eq!(result.stats.devices, 2);

        let cmd = GetCommand {
            target: Target::Device(DeviceSpecifier::exact(&aircon("192.168.0.3"))),
            epcs: vec![Epc(0x80)],
            skip_validation: false,
        };
        let rows = rows(router.route(Command::Get(cmd)).await.unwrap());
        assert_eq!(rows[0].properties[0].value, "off");
    }

    #[tokio::test]
    async fn test_debug_toggle() {
        let (router, backend) = router().await;
        router.route(Command::Debug(Some(true))).await.unwrap();
        assert!(backend.is_debug());
        let result = router.route(Command::Debug(None)).await.unwrap();
        assert!(matches!(result.data, ResultData::Message(ref m) if m.ends_with("on")));
    }

    #[tokio::test]
    async fn test_group_add_unknown_device() {
        let (router, _) = router().await;
        let cmd = GroupCommand::Add {
            group: "@x".to_string(),
            devices: vec![DeviceSpecifier {
                class_code: Some(ClassCode::SINGLE_FUNCTION_LIGHTING),
                ..Default::default()
            }],
        };
        assert!(router.route(Command::Group(cmd)).await.is_err());
    }
}
