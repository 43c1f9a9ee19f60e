//! Turn a grammar match into a [`Command`]
//!
//! The match tree is flattened into its meaningful items first, so each
//! command builder only deals with a list of keywords, names, devices and
//! properties in input order.

use tracing::debug;

use super::command::{
    AliasCommand, Command, DevicesCommand, GetCommand, GroupCommand, SetCommand, Target,
    UpdateCommand,
};
use crate::backend::{AliasManager, GroupManager, PropertyDescriptionProvider};
use crate::device::{
    ClassCode, DeviceSpecifier, Epc, FilterCriteria, Property, PropertyMode, validate_alias_name,
    validate_group_name,
};
use crate::error::ParseError;
use crate::grammar::{DeviceArg, Matched, NodeKind, PropertyArg};

type BuildResult<T> = std::result::Result<T, ParseError>;

/// Name lookups available while building
pub(crate) struct Resolver<'a> {
    pub aliases: &'a dyn AliasManager,
    pub groups: &'a dyn GroupManager,
    pub properties: &'a dyn PropertyDescriptionProvider,
}

/// Collect the items of a match in input order, dropping structure and
/// skipped optionals
fn flatten(matched: Matched, items: &mut Vec<Matched>) {
    match matched {
        Matched::Seq(parts) | Matched::Repeat(parts) => {
            for part in parts {
                flatten(part, items);
            }
        }
        Matched::Skipped => {}
        other => items.push(other),
    }
}

fn unexpected(item: &Matched) -> ParseError {
    ParseError::SemanticValidation(format!("unexpected {item:?}"))
}

impl Resolver<'_> {
    pub fn build(&self, matched: Matched) -> BuildResult<Command> {
        let mut items = Vec::new();
        flatten(matched, &mut items);
        let mut items = items.into_iter();

        let Some(Matched::Keyword(NodeKind::Command, name)) = items.next() else {
            return Err(ParseError::SemanticValidation(
                "input does not start with a command".to_string(),
            ));
        };
        let rest: Vec<Matched> = items.collect();
        debug!("Building '{}' from {} items", name, rest.len());

        match name {
            "discover" => Ok(Command::Discover),
            "devices" | "list" => self.devices(rest).map(Command::Devices),
            "get" => self.get(rest).map(Command::Get),
            "set" => self.set(rest).map(Command::Set),
            "update" => self.update(rest).map(Command::Update),
            "alias" => self.alias(rest).map(Command::Alias),
            "group" => self.group(rest).map(Command::Group),
            "debug" => Ok(Command::Debug(match rest.first() {
                Some(Matched::Keyword(NodeKind::OnOff, "on")) => Some(true),
                Some(Matched::Keyword(NodeKind::OnOff, _)) => Some(false),
                _ => None,
            })),
            "help" => Ok(Command::Help(rest.into_iter().find_map(|item| match item {
                Matched::Name(NodeKind::HelpTopic, topic) => Some(topic),
                _ => None,
            }))),
            "quit" => Ok(Command::Quit),
            other => Err(ParseError::SemanticValidation(format!(
                "no builder for command '{other}'"
            ))),
        }
    }

    fn devices(&self, items: Vec<Matched>) -> BuildResult<DevicesCommand> {
        let mut command = DevicesCommand::default();
        let mut show_all = false;
        let mut show_known = false;

        for item in items {
            match item {
                Matched::Device(DeviceArg::Alias(name)) => {
                    // An unknown alias may still be an EPC or a property alias
                    if let Some(device) = self.aliases.resolve_alias(&name) {
                        command.target = Some(Target::Device(DeviceSpecifier::exact(&device)));
                    } else if let Some(epc) = Epc::parse_hex(&name) {
                        command.epcs.push(epc);
                    } else if let Some(property) = self.properties.property_alias(None, &name) {
                        command.properties.push(property);
                    } else {
                        return Err(ParseError::LookupFailure(format!(
                            "'{name}' is neither a device alias nor a property alias"
                        )));
                    }
                }
                Matched::Device(arg) => command.target = Some(self.target(arg)?),
                Matched::Keyword(NodeKind::ListOption, "-all") => show_all = true,
                Matched::Keyword(NodeKind::ListOption, "-props") => show_known = true,
                Matched::GroupBy(epc) => command.group_by = Some(epc),
                Matched::Epc(epc) => command.epcs.push(epc),
                Matched::Property(arg) => {
                    let class_code = command
                        .target
                        .as_ref()
                        .and_then(Target::device)
                        .and_then(|spec| spec.class_code);
                    command.properties.push(self.property(class_code, arg)?);
                }
                other => return Err(unexpected(&other)),
            }
        }

        command.mode = if show_all {
            PropertyMode::All
        } else if show_known {
            PropertyMode::Known
        } else if !command.epcs.is_empty() {
            PropertyMode::Epc
        } else {
            PropertyMode::Default
        };
        Ok(command)
    }

    fn get(&self, items: Vec<Matched>) -> BuildResult<GetCommand> {
        let mut items = items.into_iter();
        let target = match items.next() {
            Some(Matched::Device(arg)) => self.target(arg)?,
            Some(other) => return Err(unexpected(&other)),
            None => return Err(ParseError::SemanticValidation("missing device".to_string())),
        };

        let mut epcs = Vec::new();
        let mut skip_validation = false;
        for item in items {
            match item {
                Matched::Epc(epc) => epcs.push(epc),
                Matched::Keyword(NodeKind::GetOption, _) => skip_validation = true,
                other => return Err(unexpected(&other)),
            }
        }
        if epcs.is_empty() {
            return Err(ParseError::SemanticValidation(
                "at least one EPC is required".to_string(),
            ));
        }
        Ok(GetCommand {
            target,
            epcs,
            skip_validation,
        })
    }

    fn set(&self, items: Vec<Matched>) -> BuildResult<SetCommand> {
        let mut items = items.into_iter();
        let target = match items.next() {
            Some(Matched::Device(arg)) => self.target(arg)?,
            Some(other) => return Err(unexpected(&other)),
            None => return Err(ParseError::SemanticValidation("missing device".to_string())),
        };
        let class_code = self.class_of(&target);

        let properties = items
            .map(|item| match item {
                Matched::Property(arg) => self.property(class_code, arg),
                other => Err(unexpected(&other)),
            })
            .collect::<BuildResult<Vec<_>>>()?;
        Ok(SetCommand { target, properties })
    }

    fn update(&self, items: Vec<Matched>) -> BuildResult<UpdateCommand> {
        let mut command = UpdateCommand::default();
        for item in items {
            match item {
                Matched::Device(arg) => command.target = Some(self.target(arg)?),
                Matched::Keyword(NodeKind::UpdateOption, _) => command.force = true,
                other => return Err(unexpected(&other)),
            }
        }
        Ok(command)
    }

    fn alias(&self, items: Vec<Matched>) -> BuildResult<AliasCommand> {
        let mut items = items.into_iter();
        let alias = match items.next() {
            None => return Ok(AliasCommand::List),
            Some(Matched::Keyword(NodeKind::DeleteOption, _)) => {
                return match items.next() {
                    Some(Matched::Name(NodeKind::AliasName, name)) => Ok(AliasCommand::Delete(name)),
                    _ => Err(ParseError::SemanticValidation(
                        "-delete needs an alias name".to_string(),
                    )),
                };
            }
            Some(Matched::Name(NodeKind::AliasName, name)) => name,
            Some(other) => return Err(unexpected(&other)),
        };

        let device = match items.next() {
            None => return Ok(AliasCommand::Get(alias)),
            Some(Matched::Device(arg)) => self.specifier(arg)?,
            Some(other) => return Err(unexpected(&other)),
        };
        validate_alias_name(&alias).map_err(ParseError::SemanticValidation)?;

        let properties = items
            .map(|item| match item {
                Matched::Property(arg) => self.property(device.class_code, arg),
                other => Err(unexpected(&other)),
            })
            .collect::<BuildResult<Vec<_>>>()?;
        Ok(AliasCommand::Set {
            alias,
            criteria: FilterCriteria { device, properties },
        })
    }

    fn group(&self, items: Vec<Matched>) -> BuildResult<GroupCommand> {
        let mut items = items.into_iter();
        let Some(Matched::Keyword(NodeKind::GroupAction, action)) = items.next() else {
            return Err(ParseError::SemanticValidation(
                "missing group action".to_string(),
            ));
        };
        let group = match items.next() {
            Some(Matched::Name(NodeKind::GroupName, name)) => Some(name),
            Some(other) => return Err(unexpected(&other)),
            None => None,
        };
        if let Some(name) = &group {
            validate_group_name(name).map_err(ParseError::SemanticValidation)?;
        }

        let devices = items
            .map(|item| match item {
                Matched::Device(arg) => self.specifier(arg),
                other => Err(unexpected(&other)),
            })
            .collect::<BuildResult<Vec<_>>>()?;

        match (action, group) {
            ("add", Some(group)) => Ok(GroupCommand::Add { group, devices }),
            ("remove", Some(group)) => Ok(GroupCommand::Remove { group, devices }),
            ("delete", Some(group)) => Ok(GroupCommand::Delete(group)),
            ("list", group) => Ok(GroupCommand::List(group)),
            (action, _) => Err(ParseError::SemanticValidation(format!(
                "group {action} needs a group name"
            ))),
        }
    }

    /* ========================= Name resolution ========================= */

    fn target(&self, arg: DeviceArg) -> BuildResult<Target> {
        match arg {
            DeviceArg::Group(name) => {
                if self.groups.group_members(&name).is_none() {
                    return Err(ParseError::LookupFailure(format!("group '{name}'")));
                }
                Ok(Target::Group(name))
            }
            other => self.specifier(other).map(Target::Device),
        }
    }

    /// Resolve an argument that must name devices directly
    fn specifier(&self, arg: DeviceArg) -> BuildResult<DeviceSpecifier> {
        match arg {
            DeviceArg::Address {
                ip,
                class_code,
                instance_code,
            } => Ok(DeviceSpecifier {
                ip,
                class_code,
                instance_code: instance_code.map(check_instance_code).transpose()?,
            }),
            DeviceArg::Alias(name) => self
                .aliases
                .resolve_alias(&name)
                .map(|device| DeviceSpecifier::exact(&device))
                .ok_or_else(|| ParseError::LookupFailure(format!("device alias '{name}'"))),
            DeviceArg::Group(name) => Err(ParseError::SemanticValidation(format!(
                "group '{name}' cannot be used here"
            ))),
        }
    }

    fn class_of(&self, target: &Target) -> Option<ClassCode> {
        target.device().and_then(|spec| spec.class_code)
    }

    fn property(&self, class_code: Option<ClassCode>, arg: PropertyArg) -> BuildResult<Property> {
        match arg {
            PropertyArg::Raw { epc, edt } => Ok(Property::new(epc, edt)),
            PropertyArg::ValueAlias { epc, alias } => self
                .properties
                .value_alias_edt(class_code, epc, &alias)
                .map(|edt| Property::new(epc, edt))
                .ok_or_else(|| {
                    let available = self.properties.value_aliases(class_code, epc);
                    if available.is_empty() {
                        ParseError::LookupFailure(format!("value alias '{alias}' for EPC {epc}"))
                    } else {
                        ParseError::LookupFailure(format!(
                            "value alias '{alias}' for EPC {epc} (available: {})",
                            available.join(", ")
                        ))
                    }
                }),
            PropertyArg::Alias(alias) => self
                .properties
                .property_alias(class_code, &alias)
                .ok_or_else(|| ParseError::LookupFailure(format!("property alias '{alias}'"))),
        }
    }
}

fn check_instance_code(code: u16) -> BuildResult<u8> {
    match u8::try_from(code) {
        Ok(code) if code >= 1 => Ok(code),
        _ => Err(ParseError::SemanticValidation(format!(
            "instance code must be between 1 and 255: {code}"
        ))),
    }
}
