//! Command type definitions for the console
//!
//! Every name on the command line (device alias, group, property alias) is
//! already resolved by the time one of these values exists.

use crate::device::{DeviceSpecifier, Epc, FilterCriteria, Property, PropertyMode};

/// Represents a parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Search the network for devices
    Discover,

    /// List known devices and their cached properties
    Devices(DevicesCommand),

    /// Read properties from one device or every member of a group
    Get(GetCommand),

    /// Write properties to one device or every member of a group
    Set(SetCommand),

    /// Refresh cached properties
    Update(UpdateCommand),

    /// Device alias management
    Alias(AliasCommand),

    /// Device group management
    Group(GroupCommand),

    /// Show or change the debug flag
    Debug(Option<bool>),

    /// Help with optional topic
    Help(Option<String>),

    /// Stop the console
    Quit,
}

/// Devices selected by a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Device(DeviceSpecifier),
    /// A registered group, name including the leading `@`
    Group(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevicesCommand {
    pub target: Option<Target>,
    pub mode: PropertyMode,
    /// EPCs to show when `mode` is [`PropertyMode::Epc`]
    pub epcs: Vec<Epc>,
    /// Only devices holding all of these values are listed
    pub properties: Vec<Property>,
    pub group_by: Option<Epc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetCommand {
    pub target: Target,
    pub epcs: Vec<Epc>,
    /// Ask the device even if discovery never saw it
    pub skip_validation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCommand {
    pub target: Target,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateCommand {
    pub target: Option<Target>,
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasCommand {
    List,
    Get(String),
    /// Bind `alias` to the single known device matching `criteria`
    Set {
        alias: String,
        criteria: FilterCriteria,
    },
    Delete(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCommand {
    Add {
        group: String,
        devices: Vec<DeviceSpecifier>,
    },
    Remove {
        group: String,
        devices: Vec<DeviceSpecifier>,
    },
    Delete(String),
    List(Option<String>),
}

impl Command {
    /// Command keyword as typed by the user
    pub fn name(&self) -> &'static str {
        match self {
            Command::Discover => "discover",
            Command::Devices(_) => "devices",
            Command::Get(_) => "get",
            Command::Set(_) => "set",
            Command::Update(_) => "update",
            Command::Alias(_) => "alias",
            Command::Group(_) => "group",
            Command::Debug(_) => "debug",
            Command::Help(_) => "help",
            Command::Quit => "quit",
        }
    }
}

impl Target {
    pub fn device(&self) -> Option<&DeviceSpecifier> {
        match self {
            Target::Device(spec) => Some(spec),
            Target::Group(_) => None,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Device(spec) => write!(f, "{spec}"),
            Target::Group(name) => f.write_str(name),
        }
    }
}
