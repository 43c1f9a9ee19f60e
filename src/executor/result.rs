//! Execution result types
//!
//! This module defines the data structures for representing command execution results:
//! - ExecutionResult: Overall result of a command execution
//! - ResultData: Various types of data that can be returned
//! - ExecutionStats: Statistics about the execution

use chrono::{DateTime, Local};

use crate::device::{Epc, IpAndEoj};

/// Result of command execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Success status
    pub success: bool,

    /// Result data (devices, aliases, messages)
    pub data: ResultData,

    /// Execution statistics
    pub stats: ExecutionStats,
}

/// Data returned from command execution
#[derive(Debug, Clone)]
pub enum ResultData {
    /// Devices with the properties selected for display
    Devices(Vec<DeviceRow>),

    /// Devices sectioned by the value of one property
    GroupedDevices { epc: Epc, groups: Vec<(String, Vec<DeviceRow>)> },

    /// Alias bindings
    Aliases(Vec<(String, IpAndEoj)>),

    /// Groups and their members
    Groups(Vec<(String, Vec<IpAndEoj>)>),

    /// Text message
    Message(String),

    /// No data
    None,
}

/// One device as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRow {
    pub device: IpAndEoj,
    pub alias: Option<String>,
    pub properties: Vec<PropertyRow>,
    pub updated_at: Option<DateTime<Local>>,
}

/// One property value with its description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRow {
    pub epc: Epc,
    pub name: Option<&'static str>,
    /// Value alias when one matches, upper-case hex otherwise
    pub value: String,
}

/// Execution statistics
#[derive(Debug, Clone, Default)]
pub struct ExecutionStats {
    /// Execution time in milliseconds
    pub execution_time_ms: u64,

    /// Number of devices the command touched or returned
    pub devices: usize,
}

impl ExecutionResult {
    /// Create a successful result
    pub fn success(data: ResultData, stats: ExecutionStats) -> Self {
        Self {
            success: true,
            data,
            stats,
        }
    }

    /// Successful result carrying only a message
    pub fn message(text: impl Into<String>) -> Self {
        Self::success(ResultData::Message(text.into()), ExecutionStats::default())
    }
}
