//! Command execution
//!
//! - `router`: runs each command against the device handler
//! - `result`: execution results handed back to the submitter
//! - `help`: help text, checked against the grammar's command names

pub mod help;
pub mod result;
pub mod router;

pub use result::{DeviceRow, ExecutionResult, ExecutionStats, PropertyRow, ResultData};
pub use router::CommandRouter;
