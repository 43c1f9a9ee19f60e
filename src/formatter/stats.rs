//! Statistics line printed under command output

use crate::executor::{ExecutionResult, ResultData};

/// Statistics formatter for command execution
pub struct StatsFormatter {
    /// Show execution time
    show_time: bool,

    /// Show device count
    show_count: bool,
}

impl StatsFormatter {
    /// Create a new statistics formatter
    ///
    /// # Arguments
    /// * `show_time` - Show execution time
    /// * `show_count` - Show device count for listings
    ///
    /// # Returns
    /// * `Self` - New formatter
    pub fn new(show_time: bool, show_count: bool) -> Self {
        Self {
            show_time,
            show_count,
        }
    }

    /// Format execution statistics
    ///
    /// # Arguments
    /// * `result` - Execution result
    ///
    /// # Returns
    /// * `String` - Formatted statistics, empty when there is nothing to show
    pub fn format(&self, result: &ExecutionResult) -> String {
        let mut parts = Vec::new();

        let lists_devices = matches!(
            result.data,
            ResultData::Devices(_) | ResultData::GroupedDevices { .. }
        );
        if self.show_count && lists_devices {
            parts.push(format!("{} device(s)", result.stats.devices));
        }

        if self.show_time && result.stats.execution_time_ms > 0 {
            parts.push(format!("{}ms", result.stats.execution_time_ms));
        }

        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutionStats;

    #[test]
    fn test_stats_for_device_list() {
        let result = ExecutionResult::success(
            ResultData::Devices(vec![]),
            ExecutionStats {
                execution_time_ms: 12,
                devices: 0,
            },
        );
        assert_eq!(StatsFormatter::new(true, true).format(&result), "0 device(s), 12ms");
        assert_eq!(StatsFormatter::new(false, true).format(&result), "0 device(s)");
    }

    #[test]
    fn test_no_stats_for_messages() {
        let result = ExecutionResult::message("hello");
        assert_eq!(StatsFormatter::new(true, true).format(&result), "");
    }
}
