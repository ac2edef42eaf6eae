use serde::{Deserialize, Serialize};

/// Attendance totals as reported by the external attendance service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub percentage: f64,
    pub total_days: u32,
    pub present_days: u32,
    pub absent_days: u32,
}

impl AttendanceSummary {
    /// Returned whenever the attendance service cannot be reached or answers badly.
    pub fn zeroed() -> Self {
        Self {
            percentage: 0.0,
            total_days: 0,
            present_days: 0,
            absent_days: 0,
        }
    }
}

impl Default for AttendanceSummary {
    fn default() -> Self {
        Self::zeroed()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub date: String,
    pub status: String,
    #[serde(default)]
    pub check_in: Option<String>,
    #[serde(default)]
    pub check_out: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}
