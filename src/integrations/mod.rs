use async_trait::async_trait;

use crate::domain::{AttendanceEntry, AttendanceSummary};

pub mod attendance;

pub use attendance::HttpAttendanceGateway;

/// Read-only source of attendance data for a student identifier.
///
/// Implementations are fail-soft: they never return an error. A failed lookup
/// yields [`AttendanceSummary::zeroed`] or an empty log, so callers cannot tell
/// "no attendance recorded" apart from "service unreachable".
#[async_trait]
pub trait AttendanceSource: Send + Sync {
    fn name(&self) -> &str;
    async fn summary(&self, student_id: &str) -> AttendanceSummary;
    async fn logs(&self, student_id: &str) -> Vec<AttendanceEntry>;
}
