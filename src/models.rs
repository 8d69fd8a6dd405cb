use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use utoipa::ToSchema;

/// One departure from a stop, normalized from an EFA stop event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DepartureEvent {
    /// Stop or platform name as reported upstream
    pub departure_point: String,
    pub line_number: String,
    pub direction: String,
    pub planned: DateTime<FixedOffset>,
    /// Real-time estimate, equal to `planned` when none was reported
    pub estimated: DateTime<FixedOffset>,
    pub delay_minutes: i64,
}

impl DepartureEvent {
    pub fn new(
        departure_point: String,
        line_number: String,
        direction: String,
        planned: DateTime<FixedOffset>,
        estimated: Option<DateTime<FixedOffset>>,
    ) -> Self {
        let estimated = estimated.unwrap_or(planned);
        let delay_minutes = delay_minutes(planned, estimated);

        Self {
            departure_point,
            line_number,
            direction,
            planned,
            estimated,
            delay_minutes,
        }
    }

    /// "{line} {direction} at {HH:MM}"
    pub fn summary(&self) -> String {
        format!(
            "{} {} at {}",
            self.line_number,
            self.direction,
            self.estimated.format("%H:%M")
        )
    }

    /// "{line} {direction}: {HH:MM} ({delay}min delay)"
    pub fn list_line(&self) -> String {
        format!(
            "{} {}: {} ({}min delay)",
            self.line_number,
            self.direction,
            self.estimated.format("%H:%M"),
            self.delay_minutes
        )
    }
}

/// Minutes between planned and estimated, rounded half to even
fn delay_minutes(planned: DateTime<FixedOffset>, estimated: DateTime<FixedOffset>) -> i64 {
    let seconds = estimated.signed_duration_since(planned).num_seconds();
    (seconds as f64 / 60.0).round_ties_even() as i64
}

/// A stop returned by the stop finder that can be configured for polling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StopCandidate {
    pub name: String,
    pub stop_id: String,
    pub short_name: Option<String>,
}
