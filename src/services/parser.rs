use serde_json::Value;
use tracing::{debug, warn};

use crate::models::DepartureEvent;
use crate::providers::efa::{EfaStopEvent, RawPayload};

use super::time::TimeNormalizer;

/// Maps EFA stop events to [`DepartureEvent`]s ordered by planned time
///
/// Each stop event is decoded on its own; an entry that is not an object is
/// dropped without affecting the others.
///
/// Field contract per stop event:
/// - `departureTimePlanned`: required, event is dropped if missing or malformed
///   (a non-string value counts as malformed)
/// - `departureTimeEstimated`: optional, defaults to the planned time; a
///   malformed value drops the event
/// - `location.name`, `transportation.number`,
///   `transportation.destination.name`: optional, default to `""`, also when
///   the upstream value has the wrong type
#[derive(Debug, Clone, Copy, Default)]
pub struct DepartureParser {
    normalizer: TimeNormalizer,
}

impl DepartureParser {
    pub fn new(normalizer: TimeNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn parse(&self, payload: &RawPayload) -> Vec<DepartureEvent> {
        let stop_events = payload.stop_events();

        let mut departures: Vec<DepartureEvent> = stop_events
            .iter()
            .enumerate()
            .filter_map(|(index, value)| match self.parse_value(value) {
                Ok(departure) => Some(departure),
                Err(e) => {
                    warn!(index, error = %e, "Skipping stop event");
                    None
                }
            })
            .collect();

        // Stable, so equal planned times keep upstream order
        departures.sort_by_key(|d| d.planned);

        if departures.len() < stop_events.len() {
            debug!(
                parsed = departures.len(),
                dropped = stop_events.len() - departures.len(),
                "Parsed stop events"
            );
        }

        departures
    }

    pub fn parse_value(&self, value: &Value) -> Result<DepartureEvent, ParseError> {
        let event = EfaStopEvent::from_value(value)
            .map_err(|e| ParseError::InvalidEvent(e.to_string()))?;
        self.parse_event(&event)
    }

    pub fn parse_event(&self, event: &EfaStopEvent) -> Result<DepartureEvent, ParseError> {
        let planned_raw = event
            .departure_time_planned
            .as_deref()
            .ok_or(ParseError::MissingField("departureTimePlanned"))?;
        let planned = self.normalizer.normalize(planned_raw)?;

        let estimated = event
            .departure_time_estimated
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| self.normalizer.normalize(raw))
            .transpose()?;

        Ok(DepartureEvent::new(
            optional_field(event.location_name(), "location.name"),
            optional_field(event.line_number(), "transportation.number"),
            optional_field(event.destination(), "transportation.destination.name"),
            planned,
            estimated,
        ))
    }
}

fn optional_field(value: Option<&str>, field: &'static str) -> String {
    match value {
        Some(v) => v.to_string(),
        None => {
            let e = ParseError::MissingField(field);
            debug!(error = %e, "Using empty default");
            String::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed timestamp: {0:?}")]
    MalformedTimestamp(String),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid stop event: {0}")]
    InvalidEvent(String),
}
