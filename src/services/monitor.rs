use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::config::StopConfig;
use crate::providers::efa::EfaClient;

use super::board::DepartureBoard;
use super::parser::DepartureParser;

const MANUFACTURER: &str = "RVV";
const MODEL: &str = "Station Sensor";
const BUS_ICON: &str = "mdi:bus";
const CLOCK_ICON: &str = "mdi:clock";

/// Fetch, parse and board for a single configured stop
///
/// Holds no timer state; whoever owns the monitor decides when to call
/// [`StopMonitor::refresh`].
#[derive(Debug)]
pub struct StopMonitor {
    stop: StopConfig,
    client: EfaClient,
    parser: DepartureParser,
    board: DepartureBoard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Board replaced, holding this many departures
    Updated(usize),
    /// Fetch failed, previous departures kept
    Unchanged,
}

impl StopMonitor {
    pub fn new(stop: StopConfig, client: EfaClient, parser: DepartureParser) -> Self {
        Self {
            stop,
            client,
            parser,
            board: DepartureBoard::new(),
        }
    }

    pub fn stop(&self) -> &StopConfig {
        &self.stop
    }

    pub fn stop_id(&self) -> &str {
        &self.stop.stop_id
    }

    pub fn board(&self) -> &DepartureBoard {
        &self.board
    }

    /// Run one fetch, parse and board refresh cycle
    #[tracing::instrument(skip(self), fields(stop_id = %self.stop.stop_id))]
    pub async fn refresh(&self) -> RefreshOutcome {
        let payload = self
            .client
            .fetch_departures(&self.stop.stop_id, self.stop.max_results)
            .await;

        if payload.is_empty() {
            warn!("No departure data received, keeping previous board");
            return RefreshOutcome::Unchanged;
        }

        let events = self.parser.parse(&payload);
        let count = events.len();
        self.board.refresh(events);

        info!(events = count, "Refreshed departure board");
        RefreshOutcome::Updated(count)
    }

    fn device(&self) -> DeviceInfo {
        DeviceInfo {
            identifier: self.stop.stop_id.clone(),
            name: self.stop.display_name().to_string(),
            manufacturer: MANUFACTURER.to_string(),
            model: MODEL.to_string(),
        }
    }

    /// Next-departure and delay sensors, read from one board snapshot
    pub fn sensors(&self) -> Vec<SensorState> {
        let snapshot = self.board.snapshot();
        let short_name = self.stop.display_short_name();

        vec![
            SensorState {
                unique_id: format!("stop_{}_departures", self.stop.stop_id),
                name: format!("Next Departure {short_name}"),
                icon: BUS_ICON.to_string(),
                state: SensorValue::Text(snapshot.next_departure_summary()),
                departures: Some(snapshot.departure_list_summary()),
                device: self.device(),
            },
            SensorState {
                unique_id: format!("stop_{}_delay", self.stop.stop_id),
                name: format!("Delay {short_name}"),
                icon: CLOCK_ICON.to_string(),
                state: SensorValue::Minutes(snapshot.current_delay_minutes()),
                departures: None,
                device: self.device(),
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum SensorValue {
    Text(String),
    Minutes(i64),
}

/// Read-only sensor value as exposed to the automation host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SensorState {
    pub unique_id: String,
    pub name: String,
    pub icon: String,
    pub state: SensorValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departures: Option<Vec<String>>,
    pub device: DeviceInfo,
}
