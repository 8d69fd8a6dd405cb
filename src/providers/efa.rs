/// EFA (Elektronische Fahrplanauskunft) API client
///
/// Talks to the RVV installation of the EFA API for real-time departures and
/// stop lookup.
///
/// ## Requests
///
/// ### Departure monitor
/// `{endpoint}/XML_DM_REQUEST?mode=direct&outputFormat=rapidJSON&type_dm=any&useRealtime=1&name_dm={stop_id}&limit={max_results}`
///
/// - `name_dm` - Global stop ID (e.g., "de:09362:12009" for Regensburg Hbf)
/// - `type_dm=any` - Let the server resolve the identifier type
/// - `useRealtime=1` - Include `departureTimeEstimated` where available
/// - `limit` - Maximum number of stop events
///
/// ### Stop finder
/// `{endpoint}/XML_STOPFINDER_REQUEST?commonMacro=stopfinder&outputFormat=rapidJSON&type_sf=any&name_sf={query}`
///
/// Only locations with `isGlobalId: true` can be used as `name_dm`.
///
/// ## Response fields used
///
/// - `stopEvents[].location.name` - Platform/stop name
/// - `stopEvents[].transportation.number` - Line number (string, sometimes numeric)
/// - `stopEvents[].transportation.destination.name` - Direction label
/// - `stopEvents[].departureTimePlanned` - Scheduled departure (ISO 8601)
/// - `stopEvents[].departureTimeEstimated` - Real-time estimate (optional)
///
/// Every field is optional on the wire. `stopEvents` entries are kept as raw
/// JSON and decoded one at a time, and a field with an unexpected type reads as
/// absent. Whether a field is required is decided by the departure parser, so
/// one broken event never rejects the whole response.
use crate::config::Config;
use crate::models::StopCandidate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const DEPARTURE_MONITOR_REQUEST: &str = "XML_DM_REQUEST";
const STOPFINDER_REQUEST: &str = "XML_STOPFINDER_REQUEST";

/// Longest body excerpt written to the log on decode failures
const BODY_PREVIEW_CHARS: usize = 500;

/// Stop finder location
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EfaLocation {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(rename = "disassembledName", default, deserialize_with = "lenient")]
    pub disassembled_name: Option<String>,
    #[serde(rename = "isGlobalId", default, deserialize_with = "lenient")]
    pub is_global_id: bool,
}

/// Platform a stop event departs from
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EfaPlatform {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EfaDestination {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EfaTransportation {
    #[serde(default, deserialize_with = "string_or_number")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub destination: Option<EfaDestination>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EfaStopEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<EfaPlatform>,
    #[serde(default, deserialize_with = "lenient")]
    pub transportation: Option<EfaTransportation>,
    #[serde(rename = "departureTimePlanned", default, deserialize_with = "timestamp")]
    pub departure_time_planned: Option<String>,
    #[serde(rename = "departureTimeEstimated", default, deserialize_with = "timestamp")]
    pub departure_time_estimated: Option<String>,
}

impl EfaStopEvent {
    /// Decode one entry of `stopEvents`
    ///
    /// Only fails when the entry is not an object at all; wrong-typed fields
    /// inside it decode as absent.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    pub fn location_name(&self) -> Option<&str> {
        self.location.as_ref()?.name.as_deref()
    }

    pub fn line_number(&self) -> Option<&str> {
        self.transportation.as_ref()?.number.as_deref()
    }

    pub fn destination(&self) -> Option<&str> {
        self.transportation.as_ref()?.destination.as_ref()?.name.as_deref()
    }
}

/// Departure monitor response
///
/// Stop events stay undecoded so each one is validated on its own by the
/// departure parser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EfaDepartureMonitorResponse {
    #[serde(rename = "stopEvents")]
    pub stop_events: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EfaStopFinderResponse {
    pub locations: Option<Vec<Value>>,
}

/// Result of a departure fetch
///
/// `Empty` means the request failed and nothing is known; a successful
/// response without events is `Departures` with an empty list.
#[derive(Debug, Clone, Default)]
pub enum RawPayload {
    #[default]
    Empty,
    Departures(EfaDepartureMonitorResponse),
}

impl RawPayload {
    pub fn stop_events(&self) -> &[Value] {
        match self {
            RawPayload::Empty => &[],
            RawPayload::Departures(response) => response.stop_events.as_deref().unwrap_or(&[]),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RawPayload::Empty)
    }
}

/// Accepts both `"6"` and `6` for line numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Keeps non-string timestamps as their JSON text so they fail as malformed
fn timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Falls back to the default when the value has an unexpected type
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

#[derive(Debug, Clone)]
pub struct EfaClient {
    client: reqwest::Client,
    base_url: String,
}

impl EfaClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EfaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EfaError::ClientBuild(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, EfaError> {
        Self::new(&config.endpoint, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch departures for a stop
    ///
    /// Never fails: transport and decode errors are logged and turned into
    /// [`RawPayload::Empty`]. No retry happens here, the next poll is the retry.
    pub async fn fetch_departures(&self, stop_id: &str, max_results: u32) -> RawPayload {
        match self.try_fetch_departures(stop_id, max_results).await {
            Ok(response) => RawPayload::Departures(response),
            Err(e) if e.is_transport() => {
                warn!(stop_id = %stop_id, error = %e, "API error fetching departures");
                RawPayload::Empty
            }
            Err(e) => {
                error!(stop_id = %stop_id, error = %e, "API invalid JSON for departures");
                RawPayload::Empty
            }
        }
    }

    pub async fn try_fetch_departures(
        &self,
        stop_id: &str,
        max_results: u32,
    ) -> Result<EfaDepartureMonitorResponse, EfaError> {
        let url = format!(
            "{}/{}?mode=direct&outputFormat=rapidJSON&type_dm=any&useRealtime=1&name_dm={}&limit={}",
            self.base_url,
            DEPARTURE_MONITOR_REQUEST,
            urlencoding::encode(stop_id),
            max_results
        );

        debug!(url = %url, stop_id = %stop_id, "Fetching departures");

        let data: EfaDepartureMonitorResponse = self.get_json(&url).await?;

        info!(
            stop_id = %stop_id,
            events = data.stop_events.as_ref().map_or(0, Vec::len),
            "Retrieved departures"
        );

        Ok(data)
    }

    /// Search stops by name, keeping only those usable as departure monitor IDs
    ///
    /// Failures are logged and produce an empty list.
    pub async fn search_stops(&self, query: &str) -> Vec<StopCandidate> {
        match self.try_search_stops(query).await {
            Ok(candidates) => candidates,
            Err(e) if e.is_transport() => {
                warn!(query = %query, error = %e, "API error searching stops");
                Vec::new()
            }
            Err(e) => {
                error!(query = %query, error = %e, "API invalid JSON for stop search");
                Vec::new()
            }
        }
    }

    pub async fn try_search_stops(&self, query: &str) -> Result<Vec<StopCandidate>, EfaError> {
        let url = format!(
            "{}/{}?commonMacro=stopfinder&outputFormat=rapidJSON&type_sf=any&name_sf={}",
            self.base_url,
            STOPFINDER_REQUEST,
            urlencoding::encode(query)
        );

        debug!(url = %url, "Searching for stops");

        let data: EfaStopFinderResponse = self.get_json(&url).await?;

        let candidates: Vec<StopCandidate> = data
            .locations
            .unwrap_or_default()
            .iter()
            .filter_map(|value| EfaLocation::deserialize(value).ok())
            .filter(|loc| loc.is_global_id)
            .filter_map(|loc| {
                Some(StopCandidate {
                    stop_id: loc.id?,
                    name: loc.name.unwrap_or_default(),
                    short_name: loc.disassembled_name,
                })
            })
            .collect();

        info!(count = candidates.len(), query = %query, "Found stops");

        Ok(candidates)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, EfaError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EfaError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EfaError::Status(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| EfaError::Transport(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| {
            error!(
                error = %e,
                body_preview = %text.chars().take(BODY_PREVIEW_CHARS).collect::<String>(),
                "Failed to parse EFA response"
            );
            EfaError::Decode(e.to_string())
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EfaError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
    #[error("Network error: {0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl EfaError {
    /// Network failures, timeouts and non-2xx statuses
    pub fn is_transport(&self) -> bool {
        matches!(self, EfaError::Transport(_) | EfaError::Status(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_stop_event() {
        let json = r#"{
            "stopEvents": [{
                "location": {"name": "Hauptbahnhof", "id": "de:09362:12009:1:A"},
                "transportation": {
                    "number": "6",
                    "destination": {"name": "Burgweinting"}
                },
                "departureTimePlanned": "2024-01-01T10:00:00",
                "departureTimeEstimated": "2024-01-01T10:05:00"
            }]
        }"#;

        let response: EfaDepartureMonitorResponse = serde_json::from_str(json).unwrap();
        let events = response.stop_events.unwrap();
        assert_eq!(events.len(), 1);

        let event = EfaStopEvent::from_value(&events[0]).unwrap();
        assert_eq!(event.location_name(), Some("Hauptbahnhof"));
        assert_eq!(event.line_number(), Some("6"));
        assert_eq!(event.destination(), Some("Burgweinting"));
        assert_eq!(
            event.departure_time_estimated.as_deref(),
            Some("2024-01-01T10:05:00")
        );
    }

    #[test]
    fn test_numeric_line_number() {
        let json = r#"{"transportation": {"number": 11}}"#;
        let event: EfaStopEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.line_number(), Some("11"));
    }

    #[test]
    fn test_missing_nested_fields() {
        let event: EfaStopEvent =
            serde_json::from_str(r#"{"departureTimePlanned": "2024-01-01T10:00:00"}"#).unwrap();
        assert_eq!(event.location_name(), None);
        assert_eq!(event.line_number(), None);
        assert_eq!(event.destination(), None);
    }

    #[test]
    fn test_response_with_mistyped_events_still_decodes() {
        let json = r#"{"stopEvents": [
            {"departureTimePlanned": "2024-01-01T10:00:00"},
            {"departureTimePlanned": 1704103200},
            {"transportation": {"destination": "Pürkelgut"}},
            null
        ]}"#;

        let response: EfaDepartureMonitorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(RawPayload::Departures(response).stop_events().len(), 4);
    }

    #[test]
    fn test_wrong_typed_fields_decode_as_absent() {
        let value = serde_json::json!({
            "location": "Hauptbahnhof",
            "transportation": {"number": "6", "destination": "Pürkelgut"},
            "departureTimePlanned": 1704103200,
            "departureTimeEstimated": null
        });

        let event = EfaStopEvent::from_value(&value).unwrap();
        assert_eq!(event.location_name(), None);
        assert_eq!(event.line_number(), Some("6"));
        assert_eq!(event.destination(), None);
        assert_eq!(event.departure_time_planned.as_deref(), Some("1704103200"));
        assert_eq!(event.departure_time_estimated, None);

        assert!(EfaStopEvent::from_value(&Value::Null).is_err());
        assert!(EfaStopEvent::from_value(&serde_json::json!("6")).is_err());
    }

    #[test]
    fn test_missing_stop_events() {
        let response: EfaDepartureMonitorResponse = serde_json::from_str("{}").unwrap();
        let payload = RawPayload::Departures(response);
        assert!(payload.stop_events().is_empty());
        assert!(!payload.is_empty());
        assert!(RawPayload::Empty.is_empty());
    }

    #[test]
    fn test_error_classification() {
        assert!(EfaError::Transport("timeout".to_string()).is_transport());
        assert!(EfaError::Status(503).is_transport());
        assert!(!EfaError::Decode("eof".to_string()).is_transport());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = EfaClient::new("https://efa.rvv.de/efa/", Duration::from_secs(30)).unwrap();
        assert_eq!(client.base_url(), "https://efa.rvv.de/efa");
    }
}
