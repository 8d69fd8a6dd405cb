pub mod board;
pub mod monitor;
pub mod parser;
pub mod time;

pub use board::{BoardSnapshot, DepartureBoard};
pub use monitor::{RefreshOutcome, SensorState, SensorValue, StopMonitor};
pub use parser::{DepartureParser, ParseError};
pub use time::TimeNormalizer;
