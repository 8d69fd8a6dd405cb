use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};

use crate::models::DepartureEvent;

/// Shown by the next-departure sensor when nothing is known
pub const NO_DEPARTURE: &str = "N/A";

/// Immutable view of a board at one point in time
#[derive(Debug, Clone, Default)]
pub struct BoardSnapshot {
    pub events: Vec<DepartureEvent>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl BoardSnapshot {
    pub fn next(&self) -> Option<&DepartureEvent> {
        self.events.first()
    }

    pub fn next_departure_summary(&self) -> String {
        self.next()
            .map_or_else(|| NO_DEPARTURE.to_string(), DepartureEvent::summary)
    }

    pub fn current_delay_minutes(&self) -> i64 {
        self.next().map_or(0, |e| e.delay_minutes)
    }

    pub fn departure_list_summary(&self) -> Vec<String> {
        self.events.iter().map(DepartureEvent::list_line).collect()
    }
}

/// Latest known departures for one stop
///
/// `refresh` swaps in a new snapshot; readers holding an older snapshot keep
/// seeing it unchanged. The lock only guards the pointer swap.
#[derive(Debug, Default)]
pub struct DepartureBoard {
    current: RwLock<Arc<BoardSnapshot>>,
}

impl DepartureBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held departures, ordered by planned time
    pub fn refresh(&self, mut events: Vec<DepartureEvent>) {
        // Stable, so parser order survives for equal planned times
        events.sort_by_key(|e| e.planned);

        let snapshot = Arc::new(BoardSnapshot {
            events,
            refreshed_at: Some(Utc::now()),
        });

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    pub fn snapshot(&self) -> Arc<BoardSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn next(&self) -> Option<DepartureEvent> {
        self.snapshot().next().cloned()
    }

    pub fn all(&self) -> Vec<DepartureEvent> {
        self.snapshot().events.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().events.is_empty()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot().refreshed_at
    }

    pub fn next_departure_summary(&self) -> String {
        self.snapshot().next_departure_summary()
    }

    pub fn current_delay_minutes(&self) -> i64 {
        self.snapshot().current_delay_minutes()
    }

    pub fn departure_list_summary(&self) -> Vec<String> {
        self.snapshot().departure_list_summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn departure(line: &str, minute: u32, delay: i64) -> DepartureEvent {
        let planned = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 12, minute, 0)
            .unwrap();
        DepartureEvent::new(
            "Hauptbahnhof".to_string(),
            line.to_string(),
            "Burgweinting".to_string(),
            planned,
            Some(planned + chrono::Duration::minutes(delay)),
        )
    }

    #[test]
    fn test_empty_board() {
        let board = DepartureBoard::new();
        assert!(board.next().is_none());
        assert!(board.all().is_empty());
        assert!(board.is_empty());
        assert!(board.refreshed_at().is_none());
        assert_eq!(board.next_departure_summary(), "N/A");
        assert_eq!(board.current_delay_minutes(), 0);
        assert!(board.departure_list_summary().is_empty());
    }

    #[test]
    fn test_next_is_first() {
        let board = DepartureBoard::new();
        board.refresh(vec![departure("6", 0, 5), departure("1", 10, 0)]);

        assert_eq!(board.next().unwrap().line_number, "6");
        assert_eq!(board.all().len(), 2);
        assert_eq!(board.next_departure_summary(), "6 Burgweinting at 12:05");
        assert_eq!(board.current_delay_minutes(), 5);
        assert_eq!(
            board.departure_list_summary(),
            [
                "6 Burgweinting: 12:05 (5min delay)",
                "1 Burgweinting: 12:10 (0min delay)"
            ]
        );
        assert!(board.refreshed_at().is_some());
    }

    #[test]
    fn test_refresh_orders_unsorted_input() {
        let board = DepartureBoard::new();
        board.refresh(vec![
            departure("11", 30, 0),
            departure("6", 0, 7),
            departure("2", 30, 0),
            departure("1", 10, 0),
        ]);

        assert_eq!(board.next().unwrap().line_number, "6");
        assert_eq!(board.current_delay_minutes(), 7);
        let lines: Vec<String> = board.all().into_iter().map(|e| e.line_number).collect();
        assert_eq!(lines, ["6", "1", "11", "2"]);
    }

    #[test]
    fn test_refresh_replaces_and_old_snapshot_survives() {
        let board = DepartureBoard::new();
        board.refresh(vec![departure("6", 0, 0), departure("1", 10, 0)]);
        let before = board.snapshot();

        board.refresh(vec![departure("11", 20, 2)]);

        assert_eq!(before.events.len(), 2);
        assert_eq!(board.all().len(), 1);
        assert_eq!(board.next().unwrap().line_number, "11");

        board.refresh(Vec::new());
        assert!(board.next().is_none());
        assert_eq!(board.next_departure_summary(), "N/A");
        assert!(board.refreshed_at().is_some());
    }

    #[test]
    fn test_concurrent_refresh_last_writer_wins() {
        let board = Arc::new(DepartureBoard::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let board = board.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        board.refresh(vec![departure(&i.to_string(), 0, 0); 3]);
                        let snapshot = board.snapshot();
                        // a snapshot is never a mix of two refreshes
                        let first = &snapshot.events[0].line_number;
                        assert!(snapshot.events.iter().all(|e| &e.line_number == first));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(board.all().len(), 3);
    }
}
