//! Real-time departure boards for RVV (Regensburg) stops.
//!
//! Each configured stop gets a [`services::StopMonitor`] that pulls the EFA
//! departure monitor, normalizes the stop events and keeps the result on a
//! [`services::DepartureBoard`]. The [`sync::SyncManager`] drives the polling
//! and [`api`] exposes the boards and derived sensor values over HTTP.

pub mod api;
pub mod config;
pub mod models;
pub mod providers;
pub mod services;
pub mod sync;
