//! Window gate daemon
//!
//! Hosts the gate's ingestion and inspection endpoints over HTTP, alongside
//! health and Prometheus metrics endpoints.

pub mod api;
pub mod config;
