//! Client library behind `gatectl`

pub mod client;
pub mod commands;
pub mod config;
pub mod output;
pub mod simulate;
