//! Core library for the `tenki` CLI.
//!
//! This crate defines:
//! - Configuration handling
//! - The city name → forecast identifier table
//! - The retrying HTTP client for the forecast endpoint
//! - Shared domain models (forecast reports and their renderings)
//!
//! It is used by `tenki-cli`, but can also be reused by other binaries or services.

pub mod cities;
pub mod client;
pub mod config;
pub mod error;
pub mod model;

pub use cities::CityTable;
pub use client::{NoticeSink, WeatherClient};
pub use config::Config;
pub use error::WeatherError;
pub use model::WeatherReport;
