//! Core library for the Storm Glass point forecast client.
//!
//! This crate defines:
//! - Measurement and data-source catalogs with their wire tokens and units
//! - Deterministic request building (`/v2/weather/point`)
//! - Lossy-tolerant decoding of forecast bodies into typed periods
//! - Classification of transport and API failures into [`StormGlassError`]
//! - A client that ties these together over a pluggable [`Transport`]
//!
//! It is used by `stormglass-cli`, but can also be reused by other binaries or services.

pub mod catalog;
pub mod classify;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod model;
pub mod request;
pub mod transport;

pub use catalog::{DataSource, MeasurementName, Unit};
pub use classify::ApiErrorPayload;
pub use client::StormGlassClient;
pub use config::{ApiKeySource, Config, SharedConfig, StaticApiKey, configure};
pub use decode::{decode_metadata, decode_period, decode_weather};
pub use error::StormGlassError;
pub use model::{Coordinate, Weather, WeatherMetadata, WeatherPeriod, WeatherQuery};
pub use request::{QueryDescriptor, build_request};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportResponse};
