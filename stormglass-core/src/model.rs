use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    catalog::{DataSource, MeasurementName},
    error::StormGlassError,
};

/// A validated WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, StormGlassError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(StormGlassError::InvalidRequest(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(StormGlassError::InvalidRequest(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Caller-side description of a point forecast request.
///
/// `measurements` keeps the caller's order; it is sent as given (minus duplicates).
#[derive(Debug, Clone)]
pub struct WeatherQuery {
    pub coordinate: Coordinate,
    pub measurements: Vec<MeasurementName>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// `None` or empty means every source.
    pub sources: Option<Vec<DataSource>>,
}

impl WeatherQuery {
    pub fn new(
        coordinate: Coordinate,
        measurements: impl IntoIterator<Item = MeasurementName>,
    ) -> Self {
        Self {
            coordinate,
            measurements: measurements.into_iter().collect(),
            start: None,
            end: None,
            sources: None,
        }
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_sources(mut self, sources: impl IntoIterator<Item = DataSource>) -> Self {
        self.sources = Some(sources.into_iter().collect());
        self
    }
}

/// One forecast slot. Both map levels are sparse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherPeriod {
    pub time: DateTime<FixedOffset>,
    pub data: BTreeMap<MeasurementName, BTreeMap<DataSource, f64>>,
}

impl WeatherPeriod {
    pub fn new(
        time: DateTime<FixedOffset>,
        data: BTreeMap<MeasurementName, BTreeMap<DataSource, f64>>,
    ) -> Self {
        Self { time, data }
    }

    pub fn value(&self, measurement: MeasurementName, source: DataSource) -> Option<f64> {
        self.data.get(&measurement)?.get(&source).copied()
    }

    /// All reported values for one measurement.
    pub fn sources_for(&self, measurement: MeasurementName) -> Option<&BTreeMap<DataSource, f64>> {
        self.data.get(&measurement)
    }
}

/// Request framing echoed back by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherMetadata {
    pub cost: f64,
    pub daily_quota: u32,
    pub request_count: u32,
    pub coordinate: Coordinate,
    pub parameters: BTreeSet<MeasurementName>,
    pub sources: BTreeSet<DataSource>,
    /// Kept verbatim; the API does not send ISO-8601 here (e.g. `2021-06-14 06:00`).
    pub start: String,
    pub end: String,
}

impl WeatherMetadata {
    pub fn remaining_quota(&self) -> u32 {
        self.daily_quota.saturating_sub(self.request_count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weather {
    /// Chronological, as returned.
    pub periods: Vec<WeatherPeriod>,
    pub metadata: WeatherMetadata,
}
