//! Lossy-tolerant decoding of point forecast bodies.
//!
//! Periods skip measurements they cannot read (unless strict) and always drop
//! unknown source keys. Metadata fields are required.

use chrono::DateTime;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::{
    catalog::{DataSource, MeasurementName},
    error::StormGlassError,
    model::{Coordinate, Weather, WeatherMetadata, WeatherPeriod},
};

/// Decode a single period object, reading only `known` measurements.
///
/// With `strict`, the first absent or malformed measurement fails the call
/// with [`StormGlassError::MissingMeasurement`]. Otherwise it is skipped and logged.
pub fn decode_period(
    body: &[u8],
    known: &[MeasurementName],
    strict: bool,
) -> Result<WeatherPeriod, StormGlassError> {
    let value = parse_body(body)?;
    period_from_value(&value, "", known, strict)
}

/// Decode a whole `{ "hours": [...], "meta": {...} }` document.
pub fn decode_weather(body: &[u8]) -> Result<Weather, StormGlassError> {
    let value = parse_body(body)?;
    let root = as_object(&value, "")?;

    let hours = match root.get("hours") {
        Some(Value::Array(hours)) => hours,
        Some(_) => return Err(StormGlassError::decode("hours", "expected an array")),
        None => return Err(StormGlassError::decode("hours", "missing field")),
    };

    let periods = hours
        .iter()
        .enumerate()
        .map(|(i, hour)| {
            period_from_value(hour, &format!("hours[{i}]"), MeasurementName::all(), false)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let meta = root.get("meta").ok_or_else(|| StormGlassError::decode("meta", "missing field"))?;
    let metadata = metadata_from_value(meta, "meta")?;

    debug!(periods = periods.len(), "decoded weather document");

    Ok(Weather { periods, metadata })
}

/// Decode a bare `meta` object.
pub fn decode_metadata(body: &[u8]) -> Result<WeatherMetadata, StormGlassError> {
    let value = parse_body(body)?;
    metadata_from_value(&value, "")
}

fn parse_body(body: &[u8]) -> Result<Value, StormGlassError> {
    serde_json::from_slice(body).map_err(|e| StormGlassError::decode("$", e.to_string()))
}

fn field_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() { field.to_string() } else { format!("{prefix}.{field}") }
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, StormGlassError> {
    value.as_object().ok_or_else(|| {
        StormGlassError::decode(if path.is_empty() { "$" } else { path }, "expected an object")
    })
}

fn period_from_value(
    value: &Value,
    path: &str,
    known: &[MeasurementName],
    strict: bool,
) -> Result<WeatherPeriod, StormGlassError> {
    let obj = as_object(value, path)?;

    let time_path = field_path(path, "time");
    let time = match obj.get("time") {
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw).map_err(|_| {
            StormGlassError::MalformedTimestamp { path: time_path.clone(), value: raw.clone() }
        })?,
        Some(other) => {
            return Err(StormGlassError::MalformedTimestamp {
                path: time_path,
                value: other.to_string(),
            });
        }
        None => return Err(StormGlassError::decode(time_path, "missing field")),
    };

    let mut data = BTreeMap::new();
    for &measurement in known {
        match source_values(obj.get(measurement.as_str())) {
            Ok(values) => {
                data.insert(measurement, values);
            }
            Err(_) if strict => return Err(StormGlassError::MissingMeasurement(measurement)),
            Err(reason) => {
                info!(measurement = measurement.as_str(), %time, %reason, "skipping measurement");
            }
        }
    }

    Ok(WeatherPeriod { time, data })
}

// Unknown agencies are dropped before their values are looked at; every known
// agency must carry a number for the measurement to count.
fn source_values(value: Option<&Value>) -> Result<BTreeMap<DataSource, f64>, String> {
    let map = match value {
        Some(Value::Object(map)) => map,
        Some(_) => return Err("expected an object of source values".to_string()),
        None => return Err("not present".to_string()),
    };

    let mut values = BTreeMap::new();
    for (token, raw) in map {
        let Some(source) = DataSource::from_token(token) else {
            debug!(source = token.as_str(), "dropping unknown data source");
            continue;
        };
        let number = raw
            .as_f64()
            .ok_or_else(|| format!("value for source '{token}' is not a number"))?;
        values.insert(source, number);
    }
    Ok(values)
}

fn metadata_from_value(value: &Value, path: &str) -> Result<WeatherMetadata, StormGlassError> {
    let obj = as_object(value, path)?;
    let fields = Fields { obj, path };

    let lat = fields.f64("lat")?;
    let lng = fields.f64("lng")?;
    let coordinate = Coordinate::new(lat, lng)
        .map_err(|e| StormGlassError::decode(field_path(path, "lat"), e.to_string()))?;

    let parameters: BTreeSet<MeasurementName> = fields
        .strings("params")?
        .into_iter()
        .filter_map(|token| {
            let measurement = MeasurementName::from_token(token);
            if measurement.is_none() {
                debug!(token, "dropping unknown measurement from metadata");
            }
            measurement
        })
        .collect();

    // `source` is omitted by the API when no filter was requested.
    let sources: BTreeSet<DataSource> = match obj.get("source") {
        None | Some(Value::Null) => BTreeSet::new(),
        Some(_) => fields
            .strings("source")?
            .into_iter()
            .filter_map(|token| {
                let source = DataSource::from_token(token);
                if source.is_none() {
                    debug!(token, "dropping unknown data source from metadata");
                }
                source
            })
            .collect(),
    };

    Ok(WeatherMetadata {
        cost: fields.f64("cost")?,
        daily_quota: fields.u32("dailyQuota")?,
        request_count: fields.u32("requestCount")?,
        coordinate,
        parameters,
        sources,
        start: fields.string("start")?,
        end: fields.string("end")?,
    })
}

struct Fields<'a> {
    obj: &'a Map<String, Value>,
    path: &'a str,
}

impl<'a> Fields<'a> {
    fn get(&self, name: &str) -> Result<&'a Value, StormGlassError> {
        self.obj
            .get(name)
            .ok_or_else(|| StormGlassError::decode(field_path(self.path, name), "missing field"))
    }

    fn mismatch(&self, name: &str, expected: &str) -> StormGlassError {
        StormGlassError::decode(field_path(self.path, name), format!("expected {expected}"))
    }

    fn f64(&self, name: &str) -> Result<f64, StormGlassError> {
        self.get(name)?.as_f64().ok_or_else(|| self.mismatch(name, "a number"))
    }

    fn u32(&self, name: &str) -> Result<u32, StormGlassError> {
        self.get(name)?
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| self.mismatch(name, "a non-negative integer"))
    }

    fn string(&self, name: &str) -> Result<String, StormGlassError> {
        self.get(name)?
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| self.mismatch(name, "a string"))
    }

    fn strings(&self, name: &str) -> Result<Vec<&'a str>, StormGlassError> {
        self.get(name)?
            .as_array()
            .and_then(|items| items.iter().map(Value::as_str).collect::<Option<Vec<_>>>())
            .ok_or_else(|| self.mismatch(name, "an array of strings"))
    }
}
