use chrono::{DateTime, Utc};
use reqwest::Url;
use std::{collections::HashSet, fmt};

use crate::{error::StormGlassError, model::{Coordinate, WeatherQuery}};

pub const POINT_ENDPOINT: &str = "/v2/weather/point";
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Canonical outbound request. Built once, never mutated.
#[derive(Clone, PartialEq)]
pub struct QueryDescriptor {
    url: Url,
    coordinate: Coordinate,
    measurements: Vec<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    sources: Vec<String>,
    api_key: String,
}

impl QueryDescriptor {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn measurements(&self) -> &[String] {
        &self.measurements
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Empty when every source was requested.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Headers to attach to the GET. The credential only ever travels here.
    pub fn headers(&self) -> [(&'static str, &str); 1] {
        [(AUTHORIZATION_HEADER, self.api_key.as_str())]
    }
}

// Keeps the credential out of logs and error reports.
impl fmt::Debug for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryDescriptor")
            .field("url", &self.url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Compose the point forecast request.
///
/// Measurement and source tokens are sent in the order given, first occurrence
/// wins on duplicates. An empty or absent source list omits `source` entirely.
/// Pure: no I/O, same inputs always give the same URL.
pub fn build_request(
    base_url: &str,
    coordinate: Coordinate,
    measurements: &[&str],
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    sources: Option<&[&str]>,
    api_key: &str,
) -> Result<QueryDescriptor, StormGlassError> {
    if measurements.is_empty() {
        return Err(StormGlassError::InvalidRequest(
            "at least one measurement must be requested".to_string(),
        ));
    }
    if api_key.chars().any(char::is_control) {
        return Err(StormGlassError::InvalidRequest(
            "API key contains control characters".to_string(),
        ));
    }

    let measurements = dedup_tokens(measurements, "measurement")?;
    let sources = match sources {
        Some(sources) => dedup_tokens(sources, "source")?,
        None => Vec::new(),
    };

    let mut query = format!(
        "lat={}&lng={}&params={}",
        coordinate.latitude(),
        coordinate.longitude(),
        measurements.join(",")
    );
    if let Some(start) = start {
        query.push_str(&format!("&start={}", epoch_seconds(&start)));
    }
    if let Some(end) = end {
        query.push_str(&format!("&end={}", epoch_seconds(&end)));
    }
    if !sources.is_empty() {
        query.push_str(&format!("&source={}", sources.join(",")));
    }

    let raw = format!("{}{}?{}", base_url.trim_end_matches('/'), POINT_ENDPOINT, query);
    let url = Url::parse(&raw).map_err(|e| {
        StormGlassError::InvalidRequest(format!("cannot compose URL '{raw}': {e}"))
    })?;

    Ok(QueryDescriptor {
        url,
        coordinate,
        measurements,
        start,
        end,
        sources,
        api_key: api_key.to_string(),
    })
}

impl WeatherQuery {
    /// Typed front for [`build_request`].
    pub fn to_request(
        &self,
        base_url: &str,
        api_key: &str,
    ) -> Result<QueryDescriptor, StormGlassError> {
        let measurements: Vec<&str> = self.measurements.iter().map(|m| m.as_str()).collect();
        let sources: Option<Vec<&str>> = self
            .sources
            .as_ref()
            .map(|sources| sources.iter().map(|s| s.as_str()).collect());

        build_request(
            base_url,
            self.coordinate,
            &measurements,
            self.start,
            self.end,
            sources.as_deref(),
            api_key,
        )
    }
}

// Tokens are spliced into the query verbatim, so only plain identifiers pass.
fn dedup_tokens(tokens: &[&str], kind: &str) -> Result<Vec<String>, StormGlassError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StormGlassError::InvalidRequest(format!(
                "invalid {kind} token '{token}'"
            )));
        }
        if seen.insert(*token) {
            out.push((*token).to_string());
        }
    }
    Ok(out)
}

fn epoch_seconds(instant: &DateTime<Utc>) -> String {
    let nanos = instant.timestamp_subsec_nanos();
    if nanos == 0 {
        instant.timestamp().to_string()
    } else {
        (instant.timestamp() as f64 + f64::from(nanos) / 1e9).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DataSource, MeasurementName};
    use chrono::TimeZone;

    const BASE: &str = "https://api.stormglass.io";
    const KEY: &str = "iLikeTurtles";

    fn kona() -> Coordinate {
        Coordinate::new(19.594379, -155.971668).unwrap()
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.timestamp_opt(1_635_760_800, 0).unwrap(),
            Utc.timestamp_opt(1_635_847_200, 0).unwrap(),
        )
    }

    #[test]
    fn minimal_request_url() {
        let req = build_request(BASE, kona(), &["swellHeight", "airTemperature"], None, None, None, KEY)
            .unwrap();

        assert_eq!(
            req.url().as_str(),
            "https://api.stormglass.io/v2/weather/point?lat=19.594379&lng=-155.971668&params=swellHeight,airTemperature"
        );
        assert_eq!(req.path(), POINT_ENDPOINT);
    }

    #[test]
    fn credential_travels_in_header_only() {
        let (start, end) = window();
        let req = build_request(BASE, kona(), &["swellHeight"], Some(start), Some(end), None, KEY)
            .unwrap();

        assert_eq!(req.headers(), [("Authorization", KEY)]);
        assert!(!req.url().as_str().contains(KEY));
        assert!(!format!("{req:?}").contains(KEY));
    }

    #[test]
    fn window_is_sent_as_epoch_seconds() {
        let (start, end) = window();
        let req = build_request(BASE, kona(), &["waveHeight"], Some(start), Some(end), None, KEY)
            .unwrap();

        let url = req.url().as_str();
        assert!(url.contains("&start=1635760800"), "{url}");
        assert!(url.contains("&end=1635847200"), "{url}");
    }

    #[test]
    fn fractional_epoch_seconds() {
        let start = Utc.timestamp_opt(1_635_760_800, 500_000_000).unwrap();
        assert_eq!(epoch_seconds(&start), "1635760800.5");
    }

    #[test]
    fn empty_measurements_is_invalid_request() {
        let err = build_request(BASE, kona(), &[], None, None, None, KEY).unwrap_err();
        assert!(matches!(err, StormGlassError::InvalidRequest(_)));
    }

    // The API judges the window itself; a reversed one goes out unchanged.
    #[test]
    fn reversed_window_is_sent_as_given() {
        let (start, end) = window();
        let req = build_request(BASE, kona(), &["waveHeight"], Some(end), Some(start), None, KEY)
            .unwrap();

        let url = req.url().as_str();
        assert!(url.contains("&start=1635847200&end=1635760800"), "{url}");
    }

    #[test]
    fn injected_tokens_are_rejected() {
        let err = build_request(BASE, kona(), &["waveHeight&lat=0"], None, None, None, KEY)
            .unwrap_err();
        assert!(matches!(err, StormGlassError::InvalidRequest(_)));
    }

    #[test]
    fn duplicates_dropped_order_kept() {
        let req = build_request(
            BASE,
            kona(),
            &["windSpeed", "gust", "windSpeed", "airTemperature"],
            None,
            None,
            Some(&["sg", "noaa", "sg"][..]),
            KEY,
        )
        .unwrap();

        assert_eq!(req.measurements(), ["windSpeed", "gust", "airTemperature"]);
        assert_eq!(req.sources(), ["sg", "noaa"]);
        assert!(req.url().as_str().ends_with("params=windSpeed,gust,airTemperature&source=sg,noaa"));
    }

    #[test]
    fn empty_source_list_is_omitted() {
        let req = build_request(BASE, kona(), &["gust"], None, None, Some(&[][..]), KEY).unwrap();
        assert!(!req.url().as_str().contains("source="));
        assert!(req.sources().is_empty());
    }

    #[test]
    fn trailing_slash_on_base_url() {
        let req = build_request("http://localhost:8080/", kona(), &["gust"], None, None, None, KEY)
            .unwrap();
        assert_eq!(req.url().path(), "/v2/weather/point");
    }

    #[test]
    fn request_urls_are_deterministic() {
        let (start, end) = window();
        let query = WeatherQuery::new(kona(), MeasurementName::all().iter().copied())
            .with_start(start)
            .with_end(end)
            .with_sources(DataSource::all().iter().copied());

        let first = query.to_request(BASE, KEY).unwrap();
        for _ in 0..100 {
            let next = query.to_request(BASE, KEY).unwrap();
            assert_eq!(next.url().as_str(), first.url().as_str());
        }
    }
}
