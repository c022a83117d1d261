use futures::{Stream, stream};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    classify::{classify, reclassify_decode_failure},
    config::{ApiKeySource, Config, DEFAULT_BASE_URL, SharedConfig, StaticApiKey},
    decode::decode_weather,
    error::StormGlassError,
    model::{Weather, WeatherQuery},
    request::QueryDescriptor,
    transport::{Transport, TransportError, TransportResponse},
};

/// Point forecast client. Cheap to clone; holds no per-call state.
#[derive(Debug, Clone)]
pub struct StormGlassClient {
    base_url: Option<String>,
    credentials: Arc<dyn ApiKeySource>,
    transport: Arc<dyn Transport>,
}

impl StormGlassClient {
    pub fn new(
        credentials: impl ApiKeySource + 'static,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            base_url: None,
            credentials: Arc::new(credentials),
            transport: Arc::new(transport),
        }
    }

    pub fn with_api_key(api_key: impl Into<String>, transport: impl Transport + 'static) -> Self {
        Self::new(StaticApiKey(api_key.into()), transport)
    }

    /// Build a client from a loaded [`Config`]; fails with a hint when no key is set.
    pub fn from_config(config: &Config, transport: impl Transport + 'static) -> anyhow::Result<Self> {
        config.require_api_key()?;
        Ok(Self::new(config.clone(), transport))
    }

    /// Client backed by the process-wide configuration installed with
    /// [`crate::configure`]. The key and base URL are looked up on every call.
    pub fn shared(transport: impl Transport + 'static) -> Self {
        Self::new(SharedConfig, transport)
    }

    /// Pin the base URL, ignoring whatever the credential source supplies.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Base URL the next call will use.
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .or_else(|| self.credentials.base_url())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Fetch a forecast: build, send, classify, decode.
    pub async fn fetch(&self, query: &WeatherQuery) -> Result<Weather, StormGlassError> {
        self.fetch_cancellable(query, &CancellationToken::new()).await
    }

    /// Like [`fetch`](Self::fetch), but gives up with [`StormGlassError::Cancelled`]
    /// as soon as `cancel` fires. A cancelled call is never classified or decoded.
    #[instrument(skip_all, fields(lat = query.coordinate.latitude(), lng = query.coordinate.longitude()))]
    pub async fn fetch_cancellable(
        &self,
        query: &WeatherQuery,
        cancel: &CancellationToken,
    ) -> Result<Weather, StormGlassError> {
        let request = self.prepare(query)?;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(url = %request.url(), "request cancelled");
                return Err(StormGlassError::Cancelled);
            }
            outcome = self.transport.send(&request) => outcome,
        };

        complete(&request, outcome)
    }

    /// Push-style shape: a stream that yields exactly one result, then ends.
    pub fn fetch_stream<'a>(
        &'a self,
        query: &'a WeatherQuery,
    ) -> impl Stream<Item = Result<Weather, StormGlassError>> + 'a {
        stream::once(self.fetch(query))
    }

    fn prepare(&self, query: &WeatherQuery) -> Result<QueryDescriptor, StormGlassError> {
        let api_key = self.credentials.api_key().ok_or(StormGlassError::MissingApiKey)?;
        let request = query.to_request(&self.base_url(), &api_key)?;
        debug!(url = %request.url(), "built Storm Glass request");
        Ok(request)
    }
}

/// Classify a transport outcome and decode the body. Shared by every call shape.
pub fn complete(
    request: &QueryDescriptor,
    outcome: Result<TransportResponse, TransportError>,
) -> Result<Weather, StormGlassError> {
    let body = classify(request, outcome)?;
    decode_weather(&body).map_err(|err| reclassify_decode_failure(request, &body, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{DataSource, MeasurementName},
        model::Coordinate,
    };
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::Mutex;

    const WEATHER: &str = r#"{
        "hours": [
            {
                "swellHeight": { "noaa": 0.26, "sg": 0.3 },
                "time": "2021-06-14T06:00:00+00:00",
                "waveHeight": { "noaa": 0.56 }
            }
        ],
        "meta": {
            "cost": 1,
            "dailyQuota": 50,
            "end": "2021-06-14 07:16",
            "lat": 19.64,
            "lng": -155.9969,
            "params": ["swellHeight", "waveHeight"],
            "requestCount": 6,
            "source": ["noaa", "sg"],
            "start": "2021-06-14 06:00"
        }
    }"#;

    #[derive(Debug)]
    enum Reply {
        Respond(u16, &'static str),
        Fail,
        Hang,
    }

    #[derive(Debug)]
    struct FakeTransport {
        reply: Reply,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl FakeTransport {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self { reply, sent: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(
            &self,
            request: &QueryDescriptor,
        ) -> Result<TransportResponse, TransportError> {
            let [(_, key)] = request.headers();
            self.sent.lock().unwrap().push((request.url().to_string(), key.to_string()));
            match self.reply {
                Reply::Respond(status, body) => Ok(TransportResponse::new(status, body)),
                Reply::Fail => Err(TransportError::new("connection refused")),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    fn query() -> WeatherQuery {
        let coordinate = Coordinate::new(19.594379, -155.971668).unwrap();
        WeatherQuery::new(coordinate, [MeasurementName::SwellHeight, MeasurementName::WaveHeight])
    }

    #[tokio::test]
    async fn fetch_decodes_success_body() {
        let transport = FakeTransport::new(Reply::Respond(200, WEATHER));
        let client = StormGlassClient::with_api_key("KEY", transport.clone());

        let weather = client.fetch(&query()).await.unwrap();

        assert_eq!(weather.periods.len(), 1);
        assert_eq!(
            weather.periods[0].value(MeasurementName::SwellHeight, DataSource::StormGlass),
            Some(0.3)
        );
        assert_eq!(weather.metadata.remaining_quota(), 44);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].0.ends_with("params=swellHeight,waveHeight"));
        assert_eq!(sent[0].1, "KEY");
    }

    #[tokio::test]
    async fn fetch_propagates_status_error() {
        let body = r#"{"errors":{"key":["API key is invalid"]}}"#;
        let transport = FakeTransport::new(Reply::Respond(403, body));
        let client = StormGlassClient::with_api_key("KEY", transport);

        let err = client.fetch(&query()).await.unwrap_err();

        assert!(matches!(err, StormGlassError::InvalidStatus { status: 403, .. }));
        assert_eq!(err.api_detail().unwrap().messages("key"), ["API key is invalid"]);
    }

    #[tokio::test]
    async fn fetch_propagates_network_failure() {
        let client = StormGlassClient::with_api_key("KEY", FakeTransport::new(Reply::Fail));
        let err = client.fetch(&query()).await.unwrap_err();
        assert!(matches!(err, StormGlassError::NoResponse { .. }));
    }

    #[tokio::test]
    async fn error_document_with_200_is_rejected() {
        let body = r#"{"errors":{"params":["time not valid"]}}"#;
        let client =
            StormGlassClient::with_api_key("KEY", FakeTransport::new(Reply::Respond(200, body)));

        let err = client.fetch(&query()).await.unwrap_err();
        assert!(matches!(err, StormGlassError::Rejected { .. }));
    }

    #[tokio::test]
    async fn weather_document_with_errors_key_still_succeeds() {
        let body = r#"{
            "hours": [
                { "time": "2021-06-14T06:00:00+00:00", "swellHeight": { "noaa": 0.26 } }
            ],
            "meta": {
                "cost": 1, "dailyQuota": 50, "end": "2021-06-14 07:16",
                "lat": 19.64, "lng": -155.9969, "params": ["swellHeight"],
                "requestCount": 6, "start": "2021-06-14 06:00"
            },
            "errors": { "source": ["sg is not available in this region"] }
        }"#;
        let client =
            StormGlassClient::with_api_key("KEY", FakeTransport::new(Reply::Respond(200, body)));

        let weather = client.fetch(&query()).await.unwrap();
        assert_eq!(
            weather.periods[0].value(MeasurementName::SwellHeight, DataSource::Noaa),
            Some(0.26)
        );
    }

    #[tokio::test]
    async fn undecodable_200_is_decode_error() {
        let client =
            StormGlassClient::with_api_key("KEY", FakeTransport::new(Reply::Respond(200, "[]")));

        let err = client.fetch(&query()).await.unwrap_err();
        assert!(matches!(err, StormGlassError::Decode { .. }));
    }

    #[tokio::test]
    async fn missing_key_fails_before_sending() {
        let transport = FakeTransport::new(Reply::Respond(200, WEATHER));
        let client = StormGlassClient::new(Config::default(), transport.clone());

        let err = client.fetch(&query()).await.unwrap_err();

        assert!(matches!(err, StormGlassError::MissingApiKey));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_query_fails_before_sending() {
        let transport = FakeTransport::new(Reply::Respond(200, WEATHER));
        let client = StormGlassClient::with_api_key("KEY", transport.clone());
        let empty = WeatherQuery::new(query().coordinate, []);

        let err = client.fetch(&empty).await.unwrap_err();

        assert!(matches!(err, StormGlassError::InvalidRequest(_)));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancellation_wins_over_pending_transport() {
        let client = StormGlassClient::with_api_key("KEY", FakeTransport::new(Reply::Hang));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client.fetch_cancellable(&query(), &cancel).await.unwrap_err();
        assert!(matches!(err, StormGlassError::Cancelled));
    }

    #[tokio::test]
    async fn stream_yields_once_then_ends() {
        let client =
            StormGlassClient::with_api_key("KEY", FakeTransport::new(Reply::Respond(200, WEATHER)));
        let query = query();

        let results: Vec<_> = client.fetch_stream(&query).collect().await;

        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[tokio::test]
    async fn stream_and_fetch_agree_on_failure() {
        let client = StormGlassClient::with_api_key(
            "KEY",
            FakeTransport::new(Reply::Respond(500, "oops")),
        );
        let query = query();

        let direct = client.fetch(&query).await.unwrap_err();
        let mut stream = Box::pin(client.fetch_stream(&query));
        let streamed = stream.next().await.unwrap().unwrap_err();

        assert_eq!(direct.to_string(), streamed.to_string());
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client =
            StormGlassClient::with_api_key("SECRET_KEY_123", FakeTransport::new(Reply::Fail));
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("SECRET_KEY_123"));
        assert!(rendered.contains("<redacted>"));
    }

    #[derive(Debug, Default)]
    struct SwitchableEndpoint {
        base_url: Mutex<Option<String>>,
    }

    impl ApiKeySource for SwitchableEndpoint {
        fn api_key(&self) -> Option<String> {
            Some("KEY".into())
        }

        fn base_url(&self) -> Option<String> {
            self.base_url.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn base_url_is_resolved_per_call() {
        let source = Arc::new(SwitchableEndpoint::default());
        let transport = FakeTransport::new(Reply::Respond(200, WEATHER));
        let client = StormGlassClient::new(source.clone(), transport.clone());
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);

        *source.base_url.lock().unwrap() = Some("http://localhost:9000".into());
        client.fetch(&query()).await.unwrap();

        let sent = transport.sent.lock().unwrap();
        assert!(sent[0].0.starts_with("http://localhost:9000/v2/weather/point?"));
    }

    #[test]
    fn pinned_base_url_wins_over_source() {
        let cfg = Config {
            api_key: Some("KEY".into()),
            base_url: Some("http://localhost:9000".into()),
        };
        let client = StormGlassClient::new(cfg, FakeTransport::new(Reply::Fail))
            .with_base_url("http://127.0.0.1:8080");
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn from_config_requires_key() {
        let err = StormGlassClient::from_config(&Config::default(), FakeTransport::new(Reply::Fail))
            .unwrap_err();
        assert!(err.to_string().contains("No Storm Glass API key configured"));

        let cfg = Config {
            api_key: Some("KEY".into()),
            base_url: Some("http://localhost:9000".into()),
        };
        let client = StormGlassClient::from_config(&cfg, FakeTransport::new(Reply::Fail)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000");
    }
}
