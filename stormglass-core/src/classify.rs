use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use tracing::warn;

use crate::{
    error::StormGlassError,
    request::QueryDescriptor,
    transport::{TransportError, TransportResponse},
};

/// Error document the API sends alongside failures:
/// `{ "errors": { "<field>": ["<message>", ...] } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorPayload {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ApiErrorPayload {
    /// Best-effort parse; `None` when the body is not an error document.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

impl fmt::Display for ApiErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

/// Turn a transport outcome into either the body to decode or a typed failure.
///
/// Only status 200 with a non-empty body is a success. Failures carry the
/// request and, when the body parses as one, the API's error document.
pub fn classify(
    request: &QueryDescriptor,
    outcome: Result<TransportResponse, TransportError>,
) -> Result<Vec<u8>, StormGlassError> {
    let response = match outcome {
        Ok(response) => response,
        Err(source) => {
            warn!(url = %request.url(), error = %source, "no response from Storm Glass");
            return Err(StormGlassError::NoResponse {
                request: Box::new(request.clone()),
                api_detail: None,
                source: Some(source),
            });
        }
    };

    if response.status != 200 {
        let api_detail = ApiErrorPayload::from_body(&response.body);
        warn!(url = %request.url(), status = response.status, "Storm Glass rejected request");
        return Err(StormGlassError::InvalidStatus {
            status: response.status,
            request: Box::new(request.clone()),
            api_detail,
        });
    }

    if response.body.iter().all(u8::is_ascii_whitespace) {
        warn!(url = %request.url(), "Storm Glass returned an empty body");
        return Err(StormGlassError::NoResponse {
            request: Box::new(request.clone()),
            api_detail: None,
            source: None,
        });
    }

    Ok(response.body)
}

/// A 200 body that failed to decode as weather: report it as the API's own
/// error document when it is one, otherwise keep the decode failure.
pub fn reclassify_decode_failure(
    request: &QueryDescriptor,
    body: &[u8],
    decode_error: StormGlassError,
) -> StormGlassError {
    match ApiErrorPayload::from_body(body) {
        Some(detail) => {
            warn!(url = %request.url(), %detail, "Storm Glass sent an error document with status 200");
            StormGlassError::Rejected { request: Box::new(request.clone()), detail }
        }
        None => decode_error,
    }
}
