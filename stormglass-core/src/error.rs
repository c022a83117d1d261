use thiserror::Error;

use crate::{
    catalog::MeasurementName, classify::ApiErrorPayload, request::QueryDescriptor,
    transport::TransportError,
};

/// Every way a forecast call can fail.
///
/// `InvalidRequest` and `MissingApiKey` are raised before anything is sent.
/// `NoResponse`, `InvalidStatus` and `Rejected` come from classifying the
/// transport outcome. The remaining variants come from decoding a 200 body.
#[derive(Debug, Error)]
pub enum StormGlassError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(
        "No API key available.\n\
         Hint: run `stormglass configure`, set STORMGLASS_API_KEY, or call `stormglass_core::configure` at startup."
    )]
    MissingApiKey,

    #[error("No usable response for {}{}", .request.url(), detail_suffix(.api_detail))]
    NoResponse {
        request: Box<QueryDescriptor>,
        api_detail: Option<ApiErrorPayload>,
        #[source]
        source: Option<TransportError>,
    },

    #[error("Storm Glass responded with status {status} for {}{}", .request.url(), detail_suffix(.api_detail))]
    InvalidStatus {
        status: u16,
        request: Box<QueryDescriptor>,
        api_detail: Option<ApiErrorPayload>,
    },

    #[error("Storm Glass returned an error document for {}: {detail}", .request.url())]
    Rejected {
        request: Box<QueryDescriptor>,
        detail: ApiErrorPayload,
    },

    #[error("'{value}' at {path} is not a valid offset date-time")]
    MalformedTimestamp { path: String, value: String },

    #[error("Measurement '{0}' is missing or malformed")]
    MissingMeasurement(MeasurementName),

    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Request was cancelled")]
    Cancelled,
}

impl StormGlassError {
    pub(crate) fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        StormGlassError::Decode { path: path.into(), message: message.into() }
    }

    /// API-supplied messages attached to a transport-level failure, if the body carried any.
    pub fn api_detail(&self) -> Option<&ApiErrorPayload> {
        match self {
            StormGlassError::NoResponse { api_detail, .. }
            | StormGlassError::InvalidStatus { api_detail, .. } => api_detail.as_ref(),
            StormGlassError::Rejected { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// The request that was sent, for failures that happened after sending.
    pub fn request(&self) -> Option<&QueryDescriptor> {
        match self {
            StormGlassError::NoResponse { request, .. }
            | StormGlassError::InvalidStatus { request, .. }
            | StormGlassError::Rejected { request, .. } => Some(request.as_ref()),
            _ => None,
        }
    }
}

fn detail_suffix(detail: &Option<ApiErrorPayload>) -> String {
    match detail {
        Some(d) => format!(" ({d})"),
        None => String::new(),
    }
}
