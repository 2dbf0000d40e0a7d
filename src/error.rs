use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use log::error;
use thiserror::Error;

/// Failures of a single ingress request or datagram.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid JSON payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Failed to publish trap: {0}")]
    Publish(#[from] BrokerError),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Parse(_) | GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Publish(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Trap request failed: {}", self);
        }
        let body = serde_json::json!({ "detail": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("kafka: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("channel {channel} is closed")]
    Closed { channel: String },
}

/// Failures delivering one alarm to a downstream HTTP endpoint.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },
}
