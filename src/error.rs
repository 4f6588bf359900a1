use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArbError>;

/// Fatal conditions of one evaluation. None of them are retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArbError {
    #[error("Get course error for pair: \"{pair}\" (platform {platform_id}, method {method_id})")]
    RateUnavailable { pair: String, platform_id: i64, method_id: i64 },

    #[error("Get method error for method name: \"{method}\"")]
    MethodUnresolved { method: String },

    #[error("Get platform error for platform name: \"{platform}\"")]
    PlatformUnresolved { platform: String },

    #[error("Get loop error for loop_id: \"{loop_id}\"")]
    LoopUnresolved { loop_id: i64 },

    #[error("base currency {currency} is not a source currency of loop {loop_id}")]
    NoBaseCurrencyInLoop { loop_id: i64, currency: String },

    #[error("order book for {pair} is empty on both sides")]
    EmptyOrderBook { pair: String },

    #[error("quote fetch failed for {pair}: {reason}")]
    QuoteFetch { pair: String, reason: String },

    #[error("{operation} timed out after {after_ms} ms")]
    Timeout { operation: String, after_ms: u64 },

    #[error("store error: {0}")]
    Store(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("wrong private key")]
    Unauthorized,
}

impl ArbError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ArbError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ArbError::Unauthorized => StatusCode::UNAUTHORIZED,
            ArbError::LoopUnresolved { .. } => StatusCode::NOT_FOUND,
            ArbError::RateUnavailable { .. }
            | ArbError::MethodUnresolved { .. }
            | ArbError::PlatformUnresolved { .. }
            | ArbError::NoBaseCurrencyInLoop { .. }
            | ArbError::EmptyOrderBook { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ArbError::QuoteFetch { .. } => StatusCode::BAD_GATEWAY,
            ArbError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ArbError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ArbError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("evaluation failed: {}", self);
        } else {
            tracing::warn!("request rejected: {}", self);
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "ok": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_unavailable_names_the_pair() {
        let err = ArbError::RateUnavailable { pair: "ETH-USDT".into(), platform_id: 1, method_id: 2 };
        assert_eq!(
            err.to_string(),
            "Get course error for pair: \"ETH-USDT\" (platform 1, method 2)"
        );
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        assert_eq!(ArbError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ArbError::Unauthorized.to_string(), "wrong private key");
    }

    #[test]
    fn unknown_loop_is_not_found() {
        let err = ArbError::LoopUnresolved { loop_id: 404 };
        assert_eq!(err.to_string(), "Get loop error for loop_id: \"404\"");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn timeout_is_a_gateway_failure() {
        let err = ArbError::Timeout { operation: "fetch quotes BTC-USDT".into(), after_ms: 50 };
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.to_string(), "fetch quotes BTC-USDT timed out after 50 ms");
    }
}
