use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),
}

impl IntoResponse for RankingError {
    fn into_response(self) -> Response {
        let status = match self {
            RankingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RankingError::NotFound(_) => StatusCode::NOT_FOUND,
            RankingError::Store(_) | RankingError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// MongoDB duplicate-key write error (E11000). The aggregator and the
/// snapshot service both use it as the lost-the-race signal on conditional
/// creates.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
    )
}
