use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

/// Application-wide error taxonomy. Every component except the numeric
/// normalizer propagates failures upward as one of these variants; the
/// calling flow decides what the user sees.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The model endpoint returned non-success or an empty choice list.
    /// The upstream message is surfaced verbatim and never retried.
    #[error("upstream model error: {0}")]
    Upstream(String),

    /// No JSON array could be located or parsed in the model response.
    /// `raw` is kept for diagnostics only and never reaches the client.
    #[error("could not interpret model response")]
    Parse { raw: String },

    /// A ledger or profile-store read/write failed. The caller's pending
    /// computation is untouched, so the save can be retried as-is.
    #[error("persistence failed: {0}")]
    Persistence(#[source] anyhow::Error),

    #[error("record not found")]
    NotFound,

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn persistence(err: impl Into<anyhow::Error>) -> Self {
        Self::Persistence(err.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Parse { raw } => {
                debug!(raw = %raw, "unparseable model response");
            }
            AppError::Persistence(e) => {
                error!(error = %e, "persistence failure");
            }
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
            }
            _ => {}
        }
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_hides_raw_text() {
        let err = AppError::Parse {
            raw: "the model rambled about breakfast".into(),
        };
        assert!(!err.to_string().contains("rambled"));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn upstream_message_is_surfaced_verbatim() {
        let err = AppError::upstream("quota exceeded for project");
        assert!(err.to_string().contains("quota exceeded for project"));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn status_mapping_covers_taxonomy() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::invalid("bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::unauthorized("no token").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::conflict("email taken").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::persistence(anyhow::anyhow!("disk gone")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
