use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::notice::Notice;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Sign in required")]
    Unauthenticated,

    #[error("Invalid or expired token")]
    InvalidSession,

    #[error("Session is still loading")]
    SessionPending,

    #[error("{0}")]
    Validation(String),

    /// A datastore call failed; `action` completes "Failed to ...".
    #[error("failed to {action}: {cause}")]
    Gateway {
        action: &'static str,
        cause: anyhow::Error,
    },

    /// Meals were marked paid but the ledger entry could not be written.
    #[error("payment ledger insert failed after meals were marked paid: {0}")]
    PartialPayment(anyhow::Error),
}

impl AppError {
    pub fn gateway(action: &'static str) -> impl FnOnce(anyhow::Error) -> AppError {
        move |cause| AppError::Gateway { action, cause }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated | AppError::InvalidSession => StatusCode::UNAUTHORIZED,
            AppError::SessionPending => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::PartialPayment(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// What the user gets to see; gateway details stay in the logs.
    pub fn notice(&self) -> Notice {
        match self {
            AppError::Gateway { action, .. } => {
                Notice::destructive("Error", format!("Failed to {action}"))
            }
            AppError::PartialPayment(_) => Notice::destructive("Error", "Failed to process payment"),
            other => Notice::destructive("Error", other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Gateway { action, cause } => {
                error!(error = %cause, action, "datastore call failed");
            }
            AppError::PartialPayment(cause) => {
                error!(error = %cause, "meals marked paid without a ledger entry");
            }
            _ => {}
        }
        (self.status(), Json(self.notice())).into_response()
    }
}
