use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use catalog::StorageError;
use thiserror::Error;

use crate::payloads::{Empty, Envelope};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Request data failed validation")]
    RequestDataFail,

    #[error("Spider not found")]
    SpiderNotFound,

    #[error("Geographies not found")]
    GeographiesNotFound,

    #[error("Image type not supported")]
    InvalidImageType,

    #[error("Read image file failed")]
    ReadImageFailed,

    #[error("Delete spider failed")]
    DeleteSpiderFailed,

    #[error("Spider database error: {0}")]
    SpiderDb(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Lookups that come back empty are the caller's problem, anything else is ours.
    pub fn from_lookup(error: StorageError) -> Self {
        match error {
            StorageError::NotFound => AppError::SpiderNotFound,
            other => AppError::SpiderDb(other),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::MalformedPayload => "general_system_error",
            AppError::RequestDataFail => "request_data_fail",
            AppError::SpiderNotFound => "spider_not_found",
            AppError::GeographiesNotFound => "geographies_not_found",
            AppError::InvalidImageType => "invalid_image_type",
            AppError::ReadImageFailed => "read_image_failed",
            AppError::DeleteSpiderFailed => "delete_spider_failed",
            AppError::SpiderDb { .. } => "error_spider_db",
            AppError::Internal { .. } => "general_system_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload | AppError::RequestDataFail => StatusCode::BAD_REQUEST,
            AppError::InvalidImageType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::SpiderNotFound | AppError::GeographiesNotFound => StatusCode::NOT_FOUND,
            AppError::ReadImageFailed
            | AppError::DeleteSpiderFailed
            | AppError::SpiderDb { .. }
            | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(_: JsonRejection) -> Self {
        AppError::MalformedPayload
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Envelope::<Empty>::failure(self.code(), self.to_string());

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_mapping() {
        assert!(matches!(
            AppError::from_lookup(StorageError::NotFound),
            AppError::SpiderNotFound
        ));
        assert!(matches!(
            AppError::from_lookup(StorageError::Backend("down".to_string())),
            AppError::SpiderDb(StorageError::Backend(_))
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::RequestDataFail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::SpiderNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::SpiderDb(StorageError::NotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
