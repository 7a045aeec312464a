use crate::server::database::DbError;
use crate::server::service::checkout::CheckoutError;
use crate::server::service::receipts::ReceiptError;
use actix_web::http::StatusCode;
use actix_web::{error, HttpResponse};
use derive_more::{Display, Error};
use log::{error, warn};
use serde_json::json;

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub(crate) enum CustomError {
    #[display("server is busy")]
    ServerIsBusy,
    #[display("invalid request")]
    BadRequest,
    #[display("resource not found")]
    ResourceNotFound,
    #[display("database error")]
    DbError,
    #[display("failed to place order")]
    CheckoutFailed,
}

impl error::ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match *self {
            CustomError::ServerIsBusy => StatusCode::SERVICE_UNAVAILABLE,
            CustomError::BadRequest => StatusCode::BAD_REQUEST,
            CustomError::ResourceNotFound => StatusCode::NOT_FOUND,
            CustomError::DbError | CustomError::CheckoutFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}

impl From<DbError> for CustomError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::PoolTimeout { .. } | DbError::PoolClosed { .. } => {
                warn!("no connection available, {}", e);
                CustomError::ServerIsBusy
            }
            e => {
                error!("database call failed, {}", e);
                CustomError::DbError
            }
        }
    }
}

/// Checkout failures are opaque to the caller; the cause only goes to the log.
impl From<CheckoutError> for CustomError {
    fn from(e: CheckoutError) -> Self {
        error!("checkout failed, {}", e);
        CustomError::CheckoutFailed
    }
}

impl From<ReceiptError> for CustomError {
    fn from(e: ReceiptError) -> Self {
        match e {
            ReceiptError::NotFound { .. } => CustomError::ResourceNotFound,
            ReceiptError::InvalidLineItem { .. } => {
                warn!("rejected receipt update, {}", e);
                CustomError::BadRequest
            }
            ReceiptError::Db { source } => source.into(),
        }
    }
}
