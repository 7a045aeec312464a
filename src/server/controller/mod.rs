//! HTTP handlers. Generic over the database client so the same routes can be
//! mounted over Postgres or the in-memory store.

pub(crate) mod catalog;
pub(crate) mod checkout;
pub(crate) mod error;
pub(crate) mod receipt;

use crate::server::controller::error::CustomError;
use crate::server::database::DbClient;
use actix_web::web;
use log::warn;

pub(crate) fn routes<C: DbClient>(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        warn!("rejected request body, {}", err);
        CustomError::BadRequest.into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        warn!("rejected query string, {}", err);
        CustomError::BadRequest.into()
    }))
    .route("/v1/checkout", web::post().to(checkout::post_checkout::<C>))
    .route("/v1/receipts", web::get().to(receipt::get_receipts::<C>))
    .service(
        web::resource("/v1/receipts/{id}")
            .route(web::get().to(receipt::get_receipt::<C>))
            .route(web::put().to(receipt::put_receipt::<C>))
            .route(web::delete().to(receipt::delete_receipt::<C>)),
    )
    .route(
        "/v1/receipts/{id}/status",
        web::patch().to(receipt::patch_receipt_status::<C>),
    )
    .route("/v1/menu", web::get().to(catalog::get_menu::<C>))
    .route("/v1/inventory", web::get().to(catalog::get_inventory::<C>));
}
