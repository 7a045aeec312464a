use crate::server::controller::error::CustomError;
use crate::server::database::DbClient;
use crate::server::model::cart::{CheckoutRequest, CheckoutResponse};
use crate::server::service::checkout::place_order;
use crate::server::state::AppState;
use actix_web::{web, Responder};
use log::error;

/// Place an order
pub(crate) async fn post_checkout<C: DbClient>(
    body: web::Json<CheckoutRequest>,
    data: web::Data<AppState<C>>,
) -> Result<impl Responder, CustomError> {
    let mut conn = data.write_connection().await.map_err(|e| {
        error!("checkout could not get a connection, {}", e);
        CustomError::CheckoutFailed
    })?;
    let receipt_id = place_order(&mut *conn, body.into_inner(), data.floor_policy()).await?;
    Ok(web::Json(CheckoutResponse {
        result: receipt_id,
        success: true,
    }))
}
