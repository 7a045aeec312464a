use crate::server::controller::error::CustomError;
use crate::server::database::DbClient;
use crate::server::model::page_bounds;
use crate::server::model::receipt::{
    GetReceiptsResponse, PatchReceiptStatusRequest, PutReceiptRequest, ReceiptListParams,
    ReceiptMutationResponse,
};
use crate::server::service::receipts;
use crate::server::state::AppState;
use actix_web::{web, HttpRequest, Responder};
use log::warn;

/// get receipts, newest first
pub(crate) async fn get_receipts<C: DbClient>(
    req: HttpRequest,
    data: web::Data<AppState<C>>,
) -> Result<impl Responder, CustomError> {
    let ReceiptListParams {
        offset,
        limit,
        status,
    } = web::Query::<ReceiptListParams>::from_query(req.query_string())
        .map_err(|e| {
            warn!("failed to parse query string, {}", e);
            CustomError::BadRequest
        })?
        .into_inner();
    let (offset, limit) = page_bounds(offset, limit);
    let mut conn = data.read_connection().await?;
    let receipts = receipts::list_receipts(&mut *conn, offset, limit, status).await?;
    Ok(web::Json(GetReceiptsResponse { receipts }))
}

/// get one receipt with its line items
pub(crate) async fn get_receipt<C: DbClient>(
    id: web::Path<i64>,
    data: web::Data<AppState<C>>,
) -> Result<impl Responder, CustomError> {
    let mut conn = data.read_connection().await?;
    let receipt = receipts::fetch_receipt(&mut *conn, id.into_inner()).await?;
    Ok(web::Json(receipt))
}

/// replace every line item of a receipt
pub(crate) async fn put_receipt<C: DbClient>(
    id: web::Path<i64>,
    body: web::Json<PutReceiptRequest>,
    data: web::Data<AppState<C>>,
) -> Result<impl Responder, CustomError> {
    let receipt_id = id.into_inner();
    let mut conn = data.write_connection().await?;
    receipts::replace_receipt(&mut *conn, receipt_id, body.into_inner()).await?;
    Ok(web::Json(ReceiptMutationResponse {
        receipt_id,
        success: true,
    }))
}

/// kitchen completion or cancellation
pub(crate) async fn patch_receipt_status<C: DbClient>(
    id: web::Path<i64>,
    body: web::Json<PatchReceiptStatusRequest>,
    data: web::Data<AppState<C>>,
) -> Result<impl Responder, CustomError> {
    let receipt_id = id.into_inner();
    let mut conn = data.write_connection().await?;
    receipts::update_status(&mut *conn, receipt_id, body.status).await?;
    Ok(web::Json(ReceiptMutationResponse {
        receipt_id,
        success: true,
    }))
}

/// delete a receipt and everything on it
pub(crate) async fn delete_receipt<C: DbClient>(
    id: web::Path<i64>,
    data: web::Data<AppState<C>>,
) -> Result<impl Responder, CustomError> {
    let receipt_id = id.into_inner();
    let mut conn = data.write_connection().await?;
    receipts::delete_receipt(&mut *conn, receipt_id).await?;
    Ok(web::Json(ReceiptMutationResponse {
        receipt_id,
        success: true,
    }))
}
