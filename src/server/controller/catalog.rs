use crate::server::controller::error::CustomError;
use crate::server::database::DbClient;
use crate::server::model::inventory::{GetInventoryResponse, GetMenuResponse, MenuParams};
use crate::server::service::catalog;
use crate::server::state::AppState;
use actix_web::{web, Responder};

pub(crate) async fn get_menu<C: DbClient>(
    params: web::Query<MenuParams>,
    data: web::Data<AppState<C>>,
) -> Result<impl Responder, CustomError> {
    let mut conn = data.read_connection().await?;
    let items = catalog::menu(&mut *conn, params.category).await?;
    Ok(web::Json(GetMenuResponse { items }))
}

pub(crate) async fn get_inventory<C: DbClient>(
    data: web::Data<AppState<C>>,
) -> Result<impl Responder, CustomError> {
    let mut conn = data.read_connection().await?;
    let items = catalog::inventory_levels(&mut *conn).await?;
    Ok(web::Json(GetInventoryResponse { items }))
}
