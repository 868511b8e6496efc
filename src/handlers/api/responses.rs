use actix_web::{web, HttpResponse};
use std::collections::HashMap;

use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::response::{self, Entity, SaveRequest};
use crate::storage::keys;
use crate::templates_structs::{ResponseFound, ResponseMissing};

/// GET /responses?type=T&company_id=C[&employee_id=E]
/// A 404 here means "nothing saved yet", not a failure.
pub async fn read(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let entity = Entity::resolve(
        query.get("type").map(String::as_str),
        query.get("company_id").map(String::as_str),
        query.get("employee_id").map(String::as_str),
    )?;
    let storage_path = keys::response_key(&entity);

    match response::find(state.store.as_ref(), &entity).await? {
        Some(document) => Ok(HttpResponse::Ok().json(ResponseFound::new(storage_path, document))),
        None => Ok(HttpResponse::NotFound().json(ResponseMissing::new(&entity, storage_path))),
    }
}

/// POST /responses
pub async fn save(
    state: web::Data<AppState>,
    body: web::Json<SaveRequest>,
) -> Result<HttpResponse, AppError> {
    let confirmation = response::save(state.store.as_ref(), &body, &state.limits).await?;
    Ok(HttpResponse::Ok().json(confirmation))
}
