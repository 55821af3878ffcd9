use actix_web::{web, HttpRequest, HttpResponse};
use serde_derive::Deserialize;
use serde_json::json;

use crate::{
    errors::ServerError,
    models::{filename::is_valid, note::FileListResponse},
    store::paging,
    utils::bearer_token,
    AppState,
};

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Paginated listing; the only route that needs a bearer token.
pub async fn list(
    req: HttpRequest,
    query: web::Query<ListQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    match bearer_token(&req) {
        Some(token) if state.gate.validate_token(&token) => {}
        _ => return Err(ServerError::Unauthorized("Invalid or expired token")),
    }

    let (page, limit) = paging(query.page, query.limit);
    let store = state.store.clone();
    let (files, total) = web::block(move || -> Result<_, ServerError> {
        let files = store.list(page as i64, limit as i64)?;
        Ok((files, store.count()))
    })
    .await??;

    Ok(HttpResponse::Ok().json(FileListResponse {
        files,
        total,
        page,
        limit,
    }))
}

pub async fn delete(
    filename: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let store = state.store.clone();
    let filename = filename.into_inner();

    let filename = web::block(move || -> Result<String, ServerError> {
        if !store.exists(&filename) {
            return Err(ServerError::NotFound(filename));
        }
        store.delete(&filename)?;
        Ok(filename)
    })
    .await??;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("File {filename} deleted successfully"),
    })))
}

#[derive(Deserialize)]
pub struct RenameQuery {
    pub new_filename: String,
}

pub async fn rename(
    filename: web::Path<String>,
    query: web::Query<RenameQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let new_filename = query.into_inner().new_filename;
    if !is_valid(&new_filename) {
        return Err(ServerError::ValidationError("Invalid new filename".to_string()));
    }

    let store = state.store.clone();
    let filename = filename.into_inner();
    let message = web::block(move || -> Result<String, ServerError> {
        if !store.exists(&filename) {
            return Ok(format!("File renamed to {new_filename}"));
        }
        store.rename(&filename, &new_filename)?;
        Ok(format!("File renamed from {filename} to {new_filename}"))
    })
    .await??;

    Ok(HttpResponse::Ok().json(json!({ "message": message })))
}
