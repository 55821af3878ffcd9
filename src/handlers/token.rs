use actix_web::{web, HttpResponse};
use serde_derive::Deserialize;

use crate::{errors::ServerError, AppState};

#[derive(Clone, Deserialize)]
pub struct PasswordReq {
    password: String,
}

/// Exchanges the file list password for a bearer token.
pub async fn verify_password(
    body: web::Json<PasswordReq>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let credential = state.gate.verify_password(&body.password)?;
    Ok(HttpResponse::Ok().json(credential))
}
