use actix_web::{web, HttpResponse};

use crate::{
    errors::ServerError,
    models::{
        filename::NoteKey,
        note::{Note, SaveRequest},
    },
    AppState,
};

/// Returns the note, or an unsaved empty one when it does not exist yet.
pub async fn get(
    filename: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let key = NoteKey::canonicalize(&filename)?;
    let store = state.store.clone();
    let filename = filename.into_inner();

    let note = web::block(move || match store.read(&filename) {
        Err(ServerError::NotFound(_)) => Ok(Note::empty(key)),
        found => found,
    })
    .await??;

    Ok(HttpResponse::Ok().json(note))
}

pub async fn save(
    filename: web::Path<String>,
    input: web::Json<SaveRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let store = state.store.clone();
    let filename = filename.into_inner();
    let content = input.into_inner().content;

    let note = web::block(move || store.write(&filename, &content)).await??;

    Ok(HttpResponse::Ok().json(note))
}
