use actix_web::{web, HttpResponse};
use serde_json::json;

pub mod files;
pub mod live_save;
pub mod note;
pub mod token;

/// Large enough for a note at the content limit in any script.
pub const MAX_JSON_BYTES: usize = 1024 * 1024;

pub async fn index() -> impl actix_web::Responder {
    HttpResponse::Ok().finish()
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health))
        .service(
            web::scope("/api")
                .app_data(web::JsonConfig::default().limit(MAX_JSON_BYTES))
                .service(
                    web::scope("/notes")
                        .route("/{filename}", web::get().to(note::get))
                        .route("/{filename}", web::post().to(note::save)),
                )
                .service(
                    web::scope("/files")
                        .route("/verify-password", web::post().to(token::verify_password))
                        .route("/list", web::get().to(files::list))
                        .route("/{filename}/delete", web::post().to(files::delete))
                        .route("/{filename}", web::delete().to(files::delete))
                        .route("/{filename}/rename", web::post().to(files::rename))
                        .route("/{filename}/rename", web::put().to(files::rename)),
                ),
        )
        .route("/ws/{filename}", web::get().to(live_save::connect));
}
