use std::sync::Arc;

use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};

mod auth;
mod config;
mod errors;
mod handlers;
mod live_save;
mod models;
mod store;
mod utils;

use auth::AccessGate;
use config::Config;
use errors::ServerError;
use live_save::SessionRegistry;
use store::NoteStore;

/// Shared by every worker; built once from the process configuration.
pub struct AppState {
    pub store: NoteStore,
    pub gate: AccessGate,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, ServerError> {
        Ok(AppState {
            store: NoteStore::open(config)?,
            gate: AccessGate::new(config),
            sessions: Arc::new(SessionRegistry::new()),
        })
    }
}

#[cfg(test)]
impl AppState {
    pub fn for_tests(notes_dir: &std::path::Path) -> Self {
        AppState::new(&Config::for_tests(notes_dir)).expect("test state")
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("invalid configuration");
    let state = web::Data::new(AppState::new(&config).expect("failed to open the notes directory"));

    // roughly 120 requests per minute per client address
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(1)
        .burst_size(120)
        .finish()
        .expect("invalid rate limit configuration");

    let allowed_origin = config.allowed_origin.clone();
    log::info!("listening on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        let cors = match &allowed_origin {
            Some(origin) => Cors::default().allowed_origin(origin),
            None => Cors::default().allow_any_origin(),
        }
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Governor::new(&governor_conf))
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
