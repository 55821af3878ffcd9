use std::path::PathBuf;

use crate::errors::ServerError;

pub const MAX_CONTENT_CHARS: usize = 100_000;
pub const MAX_FILENAME_CHARS: usize = 200;

const DEFAULT_NOTES_DIR: &str = "./data";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 1440;

/// Process configuration, read once at startup and handed to every component.
#[derive(Clone, Debug)]
pub struct Config {
    pub notes_dir: PathBuf,
    pub secret_key: String,
    pub file_list_password: String,
    pub token_lifetime_minutes: i64,
    pub host: String,
    pub port: u16,
    pub allowed_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ServerError> {
        let secret_key = required("SECRET_KEY")?;
        let file_list_password = required("FILE_LIST_PASSWORD")?;

        let port = match std::env::var("PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|_| ServerError::EnvironmentError(format!("PORT {port} is not a valid port")))?,
            Err(_) => DEFAULT_PORT,
        };

        let token_lifetime_minutes = match std::env::var("TOKEN_LIFETIME_MINUTES") {
            Ok(minutes) => match minutes.parse::<i64>() {
                Ok(m) if m > 0 => m,
                _ => {
                    return Err(ServerError::EnvironmentError(
                        "TOKEN_LIFETIME_MINUTES must be a positive integer".to_string(),
                    ))
                }
            },
            Err(_) => DEFAULT_TOKEN_LIFETIME_MINUTES,
        };

        Ok(Config {
            notes_dir: std::env::var("NOTES_DIR")
                .unwrap_or_else(|_| DEFAULT_NOTES_DIR.to_string())
                .into(),
            secret_key,
            file_list_password,
            token_lifetime_minutes,
            host: std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port,
            allowed_origin: std::env::var("ALLOWED_ORIGIN")
                .ok()
                .filter(|origin| !origin.trim().is_empty()),
        })
    }
}

fn required(name: &str) -> Result<String, ServerError> {
    std::env::var(name).map_err(|e| ServerError::EnvironmentError(format!("{name}: {e}")))
}

#[cfg(test)]
impl Config {
    pub fn for_tests(notes_dir: &std::path::Path) -> Self {
        Config {
            notes_dir: notes_dir.to_path_buf(),
            secret_key: "test-secret".to_string(),
            file_list_password: "letmein".to_string(),
            token_lifetime_minutes: 60,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origin: None,
        }
    }
}
