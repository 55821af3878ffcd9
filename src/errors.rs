use actix_web::{http::StatusCode, HttpResponse};
use derive_more::Display;
use serde_json::json;

#[derive(Debug, Display)]
pub enum ServerError {
    #[display(fmt = "{}", _0)]
    ValidationError(String),
    #[display(fmt = "File {} is not a valid text file", _0)]
    InvalidEncoding(String),
    #[display(fmt = "File {} not found", _0)]
    NotFound(String),
    #[display(fmt = "File {} already exists", _0)]
    Conflict(String),
    #[display(fmt = "{}", _0)]
    Unauthorized(&'static str),
    #[display(fmt = "Error {} file {}: {}", action, filename, source)]
    IoFailure {
        action: &'static str,
        filename: String,
        source: std::io::Error,
    },
    #[display(fmt = "Server Error: {}", _0)]
    EnvironmentError(String),
    #[display(fmt = "Library Error: JWT Library Malfunctioned")]
    JWTError,
    #[display(fmt = "Server Error: Blocking task was canceled")]
    BlockingError,
}

impl ServerError {
    pub fn io(action: &'static str, filename: impl Into<String>, source: std::io::Error) -> Self {
        ServerError::IoFailure {
            action,
            filename: filename.into(),
            source,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for ServerError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        log::error!("{e}");
        ServerError::JWTError
    }
}

impl From<actix_web::error::BlockingError> for ServerError {
    fn from(_: actix_web::error::BlockingError) -> Self {
        ServerError::BlockingError
    }
}

impl actix_web::error::ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::ValidationError(_)
            | ServerError::InvalidEncoding(_)
            | ServerError::Conflict(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::IoFailure { .. }
            | ServerError::EnvironmentError(_)
            | ServerError::JWTError
            | ServerError::BlockingError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{self}");
        }

        HttpResponse::build(self.status_code()).json(json!({ "detail": self.to_string() }))
    }
}
