use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("{message}")]
    BadRequest {
        message: String,
        entity: String,
        key: String,
    },

    #[error("{message}")]
    NotFound {
        message: String,
        entity: String,
        key: String,
    },

    #[error("{message}")]
    Forbidden {
        message: String,
        entity: String,
        key: String,
    },

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid filter: {0}")]
    InvalidCriteria(String),

    #[error("Constraint violation: {0}")]
    Conflict(String),

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Column decode error: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database connection lock poisoned")]
    Poisoned,
}

impl MarketError {
    pub fn bad_request(entity: &str, key: &str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }

    pub fn not_found(entity: &str, key: &str, message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }

    pub fn forbidden(entity: &str, key: &str, message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }

    /// Error key reported to clients as `error.<key>`.
    pub fn key(&self) -> &str {
        match self {
            Self::BadRequest { key, .. } | Self::NotFound { key, .. } | Self::Forbidden { key, .. } => key,
            Self::Unauthorized(_) => "unauthorized",
            Self::Validation(_) => "validation",
            Self::InvalidCriteria(_) => "invalidcriteria",
            Self::Conflict(_) => "conflict",
            _ => "internalServerError",
        }
    }

    pub fn entity(&self) -> Option<&str> {
        match self {
            Self::BadRequest { entity, .. }
            | Self::NotFound { entity, .. }
            | Self::Forbidden { entity, .. } => Some(entity),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for MarketError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, detail)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(detail.clone().unwrap_or_else(|| failure.to_string()))
            }
            _ => Self::Database {
                message: err.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
