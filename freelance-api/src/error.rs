use crate::headers;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use freelance_core::MarketError;
use serde::Serialize;
use tracing::{error, warn};

pub type ApiResult<T> = Result<T, ApiError>;

/// A [`MarketError`] rendered as an `application/problem+json` response.
#[derive(Debug)]
pub struct ApiError(pub MarketError);

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Malformed JSON, multipart or path input.
    pub fn malformed(key: &str, detail: impl Into<String>) -> Self {
        Self(MarketError::bad_request("request", key, detail))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MarketError::BadRequest { .. } | MarketError::Validation(_) | MarketError::InvalidCriteria(_) => {
                StatusCode::BAD_REQUEST
            }
            MarketError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            MarketError::Forbidden { .. } => StatusCode::FORBIDDEN,
            MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
            MarketError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Problem {
    title: String,
    status: u16,
    detail: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_name: Option<String>,
    error_key: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    field_errors: Vec<FieldError>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldError {
    object_name: String,
    field: String,
    message: String,
}

fn field_errors(err: &MarketError) -> Vec<FieldError> {
    let MarketError::Validation(errors) = err else {
        return Vec::new();
    };
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = camel_case(&field);
            errs.iter().map(move |e| FieldError {
                object_name: "request".to_string(),
                field: field.clone(),
                message: e.code.to_string(),
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let err = &self.0;
        if status.is_server_error() {
            error!(error = %err, "request failed");
        } else {
            warn!(status = status.as_u16(), key = err.key(), "request rejected: {}", err);
        }

        let key = err.key().to_string();
        let entity = err.entity().map(str::to_string);
        let detail = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            err.to_string()
        };
        let problem = Problem {
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status: status.as_u16(),
            detail,
            message: format!("error.{key}"),
            entity_name: entity.clone(),
            field_errors: field_errors(err),
            error_key: key.clone(),
        };

        let mut response = (status, Json(problem)).into_response();
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/problem+json"));
        headers.extend(headers::failure_alert(entity.as_deref().unwrap_or_default(), &key));
        response
    }
}
