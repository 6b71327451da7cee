//! Request extractors: caller identity, JSON bodies, criteria and uploads.

use crate::error::ApiError;
use crate::state::AppState;
use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Multipart, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use freelance_core::service::Upload;
use freelance_core::storage::schema::Table;
use freelance_core::{Actor, Criteria, Pageable};
use serde::de::DeserializeOwned;
use std::convert::Infallible;

pub const LOGIN_HEADER: &str = "x-auth-login";
pub const ROLES_HEADER: &str = "x-auth-roles";

/// The caller as asserted by the gateway. Missing headers mean anonymous.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Actor);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        let roles = header(ROLES_HEADER)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self(Actor::new(header(LOGIN_HEADER), roles)))
    }
}

/// `axum::Json` with rejections rendered as problem responses.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::malformed("invalidJson", rejection.body_text())),
        }
    }
}

/// Raw query pairs in request order, so repeated keys survive.
pub struct QueryPairs(pub Vec<(String, String)>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for QueryPairs {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::malformed("invalidQuery", e.body_text()))?;
        Ok(Self(pairs))
    }
}

impl QueryPairs {
    pub fn criteria(&self, table: &Table) -> Result<Criteria, ApiError> {
        Ok(Criteria::from_query(table, &self.0)?)
    }

    pub fn pageable(&self, table: &Table, state: &AppState) -> Result<Pageable, ApiError> {
        Ok(Pageable::from_query(table, &self.0, state.config.pagination.max_page_size)?)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// All file parts of a multipart body, keyed by part name.
pub struct Uploads(pub Vec<(String, Upload)>);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for Uploads {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::malformed("invalidMultipart", e.body_text()))?;

        let mut uploads = Vec::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::malformed("invalidMultipart", e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(String::from);
            let content_type = field.content_type().map(String::from);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::malformed("invalidMultipart", e.to_string()))?;
            uploads.push((
                name,
                Upload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                },
            ));
        }
        Ok(Self(uploads))
    }
}

impl Uploads {
    /// The first part named any of `names`.
    pub fn take(&mut self, names: &[&str]) -> Result<Upload, ApiError> {
        let index = self
            .0
            .iter()
            .position(|(name, _)| names.contains(&name.as_str()))
            .ok_or_else(|| ApiError::malformed("missingFile", format!("expected a '{}' part", names.join("' or '"))))?;
        Ok(self.0.remove(index).1)
    }

    pub fn named(self, name: &str) -> Vec<Upload> {
        self.0
            .into_iter()
            .filter(|(n, _)| n == name)
            .map(|(_, upload)| upload)
            .collect()
    }
}
