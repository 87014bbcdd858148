use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

use crate::model::UserId;
use crate::{DEFAULT_API_BASE_URL, USERS_PATH};

pub const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedUrl {
    url: String,
    scheme: String,
    host: String,
}

impl ValidatedUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, HttpError> {
        let url = url.into();
        let parsed = Self::validate(&url)?;

        let scheme = parsed.scheme().to_lowercase();
        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl {
                url: Self::truncate_url(&url),
                reason: "missing host".to_string(),
            })?
            .to_lowercase();

        Ok(Self {
            url: parsed.to_string(),
            scheme,
            host,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn validate(url: &str) -> Result<Url, HttpError> {
        if url.trim().is_empty() {
            return Err(HttpError::InvalidUrl {
                url: url.to_string(),
                reason: "URL cannot be empty".to_string(),
            });
        }

        if url.len() > MAX_URL_LENGTH {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            });
        }

        let parsed = Url::parse(url.trim()).map_err(|e| HttpError::InvalidUrl {
            url: Self::truncate_url(url),
            reason: e.to_string(),
        })?;

        let scheme = parsed.scheme().to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: format!(
                    "invalid scheme '{scheme}', only 'http' and 'https' are allowed"
                ),
            });
        }

        if parsed.host_str().is_none() {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "URL must have a host".to_string(),
            });
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "credentials in URL are not allowed".to_string(),
            });
        }

        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(HttpError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "base URL cannot carry a query or fragment".to_string(),
            });
        }

        Ok(parsed)
    }

    fn truncate_url(url: &str) -> String {
        match url.char_indices().nth(100) {
            Some((idx, _)) => format!("{}...", &url[..idx]),
            None => url.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn has_request_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addresses of the users collection and its items under one base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersEndpoint {
    base: String,
}

impl UsersEndpoint {
    pub fn new(base: &ValidatedUrl) -> Self {
        Self {
            base: base.as_str().trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn collection(&self) -> String {
        format!("{}{}", self.base, USERS_PATH)
    }

    /// Address of one user. The id always lands in a single path segment,
    /// percent-encoded, so it cannot step outside the collection.
    pub fn item(&self, id: &UserId) -> Result<String, HttpError> {
        let segment = id.to_string();
        if matches!(segment.as_str(), "" | "." | "..") {
            return Err(HttpError::InvalidRequest {
                reason: format!("'{segment}' is not a usable user id"),
            });
        }

        let collection = self.collection();
        let mut url = Url::parse(&collection).map_err(|e| HttpError::InvalidUrl {
            url: collection.clone(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|()| HttpError::InvalidUrl {
                url: collection.clone(),
                reason: "URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .push(&segment);
        Ok(url.into())
    }
}

impl Default for UsersEndpoint {
    fn default() -> Self {
        Self {
            base: DEFAULT_API_BASE_URL.trim_end_matches('/').to_string(),
        }
    }
}

/// One call against the users resource, before it is handed to the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    method: HttpMethod,
    url: String,
    body: Option<Vec<u8>>,
}

impl ResourceRequest {
    pub fn list(endpoint: &UsersEndpoint) -> Self {
        Self {
            method: HttpMethod::Get,
            url: endpoint.collection(),
            body: None,
        }
    }

    pub fn create<T: Serialize>(endpoint: &UsersEndpoint, payload: &T) -> Result<Self, HttpError> {
        Self {
            method: HttpMethod::Post,
            url: endpoint.collection(),
            body: None,
        }
        .with_json(payload)
    }

    pub fn update<T: Serialize>(
        endpoint: &UsersEndpoint,
        id: &UserId,
        payload: &T,
    ) -> Result<Self, HttpError> {
        Self {
            method: HttpMethod::Put,
            url: endpoint.item(id)?,
            body: None,
        }
        .with_json(payload)
    }

    pub fn delete(endpoint: &UsersEndpoint, id: &UserId) -> Result<Self, HttpError> {
        Ok(Self {
            method: HttpMethod::Delete,
            url: endpoint.item(id)?,
            body: None,
        })
    }

    fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, HttpError> {
        if !self.method.has_request_body() {
            return Err(HttpError::InvalidRequest {
                reason: format!("{} requests cannot have a body", self.method),
            });
        }

        let body = serde_json::to_vec(value).map_err(|e| HttpError::SerializationError {
            message: e.to_string(),
        })?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },
}
