//! HTTP transport shared by the record and auth services

use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use url::Url;

use crate::error::{ApiErrorBody, Error, Result};

/// Upper bound on `next` links followed for a single collection.
const MAX_PAGES: usize = 1_000;

/// Async client for the case-management REST API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a client for the backend rooted at `base_url`
    /// (e.g. `http://localhost:8000`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("casedesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: normalize_base(base_url)?,
            token: None,
        })
    }

    /// Attach a bearer token to every subsequent request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let res = builder.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let bytes = res.bytes().await.unwrap_or_default();
        let body = ApiErrorBody::from_bytes(&bytes);
        tracing::debug!(
            status = status.as_u16(),
            error_message = body.message().unwrap_or_default(),
            "API request failed"
        );
        Err(Error::Api {
            status: status.as_u16(),
            body,
        })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(%url, "GET");
        let res = self.send(self.request(Method::GET, url)).await?;
        Ok(res.json().await?)
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "POST");
        let res = self
            .send(self.request(Method::POST, url).json(body))
            .await?;
        read_json(res).await
    }

    pub(crate) async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "PATCH");
        let res = self
            .send(self.request(Method::PATCH, url).json(body))
            .await?;
        read_json(res).await
    }

    pub(crate) async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "DELETE");
        let res = self.send(self.request(Method::DELETE, url)).await?;
        read_json(res).await
    }

    /// Fetch a whole collection, following `next` links of paginated
    /// responses so callers always receive the materialized list.
    pub(crate) async fn fetch_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut url = self.endpoint(path)?;
        let mut out = Vec::new();

        for _ in 0..MAX_PAGES {
            let listing: Listing<T> = self.get_json(url.clone()).await?;
            let (items, next) = listing.into_parts();
            out.extend(items);

            match next {
                Some(next) => {
                    let next = Url::parse(&next).or_else(|_| self.endpoint(&next))?;
                    if next == url {
                        break;
                    }
                    url = next;
                }
                None => return Ok(out),
            }
        }

        tracing::warn!(path, pages = MAX_PAGES, "Stopped following pagination links");
        Ok(out)
    }
}

/// Response shapes used by the backend's list endpoints.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Paged {
        results: Vec<T>,
        #[serde(default)]
        next: Option<String>,
    },
    Patients {
        patients: Vec<T>,
    },
    Cases {
        cases: Vec<T>,
    },
}

impl<T> Listing<T> {
    fn into_parts(self) -> (Vec<T>, Option<String>) {
        match self {
            Self::Bare(items) => (items, None),
            Self::Paged { results, next } => (results, next),
            Self::Patients { patients } => (patients, None),
            Self::Cases { cases } => (cases, None),
        }
    }
}

/// Decode a JSON body, treating an empty body (e.g. `204 No Content`) as `{}`.
async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T> {
    let bytes = res.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(JsonValue::Object(Default::default()))?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

fn normalize_base(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Ok(Url::parse(&with_slash)?)
}
