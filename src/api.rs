// API client module: a small blocking HTTP client that talks to the
// PythonAnywhere REST API. Status codes are not judged here; every call
// hands the raw status and body back to the caller, which knows which
// codes a given step accepts.

use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Status and raw body of a finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Reply {
            status,
            body: body.into(),
        }
    }
}

/// The four request shapes the provisioning run needs. `ApiClient` is the
/// real implementation; tests script their own.
///
/// An `Err` means the request never produced a response (connection
/// refused, DNS, timeout). Any response at all, whatever its status, is an
/// `Ok(Reply)`.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Reply>;

    /// POST an `application/x-www-form-urlencoded` body.
    fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<Reply>;

    /// POST `content` as a single multipart file field named `field`.
    fn post_file(&self, url: &str, field: &str, content: Vec<u8>) -> Result<Reply>;

    /// POST with no body.
    fn post_empty(&self, url: &str) -> Result<Reply>;
}

/// Blocking reqwest client carrying the account's API token on every
/// request.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    headers: HeaderMap,
}

impl ApiClient {
    /// Build a client for `token`. `timeout` of `None` blocks until the
    /// server answers.
    pub fn new(token: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            headers: auth_headers(token)?,
        })
    }

    fn send(&self, method: &str, url: &str, req: RequestBuilder) -> Result<Reply> {
        let res = req
            .headers(self.headers.clone())
            .send()
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;
        let status = res.status();
        let body = res.text().unwrap_or_else(|_| "".into());
        debug!(method, url, status = status.as_u16(), "api response");
        Ok(Reply { status, body })
    }
}

impl Transport for ApiClient {
    fn get(&self, url: &str) -> Result<Reply> {
        self.send("GET", url, self.client.get(url))
    }

    fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<Reply> {
        self.send("POST", url, self.client.post(url).form(fields))
    }

    fn post_file(&self, url: &str, field: &str, content: Vec<u8>) -> Result<Reply> {
        // The field name doubles as the filename, which is what the files
        // endpoint sees from any browser-style upload of a bare string.
        let part = multipart::Part::bytes(content).file_name(field.to_string());
        let form = multipart::Form::new().part(field.to_string(), part);
        self.send("POST", url, self.client.post(url).multipart(form))
    }

    fn post_empty(&self, url: &str) -> Result<Reply> {
        self.send("POST", url, self.client.post(url))
    }
}

/// Authorization header map for the PythonAnywhere token scheme.
fn auth_headers(token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut val = HeaderValue::from_str(&format!("Token {}", token))
        .context("API token contains characters not allowed in an HTTP header")?;
    val.set_sensitive(true);
    headers.insert(AUTHORIZATION, val);
    Ok(headers)
}
