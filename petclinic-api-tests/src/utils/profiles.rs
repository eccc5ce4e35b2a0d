//! Reusable request templates.
//!
//! A [`RequestProfile`] fixes the base URL, default headers and logging
//! filters for a family of calls. Each run builds exactly two, one for reads
//! and one for calls that carry a JSON body, and hands them to every scenario
//! through [`Profiles`]. Profiles are never mutated after construction.

use crate::utils::{
    errors::HarnessError,
    filters::{FilterChain, RequestLoggingFilter, ResponseLoggingFilter},
};
use petclinic_settings::HttpSettings;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    redirect, Client, ClientBuilder, Method, StatusCode,
};
use serde::Serialize;
use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

/// The media type every profile negotiates.
const APPLICATION_JSON: &str = "application/json";

/// Which of the two profiles a request went through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileKind {
    /// `Accept: application/json`, no request body.
    Read,
    /// `Accept` and `Content-Type` both `application/json`.
    Write,
}

/// The pair of profiles shared by every scenario in a run.
#[derive(Debug)]
pub struct Profiles {
    /// For calls without a body.
    pub read: RequestProfile,
    /// For create and update calls.
    pub write: RequestProfile,
}

impl Profiles {
    /// Build both profiles against `base_url`, sharing one client and one
    /// filter chain.
    ///
    /// # Errors
    /// If the HTTP client cannot be constructed.
    pub fn new(base_url: &str, http: &HttpSettings) -> Result<Self, HarnessError> {
        let client = ClientBuilder::new()
            .redirect(redirect::Policy::none())
            .timeout(http.timeout)
            .connect_timeout(http.connect_timeout)
            // Every scenario runs on its own runtime. A pooled connection
            // would outlive the runtime that opened it.
            .pool_max_idle_per_host(0)
            .build()
            .map_err(HarnessError::Client)?;

        let filters = FilterChain::new(vec![
            Arc::new(RequestLoggingFilter),
            Arc::new(ResponseLoggingFilter),
        ]);

        Ok(Self {
            read: RequestProfile::new(ProfileKind::Read, base_url, client.clone(), filters.clone()),
            write: RequestProfile::new(ProfileKind::Write, base_url, client, filters),
        })
    }
}

/// An immutable request template.
#[derive(Clone, Debug)]
pub struct RequestProfile {
    /// Read or write.
    kind: ProfileKind,
    /// Prepended to every path, without a trailing slash.
    base_url: String,
    /// Sent on every request.
    headers: HeaderMap,
    /// The shared client.
    client: Client,
    /// Called around every request, in order.
    filters: FilterChain,
}

impl RequestProfile {
    /// Build a profile of the given kind.
    pub fn new(kind: ProfileKind, base_url: &str, client: Client, filters: FilterChain) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        if kind == ProfileKind::Write {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }

        Self {
            kind,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
            client,
            filters,
        }
    }

    /// Read or write.
    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The headers added to every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Start a request with an arbitrary method.
    ///
    /// The path must start with `/`, such as `/api/vet/vets`. Any other path
    /// is reported by [`ScenarioRequest::send`] without touching the network.
    pub fn request(&self, method: Method, path: &str) -> ScenarioRequest<'_> {
        ScenarioRequest {
            profile: self,
            method,
            url: format!("{}{}", self.base_url, path),
            relative_path: (!path.starts_with('/')).then(|| path.to_string()),
            query: Vec::new(),
            body: None,
        }
    }

    /// Start a GET request.
    pub fn get(&self, path: &str) -> ScenarioRequest<'_> {
        self.request(Method::GET, path)
    }

    /// Start a POST request.
    pub fn post(&self, path: &str) -> ScenarioRequest<'_> {
        self.request(Method::POST, path)
    }

    /// Start a PUT request.
    pub fn put(&self, path: &str) -> ScenarioRequest<'_> {
        self.request(Method::PUT, path)
    }
}

/// A single call being prepared through a profile.
#[must_use = "requests do nothing until sent"]
pub struct ScenarioRequest<'p> {
    /// Where headers, client and filters come from.
    profile: &'p RequestProfile,
    /// HTTP method.
    method: Method,
    /// Absolute URL, without the query string.
    url: String,
    /// Set when the caller's path did not start with `/`.
    relative_path: Option<String>,
    /// Query parameters, in order.
    query: Vec<(String, String)>,
    /// Serialized JSON body, if any.
    body: Option<Vec<u8>>,
}

impl<'p> ScenarioRequest<'p> {
    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Serialize `body` as the JSON request body.
    ///
    /// # Errors
    /// If `body` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HarnessError> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Send the request and read the whole response.
    ///
    /// Only the send and the body read are timed, so the duration on the
    /// returned [`Exchange`] belongs to this call alone.
    ///
    /// # Errors
    /// If the path was not absolute, or no response could be obtained.
    pub async fn send(self) -> Result<Exchange, HarnessError> {
        let Self {
            profile,
            method,
            url,
            relative_path,
            query,
            body,
        } = self;
        if let Some(path) = relative_path {
            return Err(HarnessError::RelativePath { path });
        }
        let transport = |source: reqwest::Error| HarnessError::Transport {
            method: method.clone(),
            url: url.clone(),
            source,
        };

        let mut builder = profile
            .client
            .request(method.clone(), &url)
            .headers(profile.headers.clone());
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = &body {
            builder = builder.body(body.clone());
        }
        let request = builder.build().map_err(transport)?;

        let captured_request = CapturedRequest {
            method: request.method().clone(),
            url: request.url().to_string(),
            headers: request.headers().clone(),
            body,
        };
        profile.filters.on_request(&captured_request);

        let started = Instant::now();
        let response = profile.client.execute(request).await.map_err(transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(transport)?.to_vec();
        let elapsed = started.elapsed();

        let exchange = Exchange {
            request: captured_request,
            response: CapturedResponse {
                status,
                headers,
                body,
            },
            elapsed,
            profile: profile.kind,
        };
        profile.filters.on_response(&exchange);
        Ok(exchange)
    }
}

/// The request half of an exchange, as it went on the wire.
#[derive(Clone, Debug)]
pub struct CapturedRequest {
    /// HTTP method.
    pub method: Method,
    /// Full URL including any query string.
    pub url: String,
    /// Headers the profile attached.
    pub headers: HeaderMap,
    /// The body, if one was sent.
    pub body: Option<Vec<u8>>,
}

impl CapturedRequest {
    /// The body as text, or an empty string.
    pub fn body_text(&self) -> String {
        self.body
            .as_deref()
            .map(|body| String::from_utf8_lossy(body).into_owned())
            .unwrap_or_default()
    }
}

/// The response half of an exchange, fully read.
#[derive(Clone, Debug)]
pub struct CapturedResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// The raw body. Empty for 204 responses.
    pub body: Vec<u8>,
}

impl CapturedResponse {
    /// The body as text.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// One call under test: what was sent, what came back, and how long it took.
#[derive(Clone, Debug)]
pub struct Exchange {
    /// What was sent.
    pub request: CapturedRequest,
    /// What came back.
    pub response: CapturedResponse,
    /// Wall clock time from sending the request to reading the last body byte.
    pub elapsed: Duration,
    /// The profile the call went through.
    pub profile: ProfileKind,
}

impl Exchange {
    /// The response status.
    pub fn status(&self) -> StatusCode {
        self.response.status
    }
}

/// Write headers one per line, indented to line up under a label.
fn write_headers(f: &mut fmt::Formatter<'_>, headers: &HeaderMap) -> fmt::Result {
    if headers.is_empty() {
        return writeln!(f, "Headers:\t<none>");
    }
    for (idx, (name, value)) in headers.iter().enumerate() {
        let label = if idx == 0 { "Headers:" } else { "" };
        writeln!(
            f,
            "{}\t{}={}",
            label,
            name,
            value.to_str().unwrap_or("<binary>")
        )?;
    }
    Ok(())
}

impl fmt::Display for CapturedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Request method:\t{}", self.method)?;
        writeln!(f, "Request URI:\t{}", self.url)?;
        write_headers(f, &self.headers)?;
        match &self.body {
            Some(_) => writeln!(f, "Body:\n{}", self.body_text()),
            None => writeln!(f, "Body:\t<none>"),
        }
    }
}

impl fmt::Display for CapturedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status:\t{}", self.status)?;
        write_headers(f, &self.headers)?;
        if self.body.is_empty() {
            writeln!(f, "Body:\t<empty>")
        } else {
            writeln!(f, "Body:\n{}", self.body_text())
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- request ({:?} profile) ---", self.profile)?;
        write!(f, "{}", self.request)?;
        writeln!(f, "--- response after {:?} ---", self.elapsed)?;
        write!(f, "{}", self.response)
    }
}
