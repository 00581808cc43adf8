//! HTTP client for the Customer.io Track API
//!
//! Every public operation issues exactly one request and maps the reply onto
//! a single policy: status 200 is success, any other status is
//! [`Error::Http`], and a transport failure is [`Error::NoResponse`].
//! Nothing is retried.

use std::fmt;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::config::{TrackConfig, DEFAULT_ENDPOINT};
use crate::error::{Error, Result};
use crate::types::{AttributeValue, Attributes, Event};

/// Attributes `identify` refuses to send without
const IDENTIFY_REQUIRED: [&str; 2] = ["id", "email"];

const NO_RESPONSE: &str = "No response received";

/// Track API client.
///
/// Holds the credentials for one Customer.io site. Cheap to clone; clones
/// share the underlying connection pool.
#[derive(Clone)]
pub struct CustomerIo {
    site_id: String,
    auth_header: String,
    endpoint: String,
    http: reqwest::Client,
}

impl fmt::Debug for CustomerIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomerIo")
            .field("site_id", &self.site_id)
            .field("auth_header", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl CustomerIo {
    /// Create a client for `site_id`, authenticating with `api_key`.
    pub fn new(site_id: impl Into<String>, api_key: impl AsRef<str>) -> Self {
        let site_id = site_id.into();
        let auth_header = basic_auth(&site_id, api_key.as_ref());

        Self {
            site_id,
            auth_header,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Create a client from the `[track]` config section
    ///
    /// Returns an error if the site id or API key is missing.
    pub fn from_config(config: &TrackConfig) -> Result<Self> {
        config.validate()?;

        let site_id = config.site_id.clone().unwrap_or_default();
        let api_key = config.api_key.as_deref().unwrap_or_default();

        Ok(Self::new(site_id, api_key).with_endpoint(&config.endpoint))
    }

    /// Send requests to `endpoint` instead of the public Track API.
    pub fn with_endpoint(mut self, endpoint: impl AsRef<str>) -> Self {
        self.endpoint = endpoint.as_ref().trim_end_matches('/').to_string();
        self
    }

    /// Use a caller-built HTTP client (timeouts, proxies, etc.).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Create or update a customer.
    ///
    /// `attributes` must carry truthy `id` and `email` values. Dates are sent
    /// as Unix seconds.
    ///
    /// The `id` value becomes one percent-encoded path segment: strings as-is,
    /// anything else in its JSON form. `42` maps to `/v1/customers/42`, a nested
    /// value such as `{"k":1}` to `/v1/customers/%7B%22k%22%3A1%7D`.
    pub async fn identify(&self, attributes: Attributes) -> Result<()> {
        let missing: Vec<&str> = IDENTIFY_REQUIRED
            .iter()
            .copied()
            .filter(|key| !attributes.has_value(key))
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingRequiredField(format!(
                "The following parameters are required in `identify`: {}",
                missing.join(", ")
            )));
        }

        let customer_id = attributes
            .get("id")
            .map(AttributeValue::to_path_segment)
            .unwrap_or_default();
        let url = self.customer_url(&customer_id);
        let data = attributes.to_json();

        debug!(%url, "identify customer");

        let request = self
            .http
            .put(&url)
            .header(AUTHORIZATION, &self.auth_header)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&data)?);

        self.dispatch(request, url, Some(data)).await
    }

    /// Delete a customer.
    pub async fn remove(&self, customer_id: &str) -> Result<()> {
        if customer_id.is_empty() {
            return Err(Error::MissingRequiredField(
                "Please provide a `customerId` in the first argument of `remove`.".to_string(),
            ));
        }

        let url = self.customer_url(customer_id);

        debug!(%url, "remove customer");

        let request = self
            .http
            .delete(&url)
            .header(AUTHORIZATION, &self.auth_header);

        self.dispatch(request, url, None).await
    }

    /// Track an event for a customer.
    ///
    /// `event_type` tags the event kind, e.g. `Some("page")` for page views.
    pub async fn track(
        &self,
        customer_id: &str,
        event_name: &str,
        properties: Attributes,
        event_type: Option<&str>,
    ) -> Result<()> {
        let mut event = Event::new(event_name, properties);
        if let Some(event_type) = event_type.filter(|t| !t.is_empty()) {
            event = event.with_type(event_type);
        }
        self.track_event(customer_id, &event).await
    }

    /// Track a prebuilt [`Event`] for a customer.
    pub async fn track_event(&self, customer_id: &str, event: &Event) -> Result<()> {
        if customer_id.is_empty() {
            return Err(Error::MissingRequiredField(
                "Please provide a `customerId` in the first argument of `track`.".to_string(),
            ));
        }
        if event.name.is_empty() {
            return Err(Error::MissingRequiredField(
                "Please provide an `eventName` in the second argument of `track`.".to_string(),
            ));
        }

        let url = format!("{}/events", self.customer_url(customer_id));
        let data = serde_json::to_value(event)?;

        debug!(%url, event = %event.name, "track event");

        let request = self
            .http
            .post(&url)
            .header(AUTHORIZATION, &self.auth_header)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&data)?);

        self.dispatch(request, url, Some(data)).await
    }

    fn customer_url(&self, customer_id: &str) -> String {
        format!(
            "{}/v1/customers/{}",
            self.endpoint,
            urlencoding::encode(customer_id)
        )
    }

    /// Send `request` and apply the response policy.
    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        url: String,
        data: Option<serde_json::Value>,
    ) -> Result<()> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "Track API request failed without a response");
                return Err(Error::NoResponse {
                    message: NO_RESPONSE.to_string(),
                    url,
                    data,
                    reason: e.to_string(),
                });
            }
        };

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let body = read_error_body(response.text().await);

        warn!(%url, status = status.as_u16(), "Track API rejected request");

        Err(Error::Http {
            code: status.as_u16(),
            body,
        })
    }
}

/// `Basic base64(site_id:api_key)`
fn basic_auth(site_id: &str, api_key: &str) -> String {
    format!("Basic {}", B64.encode(format!("{}:{}", site_id, api_key)))
}

/// Error body of a rejected request; a body that could not be read keeps the read error
fn read_error_body<E: fmt::Display>(text: std::result::Result<String, E>) -> serde_json::Value {
    match text {
        Ok(text) => parse_error_body(&text),
        Err(e) => {
            warn!(error = %e, "failed to read Track API error body");
            serde_json::Value::String(format!("failed to read response body: {}", e))
        }
    }
}

/// Parse an error body, keeping non-JSON text as a JSON string
fn parse_error_body(text: &str) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
}
