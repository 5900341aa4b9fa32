//! Request normalization
//!
//! External callers hand the gateway loosely-typed JSON. Everything here is
//! lenient: a missing or wrong-typed field falls back to its default instead
//! of failing, and URL problems become structural reasons rather than errors.

use bytes::Bytes;
use serde_json::Value;
use url::{ParseError, Url};

/// HTTP methods the gateway will forward
pub const SUPPORTED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];

/// Reason recorded when the URL has no scheme
pub const MISSING_SCHEME: &str = "invalid url: missing scheme";

/// Reason recorded when the URL has no host
pub const MISSING_HOST: &str = "invalid url: missing host";

/// Device telemetry as reported by the client
///
/// Every field is optional; defaults are applied by the posture evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceContext {
    /// Device identifier
    pub device_id: Option<String>,
    /// Raw health flag reported by the endpoint agent
    pub healthy: Option<bool>,
    /// Posture score reported by the endpoint agent
    pub posture_score: Option<i64>,
}

impl DeviceContext {
    /// Build from a free-form JSON map, coercing what can be coerced
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };

        let device_id = match map.get("device_id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let healthy = match map.get("healthy") {
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0),
            _ => None,
        };

        let posture_score = match map.get("posture_score") {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };

        Self {
            device_id,
            healthy,
            posture_score,
        }
    }
}

/// Untyped request as received from a client or test harness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    /// Full destination URL
    pub url: String,
    /// HTTP method, as sent
    pub method: String,
    /// Bearer credential
    pub credential: Option<String>,
    /// Device telemetry
    pub device: DeviceContext,
    /// Request body
    pub body: Option<Bytes>,
}

impl RawRequest {
    /// Create a GET request for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            credential: None,
            device: DeviceContext::default(),
            body: None,
        }
    }

    /// Set the method
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Set the bearer credential
    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Set device telemetry
    pub fn device(mut self, device: DeviceContext) -> Self {
        self.device = device;
        self
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Build from a JSON object
    ///
    /// Accepts `token` or `credential` for the bearer credential. Scalars in
    /// the `url` slot are stringified; anything else falls back to defaults.
    /// A non-string `method` is kept as its JSON text so it is rejected as
    /// unsupported rather than read as `GET`.
    pub fn from_value(value: &Value) -> Self {
        let url = match value.get("url") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other @ (Value::Number(_) | Value::Bool(_))) => other.to_string(),
            Some(_) => String::new(),
        };

        let method = match value.get("method") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "GET".to_string(),
            Some(other) => other.to_string(),
        };

        let credential = value
            .get("token")
            .or_else(|| value.get("credential"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let device = value
            .get("device")
            .map(DeviceContext::from_value)
            .unwrap_or_default();

        let body = value
            .get("body")
            .and_then(Value::as_str)
            .map(|s| Bytes::copy_from_slice(s.as_bytes()));

        Self {
            url,
            method,
            credential,
            device,
            body,
        }
    }

    /// Whether the method is one the gateway forwards
    pub fn method_supported(&self) -> bool {
        let upper = self.method.to_ascii_uppercase();
        SUPPORTED_METHODS.contains(&upper.as_str())
    }

    /// Whether the method carries a body worth inspecting
    pub fn carries_body(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
    }
}

/// Destination extracted from a request URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Destination {
    /// Lower-cased host, empty when the URL has none
    pub domain: String,
    /// URL path, `/` when empty
    pub path: String,
}

/// Split a URL into its destination, collecting structural reasons
pub fn parse_destination(raw_url: &str) -> (Destination, Vec<String>) {
    let mut reasons = Vec::new();

    if raw_url.is_empty() {
        reasons.push(MISSING_SCHEME.to_string());
        reasons.push(MISSING_HOST.to_string());
        return (Destination::default(), reasons);
    }

    match Url::parse(raw_url) {
        Ok(url) => {
            let destination = destination_of(&url);
            if destination.domain.is_empty() {
                reasons.push(MISSING_HOST.to_string());
            }
            (destination, reasons)
        }
        Err(ParseError::RelativeUrlWithoutBase) => {
            reasons.push(MISSING_SCHEME.to_string());
            // "//host/path" still names a host
            let destination = raw_url
                .strip_prefix("//")
                .and_then(|rest| Url::parse(&format!("http://{rest}")).ok())
                .map(|url| destination_of(&url))
                .unwrap_or_default();
            if destination.domain.is_empty() {
                reasons.push(MISSING_HOST.to_string());
            }
            (destination, reasons)
        }
        Err(ParseError::EmptyHost) => {
            reasons.push(MISSING_HOST.to_string());
            (Destination::default(), reasons)
        }
        Err(err) => {
            reasons.push(format!("invalid url: {err}"));
            (Destination::default(), reasons)
        }
    }
}

fn destination_of(url: &Url) -> Destination {
    let domain = url
        .host_str()
        .unwrap_or_default()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_ascii_lowercase();
    let path = match url.path() {
        "" => "/".to_string(),
        p => p.to_string(),
    };
    Destination { domain, path }
}
