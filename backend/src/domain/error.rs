//! Failures surfaced by the library services.
//!
//! An [`Error`] pairs a coarse [`ErrorCode`] with a message and optional
//! structured details. Most details are a single `code` reason such as
//! `profile_not_synchronised` or `duplicate_purchase`; [`Error::with_reason`]
//! and [`Error::with_detail`] build them without hand-written JSON. Adapters
//! choose the wire status and call [`Error::redacted`] before anything leaves
//! the process.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::TraceId;

/// Response header carrying the request trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

const REDACTED_MESSAGE: &str = "Internal server error";

/// Failure category shared by every adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed input or a refused upload.
    InvalidRequest,
    /// Missing or rejected credential.
    Unauthorized,
    /// Signed in, but the role or account state forbids the action.
    Forbidden,
    NotFound,
    /// Duplicate registration or a repeated purchase.
    Conflict,
    /// A store or the identity service is unreachable; retrying may help.
    ServiceUnavailable,
    InternalError,
}

impl ErrorCode {
    /// Whether clients may see the message and details as raised.
    #[must_use]
    pub const fn is_public(self) -> bool {
        !matches!(self, Self::InternalError)
    }
}

/// A service failure with its category, message and optional details.
///
/// The trace id in scope at construction is captured so logs and responses
/// can be correlated.
///
/// # Examples
/// ```
/// use library_backend::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("book not found").with_reason("not_found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(err.reason(), Some("not_found"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "trace_id")]
    trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

macro_rules! shorthand {
    ($($(#[$doc:meta])* $name:ident => $code:ident;)+) => {
        $(
            $(#[$doc])*
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new(ErrorCode::$code, message)
            }
        )+
    };
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    shorthand! {
        invalid_request => InvalidRequest;
        unauthorized => Unauthorized;
        forbidden => Forbidden;
        not_found => NotFound;
        conflict => Conflict;
        /// For store and identity-service outages.
        service_unavailable => ServiceUnavailable;
        internal => InternalError;
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// The machine-readable `details.code`, when one was attached.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.details.as_ref()?.get("code")?.as_str()
    }

    #[must_use]
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Replace the details wholesale.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Set `details.code`, keeping any other detail fields.
    #[must_use]
    pub fn with_reason(self, reason: &str) -> Self {
        self.with_detail("code", reason)
    }

    /// Set one field of the details object.
    ///
    /// Non-object details are replaced by an object holding only `key`.
    ///
    /// # Examples
    /// ```
    /// use library_backend::domain::Error;
    ///
    /// let err = Error::invalid_request("mobile is required")
    ///     .with_reason("missing_field")
    ///     .with_detail("field", "mobile");
    /// assert_eq!(
    ///     err.details(),
    ///     Some(&serde_json::json!({ "code": "missing_field", "field": "mobile" }))
    /// );
    /// ```
    #[must_use]
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        let mut fields = match self.details.take() {
            Some(Value::Object(fields)) => fields,
            _ => Map::new(),
        };
        fields.insert(key.to_owned(), value.into());
        self.details = Some(Value::Object(fields));
        self
    }

    /// The form clients may see: internal failures lose their message and
    /// details but keep the trace id.
    #[must_use]
    pub fn redacted(&self) -> Self {
        if self.code.is_public() {
            return self.clone();
        }
        Self {
            code: self.code,
            message: REDACTED_MESSAGE.to_owned(),
            trace_id: self.trace_id.clone(),
            details: None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}
