//! The uniform result wrapper every handler returns.
//!
//! ## Invariants
//! - `operationStatus` is `true` iff `data` is present.
//! - A successful envelope never carries an exception message; the success
//!   constructors take no diagnostic argument and
//!   [`ResultEnvelope::with_exception_message`] ignores successes.
//! - `message` is never empty; blank messages fall back to the defaults.

use serde::Serialize;
use serde_json::Value;

/// Title of successful envelopes.
pub const SUCCESS_TITLE: &str = "Success";
/// Title of failed envelopes.
pub const ERROR_TITLE: &str = "Operation Failed";
/// Default message of successful envelopes.
pub const SUCCESS_MESSAGE: &str = "The operation completed successfully.";
/// Default message of failed envelopes.
pub const ERROR_MESSAGE: &str = "The operation could not be completed.";

/// Operation result shared by every handler and returned verbatim over HTTP.
///
/// # Examples
/// ```
/// use guide_backend::domain::ResultEnvelope;
///
/// let ok = ResultEnvelope::success(3_u32).map(|n| n * 2);
/// assert!(ok.is_success());
/// assert_eq!(ok.data(), Some(&6));
///
/// let failed = ResultEnvelope::<u32>::failure("Business was not found.")
///     .with_exception_message("no live row");
/// assert!(!failed.is_success());
/// assert_eq!(failed.exception_message(), Some("no live row"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope<R> {
    operation_status: bool,
    data: Option<R>,
    error_data: Option<Value>,
    title: String,
    message: String,
    exception_message: Option<String>,
}

fn non_blank(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_owned()
    } else {
        text
    }
}

impl<R> ResultEnvelope<R> {
    /// Successful envelope with the default title and message.
    pub fn success(data: R) -> Self {
        Self::success_with(data, SUCCESS_TITLE, SUCCESS_MESSAGE)
    }

    /// Successful envelope with a custom title and message.
    pub fn success_with(data: R, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation_status: true,
            data: Some(data),
            error_data: None,
            title: non_blank(title.into(), SUCCESS_TITLE),
            message: non_blank(message.into(), SUCCESS_MESSAGE),
            exception_message: None,
        }
    }

    /// Failed envelope with a custom title.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation_status: false,
            data: None,
            error_data: None,
            title: non_blank(title.into(), ERROR_TITLE),
            message: non_blank(message.into(), ERROR_MESSAGE),
            exception_message: None,
        }
    }

    /// Failed envelope titled [`ERROR_TITLE`].
    pub fn failure(message: impl Into<String>) -> Self {
        Self::error(ERROR_TITLE, message)
    }

    /// Attach structured failure context. Ignored on success.
    #[must_use]
    pub fn with_error_data(mut self, error_data: Value) -> Self {
        if !self.operation_status {
            self.error_data = Some(error_data);
        }
        self
    }

    /// Attach diagnostic text. Ignored on success.
    #[must_use]
    pub fn with_exception_message(mut self, exception: impl Into<String>) -> Self {
        if !self.operation_status {
            self.exception_message = Some(exception.into());
        }
        self
    }

    /// Drop the diagnostic text before the envelope leaves the process.
    #[must_use]
    pub fn redact_diagnostics(mut self) -> Self {
        self.exception_message = None;
        self
    }

    pub fn is_success(&self) -> bool {
        self.operation_status
    }

    pub fn data(&self) -> Option<&R> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<R> {
        self.data
    }

    pub fn error_data(&self) -> Option<&Value> {
        self.error_data.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exception_message(&self) -> Option<&str> {
        self.exception_message.as_deref()
    }

    /// Transform the payload, keeping every other field.
    pub fn map<U, F>(self, f: F) -> ResultEnvelope<U>
    where
        F: FnOnce(R) -> U,
    {
        ResultEnvelope {
            operation_status: self.operation_status,
            data: self.data.map(f),
            error_data: self.error_data,
            title: self.title,
            message: self.message,
            exception_message: self.exception_message,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Envelope construction invariants.
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn success_carries_data_and_no_diagnostics() {
        let envelope = ResultEnvelope::success("ok").with_exception_message("ignored");
        assert!(envelope.is_success());
        assert_eq!(envelope.data(), Some(&"ok"));
        assert_eq!(envelope.exception_message(), None);
        assert_eq!(envelope.title(), SUCCESS_TITLE);
    }

    #[rstest]
    fn errors_never_carry_data() {
        let envelope = ResultEnvelope::<u8>::failure("Review was not found.")
            .with_error_data(json!({ "code": "not_found" }));
        assert!(!envelope.is_success());
        assert!(envelope.data().is_none());
        assert_eq!(envelope.title(), ERROR_TITLE);
        assert_eq!(envelope.error_data(), Some(&json!({ "code": "not_found" })));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_messages_fall_back_to_defaults(#[case] message: &str) {
        assert_eq!(ResultEnvelope::<u8>::failure(message).message(), ERROR_MESSAGE);
        assert_eq!(
            ResultEnvelope::success_with(1_u8, "", message).message(),
            SUCCESS_MESSAGE
        );
    }

    #[rstest]
    fn serialises_every_field_in_camel_case() {
        let value = serde_json::to_value(ResultEnvelope::<u8>::failure("nope")).expect("json");
        assert_eq!(
            value,
            json!({
                "operationStatus": false,
                "data": null,
                "errorData": null,
                "title": ERROR_TITLE,
                "message": "nope",
                "exceptionMessage": null,
            })
        );
    }

    #[rstest]
    fn redaction_strips_exception_text() {
        let envelope = ResultEnvelope::<u8>::failure("nope")
            .with_exception_message("connection refused")
            .redact_diagnostics();
        assert_eq!(envelope.exception_message(), None);
    }
}
