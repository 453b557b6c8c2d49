//! The abort reason delivered to observers, and the options that shape it.
//!
//! The reason is built once, when the signal is constructed, so that its
//! contents describe the call site that created the signal rather than the
//! moment the timer happened to elapse.

use thiserror::Error;

/// The cause delivered to observers when a signal aborts.
///
/// A reason always has three textual fields: a human-readable `message`, a
/// symbolic `name`, and a machine-readable `code`. All three default to the
/// conventional abort values and can be overridden via [`SignalOptions`].
///
/// `AbortReason` implements [`std::error::Error`], so it can be boxed or
/// wrapped into whatever error type the caller surfaces on timeout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AbortReason {
    message: String,
    name: String,
    code: String,
}

impl AbortReason {
    /// Default human-readable message.
    pub const DEFAULT_MESSAGE: &'static str = "The operation was aborted";
    /// Default symbolic name.
    pub const DEFAULT_NAME: &'static str = "AbortError";
    /// Default machine-readable code.
    pub const DEFAULT_CODE: &'static str = "ABORT_ERR";

    /// The human-readable message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The symbolic error name, `"AbortError"` unless overridden.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The machine-readable code, `"ABORT_ERR"` unless overridden.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Always `"aborted"`.
    ///
    /// Distinguishes this cause from other error kinds a caller may funnel
    /// through the same channel; it is not overridable.
    pub fn kind(&self) -> &'static str {
        "aborted"
    }
}

impl Default for AbortReason {
    fn default() -> Self {
        SignalOptions::default().into()
    }
}

/// Optional overrides for the three [`AbortReason`] fields.
///
/// Every field is optional; `None` keeps the default.
///
/// # Example
///
/// ```
/// use retimeable_signal::SignalOptions;
///
/// let options = SignalOptions {
///     error_message: Some("upstream fetch timed out".to_string()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Default, Clone)]
pub struct SignalOptions {
    /// Overrides the default message text.
    pub error_message: Option<String>,
    /// Overrides the default machine-readable code.
    pub error_code: Option<String>,
    /// Overrides the default symbolic name.
    pub error_name: Option<String>,
}

impl From<SignalOptions> for AbortReason {
    fn from(options: SignalOptions) -> Self {
        Self {
            message: options
                .error_message
                .unwrap_or_else(|| AbortReason::DEFAULT_MESSAGE.to_string()),
            name: options
                .error_name
                .unwrap_or_else(|| AbortReason::DEFAULT_NAME.to_string()),
            code: options
                .error_code
                .unwrap_or_else(|| AbortReason::DEFAULT_CODE.to_string()),
        }
    }
}
