use reqwest::StatusCode;

/// An extension trait to help determine if a given HTTP response
/// warrants another attempt.
///
/// Any status of 500 or above is retried, including non-standard codes
/// past 599. Everything else, including `429 Too Many Requests`, is
/// handed back to the caller as-is.
pub(crate) trait RetryExt {
    fn should_retry(&self) -> bool;
}

impl RetryExt for StatusCode {
    fn should_retry(&self) -> bool {
        self.as_u16() >= 500
    }
}
