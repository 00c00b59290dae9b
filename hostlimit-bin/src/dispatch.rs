use hostlimit_lib::{RateLimitError, RateLimitedClient, Transport};
use log::info;
use reqwest::{Method, StatusCode, blocking::Request, header::HeaderMap};
use std::fmt;
use std::num::NonZeroUsize;
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use url::Url;

/// What happened to one URL
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) url: Url,
    pub(crate) elapsed: Duration,
    pub(crate) result: Result<StatusCode, RateLimitError>,
}

impl Outcome {
    /// Transport errors and any status of 400 or above count as failures
    pub(crate) fn is_success(&self) -> bool {
        matches!(&self.result, Ok(status) if status.as_u16() < 400)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(status) => write!(
                f,
                "[{}] {} ({}ms)",
                status.as_u16(),
                self.url,
                self.elapsed.as_millis()
            ),
            Err(e) => write!(f, "[ERROR] {} | {e}", self.url),
        }
    }
}

/// Fetch all URLs through one shared client, with at most
/// `max_concurrency` worker threads picking URLs off a shared cursor.
///
/// Outcomes are returned in the order of `urls`.
pub(crate) fn fetch_all<T: Transport>(
    client: &RateLimitedClient<T>,
    urls: &[Url],
    headers: &HeaderMap,
    max_concurrency: NonZeroUsize,
) -> Vec<Outcome> {
    let workers = max_concurrency.get().min(urls.len());
    let next = AtomicUsize::new(0);

    let mut outcomes: Vec<(usize, Outcome)> = thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let next = &next;
                s.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(url) = urls.get(index) else {
                            return done;
                        };
                        done.push((index, fetch(client, url, headers)));
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    });

    outcomes.sort_by_key(|(index, _)| *index);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}

fn fetch<T: Transport>(client: &RateLimitedClient<T>, url: &Url, headers: &HeaderMap) -> Outcome {
    let mut request = Request::new(Method::GET, url.clone());
    request.headers_mut().extend(headers.clone());

    let start = Instant::now();
    let result = client.send(request).map(|response| response.status());
    let elapsed = start.elapsed();

    info!("Finished {url} after {}ms", elapsed.as_millis());
    Outcome {
        url: url.clone(),
        elapsed,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success() {
        let outcome = |result| Outcome {
            url: Url::parse("https://example.com").unwrap(),
            elapsed: Duration::from_millis(12),
            result,
        };

        assert!(outcome(Ok(StatusCode::OK)).is_success());
        assert!(outcome(Ok(StatusCode::MOVED_PERMANENTLY)).is_success());
        assert!(!outcome(Ok(StatusCode::NOT_FOUND)).is_success());
        assert!(!outcome(Ok(StatusCode::SERVICE_UNAVAILABLE)).is_success());
        assert!(!outcome(Ok(StatusCode::from_u16(600).unwrap())).is_success());

        let invalid = RateLimitError::InvalidRequest {
            url: Url::parse("file:///tmp").unwrap(),
        };
        assert!(!outcome(Err(invalid)).is_success());
    }

    #[test]
    fn test_outcome_display() {
        let outcome = Outcome {
            url: Url::parse("https://example.com/a").unwrap(),
            elapsed: Duration::from_millis(12),
            result: Ok(StatusCode::OK),
        };
        assert_eq!(outcome.to_string(), "[200] https://example.com/a (12ms)");
    }
}
