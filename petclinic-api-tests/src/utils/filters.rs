//! Diagnostic interceptors attached to every profile.
//!
//! Each filter sees the request just before it is sent and the exchange just
//! after the response body has been read. The logging pair writes both halves
//! to `tracing`, so a failed scenario can be diagnosed from its captured logs
//! without running it again.

use crate::utils::profiles::{CapturedRequest, Exchange};
use std::{fmt, sync::Arc};

/// Message of the event [`RequestLoggingFilter`] writes.
pub const REQUEST_SENT: &str = "request sent";

/// Message of the event [`ResponseLoggingFilter`] writes.
pub const RESPONSE_RECEIVED: &str = "response received";

/// Something that observes every call made through a profile.
pub trait ExchangeFilter: Send + Sync + fmt::Debug {
    /// Called before the request is sent.
    fn on_request(&self, _request: &CapturedRequest) {}

    /// Called once the response has been fully read.
    fn on_response(&self, _exchange: &Exchange) {}
}

/// An ordered, shared list of filters.
#[derive(Clone, Debug)]
pub struct FilterChain(Arc<[Arc<dyn ExchangeFilter>]>);

impl FilterChain {
    /// Wrap `filters`, keeping their order.
    pub fn new(filters: Vec<Arc<dyn ExchangeFilter>>) -> Self {
        Self(filters.into())
    }

    /// The number of filters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the chain has no filters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Run every filter's request hook, in order.
    pub fn on_request(&self, request: &CapturedRequest) {
        for filter in self.0.iter() {
            filter.on_request(request);
        }
    }

    /// Run every filter's response hook, in order.
    pub fn on_response(&self, exchange: &Exchange) {
        for filter in self.0.iter() {
            filter.on_response(exchange);
        }
    }
}

/// Logs each outgoing request.
#[derive(Debug, Default)]
pub struct RequestLoggingFilter;

impl ExchangeFilter for RequestLoggingFilter {
    fn on_request(&self, request: &CapturedRequest) {
        tracing::info!(
            method = %request.method,
            url = %request.url,
            headers = ?request.headers,
            body = %request.body_text(),
            "{}",
            REQUEST_SENT
        );
    }
}

/// Logs each response along with how long the call took.
#[derive(Debug, Default)]
pub struct ResponseLoggingFilter;

impl ExchangeFilter for ResponseLoggingFilter {
    fn on_response(&self, exchange: &Exchange) {
        tracing::info!(
            method = %exchange.request.method,
            url = %exchange.request.url,
            status = exchange.response.status.as_u16(),
            elapsed_ms = exchange.elapsed.as_millis() as u64,
            headers = ?exchange.response.headers,
            body = %exchange.response.body_text(),
            "{}",
            RESPONSE_RECEIVED
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{ExchangeFilter, FilterChain};
    use crate::utils::profiles::CapturedRequest;
    use pretty_assertions::assert_eq;
    use reqwest::{header::HeaderMap, Method};
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct Recorder {
        label: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ExchangeFilter for Recorder {
        fn on_request(&self, _request: &CapturedRequest) {
            self.seen.lock().unwrap().push(self.label);
        }
    }

    #[test]
    fn filters_run_in_the_order_given() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let chain = FilterChain::new(vec![
            Arc::new(Recorder {
                label: "first",
                seen: Arc::clone(&seen),
            }),
            Arc::new(Recorder {
                label: "second",
                seen: Arc::clone(&seen),
            }),
        ]);
        assert_eq!(chain.len(), 2);
        assert!(!chain.is_empty());

        chain.on_request(&CapturedRequest {
            method: Method::GET,
            url: "http://svc/api/vet/vets".to_string(),
            headers: HeaderMap::new(),
            body: None,
        });
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn an_empty_chain_does_nothing() {
        let chain = FilterChain::new(Vec::new());
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
    }
}
