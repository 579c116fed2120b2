//! Request interception: filter, classify, dispatch
//!
//! The interceptor is the read-path entry point. Anything that is not a GET
//! over http(s) bypasses the engine untouched; everything else is classified
//! against the rule table and handed to the matching strategy.

use crate::error::Result;
use crate::models::{InboundRequest, ResponseSnapshot};
use crate::rules::RuleTable;
use crate::strategy::StrategyEngine;
use http::Method;
use std::sync::Arc;
use tracing::debug;

/// What the host should do with an intercepted request
#[derive(Debug)]
pub enum FetchOutcome {
    /// The engine did not touch the request; the host performs it itself
    /// with whatever failure behavior the underlying transport provides
    Bypass,
    /// The engine resolved the request to this response
    Response(ResponseSnapshot),
}

/// The read-path entry point
pub struct RequestInterceptor {
    rules: RuleTable,
    strategies: Arc<StrategyEngine>,
}

impl RequestInterceptor {
    /// Create a new RequestInterceptor
    pub fn new(rules: RuleTable, strategies: Arc<StrategyEngine>) -> Self {
        RequestInterceptor { rules, strategies }
    }

    /// Intercept an inbound request
    ///
    /// Non-GET methods and non-http(s) schemes bypass before any rule lookup
    /// or cache access. For everything else the engine always resolves to
    /// some response (cached, fresh, or synthetic unavailable) except where a
    /// strategy's contract propagates a network failure.
    pub async fn intercept(&self, request: &InboundRequest) -> Result<FetchOutcome> {
        if request.method != Method::GET {
            debug!(method = %request.method, url = %request.url, "bypassing non-GET request");
            return Ok(FetchOutcome::Bypass);
        }

        match request.scheme() {
            Some("http") | Some("https") => {}
            other => {
                debug!(scheme = ?other, url = %request.url, "bypassing non-http request");
                return Ok(FetchOutcome::Bypass);
            }
        }

        let classification = self.rules.classify(request.path());
        debug!(
            url = %request.url,
            strategy = classification.strategy.as_str(),
            max_age_secs = classification.max_age.map(|d| d.as_secs()),
            "request classified"
        );

        let response = self
            .strategies
            .execute(classification.strategy, request, classification.max_age)
            .await?;
        Ok(FetchOutcome::Response(response))
    }
}
