//! Canned Overpass executor for tests and offline development.
//!
//! Replies are chosen by substring match on the query text, first rule wins.
//! Every query is recorded so tests can assert on what was asked.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::cancel::CancelToken;
use super::client::QueryExecutor;
use super::error::OverpassError;
use super::query::OverpassQuery;
use super::types::{OverpassElement, OverpassResponse};

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    reply: Result<Vec<OverpassElement>, OverpassError>,
}

#[derive(Debug, Default)]
struct MockState {
    rules: Vec<Rule>,
    queries: Vec<OverpassQuery>,
}

/// Mock executor with substring-matched replies.
///
/// Unmatched queries get an empty element list. Clones share rules and the
/// query log.
#[derive(Debug, Clone, Default)]
pub struct MockOverpass {
    state: Arc<Mutex<MockState>>,
    delay: Option<Duration>,
}

impl MockOverpass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait this long before answering. Cancellation during the wait is
    /// honoured.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer queries containing `pattern` with `elements`.
    pub fn reply(self, pattern: impl Into<String>, elements: Vec<OverpassElement>) -> Self {
        self.push_rule(pattern.into(), Ok(elements));
        self
    }

    /// Answer queries containing `pattern` with the elements of an Overpass
    /// JSON document.
    ///
    /// # Panics
    ///
    /// Panics if `json` is not a valid Overpass response.
    pub fn reply_json(self, pattern: impl Into<String>, json: &str) -> Self {
        let response: OverpassResponse =
            serde_json::from_str(json).expect("mock reply is not valid Overpass JSON");
        self.reply(pattern, response.elements)
    }

    /// Fail queries containing `pattern` with `error`.
    pub fn fail(self, pattern: impl Into<String>, error: OverpassError) -> Self {
        self.push_rule(pattern.into(), Err(error));
        self
    }

    /// Every query executed so far, in order.
    pub fn queries(&self) -> Vec<OverpassQuery> {
        self.lock().queries.clone()
    }

    /// Number of executed queries whose text contains `pattern`.
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.lock()
            .queries
            .iter()
            .filter(|q| q.text().contains(pattern))
            .count()
    }

    fn push_rule(&self, pattern: String, reply: Result<Vec<OverpassElement>, OverpassError>) {
        self.lock().rules.push(Rule { pattern, reply });
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panic while holding the lock only happens in a failing test.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn answer(&self, query: &OverpassQuery) -> Result<Vec<OverpassElement>, OverpassError> {
        let mut state = self.lock();
        state.queries.push(query.clone());
        state
            .rules
            .iter()
            .find(|rule| query.text().contains(&rule.pattern))
            .map(|rule| rule.reply.clone())
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

impl QueryExecutor for MockOverpass {
    async fn execute(
        &self,
        query: &OverpassQuery,
        cancel: &CancelToken,
    ) -> Result<Vec<OverpassElement>, OverpassError> {
        if cancel.is_cancelled() {
            return Err(OverpassError::Cancelled);
        }

        let reply = self.answer(query);

        if let Some(delay) = self.delay {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(OverpassError::Cancelled),
            }
        }

        reply
    }
}
