//! Debounced city autocomplete.
//!
//! Keystrokes go through [`SearchSession`], a small synchronous state machine:
//! a debounce ticket (bumped per keystroke), the last effective query (for
//! de-duplication) and a request generation. A response is applied only if
//! its generation is still current when it arrives.

use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

use crate::{
    coordinator::WeatherRequestCoordinator,
    error::WeatherLookupError,
    model::{SearchCandidate, WeatherSnapshot},
    provider::{DEFAULT_SEARCH_LIMIT, WeatherProvider, is_searchable},
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub debounce: Duration,
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// What the search box renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchView {
    pub query: String,
    pub candidates: Vec<SearchCandidate>,
    /// A request for the latest effective query is in flight.
    pub busy: bool,
    /// The suggestion list is shown.
    pub open: bool,
    /// A keystroke is waiting for the debounce window to pass.
    pub pending: bool,
}

impl SearchView {
    pub fn is_settled(&self) -> bool {
        !self.pending && !self.busy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Below the search threshold; suggestions were cleared right away.
    Cleared,
    /// Wait out the debounce window, then settle with this ticket.
    Debounce(u64),
}

/// A request to issue: generation tag and query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSearch {
    pub generation: u64,
    pub query: String,
}

#[derive(Debug, Default)]
pub struct SearchSession {
    view: SearchView,
    ticket: u64,
    last_effective: Option<String>,
    generation: u64,
}

impl SearchSession {
    pub fn view(&self) -> &SearchView {
        &self.view
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn input(&mut self, text: &str) -> InputAction {
        self.view.query = text.to_string();
        self.ticket += 1;

        if !is_searchable(text) {
            // Anything in flight is now stale.
            self.generation += 1;
            self.last_effective = Some(text.to_string());
            self.view.candidates.clear();
            self.view.open = false;
            self.view.busy = false;
            self.view.pending = false;
            return InputAction::Cleared;
        }

        self.view.pending = true;
        InputAction::Debounce(self.ticket)
    }

    /// Debounce window for `ticket` has elapsed. Returns the request to issue,
    /// if any: none when a later keystroke re-armed the timer or when the
    /// effective query did not change.
    pub fn settle(&mut self, ticket: u64) -> Option<IssuedSearch> {
        if ticket != self.ticket {
            return None;
        }
        self.view.pending = false;

        if self.last_effective.as_deref() == Some(self.view.query.as_str()) {
            return None;
        }

        self.last_effective = Some(self.view.query.clone());
        self.generation += 1;
        self.view.busy = true;

        Some(IssuedSearch {
            generation: self.generation,
            query: self.view.query.clone(),
        })
    }

    /// Apply a response. Returns false when it was stale and discarded.
    /// Failures leave the list empty.
    pub fn complete<E>(&mut self, generation: u64, result: Result<Vec<SearchCandidate>, E>) -> bool {
        if generation != self.generation {
            return false;
        }

        self.view.busy = false;
        self.view.candidates = result.unwrap_or_default();
        self.view.open = !self.view.candidates.is_empty();
        true
    }

    pub fn select(&mut self, candidate: &SearchCandidate) {
        self.view.query = candidate.label();
        self.view.open = false;
    }

    pub fn focus(&mut self) {
        if !self.view.candidates.is_empty() {
            self.view.open = true;
        }
    }

    pub fn blur(&mut self) {
        self.view.open = false;
    }
}

/// The search box. Cheap to clone; clones share one session.
///
/// `on_input` spawns the debounce timer on the current tokio runtime.
#[derive(Debug, Clone)]
pub struct CitySearchAutocomplete {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    provider: Arc<dyn WeatherProvider>,
    options: SearchOptions,
    session: Mutex<SearchSession>,
    view: watch::Sender<SearchView>,
}

impl Inner {
    fn update<R>(&self, f: impl FnOnce(&mut SearchSession) -> R) -> R {
        let mut session = self.session.lock();
        let out = f(&mut session);
        self.view.send_replace(session.view().clone());
        out
    }
}

impl CitySearchAutocomplete {
    pub fn new(provider: Arc<dyn WeatherProvider>, options: SearchOptions) -> Self {
        let (view, _) = watch::channel(SearchView::default());
        Self {
            inner: Arc::new(Inner {
                provider,
                options,
                session: Mutex::new(SearchSession::default()),
                view,
            }),
        }
    }

    pub fn options(&self) -> SearchOptions {
        self.inner.options
    }

    pub fn view(&self) -> SearchView {
        self.inner.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.inner.view.subscribe()
    }

    /// Feed one change of the raw query text.
    pub fn on_input(&self, text: &str) {
        match self.inner.update(|s| s.input(text)) {
            InputAction::Cleared => {}
            InputAction::Debounce(ticket) => {
                tokio::spawn(debounce(self.inner.clone(), ticket));
            }
        }
    }

    /// Wait until no keystroke is pending and no request is in flight.
    pub async fn settled(&self) -> SearchView {
        let mut rx = self.subscribe();
        let settled = rx.wait_for(SearchView::is_settled).await.map(|v| v.clone());
        settled.unwrap_or_else(|_| self.view())
    }

    /// Close the list and load weather for `candidate`. Favorites are untouched.
    pub async fn select(
        &self,
        candidate: &SearchCandidate,
        coordinator: &WeatherRequestCoordinator,
    ) -> Result<Arc<WeatherSnapshot>, WeatherLookupError> {
        self.inner.update(|s| s.select(candidate));
        coordinator.get_by_city(&candidate.name).await
    }

    pub fn focus(&self) {
        self.inner.update(SearchSession::focus);
    }

    pub fn blur(&self) {
        self.inner.update(SearchSession::blur);
    }
}

async fn debounce(inner: Arc<Inner>, ticket: u64) {
    tokio::time::sleep(inner.options.debounce).await;

    let Some(issued) = inner.update(|s| s.settle(ticket)) else {
        return;
    };

    tracing::debug!("Search #{} for '{}'", issued.generation, issued.query);
    let result = inner
        .provider
        .search_cities(&issued.query, inner.options.limit)
        .await;

    if let Err(e) = &result {
        tracing::warn!("City search for '{}' failed: {}", issued.query, e);
    }

    if !inner.update(|s| s.complete(issued.generation, result)) {
        tracing::debug!("Discarding stale search results #{}", issued.generation);
    }
}
