// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Regulation store
//!
//! Owns the cached set of regulations fetched so far, the visible subset
//! derived from it, and the search / filter / selection / pagination state.
//! The visible set is always recomputed from the cache; it is never edited
//! in place.
//!
//! Operations never return errors. Failures are logged and turned into a
//! single user-facing message stored in the state (see [`messages`]).

mod filters;
pub mod pipeline;
mod tokens;

pub use filters::{FilterSection, FilterState};

use crate::client::{ApiError, RegulationSource};
use crate::config::Config;
use crate::types::{LocationFilter, Regulation};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokens::{RequestKind, RequestTokens};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// User-facing messages stored in [`StoreSnapshot::error`]
pub mod messages {
    /// The backend could not be reached
    pub const CONNECTIVITY: &str =
        "No se pudo conectar a la base de datos. Por favor, inténtelo de nuevo más tarde.";
    /// The backend answered but holds no regulations
    pub const NO_DATA: &str = "No hay normativas disponibles en la base de datos.";
    /// Initial load failed
    pub const LOAD: &str = "Error al cargar los datos. Por favor, inténtelo de nuevo más tarde.";
    /// Detail fetch failed
    pub const DETAIL: &str = "Error al cargar los detalles. Por favor, inténtelo de nuevo más tarde.";
    /// Search attempted before any data arrived
    pub const WAITING: &str = "Los datos aún se están cargando. Por favor, espere un momento.";
    /// Filter application failed
    pub const FILTER: &str = "Error al aplicar los filtros. Por favor, inténtelo de nuevo más tarde.";
    /// Loading another page failed
    pub const PAGE: &str = "Error al cargar más normativas. Por favor, inténtelo de nuevo más tarde.";
}

/// Errors raised inside store operations before they become messages
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connectivity probe failed
    #[error("backend unreachable: {0}")]
    Unreachable(#[source] ApiError),
    /// A fetch failed
    #[error(transparent)]
    Source(#[from] ApiError),
    /// A filter option the pipeline does not know
    #[error("unknown {section} filter option '{option}'")]
    UnknownOption {
        /// Section holding the option
        section: FilterSection,
        /// The offending option id
        option: String,
    },
}

/// Store construction options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Records requested per page
    pub page_size: u32,
    /// Query parameters forwarded with every page request
    pub remote_filters: Vec<(String, String)>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            remote_filters: Vec::new(),
        }
    }
}

impl StoreOptions {
    /// Options taken from the application configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.page_size,
            ..Self::default()
        }
    }

    /// Forward `filters` with every page request
    #[must_use]
    pub fn with_remote_filters(mut self, filters: Vec<(String, String)>) -> Self {
        self.remote_filters = filters;
        self
    }
}

/// Point-in-time copy of the store state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreSnapshot {
    /// Visible regulations
    pub regulations: Vec<Regulation>,
    /// Currently selected regulation
    pub selected: Option<Regulation>,
    /// Facet selections
    pub filters: FilterState,
    /// Whether any filter, search or location narrowed the visible set
    pub filter_active: bool,
    /// A foreground operation is in flight
    pub is_loading: bool,
    /// Last user-facing error message
    pub error: Option<String>,
    /// Size of the visible set after filtering, or the remote total
    pub total_count: u64,
    /// Last page fetched
    pub current_page: u32,
    /// More pages remain on the backend
    pub has_more: bool,
    /// Current search term
    pub search_query: String,
    /// The cache holds every remote regulation
    pub fully_loaded: bool,
}

#[derive(Debug, Default)]
struct State {
    all: Vec<Regulation>,
    visible: Vec<Regulation>,
    selected: Option<Regulation>,
    filters: FilterState,
    filter_active: bool,
    is_loading: bool,
    error: Option<String>,
    total_count: u64,
    remote_total: u64,
    current_page: u32,
    has_more: bool,
    search_query: String,
    fully_loaded: bool,
    exhausted: bool,
}

impl State {
    fn show_all(&mut self) {
        self.visible = self.all.clone();
    }

    fn narrowing(&self) -> bool {
        self.filter_active || !self.search_query.is_empty()
    }

    fn cached(&self) -> u64 {
        self.all.len() as u64
    }

    /// Merge a fetched page and refresh the pagination flags
    ///
    /// Only a page past the furthest one merged can mark the backend as
    /// exhausted; re-fetching an earlier page never does.
    fn absorb_page(&mut self, page: u32, batch: Vec<Regulation>) -> usize {
        let fresh = page > self.current_page;
        let added = pipeline::merge_by_id(&mut self.all, batch);
        if fresh && added == 0 {
            self.exhausted = true;
        }
        self.current_page = self.current_page.max(page);
        self.fully_loaded = self.cached() >= self.remote_total;
        self.has_more = !self.fully_loaded && !self.exhausted;
        if !self.narrowing() {
            self.show_all();
        }
        added
    }
}

struct Inner<S> {
    source: S,
    options: StoreOptions,
    state: Mutex<State>,
    tokens: RequestTokens,
    initialized: AtomicBool,
    background_running: AtomicBool,
    background: Mutex<Option<JoinHandle<()>>>,
}

/// Shared handle to the regulation store
///
/// Clones point at the same state.
pub struct RegulationStore<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for RegulationStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

enum FirstPage {
    Empty,
    Loaded { total: u64, batch: Vec<Regulation> },
}

impl<S: RegulationSource + 'static> RegulationStore<S> {
    /// Create an empty store reading from `source`
    pub fn new(source: S, options: StoreOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                options: StoreOptions {
                    page_size: options.page_size.max(1),
                    ..options
                },
                state: Mutex::new(State {
                    filters: FilterState::new(),
                    ..State::default()
                }),
                tokens: RequestTokens::default(),
                initialized: AtomicBool::new(false),
                background_running: AtomicBool::new(false),
                background: Mutex::new(None),
            }),
        }
    }

    /// The underlying source
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Copy of the whole state
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.inner.state.lock();
        StoreSnapshot {
            regulations: state.visible.clone(),
            selected: state.selected.clone(),
            filters: state.filters.clone(),
            filter_active: state.filter_active,
            is_loading: state.is_loading,
            error: state.error.clone(),
            total_count: state.total_count,
            current_page: state.current_page,
            has_more: state.has_more,
            search_query: state.search_query.clone(),
            fully_loaded: state.fully_loaded,
        }
    }

    /// Visible regulations
    #[must_use]
    pub fn regulations(&self) -> Vec<Regulation> {
        self.inner.state.lock().visible.clone()
    }

    /// Every regulation fetched so far
    #[must_use]
    pub fn all_regulations(&self) -> Vec<Regulation> {
        self.inner.state.lock().all.clone()
    }

    /// Last user-facing error message
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.inner.state.lock().error.clone()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Probe the backend and load the first page
    ///
    /// Runs once per store; later calls return immediately. When the first
    /// page does not cover the remote total, the remaining pages are
    /// fetched on a background task (see [`Self::wait_for_background`]).
    pub async fn initialize(&self) {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            debug!("store already initialized");
            return;
        }

        let token = {
            let mut state = self.inner.state.lock();
            state.is_loading = true;
            state.error = None;
            self.inner.tokens.issue(RequestKind::Initialize)
        };

        let outcome = self.first_page().await;

        let spawn_background = {
            let mut state = self.inner.state.lock();
            state.is_loading = false;
            if !self.inner.tokens.is_latest(token) {
                debug!("initial load superseded");
                return;
            }
            match outcome {
                Ok(FirstPage::Empty) => {
                    warn!("catalog is empty");
                    state.error = Some(messages::NO_DATA.into());
                    state.fully_loaded = true;
                    false
                }
                Ok(FirstPage::Loaded { total, batch }) => {
                    state.remote_total = total;
                    state.total_count = total;
                    state.absorb_page(1, batch);
                    state.show_all();
                    info!(loaded = state.all.len(), total, "initial page loaded");
                    state.has_more
                }
                Err(StoreError::Unreachable(e)) => {
                    error!("connectivity check failed: {e}");
                    state.error = Some(messages::CONNECTIVITY.into());
                    false
                }
                Err(e) => {
                    error!("initial load failed: {e}");
                    state.error = Some(messages::LOAD.into());
                    false
                }
            }
        };

        if spawn_background {
            let store = self.clone();
            let handle = tokio::spawn(async move { store.load_all_remaining().await });
            *self.inner.background.lock() = Some(handle);
        }
    }

    async fn first_page(&self) -> Result<FirstPage, StoreError> {
        self.inner
            .source
            .probe()
            .await
            .map_err(StoreError::Unreachable)?;

        let total = self.inner.source.count().await?;
        if total == 0 {
            return Ok(FirstPage::Empty);
        }
        let batch = self
            .inner
            .source
            .list_page(1, self.inner.options.page_size, &self.inner.options.remote_filters)
            .await?;
        Ok(FirstPage::Loaded { total, batch })
    }

    /// Wait for the background loader started by [`Self::initialize`]
    pub async fn wait_for_background(&self) {
        let handle = self.inner.background.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("background loader ended abnormally: {e}");
            }
        }
    }

    /// Fetch the page after the last one loaded
    pub async fn load_next_page(&self) {
        let next = self.inner.state.lock().current_page + 1;
        self.load_page(next).await;
    }

    /// Fetch page `page` (1-based) and merge it into the cache
    ///
    /// Does nothing while another foreground load runs or when the cache
    /// already holds every remote record. The visible set follows the
    /// cache only while no filter or search is active.
    pub async fn load_page(&self, page: u32) {
        let page = page.max(1);
        let token = {
            let mut state = self.inner.state.lock();
            if state.is_loading || !state.has_more {
                debug!(page, loading = state.is_loading, has_more = state.has_more, "page load skipped");
                return;
            }
            state.is_loading = true;
            self.inner.tokens.issue(RequestKind::Page)
        };

        let result = self
            .inner
            .source
            .list_page(page, self.inner.options.page_size, &self.inner.options.remote_filters)
            .await;

        let mut state = self.inner.state.lock();
        if !self.inner.tokens.is_latest(token) {
            debug!(page, "discarding superseded page");
            return;
        }
        state.is_loading = false;
        match result {
            Ok(batch) => {
                let added = state.absorb_page(page, batch);
                debug!(page, added, cached = state.all.len(), "page merged");
            }
            Err(e) => {
                error!(page, "page load failed: {e}");
                state.error = Some(messages::PAGE.into());
            }
        }
    }

    /// Fetch pages until the cache holds the remote total
    ///
    /// Only one loop runs at a time. Each round asks for the page after
    /// the furthest one merged, so pages loaded concurrently by
    /// [`Self::load_page`] are skipped rather than counted as the end.
    /// Stops early when a new page adds nothing. Errors are logged and end
    /// the loop without touching the state's error message.
    pub async fn load_all_remaining(&self) {
        if self.inner.background_running.swap(true, Ordering::SeqCst) {
            debug!("background loader already running");
            return;
        }

        loop {
            let (page, token) = {
                let state = self.inner.state.lock();
                if !state.has_more {
                    break;
                }
                (
                    state.current_page + 1,
                    self.inner.tokens.issue(RequestKind::Background),
                )
            };

            let result = self
                .inner
                .source
                .list_page(page, self.inner.options.page_size, &self.inner.options.remote_filters)
                .await;

            let mut state = self.inner.state.lock();
            if !self.inner.tokens.is_latest(token) {
                debug!(page, "discarding superseded background page");
                break;
            }
            match result {
                Ok(batch) => {
                    let added = state.absorb_page(page, batch);
                    debug!(page, added, cached = state.all.len(), total = state.remote_total, "background page merged");
                    if !state.has_more {
                        break;
                    }
                }
                Err(e) => {
                    warn!(page, "background page load failed: {e}");
                    break;
                }
            }
        }

        self.inner.background_running.store(false, Ordering::SeqCst);
        let state = self.inner.state.lock();
        info!(cached = state.all.len(), fully_loaded = state.fully_loaded, "background loading finished");
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Fetch one regulation from the source and select it
    ///
    /// The cache is not consulted. On failure the previous selection stays.
    pub async fn select_regulation(&self, id: &str) {
        let token = {
            let mut state = self.inner.state.lock();
            state.is_loading = true;
            state.error = None;
            self.inner.tokens.issue(RequestKind::Select)
        };

        let result = self.inner.source.get(id).await;

        let mut state = self.inner.state.lock();
        if !self.inner.tokens.is_latest(token) {
            debug!(id, "discarding superseded detail response");
            return;
        }
        state.is_loading = false;
        match result {
            Ok(regulation) => {
                debug!(id, "regulation selected");
                state.selected = Some(regulation);
            }
            Err(e) => {
                error!(id, "detail fetch failed: {e}");
                state.error = Some(messages::DETAIL.into());
            }
        }
    }

    /// Drop the current selection
    pub fn clear_selected_regulation(&self) {
        self.inner.state.lock().selected = None;
    }

    // =========================================================================
    // Search and filters
    // =========================================================================

    /// Toggle `option` in `section`, or empty the section when `clear`
    ///
    /// The visible set is left alone until [`Self::apply_filters`].
    pub fn update_filters(&self, section: FilterSection, option: &str, clear: bool) {
        let mut state = self.inner.state.lock();
        if clear {
            state.filters.clear(section);
        } else {
            state.filters.toggle(section, option);
        }
        state.filter_active = state.filters.any_selected();
        debug!(%section, option, clear, active = state.filter_active, "filters updated");
    }

    /// Set the search term and narrow the visible set immediately
    pub fn search_regulations(&self, query: &str) {
        let mut state = self.inner.state.lock();
        state.search_query = query.to_string();
        if state.all.is_empty() {
            warn!(query, "search before any data arrived");
            state.error = Some(messages::WAITING.into());
            return;
        }

        state.visible = state
            .all
            .iter()
            .filter(|r| pipeline::matches_search(r, query))
            .cloned()
            .collect();
        state.error = None;
        debug!(query, matched = state.visible.len(), "search applied");
    }

    /// Clear the search term and show the whole cache
    ///
    /// Facet and location filters are not reapplied.
    pub fn clear_search_query(&self) {
        let mut state = self.inner.state.lock();
        state.search_query.clear();
        state.show_all();
    }

    /// Clear every filter and the search term
    pub fn reset_filters(&self) {
        let mut state = self.inner.state.lock();
        if state.all.is_empty() {
            return;
        }
        state.filters.clear_all();
        state.search_query.clear();
        state.filter_active = false;
        state.total_count = state.remote_total;
        state.show_all();
        debug!("filters reset");
    }

    /// Show a fresh copy of the cache without touching search or filters
    pub fn force_reset_regulations(&self) {
        self.inner.state.lock().show_all();
    }

    /// Recompute the visible set from the cache, search, filters and location
    pub fn apply_filters(&self, location: &LocationFilter) {
        let mut state = self.inner.state.lock();

        if state.search_query.is_empty() && !state.filters.any_selected() && location.is_empty() {
            state.show_all();
            state.filter_active = false;
            state.total_count = state.remote_total;
            state.is_loading = false;
            return;
        }

        let found = pipeline::run(&state.all, &state.search_query, &state.filters, location)
            .map(|found| found.into_iter().cloned().collect::<Vec<_>>());
        match found {
            Ok(visible) => {
                state.total_count = visible.len() as u64;
                state.visible = visible;
                state.filter_active = true;
                state.error = None;
                debug!(visible = state.total_count, "filters applied");
            }
            Err(e) => {
                error!("filter application failed: {e}");
                state.error = Some(messages::FILTER.into());
            }
        }
        state.is_loading = false;
    }
}
