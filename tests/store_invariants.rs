// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Behaviour tests for the regulation store
//!
//! These tests verify:
//! 1. Loading - first page, background pagination, one-shot initialization
//! 2. Filtering - reset / apply equivalence, idempotence, facet semantics
//! 3. Failure handling - user-facing messages, untouched state on failure
//! 4. Stale responses - superseded detail fetches are discarded

use async_trait::async_trait;
use datalex::client::{ApiError, RegulationSource};
use datalex::store::{messages, FilterSection, RegulationStore, StoreOptions};
use datalex::types::{LocationFilter, Regulation};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// =============================================================================
// Test Helpers
// =============================================================================

#[derive(Default)]
struct FakeSource {
    records: Vec<Regulation>,
    total: Option<u64>,
    unreachable: bool,
    fail_list_from: Option<u32>,
    fail_get: bool,
    slow_ids: Vec<String>,
    /// `(page, millis)` delays, each consumed by the first matching call
    page_delays: Mutex<Vec<(u32, u64)>>,
    seen_filters: Mutex<Vec<Vec<(String, String)>>>,
    probes: AtomicUsize,
}

fn server_error(endpoint: &str) -> ApiError {
    ApiError::Status {
        endpoint: endpoint.into(),
        status: 500,
        body: "boom".into(),
    }
}

#[async_trait]
impl RegulationSource for FakeSource {
    async fn probe(&self) -> Result<(), ApiError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            Err(server_error("probe"))
        } else {
            Ok(())
        }
    }

    async fn count(&self) -> Result<u64, ApiError> {
        Ok(self.total.unwrap_or(self.records.len() as u64))
    }

    async fn list_page(
        &self,
        page: u32,
        limit: u32,
        filters: &[(String, String)],
    ) -> Result<Vec<Regulation>, ApiError> {
        self.seen_filters.lock().push(filters.to_vec());
        let delay = {
            let mut delays = self.page_delays.lock();
            delays
                .iter()
                .position(|(p, _)| *p == page)
                .map(|i| delays.remove(i).1)
        };
        if let Some(millis) = delay {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        if self.fail_list_from.is_some_and(|from| page >= from) {
            return Err(server_error("list"));
        }
        let start = ((page.max(1) - 1) * limit) as usize;
        let end = (start + limit as usize).min(self.records.len());
        Ok(self.records.get(start..end).map(<[Regulation]>::to_vec).unwrap_or_default())
    }

    async fn get(&self, id: &str) -> Result<Regulation, ApiError> {
        if self.slow_ids.iter().any(|slow| slow == id) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if self.fail_get {
            return Err(server_error("get"));
        }
        self.records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                endpoint: format!("get {id}"),
            })
    }
}

fn make_regulation(id: &str, scale: &str, ambito: &str, ciudad: &str) -> Regulation {
    Regulation {
        id: id.into(),
        titulo: format!("Normativa {id}"),
        escala_normativa: scale.into(),
        ambito: ambito.into(),
        ciudad: ciudad.into(),
        ..Regulation::default()
    }
}

fn catalog(n: usize) -> Vec<Regulation> {
    (1..=n)
        .map(|i| {
            let (scale, ambito, city) = match i % 3 {
                0 => ("LEY_EST", "EST", ""),
                1 => ("PLAN_URB", "MUN", "Madrid"),
                _ => ("REG_UE", "COM", ""),
            };
            make_regulation(&i.to_string(), scale, ambito, city)
        })
        .collect()
}

fn store_with(source: FakeSource, page_size: u32) -> RegulationStore<FakeSource> {
    RegulationStore::new(
        source,
        StoreOptions {
            page_size,
            ..StoreOptions::default()
        },
    )
}

async fn loaded_store(records: Vec<Regulation>) -> RegulationStore<FakeSource> {
    let store = store_with(
        FakeSource {
            records,
            ..FakeSource::default()
        },
        100,
    );
    store.initialize().await;
    store
}

fn ids(regulations: &[Regulation]) -> Vec<&str> {
    regulations.iter().map(|r| r.id.as_str()).collect()
}

// =============================================================================
// Loading
// =============================================================================

#[tokio::test]
async fn test_initialize_loads_first_page_then_background_completes() {
    let store = store_with(
        FakeSource {
            records: catalog(5),
            ..FakeSource::default()
        },
        2,
    );
    store.initialize().await;

    let snap = store.snapshot();
    assert_eq!(ids(&snap.regulations), ["1", "2"]);
    assert_eq!(snap.total_count, 5);
    assert!(snap.has_more);
    assert!(!snap.is_loading);
    assert!(snap.error.is_none());

    store.wait_for_background().await;
    let snap = store.snapshot();
    assert_eq!(snap.regulations.len(), 5);
    assert!(snap.fully_loaded);
    assert!(!snap.has_more);
    assert_eq!(snap.current_page, 3);
}

#[tokio::test]
async fn test_initialize_is_one_shot() {
    let store = loaded_store(catalog(3)).await;
    store.initialize().await;
    assert_eq!(store.source().probes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_zero_count_sets_no_data_message() {
    let store = loaded_store(Vec::new()).await;
    let snap = store.snapshot();
    assert_eq!(snap.error.as_deref(), Some(messages::NO_DATA));
    assert!(snap.regulations.is_empty());
}

#[tokio::test]
async fn test_first_page_failure_sets_load_message() {
    let store = store_with(
        FakeSource {
            records: catalog(3),
            fail_list_from: Some(1),
            ..FakeSource::default()
        },
        10,
    );
    store.initialize().await;
    let snap = store.snapshot();
    assert_eq!(snap.error.as_deref(), Some(messages::LOAD));
    assert!(!snap.is_loading);
}

#[tokio::test]
async fn test_unreachable_backend_sets_connectivity_message() {
    let store = store_with(
        FakeSource {
            unreachable: true,
            ..FakeSource::default()
        },
        10,
    );
    store.initialize().await;
    assert_eq!(store.error().as_deref(), Some(messages::CONNECTIVITY));
}

#[tokio::test]
async fn test_background_stops_when_a_page_adds_nothing() {
    let store = store_with(
        FakeSource {
            records: catalog(3),
            total: Some(10),
            ..FakeSource::default()
        },
        2,
    );
    store.initialize().await;
    store.wait_for_background().await;

    let snap = store.snapshot();
    assert_eq!(snap.regulations.len(), 3);
    assert!(!snap.has_more);
    assert!(!snap.fully_loaded);
}

#[tokio::test]
async fn test_overlapping_page_loads_still_fill_the_cache() {
    let store = store_with(
        FakeSource {
            records: catalog(30),
            page_delays: Mutex::new(vec![(2, 20), (2, 60)]),
            ..FakeSource::default()
        },
        10,
    );
    store.initialize().await;
    store.load_next_page().await;
    assert_eq!(store.all_regulations().len(), 20);

    store.wait_for_background().await;
    let snap = store.snapshot();
    assert_eq!(store.all_regulations().len(), 30);
    assert!(snap.fully_loaded);
    assert!(!snap.has_more);
    assert_eq!(snap.current_page, 3);
}

#[tokio::test]
async fn test_refetching_a_loaded_page_keeps_more_pages_available() {
    let store = store_with(
        FakeSource {
            records: catalog(6),
            ..FakeSource::default()
        },
        2,
    );
    store.initialize().await;
    store.load_page(1).await;

    let snap = store.snapshot();
    assert_eq!(store.all_regulations().len(), 2);
    assert!(snap.has_more);
    assert!(!snap.fully_loaded);

    store.wait_for_background().await;
    assert_eq!(store.all_regulations().len(), 6);
    assert!(!store.snapshot().has_more);
}

#[tokio::test]
async fn test_remote_filters_go_with_every_page_request() {
    let remote = vec![("ccaa".to_string(), "Galicia".to_string())];
    let store = RegulationStore::new(
        FakeSource {
            records: catalog(5),
            ..FakeSource::default()
        },
        StoreOptions {
            page_size: 2,
            ..StoreOptions::default()
        }
        .with_remote_filters(remote.clone()),
    );
    store.initialize().await;
    store.wait_for_background().await;

    let seen = store.source().seen_filters.lock().clone();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|filters| *filters == remote));
}

#[tokio::test]
async fn test_load_next_page_mirrors_cache_when_unfiltered() {
    let store = store_with(
        FakeSource {
            records: catalog(6),
            ..FakeSource::default()
        },
        2,
    );
    store.initialize().await;
    store.load_next_page().await;

    let snap = store.snapshot();
    assert_eq!(snap.current_page, 2);
    assert_eq!(ids(&snap.regulations), ["1", "2", "3", "4"]);
}

#[tokio::test]
async fn test_page_failure_sets_page_message() {
    let store = store_with(
        FakeSource {
            records: catalog(6),
            fail_list_from: Some(2),
            ..FakeSource::default()
        },
        2,
    );
    store.initialize().await;
    store.load_next_page().await;

    let snap = store.snapshot();
    assert_eq!(snap.error.as_deref(), Some(messages::PAGE));
    assert_eq!(snap.regulations.len(), 2);
    assert!(!snap.is_loading);
}

#[tokio::test]
async fn test_background_pages_stay_hidden_under_active_filter() {
    let store = store_with(
        FakeSource {
            records: catalog(6),
            ..FakeSource::default()
        },
        3,
    );
    store.initialize().await;
    store.update_filters(FilterSection::Scale, "PLAN_URB", false);
    store.apply_filters(&LocationFilter::default());
    assert_eq!(ids(&store.regulations()), ["1"]);

    store.wait_for_background().await;
    assert_eq!(store.all_regulations().len(), 6);
    assert_eq!(ids(&store.regulations()), ["1"]);

    store.apply_filters(&LocationFilter::default());
    assert_eq!(ids(&store.regulations()), ["1", "4"]);
}

// =============================================================================
// Filtering
// =============================================================================

#[tokio::test]
async fn test_scale_filter_scenario() {
    let store = loaded_store(vec![
        make_regulation("A", "LEY_EST", "MUN", "Madrid"),
        make_regulation("B", "REG_UE", "EST", ""),
    ])
    .await;

    store.update_filters(FilterSection::Scale, "LEY_EST", false);
    store.apply_filters(&LocationFilter::default());

    let snap = store.snapshot();
    assert_eq!(ids(&snap.regulations), ["A"]);
    assert_eq!(snap.total_count, 1);
    assert!(snap.filter_active);
}

#[tokio::test]
async fn test_empty_search_restores_full_cache() {
    let store = loaded_store(catalog(6)).await;
    store.search_regulations("madrid");
    assert_eq!(ids(&store.regulations()), ["1", "4"]);

    store.search_regulations("");
    assert_eq!(store.regulations(), store.all_regulations());
}

#[tokio::test]
async fn test_reset_filters_postconditions() {
    let store = loaded_store(catalog(6)).await;
    store.search_regulations("madrid");
    store.update_filters(FilterSection::Territorial, "municipal", false);
    store.apply_filters(&LocationFilter {
        municipio: Some("Madrid".into()),
        ..LocationFilter::default()
    });

    store.reset_filters();
    let snap = store.snapshot();
    assert_eq!(snap.regulations, store.all_regulations());
    assert!(!snap.filter_active);
    assert!(snap.search_query.is_empty());
    assert_eq!(snap.total_count, 6);
    assert!(snap.filters.iter().all(|(_, selected)| selected.is_empty()));
}

#[tokio::test]
async fn test_empty_apply_matches_reset() {
    let applied = loaded_store(catalog(6)).await;
    applied.update_filters(FilterSection::Scale, "LEY_EST", false);
    applied.apply_filters(&LocationFilter::default());
    applied.update_filters(FilterSection::Scale, "LEY_EST", false);
    applied.apply_filters(&LocationFilter::default());

    let reset = loaded_store(catalog(6)).await;
    reset.reset_filters();

    let (a, r) = (applied.snapshot(), reset.snapshot());
    assert_eq!(a.regulations, r.regulations);
    assert_eq!(a.filter_active, r.filter_active);
    assert!(!a.filter_active);
}

#[tokio::test]
async fn test_apply_filters_is_idempotent() {
    let store = loaded_store(catalog(9)).await;
    store.update_filters(FilterSection::Territorial, "comunitario", false);
    store.update_filters(FilterSection::Territorial, "estatal", false);
    let location = LocationFilter::default();

    store.apply_filters(&location);
    let first = store.regulations();
    store.apply_filters(&location);
    assert_eq!(store.regulations(), first);
    assert_eq!(first.len(), 6);
}

#[tokio::test]
async fn test_location_filter_is_exact() {
    let store = loaded_store(catalog(6)).await;

    store.apply_filters(&LocationFilter {
        municipio: Some("madrid ".into()),
        ..LocationFilter::default()
    });
    assert!(store.regulations().is_empty());

    store.apply_filters(&LocationFilter {
        municipio: Some("Madrid".into()),
        ..LocationFilter::default()
    });
    assert_eq!(ids(&store.regulations()), ["1", "4"]);
}

#[tokio::test]
async fn test_unknown_filter_option_keeps_previous_view() {
    let store = loaded_store(catalog(6)).await;
    store.update_filters(FilterSection::Scale, "REG_UE", false);
    store.apply_filters(&LocationFilter::default());
    let before = store.regulations();

    store.update_filters(FilterSection::Territorial, "provincial", false);
    store.apply_filters(&LocationFilter::default());

    let snap = store.snapshot();
    assert_eq!(snap.regulations, before);
    assert_eq!(snap.error.as_deref(), Some(messages::FILTER));
    assert!(!snap.is_loading);
}

#[tokio::test]
async fn test_clear_search_ignores_facets() {
    let store = loaded_store(catalog(6)).await;
    store.update_filters(FilterSection::Scale, "LEY_EST", false);
    store.apply_filters(&LocationFilter::default());
    store.clear_search_query();

    let snap = store.snapshot();
    assert_eq!(snap.regulations.len(), 6);
    assert!(snap.filter_active);
}

#[tokio::test]
async fn test_force_reset_keeps_filter_state() {
    let store = loaded_store(catalog(6)).await;
    store.search_regulations("madrid");
    store.force_reset_regulations();

    let snap = store.snapshot();
    assert_eq!(snap.regulations.len(), 6);
    assert_eq!(snap.search_query, "madrid");
}

// =============================================================================
// Selection
// =============================================================================

#[tokio::test]
async fn test_failed_select_keeps_previous_selection() {
    let store = store_with(
        FakeSource {
            records: catalog(3),
            fail_get: true,
            ..FakeSource::default()
        },
        10,
    );
    store.select_regulation("42").await;

    let snap = store.snapshot();
    assert!(snap.selected.is_none());
    assert_eq!(snap.error.as_deref(), Some(messages::DETAIL));
    assert!(!snap.is_loading);
}

#[tokio::test]
async fn test_select_then_clear() {
    let store = loaded_store(catalog(3)).await;
    store.select_regulation("2").await;
    assert_eq!(store.snapshot().selected.map(|r| r.id), Some("2".to_string()));

    store.select_regulation("missing").await;
    let snap = store.snapshot();
    assert_eq!(snap.selected.as_ref().map(|r| r.id.as_str()), Some("2"));
    assert_eq!(snap.error.as_deref(), Some(messages::DETAIL));

    store.clear_selected_regulation();
    assert!(store.snapshot().selected.is_none());
}

#[tokio::test]
async fn test_superseded_select_is_discarded() {
    let store = store_with(
        FakeSource {
            records: catalog(3),
            slow_ids: vec!["1".into()],
            ..FakeSource::default()
        },
        10,
    );

    tokio::join!(store.select_regulation("1"), store.select_regulation("2"));

    let snap = store.snapshot();
    assert_eq!(snap.selected.map(|r| r.id), Some("2".to_string()));
    assert!(!snap.is_loading);
}
