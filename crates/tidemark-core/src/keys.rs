//! Namespaced key names used in the key-value store.
//!
//! Several of these keys are no longer written by anything (the combined raw
//! data blob and the last-search-params entry moved to the record archive),
//! but they stay in [`DEFAULT_EVICTION_PRIORITY`] and [`DEFAULT_PURGE_KEYS`]
//! so that state persisted by older versions is still cleaned up.

/// Cached search results.
pub const SEARCH_RESULTS: &str = "github-search-results";
/// Cached processed events.
pub const EVENTS_RESULTS: &str = "github-events-results";
/// Cached raw events.
pub const RAW_EVENTS_RESULTS: &str = "github-raw-events-results";
/// Legacy combined raw events + search items blob.
pub const LEGACY_RAW_DATA: &str = "github-raw-data-storage";
/// Legacy cache-validation parameters of the last search.
pub const LAST_SEARCH_PARAMS: &str = "github-last-search-params";
/// Per-item UI state (expanded/collapsed, description visibility).
pub const ITEM_UI_STATE: &str = "github-item-ui-state";
/// UI preferences.
pub const UI_SETTINGS: &str = "github-ui-settings";
/// Form settings. Carries the access token.
pub const FORM_SETTINGS: &str = "github-form-settings";
/// Username validation cache.
pub const USERNAME_CACHE: &str = "github-username-cache";

/// Field of [`FORM_SETTINGS`] holding the access token.
pub const TOKEN_FIELD: &str = "githubToken";

/// Eviction order, first entry evicted first: stale raw caches, then the
/// legacy blob, then UI preference caches.
pub const DEFAULT_EVICTION_PRIORITY: [&str; 6] = [
    SEARCH_RESULTS,
    EVENTS_RESULTS,
    RAW_EVENTS_RESULTS,
    LEGACY_RAW_DATA,
    ITEM_UI_STATE,
    UI_SETTINGS,
];

/// Every key removed by a full purge.
pub const DEFAULT_PURGE_KEYS: [&str; 9] = [
    SEARCH_RESULTS,
    EVENTS_RESULTS,
    RAW_EVENTS_RESULTS,
    LEGACY_RAW_DATA,
    LAST_SEARCH_PARAMS,
    ITEM_UI_STATE,
    UI_SETTINGS,
    FORM_SETTINGS,
    USERNAME_CACHE,
];
