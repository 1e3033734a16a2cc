use crate::feed::ActivityService;

/// Application state shared across request handlers.
pub(crate) struct AppState {
    pub(crate) service: ActivityService,
    /// Optional API key. None = no auth required.
    pub(crate) api_key: Option<String>,
}
