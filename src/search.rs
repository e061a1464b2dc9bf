use crate::applications::{Application, ApplicationsClient};
use crate::debounce::Debouncer;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::debug;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(200);

#[async_trait]
pub trait SearchSource: Send + Sync {
    async fn search(&self, term: &str) -> Result<Vec<Application>>;
}

#[async_trait]
impl SearchSource for ApplicationsClient {
    async fn search(&self, term: &str) -> Result<Vec<Application>> {
        self.query(Some(term)).await
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub term: String,
    pub results: Vec<Application>,
    pub loading: bool,
}

pub struct DebouncedSearch {
    latest: Arc<Mutex<String>>,
    state: Arc<watch::Sender<SearchState>>,
    debouncer: Debouncer,
}

impl DebouncedSearch {
    pub fn spawn(source: Arc<dyn SearchSource>, window: Duration) -> Self {
        let latest = Arc::new(Mutex::new(String::new()));
        let (state, _) = watch::channel(SearchState::default());
        let state = Arc::new(state);

        let fire_latest = Arc::clone(&latest);
        let fire_state = Arc::clone(&state);
        let debouncer = Debouncer::spawn(window, move || {
            let term = current(&fire_latest);
            let source = Arc::clone(&source);
            let latest = Arc::clone(&fire_latest);
            let state = Arc::clone(&fire_state);
            tokio::spawn(async move {
                let results = source.search(&term).await.unwrap_or_else(|error| {
                    debug!(term = %term, %error, "application search failed");
                    Vec::new()
                });
                if current(&latest) != term {
                    debug!(term = %term, "discarding stale search results");
                    return;
                }
                state.send_replace(SearchState {
                    term,
                    results,
                    loading: false,
                });
            });
        });

        Self {
            latest,
            state,
            debouncer,
        }
    }

    pub fn search(&self, term: &str) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = term.to_string();
        self.state.send_modify(|state| state.loading = true);
        self.debouncer.touch();
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }
}

fn current(latest: &Mutex<String>) -> String {
    latest.lock().unwrap_or_else(PoisonError::into_inner).clone()
}
