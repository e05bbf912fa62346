use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::{self, ReportBackend};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Debug, Default)]
struct SuggestionSlot {
    request_id: u64,
    usernames: Vec<String>,
}

/// Debounced username lookup.
///
/// Every keystroke aborts the pending search and takes a new request id;
/// a finished search only publishes its suggestions if its id is still the
/// latest one, so a slow stale response can never overwrite a newer list.
pub struct UserAutocomplete<B> {
    backend: Arc<B>,
    debounce: Duration,
    latest: Arc<AtomicU64>,
    slot: Arc<Mutex<SuggestionSlot>>,
    pending: Option<JoinHandle<()>>,
}

impl<B: ReportBackend> UserAutocomplete<B> {
    pub fn new(backend: Arc<B>, debounce: Duration) -> Self {
        Self {
            backend,
            debounce,
            latest: Arc::new(AtomicU64::new(0)),
            slot: Arc::new(Mutex::new(SuggestionSlot::default())),
            pending: None,
        }
    }

    /// Feeds the current contents of the username field.
    pub fn on_input(&mut self, text: &str) {
        self.cancel_pending();
        let request_id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let query = text.trim().to_string();
        if query.is_empty() {
            self.dismiss();
            return;
        }

        let backend = Arc::clone(&self.backend);
        let latest = Arc::clone(&self.latest);
        let slot = Arc::clone(&self.slot);
        let debounce = self.debounce;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if latest.load(Ordering::SeqCst) != request_id {
                return;
            }
            debug!(%query, request_id, "searching people");
            let usernames = match backend.search_people(&query).await {
                Ok(people) => client::filter_usernames(people, &query),
                Err(e) => {
                    warn!(%query, error = %e, "people search failed");
                    Vec::new()
                }
            };
            publish(&slot, &latest, request_id, usernames);
        }));
    }

    pub fn suggestions(&self) -> Vec<String> {
        lock(&self.slot).usernames.clone()
    }

    pub fn is_open(&self) -> bool {
        !lock(&self.slot).usernames.is_empty()
    }

    /// Picks a suggestion, closing the list. Returns the chosen username.
    pub fn select(&mut self, index: usize) -> Option<String> {
        let chosen = lock(&self.slot).usernames.get(index).cloned()?;
        self.cancel_pending();
        self.latest.fetch_add(1, Ordering::SeqCst);
        self.dismiss();
        Some(chosen)
    }

    pub fn dismiss(&self) {
        let mut slot = lock(&self.slot);
        slot.usernames.clear();
        slot.request_id = self.latest.load(Ordering::SeqCst);
    }

    /// Waits for the scheduled search, if any, to finish. Cancel safe: if
    /// the wait is dropped the search stays scheduled.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.pending.as_mut() {
            let _ = handle.await;
            self.pending = None;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<B> Drop for UserAutocomplete<B> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

fn publish(
    slot: &Mutex<SuggestionSlot>,
    latest: &AtomicU64,
    request_id: u64,
    usernames: Vec<String>,
) {
    let mut slot = lock(slot);
    if latest.load(Ordering::SeqCst) != request_id || request_id < slot.request_id {
        return;
    }
    slot.request_id = request_id;
    slot.usernames = usernames;
}

fn lock(slot: &Mutex<SuggestionSlot>) -> std::sync::MutexGuard<'_, SuggestionSlot> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::FakeBackend;

    #[tokio::test(start_paused = true)]
    async fn rapid_typing_sends_one_search_for_latest_text() {
        let backend = Arc::new(FakeBackend::with_people(&["alice", "alicia", "bob"]));
        let mut ac = UserAutocomplete::new(Arc::clone(&backend), DEFAULT_DEBOUNCE);

        ac.on_input("ali");
        tokio::time::advance(Duration::from_millis(50)).await;
        ac.on_input("alic");
        ac.settle().await;

        assert_eq!(backend.people_queries(), vec!["alic".to_string()]);
        assert_eq!(ac.suggestions(), vec!["alice", "alicia"]);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_input_dismisses_synchronously() {
        let backend = Arc::new(FakeBackend::with_people(&["alice"]));
        let mut ac = UserAutocomplete::new(Arc::clone(&backend), DEFAULT_DEBOUNCE);

        ac.on_input("al");
        ac.settle().await;
        assert!(ac.is_open());

        ac.on_input("ali");
        ac.on_input("");
        assert!(!ac.is_open());

        ac.settle().await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!ac.is_open());
        assert_eq!(backend.people_queries(), vec!["al".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn select_fills_value_and_closes_list() {
        let backend = Arc::new(FakeBackend::with_people(&["bob", "bobby"]));
        let mut ac = UserAutocomplete::new(Arc::clone(&backend), DEFAULT_DEBOUNCE);

        ac.on_input("bo");
        ac.settle().await;
        assert_eq!(ac.select(1), Some("bobby".to_string()));
        assert!(!ac.is_open());
        assert_eq!(ac.select(0), None);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_search_leaves_list_closed() {
        let backend = Arc::new(FakeBackend::failing());
        let mut ac = UserAutocomplete::new(Arc::clone(&backend), DEFAULT_DEBOUNCE);

        ac.on_input("x");
        ac.settle().await;
        assert!(!ac.is_open());
    }

    #[test]
    fn stale_response_is_not_published() {
        let slot = Mutex::new(SuggestionSlot::default());
        let latest = AtomicU64::new(3);
        publish(&slot, &latest, 2, vec!["stale".to_string()]);
        assert!(lock(&slot).usernames.is_empty());
        publish(&slot, &latest, 3, vec!["fresh".to_string()]);
        assert_eq!(lock(&slot).usernames, vec!["fresh"]);
    }
}
