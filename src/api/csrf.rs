use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Method;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::headers::json_headers;
use super::transport::{ApiRequest, HttpTransport};

type PendingFetch = Shared<BoxFuture<'static, ()>>;

#[derive(Default)]
struct Slot {
    generation: u64,
    pending: Option<PendingFetch>,
}

/// Makes sure the CSRF cookie has been requested before API calls.
///
/// Callers arriving while a fetch is in flight, or within `refresh` after it
/// settled, share that fetch. A failed fetch is logged and otherwise ignored:
/// the server rejects the follow-up request if the token really was needed.
pub struct CsrfGate<T> {
    transport: Arc<T>,
    csrf_url: String,
    refresh: Duration,
    slot: Arc<Mutex<Slot>>,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl<T: HttpTransport> CsrfGate<T> {
    pub fn new(transport: Arc<T>, csrf_url: impl Into<String>, refresh: Duration) -> Self {
        Self {
            transport,
            csrf_url: csrf_url.into(),
            refresh,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub async fn ensure(&self) {
        let fetch = {
            let mut slot = lock(&self.slot);
            match &slot.pending {
                Some(fetch) => fetch.clone(),
                None => {
                    slot.generation += 1;
                    let fetch = self.fetch(slot.generation).boxed().shared();
                    slot.pending = Some(fetch.clone());
                    fetch
                }
            }
        };
        fetch.await;
    }

    /// Drop the cached fetch so the next call requests a fresh cookie.
    pub fn invalidate(&self) {
        let mut slot = lock(&self.slot);
        if slot.pending.take().is_some() {
            log::debug!("CSRF cookie invalidated");
        }
    }

    /// Whether a fetch is in flight or still inside its refresh window.
    pub fn is_cached(&self) -> bool {
        lock(&self.slot).pending.is_some()
    }

    fn fetch(&self, generation: u64) -> impl Future<Output = ()> + Send + 'static {
        let transport = Arc::clone(&self.transport);
        let slot = Arc::clone(&self.slot);
        let url = self.csrf_url.clone();
        let refresh = self.refresh;

        async move {
            let request = ApiRequest {
                method: Method::GET,
                url: url.clone(),
                headers: json_headers(),
                body: None,
            };
            match transport.execute(request).await {
                Ok(resp) if resp.status.is_success() => {
                    log::debug!("CSRF cookie refreshed from {}", url)
                }
                Ok(resp) => log::warn!("CSRF cookie request to {} returned {}", url, resp.status),
                Err(e) => log::warn!("CSRF cookie request failed: {}", e),
            }

            // A newer fetch may own the slot by the time this fires.
            tokio::spawn(async move {
                tokio::time::sleep(refresh).await;
                let mut slot = lock(&slot);
                if slot.generation == generation {
                    slot.pending = None;
                }
            });
        }
    }
}
