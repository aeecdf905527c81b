//! Single-flight re-authentication.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use busbar_superset_client::Error;

use crate::authenticator::Authenticator;

/// Outcome shared by every caller of one refresh.
pub type RefreshOutcome = std::result::Result<(), Arc<Error>>;

type RefreshFuture = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Ensures at most one re-authentication runs at a time.
///
/// The first caller installs a shared future and drives it; callers arriving
/// while it is pending await a clone and observe the same outcome. The slot
/// is guarded by one mutex, so "in progress" and "pending outcome" change
/// together.
#[derive(Default)]
pub struct RefreshCoordinator {
    slot: Mutex<Option<RefreshFuture>>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator").finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    /// Create an idle coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a refresh is pending.
    pub async fn in_progress(&self) -> bool {
        self.slot
            .lock()
            .await
            .as_ref()
            .is_some_and(|pending| pending.peek().is_none())
    }

    /// Re-authenticate, or join the refresh already in flight.
    pub async fn refresh(&self, authenticator: &Arc<Authenticator>) -> RefreshOutcome {
        let (pending, leader) = {
            let mut slot = self.slot.lock().await;
            match slot.as_ref() {
                Some(pending) if pending.peek().is_none() => {
                    debug!("Joining in-flight refresh");
                    (pending.clone(), false)
                }
                _ => {
                    info!("Refreshing Superset session");
                    let authenticator = Arc::clone(authenticator);
                    let pending = async move {
                        authenticator.reauthenticate().await.map_err(Arc::new)
                    }
                    .boxed()
                    .shared();
                    *slot = Some(pending.clone());
                    (pending, true)
                }
            }
        };

        let outcome = pending.clone().await;

        if leader {
            let mut slot = self.slot.lock().await;
            if slot
                .as_ref()
                .is_some_and(|current| Shared::ptr_eq(current, &pending))
            {
                *slot = None;
            }
            if let Err(err) = &outcome {
                warn!(error = %err, "Session refresh failed");
            }
        }

        outcome
    }
}
