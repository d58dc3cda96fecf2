//! One-shot write operations that invalidate the query cache on success.
//!
//! # Example
//!
//! ```ignore
//! let api = api.clone();
//! let input = form.to_update();
//! mutation.run(
//!     async move { api.update_task(id, &input).await.map_err(|e| e.to_string()) },
//!     [QueryKey::Task(id), QueryKey::Tasks],
//! );
//!
//! // In the view's tick
//! match mutation.pump() {
//!     Some(MutationOutcome::Success(task)) => { /* continuation: leave edit mode */ }
//!     Some(MutationOutcome::Failure(e)) => { /* show error */ }
//!     None => {}
//! }
//! ```

use super::client::QueryClient;
use super::key::QueryKey;
use std::future::Future;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// The state of a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationState {
  /// Not started, or settled successfully and handed off
  Idle,
  /// The write is in flight
  Pending,
  /// The last write failed
  Failed(String),
}

/// How a mutation settled. Returned exactly once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome<T> {
  Success(T),
  Failure(String),
}

/// Runs a write once, then invalidates the declared keys.
///
/// The runner never writes into the cache; it only invalidates, so the next
/// read comes from the backend. Invalidation is queued on the cache by the
/// write task itself, so it lands even if the `Mutation` is dropped or never
/// pumped again.
pub struct Mutation<T> {
  client: QueryClient,
  state: MutationState,
  receiver: Option<oneshot::Receiver<Result<T, String>>>,
  invalidates: Vec<QueryKey>,
}

impl<T: Send + 'static> Mutation<T> {
  pub fn new(client: QueryClient) -> Self {
    Self {
      client,
      state: MutationState::Idle,
      receiver: None,
      invalidates: Vec::new(),
    }
  }

  pub fn state(&self) -> &MutationState {
    &self.state
  }

  pub fn is_pending(&self) -> bool {
    matches!(self.state, MutationState::Pending)
  }

  /// Error message from the last failed run.
  pub fn error(&self) -> Option<&str> {
    match &self.state {
      MutationState::Failed(e) => Some(e),
      _ => None,
    }
  }

  /// Clear a failure so the form can be shown clean again.
  pub fn reset(&mut self) {
    if !self.is_pending() {
      self.state = MutationState::Idle;
    }
  }

  /// Start the write. Keys in `invalidates` are invalidated after the backend
  /// acknowledges it.
  ///
  /// Returns `false` without running anything if a previous run is pending.
  pub fn run<Fut>(&mut self, future: Fut, invalidates: impl IntoIterator<Item = QueryKey>) -> bool
  where
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    if self.is_pending() {
      return false;
    }

    let (tx, rx) = oneshot::channel();
    self.receiver = Some(rx);
    self.invalidates = invalidates.into_iter().collect();
    self.state = MutationState::Pending;
    debug!(invalidates = ?self.invalidates, "mutation started");

    let invalidator = self.client.invalidator();
    let keys = self.invalidates.clone();
    tokio::spawn(async move {
      let result = future.await;
      if result.is_ok() {
        invalidator.invalidate(keys);
      }
      // Ignore send errors - the view may have been closed
      let _ = tx.send(result);
    });
    true
  }

  /// Check for the settled result.
  ///
  /// On success the queued invalidation is applied before the outcome is
  /// returned, so continuations always observe the refetch already started.
  pub fn pump(&mut self) -> Option<MutationOutcome<T>> {
    let receiver = self.receiver.as_mut()?;

    let result = match receiver.try_recv() {
      Ok(result) => result,
      Err(oneshot::error::TryRecvError::Empty) => return None,
      Err(oneshot::error::TryRecvError::Closed) => Err("Mutation was cancelled".to_string()),
    };
    self.receiver = None;

    match result {
      Ok(value) => {
        self.invalidates.clear();
        self.client.pump();
        info!("mutation succeeded");
        self.state = MutationState::Idle;
        Some(MutationOutcome::Success(value))
      }
      Err(error) => {
        warn!(%error, "mutation failed");
        self.invalidates.clear();
        self.state = MutationState::Failed(error.clone());
        Some(MutationOutcome::Failure(error))
      }
    }
  }
}

impl<T> std::fmt::Debug for Mutation<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Mutation")
      .field("state", &self.state)
      .field("invalidates", &self.invalidates)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::QueryOptions;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;
  use std::time::Duration;

  async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
  }

  #[tokio::test(start_paused = true)]
  async fn test_success_invalidates_declared_keys() {
    let client = QueryClient::default();
    let fetches = Arc::new(AtomicU32::new(0));
    let fetches_clone = fetches.clone();
    let _sub = client.subscribe(
      QueryKey::Users,
      move || {
        fetches_clone.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, String>(()) }
      },
      QueryOptions::default(),
    );
    settle().await;
    client.pump();

    let mut mutation = Mutation::new(client.clone());
    assert!(mutation.run(async { Ok::<_, String>(42) }, [QueryKey::Users]));
    assert!(mutation.is_pending());

    // Nothing is invalidated before the write is acknowledged
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    settle().await;
    assert_eq!(mutation.pump(), Some(MutationOutcome::Success(42)));
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    assert_eq!(mutation.state(), &MutationState::Idle);

    // Outcome is handed over once
    assert_eq!(mutation.pump(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_dropped_mutation_still_invalidates() {
    let client = QueryClient::default();
    let fetches = Arc::new(AtomicU32::new(0));
    let fetches_clone = fetches.clone();
    let _sub = client.subscribe(
      QueryKey::Users,
      move || {
        fetches_clone.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, String>(()) }
      },
      QueryOptions::default(),
    );
    settle().await;
    client.pump();

    let mut mutation = Mutation::new(client.clone());
    mutation.run(async { Ok::<_, String>(()) }, [QueryKey::Users, QueryKey::Tasks]);
    drop(mutation);

    settle().await;
    client.pump();
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_failure_leaves_cache_untouched() {
    let client = QueryClient::default();
    let fetches = Arc::new(AtomicU32::new(0));
    let fetches_clone = fetches.clone();
    let _sub = client.subscribe(
      QueryKey::Tasks,
      move || {
        fetches_clone.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, String>(()) }
      },
      QueryOptions::default(),
    );
    settle().await;
    client.pump();

    let mut mutation: Mutation<()> = Mutation::new(client.clone());
    mutation.run(async { Err("Task not found".to_string()) }, [QueryKey::Tasks]);
    settle().await;

    assert_eq!(
      mutation.pump(),
      Some(MutationOutcome::Failure("Task not found".to_string()))
    );
    assert_eq!(mutation.error(), Some("Task not found"));
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    mutation.reset();
    assert_eq!(mutation.state(), &MutationState::Idle);
  }

  #[tokio::test(start_paused = true)]
  async fn test_run_while_pending_is_rejected() {
    let client = QueryClient::default();
    let runs = Arc::new(AtomicU32::new(0));

    let mut mutation = Mutation::new(client);
    let first = runs.clone();
    assert!(mutation.run(
      async move {
        first.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok::<_, String>(())
      },
      [],
    ));
    let second = runs.clone();
    assert!(!mutation.run(
      async move {
        second.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>(())
      },
      [],
    ));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(mutation.pump(), Some(MutationOutcome::Success(())));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
  }
}
