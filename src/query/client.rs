//! Shared, keyed query cache.
//!
//! Inspired by TanStack Query: many views subscribe to the same [`QueryKey`]
//! and share one cached value and at most one in-flight fetch. Fetches run as
//! tokio tasks; their results come back over a channel and are applied by
//! [`QueryClient::pump`], which the UI calls on every tick together with
//! polling and garbage collection.
//!
//! All cache state lives on the UI task, so the client is an `Rc<RefCell<_>>`
//! handle rather than a lock.

use super::key::QueryKey;
use futures::future::BoxFuture;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

type AnyValue = Box<dyn Any + Send>;
type FetchResult = Result<AnyValue, String>;
type FetcherFn = Rc<dyn Fn() -> BoxFuture<'static, FetchResult>>;

/// Per-subscription options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
  /// Refetch on this interval while the subscription is alive
  pub poll_interval: Option<Duration>,
  /// Cached data younger than this is served without refetching on subscribe
  pub stale_time: Duration,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      poll_interval: None,
      stale_time: Duration::ZERO,
    }
  }
}

impl QueryOptions {
  pub fn polling(interval: Duration) -> Self {
    Self {
      poll_interval: Some(interval),
      ..Self::default()
    }
  }

  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }
}

/// Point-in-time view of a cache entry.
#[derive(Debug)]
pub struct QuerySnapshot<T> {
  /// Last successfully fetched value, kept across failed refreshes
  pub data: Option<Rc<T>>,
  /// A fetch is in flight
  pub is_fetching: bool,
  /// Error from the most recent fetch, cleared by the next success
  pub error: Option<String>,
}

impl<T> QuerySnapshot<T> {
  /// Fetching with nothing to show yet.
  pub fn is_loading(&self) -> bool {
    self.is_fetching && self.data.is_none()
  }
}

impl<T> Clone for QuerySnapshot<T> {
  fn clone(&self) -> Self {
    Self {
      data: self.data.clone(),
      is_fetching: self.is_fetching,
      error: self.error.clone(),
    }
  }
}

struct Completion {
  key: QueryKey,
  seq: u64,
  result: FetchResult,
}

/// Work sent back to the UI task, applied in [`QueryClient::pump`].
enum Message {
  Fetched(Completion),
  Invalidate(Vec<QueryKey>),
}

/// Sendable handle that asks the cache to invalidate keys on its next pump.
///
/// Writes hold one of these so an acknowledged write invalidates its keys even
/// after the view that started it is gone.
#[derive(Clone)]
pub struct Invalidator {
  tx: mpsc::UnboundedSender<Message>,
}

impl Invalidator {
  pub fn invalidate(&self, keys: Vec<QueryKey>) {
    if keys.is_empty() {
      return;
    }
    // Receiver lives as long as the client; nothing to do if it is gone
    let _ = self.tx.send(Message::Invalidate(keys));
  }
}

struct InFlight {
  seq: u64,
  handle: JoinHandle<()>,
}

struct Entry {
  data: Option<Rc<dyn Any>>,
  error: Option<String>,
  fetched_at: Option<Instant>,
  invalidated: bool,
  fetcher: FetcherFn,
  in_flight: Option<InFlight>,
  issued_seq: u64,
  observers: HashMap<u64, QueryOptions>,
  next_poll: Option<Instant>,
  unobserved_since: Option<Instant>,
}

impl Entry {
  fn new(fetcher: FetcherFn) -> Self {
    Self {
      data: None,
      error: None,
      fetched_at: None,
      invalidated: false,
      fetcher,
      in_flight: None,
      issued_seq: 0,
      observers: HashMap::new(),
      next_poll: None,
      unobserved_since: None,
    }
  }

  /// Shortest poll interval among the current observers.
  fn poll_interval(&self) -> Option<Duration> {
    self.observers.values().filter_map(|o| o.poll_interval).min()
  }

  fn is_stale(&self, stale_time: Duration, now: Instant) -> bool {
    self.invalidated
      || self
        .fetched_at
        .map(|t| now.duration_since(t) >= stale_time)
        .unwrap_or(true)
  }

  fn poll_due(&self, now: Instant) -> bool {
    self.next_poll.map(|t| now >= t).unwrap_or(false)
  }
}

struct Inner {
  entries: HashMap<QueryKey, Entry>,
  next_observer: u64,
  gc_time: Duration,
  tx: mpsc::UnboundedSender<Message>,
  rx: mpsc::UnboundedReceiver<Message>,
}

impl Inner {
  /// Start a fetch for `key`, superseding any fetch already in flight.
  fn start_fetch(&mut self, key: QueryKey, now: Instant) {
    let tx = self.tx.clone();
    let Some(entry) = self.entries.get_mut(&key) else {
      return;
    };

    if let Some(previous) = entry.in_flight.take() {
      debug!(%key, seq = previous.seq, "superseding in-flight fetch");
      previous.handle.abort();
    }

    entry.issued_seq += 1;
    let seq = entry.issued_seq;
    let future = (entry.fetcher)();
    let handle = tokio::spawn(async move {
      let result = future.await;
      // Receiver lives as long as the client; nothing to do if it is gone
      let _ = tx.send(Message::Fetched(Completion { key, seq, result }));
    });

    entry.in_flight = Some(InFlight { seq, handle });
    entry.next_poll = entry.poll_interval().map(|interval| now + interval);
    debug!(%key, seq, "fetch started");
  }

  /// Apply a finished fetch. Returns whether the entry changed.
  fn apply(&mut self, completion: Completion) -> bool {
    let Completion { key, seq, result } = completion;
    let Some(entry) = self.entries.get_mut(&key) else {
      return false;
    };

    match &entry.in_flight {
      Some(in_flight) if in_flight.seq == seq => {}
      _ => {
        debug!(%key, seq, "discarding superseded response");
        return false;
      }
    }
    entry.in_flight = None;

    match result {
      Ok(value) => {
        let value: Box<dyn Any> = value;
        entry.data = Some(Rc::from(value));
        entry.error = None;
        entry.fetched_at = Some(Instant::now());
        entry.invalidated = false;
        debug!(%key, seq, "fetch succeeded");
      }
      Err(error) => {
        warn!(%key, seq, %error, "fetch failed");
        entry.error = Some(error);
      }
    }
    true
  }

  /// Mark `key` stale and refetch it if anyone is watching.
  fn invalidate(&mut self, key: QueryKey, now: Instant) -> bool {
    let Some(entry) = self.entries.get_mut(&key) else {
      return false;
    };
    entry.invalidated = true;
    let active = !entry.observers.is_empty();
    debug!(%key, active, "invalidated");
    if active {
      self.start_fetch(key, now);
    }
    true
  }

  /// Drop entries nobody has observed for `gc_time`.
  fn collect_garbage(&mut self, now: Instant) {
    let gc_time = self.gc_time;
    self.entries.retain(|key, entry| {
      let expired = entry.in_flight.is_none()
        && entry
          .unobserved_since
          .map(|since| now.duration_since(since) >= gc_time)
          .unwrap_or(false);
      if expired {
        debug!(%key, "evicting unobserved entry");
      }
      !expired
    });
  }
}

/// Injectable query cache handle. Clones share the same cache.
#[derive(Clone)]
pub struct QueryClient {
  inner: Rc<RefCell<Inner>>,
}

impl Default for QueryClient {
  fn default() -> Self {
    Self::new(Duration::from_secs(300))
  }
}

impl QueryClient {
  /// Create an empty cache. Entries without subscribers are evicted after `gc_time`.
  pub fn new(gc_time: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      inner: Rc::new(RefCell::new(Inner {
        entries: HashMap::new(),
        next_observer: 0,
        gc_time,
        tx,
        rx,
      })),
    }
  }

  /// Subscribe to `key`.
  ///
  /// The first subscription fetches immediately. Later ones attach to the
  /// in-flight fetch or serve the cached value, refetching only when it is
  /// missing, stale or invalidated. The latest fetcher replaces the stored one.
  pub fn subscribe<T, F, Fut>(&self, key: QueryKey, fetcher: F, options: QueryOptions) -> Subscription<T>
  where
    T: Send + 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let fetcher: FetcherFn = Rc::new(move || {
      let future = fetcher();
      Box::pin(async move { future.await.map(|value| Box::new(value) as AnyValue) })
    });

    let now = Instant::now();
    let mut inner = self.inner.borrow_mut();
    let id = inner.next_observer;
    inner.next_observer += 1;

    let entry = inner
      .entries
      .entry(key)
      .or_insert_with(|| Entry::new(fetcher.clone()));
    entry.fetcher = fetcher;
    entry.observers.insert(id, options);
    entry.unobserved_since = None;

    if let Some(interval) = options.poll_interval {
      let candidate = now + interval;
      entry.next_poll = Some(entry.next_poll.map_or(candidate, |t| t.min(candidate)));
    }

    let needs_fetch = entry.in_flight.is_none()
      && (entry.data.is_none() || entry.is_stale(options.stale_time, now));
    if needs_fetch {
      inner.start_fetch(key, now);
    } else {
      debug!(%key, "subscribed to cached entry");
    }

    Subscription {
      client: self.clone(),
      key,
      id,
      _marker: PhantomData,
    }
  }

  /// Mark `key` stale. Active subscribers refetch right away.
  pub fn invalidate(&self, key: QueryKey) {
    self.inner.borrow_mut().invalidate(key, Instant::now());
  }

  /// Handle for invalidating keys from outside the UI task.
  pub fn invalidator(&self) -> Invalidator {
    Invalidator {
      tx: self.inner.borrow().tx.clone(),
    }
  }

  /// Invalidate every cached key.
  pub fn invalidate_all(&self) {
    let keys: Vec<QueryKey> = self.inner.borrow().entries.keys().copied().collect();
    for key in keys {
      self.invalidate(key);
    }
  }

  /// Apply finished fetches and queued invalidations, fire due polls and
  /// evict unobserved entries.
  ///
  /// Returns `true` if any entry changed. Call this on every UI tick.
  pub fn pump(&self) -> bool {
    let mut inner = self.inner.borrow_mut();
    let mut changed = false;

    while let Ok(message) = inner.rx.try_recv() {
      changed |= match message {
        Message::Fetched(completion) => inner.apply(completion),
        Message::Invalidate(keys) => {
          let now = Instant::now();
          keys
            .into_iter()
            .fold(false, |changed, key| inner.invalidate(key, now) | changed)
        }
      };
    }

    let now = Instant::now();
    let due: Vec<QueryKey> = inner
      .entries
      .iter()
      .filter(|(_, entry)| entry.poll_due(now))
      .map(|(key, _)| *key)
      .collect();

    for key in due {
      let Some(entry) = inner.entries.get_mut(&key) else {
        continue;
      };
      if entry.in_flight.is_some() {
        // Already fetching; wait for the next interval
        entry.next_poll = entry.poll_interval().map(|interval| now + interval);
        continue;
      }
      inner.start_fetch(key, now);
      changed = true;
    }

    inner.collect_garbage(now);
    changed
  }

  /// Current state of `key`, if it is cached.
  pub fn snapshot<T: 'static>(&self, key: QueryKey) -> QuerySnapshot<T> {
    let inner = self.inner.borrow();
    match inner.entries.get(&key) {
      Some(entry) => QuerySnapshot {
        data: entry.data.clone().and_then(|data| data.downcast::<T>().ok()),
        is_fetching: entry.in_flight.is_some(),
        error: entry.error.clone(),
      },
      None => QuerySnapshot {
        data: None,
        is_fetching: false,
        error: None,
      },
    }
  }

  /// Whether `key` currently has an entry.
  pub fn contains(&self, key: QueryKey) -> bool {
    self.inner.borrow().entries.contains_key(&key)
  }

  fn refetch(&self, key: QueryKey) {
    self.inner.borrow_mut().start_fetch(key, Instant::now());
  }

  fn detach(&self, key: QueryKey, id: u64) {
    let mut inner = self.inner.borrow_mut();
    let Some(entry) = inner.entries.get_mut(&key) else {
      return;
    };
    entry.observers.remove(&id);
    if entry.poll_interval().is_none() {
      entry.next_poll = None;
    }
    if entry.observers.is_empty() {
      entry.unobserved_since = Some(Instant::now());
      debug!(%key, "last subscriber detached");
    }
  }
}

/// A live subscription to one cache entry. Detaches on drop.
pub struct Subscription<T> {
  client: QueryClient,
  key: QueryKey,
  id: u64,
  _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Subscription<T> {
  pub fn key(&self) -> QueryKey {
    self.key
  }

  pub fn snapshot(&self) -> QuerySnapshot<T> {
    self.client.snapshot(self.key)
  }

  pub fn data(&self) -> Option<Rc<T>> {
    self.snapshot().data
  }

  pub fn is_loading(&self) -> bool {
    self.snapshot().is_loading()
  }

  pub fn error(&self) -> Option<String> {
    self.snapshot().error
  }

  /// Fetch again now, superseding any in-flight fetch.
  pub fn refetch(&self) {
    self.client.refetch(self.key);
  }
}

impl<T: Clone + 'static> Subscription<Option<T>> {
  /// The record, once the backend has answered that it exists.
  pub fn found(&self) -> Option<T> {
    self.data().and_then(|data| (*data).clone())
  }
}

impl<T> Drop for Subscription<T> {
  fn drop(&mut self) {
    self.client.detach(self.key, self.id);
  }
}

impl<T> std::fmt::Debug for Subscription<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("key", &self.key)
      .field("id", &self.id)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  /// Let spawned fetches finish, then apply them.
  async fn settle(client: &QueryClient) {
    tokio::time::sleep(Duration::from_millis(1)).await;
    client.pump();
  }

  fn counting(calls: &Arc<AtomicU32>) -> impl Fn() -> futures::future::Ready<Result<u32, String>> {
    let calls = calls.clone();
    move || {
      let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
      futures::future::ready(Ok(n))
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_first_subscription_fetches_immediately() {
    let client = QueryClient::default();
    let calls = Arc::new(AtomicU32::new(0));

    let sub = client.subscribe(QueryKey::Users, counting(&calls), QueryOptions::default());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(sub.is_loading());

    settle(&client).await;
    assert!(!sub.is_loading());
    assert_eq!(sub.data().as_deref(), Some(&1));
  }

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_subscriptions_share_one_fetch() {
    let client = QueryClient::default();
    let calls = Arc::new(AtomicU32::new(0));

    let first = client.subscribe(QueryKey::Tasks, counting(&calls), QueryOptions::default());
    let second = client.subscribe(QueryKey::Tasks, counting(&calls), QueryOptions::default());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    settle(&client).await;
    assert_eq!(first.data().as_deref(), Some(&1));
    assert_eq!(second.data().as_deref(), Some(&1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_polling_refetches_each_interval_until_detached() {
    let client = QueryClient::default();
    let calls = Arc::new(AtomicU32::new(0));
    let interval = Duration::from_secs(1);

    let sub = client.subscribe(QueryKey::Tasks, counting(&calls), QueryOptions::polling(interval));
    settle(&client).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    for expected in 2..=4 {
      tokio::time::advance(interval).await;
      client.pump();
      assert_eq!(calls.load(Ordering::SeqCst), expected);
      settle(&client).await;
    }
    assert_eq!(sub.data().as_deref(), Some(&4));

    drop(sub);
    tokio::time::advance(interval * 3).await;
    client.pump();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
  }

  #[tokio::test(start_paused = true)]
  async fn test_polling_uses_shortest_observer_interval() {
    let client = QueryClient::default();
    let calls = Arc::new(AtomicU32::new(0));
    let fast = Duration::from_secs(1);

    let _slow = client.subscribe(
      QueryKey::Tasks,
      counting(&calls),
      QueryOptions::polling(Duration::from_secs(3)),
    );
    let _fast = client.subscribe(QueryKey::Tasks, counting(&calls), QueryOptions::polling(fast));
    settle(&client).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    for expected in 2..=3 {
      tokio::time::advance(fast).await;
      client.pump();
      assert_eq!(calls.load(Ordering::SeqCst), expected);
      settle(&client).await;
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_polling_stops_with_last_polling_subscriber() {
    let client = QueryClient::default();
    let calls = Arc::new(AtomicU32::new(0));
    let interval = Duration::from_secs(1);

    let polling = client.subscribe(QueryKey::Users, counting(&calls), QueryOptions::polling(interval));
    let plain = client.subscribe(QueryKey::Users, counting(&calls), QueryOptions::default());
    settle(&client).await;

    tokio::time::advance(interval).await;
    client.pump();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    settle(&client).await;

    drop(polling);
    tokio::time::advance(interval * 3).await;
    client.pump();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // The remaining subscriber still sees the cached value
    assert!(client.contains(QueryKey::Users));
    assert_eq!(plain.data().as_deref(), Some(&2));
  }

  #[tokio::test(start_paused = true)]
  async fn test_poll_skips_while_fetch_in_flight() {
    let client = QueryClient::default();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();

    let _sub = client.subscribe(
      QueryKey::Tasks,
      move || {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        async {
          tokio::time::sleep(Duration::from_secs(5)).await;
          Ok::<_, String>(())
        }
      },
      QueryOptions::polling(Duration::from_secs(1)),
    );

    tokio::time::advance(Duration::from_secs(1)).await;
    client.pump();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_invalidate_refetches_active_subscribers() {
    let client = QueryClient::default();
    let calls = Arc::new(AtomicU32::new(0));

    let sub = client.subscribe(QueryKey::User(1), counting(&calls), QueryOptions::default());
    settle(&client).await;
    assert_eq!(sub.data().as_deref(), Some(&1));

    client.invalidate(QueryKey::User(1));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    settle(&client).await;
    assert_eq!(sub.data().as_deref(), Some(&2));
  }

  #[tokio::test(start_paused = true)]
  async fn test_invalidate_without_subscribers_refetches_on_next_subscribe() {
    let client = QueryClient::default();
    let calls = Arc::new(AtomicU32::new(0));
    let options = QueryOptions::default().with_stale_time(Duration::from_secs(60));

    let sub = client.subscribe(QueryKey::Users, counting(&calls), options);
    settle(&client).await;
    drop(sub);

    // Fresh data is served from cache
    let sub = client.subscribe(QueryKey::Users, counting(&calls), options);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    drop(sub);

    client.invalidate(QueryKey::Users);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let sub = client.subscribe(QueryKey::Users, counting(&calls), options);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // Stale value is visible while the refetch runs
    assert_eq!(sub.data().as_deref(), Some(&1));
  }

  #[tokio::test(start_paused = true)]
  async fn test_error_keeps_previous_data() {
    let client = QueryClient::default();
    let fail = Arc::new(AtomicU32::new(0));
    let fail_clone = fail.clone();

    let sub = client.subscribe(
      QueryKey::Task(7),
      move || {
        let failing = fail_clone.load(Ordering::SeqCst) == 1;
        async move {
          if failing {
            Err("backend unavailable".to_string())
          } else {
            Ok("first".to_string())
          }
        }
      },
      QueryOptions::default(),
    );
    settle(&client).await;
    assert_eq!(sub.data().as_deref().map(String::as_str), Some("first"));

    fail.store(1, Ordering::SeqCst);
    sub.refetch();
    settle(&client).await;

    let snapshot = sub.snapshot();
    assert_eq!(snapshot.data.as_deref().map(String::as_str), Some("first"));
    assert_eq!(snapshot.error.as_deref(), Some("backend unavailable"));

    fail.store(0, Ordering::SeqCst);
    sub.refetch();
    settle(&client).await;
    assert!(sub.error().is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_superseded_response_is_discarded() {
    let client = QueryClient::default();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();

    // First fetch is slow, second is fast
    let sub = client.subscribe(
      QueryKey::Tasks,
      move || {
        let n = calls_clone.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
          if n == 1 {
            tokio::time::sleep(Duration::from_secs(2)).await;
          }
          Ok::<_, String>(n)
        }
      },
      QueryOptions::default(),
    );

    client.invalidate(QueryKey::Tasks);
    settle(&client).await;
    assert_eq!(sub.data().as_deref(), Some(&2));

    tokio::time::advance(Duration::from_secs(3)).await;
    client.pump();
    assert_eq!(sub.data().as_deref(), Some(&2));
  }

  #[tokio::test(start_paused = true)]
  async fn test_unobserved_entries_are_collected() {
    let client = QueryClient::new(Duration::from_secs(10));
    let calls = Arc::new(AtomicU32::new(0));

    let sub = client.subscribe(QueryKey::Users, counting(&calls), QueryOptions::default());
    settle(&client).await;
    drop(sub);
    assert!(client.contains(QueryKey::Users));

    tokio::time::advance(Duration::from_secs(11)).await;
    client.pump();
    assert!(!client.contains(QueryKey::Users));
  }

  #[tokio::test(start_paused = true)]
  async fn test_snapshot_with_wrong_type_has_no_data() {
    let client = QueryClient::default();
    let _sub = client.subscribe(
      QueryKey::Users,
      || async { Ok::<_, String>(5u32) },
      QueryOptions::default(),
    );
    settle(&client).await;

    assert!(client.snapshot::<String>(QueryKey::Users).data.is_none());
    assert_eq!(client.snapshot::<u32>(QueryKey::Users).data.as_deref(), Some(&5));
  }
}
