//! Run-scoped memoization of source calls
//!
//! Every adapter result is produced at most once per key for the lifetime of
//! a [`MetricsCache`]. Concurrent callers asking for the same key while the
//! first call is still in flight wait for that call instead of issuing their
//! own. Errors are not memoized, so a later caller may retry a failed key.

use quinta_domain::{ActiveUsers, Domain, SearchPerformance, TagId};
use quinta_sources::{HostVisits, PropertyId};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

/// Single-flight memo table keyed by `K`
///
/// # Examples
///
/// ```
/// use quinta_engine::cache::Memo;
///
/// # tokio_test::block_on(async {
/// let memo: Memo<&str, u32> = Memo::new();
/// let a = memo.get_or_try_init(&"k", || async { Ok::<_, ()>(1) }).await;
/// let b = memo.get_or_try_init(&"k", || async { Ok::<_, ()>(2) }).await;
/// assert_eq!((a, b), (Ok(1), Ok(1)));
/// # });
/// ```
#[derive(Debug)]
pub struct Memo<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty memo table
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, key: &K) -> Arc<OnceCell<V>> {
        // The map lock is only held to find the cell, never across an await
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.entry(key.clone()).or_default().clone()
    }

    /// Return the memoized value for `key`, running `init` if there is none
    ///
    /// `init` runs at most once per key while it keeps succeeding.
    pub async fn get_or_try_init<E, F, Fut>(&self, key: &K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = self.cell(key);
        cell.get_or_try_init(init).await.cloned()
    }

    /// The memoized value for `key`, if already produced
    pub fn get(&self, key: &K) -> Option<V> {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Number of keys with a produced value
    pub fn len(&self) -> usize {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.values().filter(|cell| cell.initialized()).count()
    }

    /// Whether no value has been produced yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Active users summed per hostname across every analytics property
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitsByHost {
    users: HashMap<String, u64>,
}

impl VisitsByHost {
    /// Sum hostname rows from any number of property reports
    ///
    /// # Examples
    ///
    /// ```
    /// use quinta_domain::{ActiveUsers, Domain};
    /// use quinta_engine::VisitsByHost;
    /// use quinta_sources::HostVisits;
    ///
    /// let visits = VisitsByHost::from_rows(vec![
    ///     HostVisits::new("example.com", 30),
    ///     HostVisits::new("example.com", 20),
    /// ]);
    /// let domain = Domain::parse("example.com").unwrap();
    /// assert_eq!(visits.active_users(&domain), ActiveUsers::Count(50));
    /// ```
    pub fn from_rows(rows: impl IntoIterator<Item = HostVisits>) -> Self {
        let mut users: HashMap<String, u64> = HashMap::new();
        for row in rows {
            let total = users.entry(row.host).or_insert(0);
            *total = total.saturating_add(row.active_users);
        }
        Self { users }
    }

    /// Active users for a domain, `Unavailable` when no property reports it
    pub fn active_users(&self, domain: &Domain) -> ActiveUsers {
        self.users.get(domain.as_str()).copied().into()
    }

    /// Number of distinct hostnames
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no hostname was reported
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Entry counts per cache slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Cached uptime results
    pub uptime: usize,
    /// Cached word counts
    pub content_size: usize,
    /// Cached search figures
    pub search_performance: usize,
    /// Cached tag lookups
    pub tag_id: usize,
    /// Whether the session was acquired
    pub session: bool,
    /// Whether the property list was fetched
    pub properties: bool,
    /// Whether the visits mapping was built
    pub visits: bool,
}

/// Memoized results of every source adapter for one run
///
/// Per-domain adapters are keyed by [`Domain`]. The authenticated session,
/// the property enumeration and the visits mapping are whole-run values held
/// under a single constant slot each. The property list is stored fully
/// materialized, so every reader sees the same finite sequence.
pub struct MetricsCache<S> {
    pub(crate) session: OnceCell<Arc<S>>,
    pub(crate) uptime: Memo<Domain, bool>,
    pub(crate) content_size: Memo<Domain, u64>,
    pub(crate) search_performance: Memo<Domain, SearchPerformance>,
    pub(crate) tag_id: Memo<Domain, Option<TagId>>,
    pub(crate) properties: OnceCell<Arc<Vec<PropertyId>>>,
    pub(crate) visits: OnceCell<Arc<VisitsByHost>>,
}

impl<S> Default for MetricsCache<S> {
    fn default() -> Self {
        Self {
            session: OnceCell::new(),
            uptime: Memo::default(),
            content_size: Memo::default(),
            search_performance: Memo::default(),
            tag_id: Memo::default(),
            properties: OnceCell::new(),
            visits: OnceCell::new(),
        }
    }
}

impl<S> MetricsCache<S> {
    /// Create an empty cache for a new run
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an empty visits mapping unless one was already built
    ///
    /// Used when the analytics sources fail and the run continues without
    /// user counts.
    pub fn degrade_visits(&self) -> Arc<VisitsByHost> {
        if self.visits.set(Arc::new(VisitsByHost::default())).is_err() {
            tracing::debug!("visits already cached, keeping existing mapping");
        }
        self.visits.get().cloned().unwrap_or_default()
    }

    /// How many values each slot holds
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            uptime: self.uptime.len(),
            content_size: self.content_size.len(),
            search_performance: self.search_performance.len(),
            tag_id: self.tag_id.len(),
            session: self.session.initialized(),
            properties: self.properties.initialized(),
            visits: self.visits.initialized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_memo_runs_producer_once() {
        let memo: Memo<String, u64> = Memo::new();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        for _ in 0..3 {
            let value = memo
                .get_or_try_init(&"a".to_string(), move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(memo.get(&"a".to_string()), Some(7));
        assert_eq!(memo.len(), 1);
    }

    #[tokio::test]
    async fn test_memo_keys_are_independent() {
        let memo: Memo<&str, &str> = Memo::new();
        let a = memo.get_or_try_init(&"a", || async { Ok::<_, ()>("A") }).await;
        let b = memo.get_or_try_init(&"b", || async { Ok::<_, ()>("B") }).await;
        assert_eq!(a, Ok("A"));
        assert_eq!(b, Ok("B"));
        assert_eq!(memo.len(), 2);
    }

    #[tokio::test]
    async fn test_memo_does_not_cache_errors() {
        let memo: Memo<u8, u8> = Memo::new();
        let first = memo.get_or_try_init(&1, || async { Err::<u8, _>("boom") }).await;
        assert_eq!(first, Err("boom"));
        assert!(memo.is_empty());

        let second = memo.get_or_try_init(&1, || async { Ok::<_, &str>(9) }).await;
        assert_eq!(second, Ok(9));
    }

    #[tokio::test]
    async fn test_memo_single_flight_under_concurrency() {
        let memo: Memo<u8, u64> = Memo::new();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let producer = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, ()>(42)
        };

        let (a, b, c) = tokio::join!(
            memo.get_or_try_init(&0, producer),
            memo.get_or_try_init(&0, producer),
            memo.get_or_try_init(&0, producer),
        );

        assert_eq!((a, b, c), (Ok(42), Ok(42), Ok(42)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_memo_blocking_runtime() {
        let memo: Memo<&str, i32> = Memo::new();
        let value = tokio_test::block_on(memo.get_or_try_init(&"x", || async { Ok::<_, ()>(-3) }));
        assert_eq!(value, Ok(-3));
        assert_eq!(memo.get(&"x"), Some(-3));
        assert_eq!(memo.get(&"y"), None);
    }

    #[test]
    fn test_visits_sum_across_properties() {
        let visits = VisitsByHost::from_rows(vec![
            HostVisits::new("a.com", 10),
            HostVisits::new("b.com", 1),
            HostVisits::new("a.com", 5),
        ]);
        let a = Domain::parse("a.com").unwrap();
        let c = Domain::parse("c.com").unwrap();

        assert_eq!(visits.len(), 2);
        assert_eq!(visits.active_users(&a), ActiveUsers::Count(15));
        assert_eq!(visits.active_users(&c), ActiveUsers::Unavailable);
    }

    #[test]
    fn test_visits_sum_saturates() {
        let visits = VisitsByHost::from_rows(vec![
            HostVisits::new("a.com", u64::MAX),
            HostVisits::new("a.com", 3),
        ]);
        let a = Domain::parse("a.com").unwrap();
        assert_eq!(visits.active_users(&a), ActiveUsers::Count(u64::MAX));
    }

    #[test]
    fn test_degrade_visits_keeps_existing_mapping() {
        let cache: MetricsCache<()> = MetricsCache::new();
        let built = Arc::new(VisitsByHost::from_rows(vec![HostVisits::new("a.com", 1)]));
        cache.visits.set(built.clone()).unwrap();

        assert_eq!(cache.degrade_visits(), built);
    }

    #[test]
    fn test_degrade_visits_on_empty_cache() {
        let cache: MetricsCache<()> = MetricsCache::new();
        assert!(cache.degrade_visits().is_empty());
        assert!(cache.stats().visits);
        assert!(!cache.stats().session);
    }
}
