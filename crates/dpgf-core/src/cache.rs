//! Keyed response cache with prefix invalidation
//!
//! The cache is a plain value owned by whoever needs it: the browser app
//! wraps it in `Rc<RefCell<_>>` and hands clones to its views, tests build a
//! fresh one per case. Values are stored as `Arc<T>` so a view can tell two
//! snapshots apart by pointer identity (see [`crate::memo::Memo`]).

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Hierarchical cache key, e.g. `["dpgf", "42", "structure"]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Append one segment
    pub fn with(mut self, part: impl ToString) -> Self {
        self.0.push(part.to_string());
        self
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// True when `prefix` is a leading run of this key's segments
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn clients() -> Self {
        Self::new(["clients"])
    }

    pub fn documents() -> Self {
        Self::new(["dpgfs"])
    }

    pub fn document(id: i64) -> Self {
        Self::new(["dpgf"]).with(id)
    }

    pub fn structure(id: i64) -> Self {
        Self::new(["dpgf_structure"]).with(id)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Result of a cache lookup
#[derive(Debug)]
pub enum Lookup<T> {
    Fresh(Arc<T>),
    /// Present but invalidated since it was stored; still displayable
    Stale(Arc<T>),
    Missing,
}

impl<T> Lookup<T> {
    pub fn value(&self) -> Option<&Arc<T>> {
        match self {
            Lookup::Fresh(v) | Lookup::Stale(v) => Some(v),
            Lookup::Missing => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Lookup::Fresh(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(QueryKey),
    Invalidated(QueryKey),
}

impl CacheEvent {
    pub fn key(&self) -> &QueryKey {
        match self {
            CacheEvent::Updated(k) | CacheEvent::Invalidated(k) => k,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&CacheEvent)>;

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    stale: bool,
}

struct Subscriber {
    id: SubscriptionId,
    key: QueryKey,
    listener: Listener,
}

#[derive(Default)]
pub struct QueryCache {
    entries: BTreeMap<QueryKey, Entry>,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key` as a `T`; an entry stored under another type is `Missing`
    pub fn get<T: Any + Send + Sync>(&self, key: &QueryKey) -> Lookup<T> {
        let Some(entry) = self.entries.get(key) else {
            return Lookup::Missing;
        };
        match Arc::clone(&entry.value).downcast::<T>() {
            Ok(value) if entry.stale => Lookup::Stale(value),
            Ok(value) => Lookup::Fresh(value),
            Err(_) => Lookup::Missing,
        }
    }

    /// Store a value, replacing any previous entry and clearing staleness
    pub fn set<T: Any + Send + Sync>(&mut self, key: QueryKey, value: Arc<T>) {
        debug!(%key, "cache set");
        self.entries.insert(
            key.clone(),
            Entry {
                value,
                stale: false,
            },
        );
        self.notify(&CacheEvent::Updated(key));
    }

    /// Mark every entry under `prefix` stale; returns how many were affected
    pub fn invalidate(&mut self, prefix: &QueryKey) -> usize {
        let keys: Vec<QueryKey> = self
            .entries
            .iter_mut()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, entry)| {
                entry.stale = true;
                key.clone()
            })
            .collect();

        debug!(%prefix, count = keys.len(), "cache invalidate");
        for key in &keys {
            self.notify(&CacheEvent::Invalidated(key.clone()));
        }
        keys.len()
    }

    pub fn remove(&mut self, key: &QueryKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Call `listener` for every event on `key` or on keys below it
    pub fn subscribe<F>(&mut self, key: QueryKey, listener: F) -> SubscriptionId
    where
        F: FnMut(&CacheEvent) + 'static,
    {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.push(Subscriber {
            id,
            key,
            listener: Box::new(listener),
        });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self, event: &CacheEvent) {
        for subscriber in &mut self.subscribers {
            if event.key().starts_with(&subscriber.key) {
                (subscriber.listener)(event);
            }
        }
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_get_set_roundtrip_keeps_identity() {
        let mut cache = QueryCache::new();
        let value = Arc::new(vec![1, 2, 3]);
        cache.set(QueryKey::clients(), Arc::clone(&value));

        match cache.get::<Vec<i32>>(&QueryKey::clients()) {
            Lookup::Fresh(v) => assert!(Arc::ptr_eq(&v, &value)),
            other => panic!("expected fresh entry, got {:?}", other),
        }
    }

    #[test]
    fn test_type_mismatch_is_missing() {
        let mut cache = QueryCache::new();
        cache.set(QueryKey::clients(), Arc::new(5u32));
        assert!(matches!(
            cache.get::<String>(&QueryKey::clients()),
            Lookup::Missing
        ));
    }

    #[test]
    fn test_invalidate_prefix_marks_stale_until_set() {
        let mut cache = QueryCache::new();
        let page = QueryKey::documents().with(100).with(0);
        cache.set(page.clone(), Arc::new("page".to_string()));
        cache.set(QueryKey::clients(), Arc::new("clients".to_string()));

        assert_eq!(cache.invalidate(&QueryKey::documents()), 1);
        assert!(matches!(cache.get::<String>(&page), Lookup::Stale(_)));
        assert!(cache.get::<String>(&QueryKey::clients()).is_fresh());

        cache.set(page.clone(), Arc::new("page 2".to_string()));
        assert!(cache.get::<String>(&page).is_fresh());
    }

    #[test]
    fn test_prefix_is_segment_wise() {
        let key = QueryKey::document(42);
        assert!(key.starts_with(&QueryKey::new(["dpgf"])));
        assert!(!QueryKey::documents().starts_with(&QueryKey::new(["dpgf"])));
        assert!(!key.starts_with(&QueryKey::document(4)));
    }

    #[test]
    fn test_subscribers_see_matching_events() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut cache = QueryCache::new();

        let sink = Rc::clone(&seen);
        let id = cache.subscribe(QueryKey::documents(), move |event| {
            sink.borrow_mut().push(event.clone());
        });

        let page = QueryKey::documents().with(100).with(0);
        cache.set(page.clone(), Arc::new(1u8));
        cache.set(QueryKey::clients(), Arc::new(2u8));
        cache.invalidate(&QueryKey::documents());

        assert_eq!(
            *seen.borrow(),
            vec![
                CacheEvent::Updated(page.clone()),
                CacheEvent::Invalidated(page.clone())
            ]
        );

        assert!(cache.unsubscribe(id));
        cache.set(page, Arc::new(3u8));
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(QueryKey::structure(7).to_string(), "[dpgf_structure, 7]");
    }
}
