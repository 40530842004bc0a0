//! A write-back cache over a store.
//!
//! Every execution works against its own `DataCache`. Changes stay in the
//! cache until [`DataCache::commit`]; dropping the cache discards them.

use crate::storage::{StorageItem, StorageKey};
use crate::Result;
use neo_persistence::{seek_bounds, SeekDirection, SeekIterator, Store, WriteBatch};
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::sync::Arc;
use tracing::debug;

/// Represents the state of a cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// Read from the store and unchanged.
    None,
    Added,
    Changed,
    Deleted,
}

/// Represents an entry in the cache.
#[derive(Debug, Clone)]
pub struct Trackable {
    pub key: StorageKey,
    pub item: StorageItem,
    pub state: TrackState,
}

impl Trackable {
    pub fn new(key: StorageKey, item: StorageItem, state: TrackState) -> Self {
        Self { key, item, state }
    }
}

/// Represents a cache for the underlying storage.
pub struct DataCache {
    store: Arc<dyn Store>,
    dictionary: BTreeMap<Vec<u8>, Trackable>,
}

impl std::fmt::Debug for DataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCache")
            .field("tracked", &self.dictionary.len())
            .finish()
    }
}

impl DataCache {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            dictionary: BTreeMap::new(),
        }
    }

    fn load(&self, raw: &[u8]) -> Option<StorageItem> {
        self.store.try_get(raw).map(StorageItem::new)
    }

    /// Reads an entry, seeing uncommitted changes.
    pub fn try_get(&self, key: &StorageKey) -> Option<StorageItem> {
        let raw = key.to_array();
        match self.dictionary.get(&raw) {
            Some(trackable) if trackable.state == TrackState::Deleted => None,
            Some(trackable) => Some(trackable.item.clone()),
            None => self.load(&raw),
        }
    }

    pub fn contains(&self, key: &StorageKey) -> bool {
        let raw = key.to_array();
        match self.dictionary.get(&raw) {
            Some(trackable) => trackable.state != TrackState::Deleted,
            None => self.store.contains(&raw),
        }
    }

    /// Adds a new entry. Fails if the key already exists.
    pub fn add(&mut self, key: StorageKey, item: StorageItem) -> Result<()> {
        let raw = key.to_array();
        let state = match self.dictionary.get(&raw).map(|t| t.state) {
            Some(TrackState::Deleted) => TrackState::Changed,
            Some(_) => {
                return Err(crate::Error::state(format!("{key} already exists")));
            }
            None if self.store.contains(&raw) => {
                return Err(crate::Error::state(format!("{key} already exists")));
            }
            None => TrackState::Added,
        };
        self.dictionary.insert(raw, Trackable::new(key, item, state));
        Ok(())
    }

    /// Returns the entry for in-place modification, marking it changed.
    pub fn get_and_change(&mut self, key: &StorageKey) -> Option<&mut StorageItem> {
        let raw = key.to_array();
        if !self.dictionary.contains_key(&raw) {
            let item = self.load(&raw)?;
            self.dictionary
                .insert(raw.clone(), Trackable::new(key.clone(), item, TrackState::Changed));
        }
        let trackable = self.dictionary.get_mut(&raw)?;
        match trackable.state {
            TrackState::Deleted => None,
            TrackState::None => {
                trackable.state = TrackState::Changed;
                Some(&mut trackable.item)
            }
            TrackState::Added | TrackState::Changed => Some(&mut trackable.item),
        }
    }

    /// Returns the entry for modification, creating it with `factory` if absent.
    pub fn get_or_add(
        &mut self,
        key: &StorageKey,
        factory: impl FnOnce() -> StorageItem,
    ) -> &mut StorageItem {
        let raw = key.to_array();
        let loaded = if self.dictionary.contains_key(&raw) {
            None
        } else {
            self.load(&raw)
        };
        let trackable = match self.dictionary.entry(raw) {
            Entry::Vacant(slot) => slot.insert(match loaded {
                Some(item) => Trackable::new(key.clone(), item, TrackState::Changed),
                None => Trackable::new(key.clone(), factory(), TrackState::Added),
            }),
            Entry::Occupied(slot) => {
                let trackable = slot.into_mut();
                match trackable.state {
                    TrackState::Deleted => {
                        trackable.item = factory();
                        trackable.state = TrackState::Changed;
                    }
                    TrackState::None => trackable.state = TrackState::Changed,
                    TrackState::Added | TrackState::Changed => {}
                }
                trackable
            }
        };
        &mut trackable.item
    }

    /// Removes an entry. Deleting a missing key is a no-op.
    pub fn delete(&mut self, key: &StorageKey) {
        let raw = key.to_array();
        match self.dictionary.get(&raw).map(|t| t.state) {
            Some(TrackState::Added) => {
                self.dictionary.remove(&raw);
            }
            Some(_) => {
                if let Some(trackable) = self.dictionary.get_mut(&raw) {
                    trackable.state = TrackState::Deleted;
                }
            }
            None if self.store.contains(&raw) => {
                self.dictionary.insert(
                    raw,
                    Trackable::new(key.clone(), StorageItem::default(), TrackState::Deleted),
                );
            }
            None => {}
        }
    }

    /// Every live entry whose raw key starts with `prefix`, cached changes
    /// merged over the store, in key order or its reverse.
    pub fn find(
        &self,
        prefix: &[u8],
        direction: SeekDirection,
    ) -> impl Iterator<Item = (StorageKey, StorageItem)> + '_ {
        self.find_from(prefix, None, direction)
    }

    /// Like [`DataCache::find`], starting just past the raw key `after`.
    ///
    /// Both the cache and the store are walked on demand, so taking one
    /// entry costs one step of each.
    pub fn find_from(
        &self,
        prefix: &[u8],
        after: Option<&[u8]>,
        direction: SeekDirection,
    ) -> impl Iterator<Item = (StorageKey, StorageItem)> + '_ {
        let (stored, cached): (SeekIterator<'_>, CachedEntries<'_>) =
            match seek_bounds(prefix, after, direction) {
                Some(bounds) => {
                    let range = self.dictionary.range(bounds);
                    let cached: CachedEntries<'_> = match direction {
                        SeekDirection::Forward => Box::new(range),
                        SeekDirection::Backward => Box::new(range.rev()),
                    };
                    (self.store.seek_from(prefix, after, direction), cached)
                }
                None => (
                    Box::new(std::iter::empty::<(Vec<u8>, Vec<u8>)>()),
                    Box::new(std::iter::empty::<(&Vec<u8>, &Trackable)>()),
                ),
            };
        MergedFind {
            stored: stored.peekable(),
            cached: cached.peekable(),
            direction,
        }
    }

    /// Entries that differ from the store.
    pub fn get_change_set(&self) -> impl Iterator<Item = &Trackable> {
        self.dictionary
            .values()
            .filter(|t| t.state != TrackState::None)
    }

    /// Writes every change through to the store and clears the cache.
    pub fn commit(&mut self) -> Result<()> {
        let mut batch: WriteBatch = Vec::new();
        for (raw, trackable) in &self.dictionary {
            match trackable.state {
                TrackState::Added | TrackState::Changed => {
                    batch.push((raw.clone(), Some(trackable.item.value()?)));
                }
                TrackState::Deleted => batch.push((raw.clone(), None)),
                TrackState::None => {}
            }
        }
        debug!(changes = batch.len(), "committing data cache");
        self.store.write_batch(batch);
        self.dictionary.clear();
        Ok(())
    }
}

type CachedEntries<'a> = Box<dyn Iterator<Item = (&'a Vec<u8>, &'a Trackable)> + 'a>;

/// Merges store entries with cached ones walking the same direction. A
/// cached entry shadows the stored one under the same key.
struct MergedFind<'a> {
    stored: Peekable<SeekIterator<'a>>,
    cached: Peekable<CachedEntries<'a>>,
    direction: SeekDirection,
}

impl Iterator for MergedFind<'_> {
    type Item = (StorageKey, StorageItem);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let order = match (self.stored.peek(), self.cached.peek()) {
                (None, None) => return None,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some((stored, _)), Some((cached, _))) => {
                    let order = stored.as_slice().cmp(cached.as_slice());
                    match self.direction {
                        SeekDirection::Forward => order,
                        SeekDirection::Backward => order.reverse(),
                    }
                }
            };
            if order == Ordering::Less {
                let (raw, value) = self.stored.next()?;
                match StorageKey::from_bytes(&raw) {
                    Ok(key) => return Some((key, StorageItem::new(value))),
                    Err(_) => continue,
                }
            }
            if order == Ordering::Equal {
                self.stored.next();
            }
            let (_, trackable) = self.cached.next()?;
            if trackable.state != TrackState::Deleted {
                return Some((trackable.key.clone(), trackable.item.clone()));
            }
        }
    }
}
