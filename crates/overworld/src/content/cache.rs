use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use tracing::debug;

use super::error::{LoadError, ResourceKind};
use super::id_list::IdList;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub loads: u64,
    pub evictions: u64,
}

struct CacheState<T> {
    live: HashMap<u32, Weak<T>>,
    recent: VecDeque<(u32, Rc<T>)>,
    stats: CacheStats,
}

/// Lazily populated, id-addressed cache for one resource kind.
///
/// Every instance handed out is also tracked weakly, so as long as anything in
/// the world still holds an `Rc`, `load_or_get` returns that same instance.
/// On top of that a bounded LRU keeps the most recently used resources alive
/// after their last outside holder drops them. Anything that falls out of both
/// is decoded again on the next request; decoding is deterministic, so the new
/// instance is content-equal to the old one.
pub struct ResourceCache<T> {
    kind: ResourceKind,
    ids: IdList,
    dir: PathBuf,
    extension: &'static str,
    capacity: usize,
    state: RefCell<CacheState<T>>,
}

impl<T> ResourceCache<T> {
    pub fn new(
        kind: ResourceKind,
        ids: IdList,
        dir: PathBuf,
        extension: &'static str,
        capacity: usize,
    ) -> Self {
        Self {
            kind,
            ids,
            dir,
            extension,
            capacity,
            state: RefCell::new(CacheState {
                live: HashMap::new(),
                recent: VecDeque::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn ids(&self) -> &IdList {
        &self.ids
    }

    pub fn stats(&self) -> CacheStats {
        self.state.borrow().stats
    }

    /// Validates a raw id read from a resource file.
    pub fn check_raw_id(&self, raw: i32) -> Result<u32, LoadError> {
        match u32::try_from(raw) {
            Ok(id) if (id as usize) < self.ids.len() => Ok(id),
            _ => Err(self.unknown_id(raw as i64)),
        }
    }

    pub fn path_for(&self, id: u32) -> Result<PathBuf, LoadError> {
        let name = self
            .ids
            .name(id)
            .ok_or_else(|| self.unknown_id(id as i64))?;
        Ok(self.dir.join(format!("{name}.{}", self.extension)))
    }

    pub fn is_live(&self, id: u32) -> bool {
        self.state
            .borrow()
            .live
            .get(&id)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Returns the live instance for `id`, or decodes it with `load`.
    ///
    /// `load` runs without any borrow of this cache held, so it may freely
    /// consult other caches.
    pub fn load_or_get<F>(&self, id: u32, load: F) -> Result<Rc<T>, LoadError>
    where
        F: FnOnce(&Path) -> Result<T, LoadError>,
    {
        let path = self.path_for(id)?;
        if let Some(existing) = self.lookup_live(id) {
            return Ok(existing);
        }

        debug!(kind = %self.kind, id, path = %path.display(), "resource_load");
        let value = Rc::new(load(&path)?);

        let mut state = self.state.borrow_mut();
        state.stats.loads += 1;
        state.live.insert(id, Rc::downgrade(&value));
        self.touch(&mut state, id, &value);
        Ok(value)
    }

    /// Drops every strong reference the LRU holds. Resources still referenced
    /// elsewhere stay live.
    pub fn release_unused(&self) {
        let mut state = self.state.borrow_mut();
        state.recent.clear();
        state.live.retain(|_, weak| weak.strong_count() > 0);
    }

    fn lookup_live(&self, id: u32) -> Option<Rc<T>> {
        let mut state = self.state.borrow_mut();
        let Some(found) = state.live.get(&id).and_then(Weak::upgrade) else {
            state.live.remove(&id);
            return None;
        };
        state.stats.hits += 1;
        self.touch(&mut state, id, &found);
        Some(found)
    }

    fn touch(&self, state: &mut CacheState<T>, id: u32, value: &Rc<T>) {
        if self.capacity == 0 {
            return;
        }
        if let Some(pos) = state.recent.iter().position(|(entry, _)| *entry == id) {
            state.recent.remove(pos);
        }
        state.recent.push_back((id, Rc::clone(value)));
        while state.recent.len() > self.capacity {
            if let Some((evicted, _)) = state.recent.pop_front() {
                state.stats.evictions += 1;
                debug!(kind = %self.kind, id = evicted, "resource_evicted");
            }
        }
    }

    fn unknown_id(&self, id: i64) -> LoadError {
        LoadError::UnknownId {
            kind: self.kind,
            id,
            count: self.ids.len(),
        }
    }
}
