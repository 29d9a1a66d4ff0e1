//! Model cache: each distinct name is fetched and parsed at most once.
//!
//! The map holds one slot per normalized name. The slot is created under the
//! map lock and filled outside it through `OnceLock::get_or_init`, so
//! concurrent requesters for a name that is still being parsed block on that
//! parse instead of starting their own. The outcome is stored either way: a
//! missing part is not asked for again.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use thiserror::Error;

use super::command::normalize_name;
use super::model::Model;
use super::source::{PartSource, SourceError};

/// Why a model could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The source has no such part. The reference is skipped.
    #[error("Missing part: {0}")]
    Missing(String),

    /// The source itself failed. The import is aborted.
    #[error(transparent)]
    Source(#[from] SourceError),
}

type Slot = Arc<OnceLock<Result<Arc<Model>, ResolveError>>>;

/// Name -> parsed model map shared by every walk of one import session.
#[derive(Default)]
pub struct ModelCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the model for `name`, fetching and parsing it on first use.
    ///
    /// `name` is passed to `source` as written; the cache key is its
    /// normalized form.
    pub fn resolve(&self, name: &str, source: &dyn PartSource) -> Result<Arc<Model>, ResolveError> {
        let key = normalize_name(name);
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(key.clone()).or_default().clone()
        };

        if let Some(result) = slot.get() {
            log::trace!("Already parsed; reusing '{}'", key);
            return result.clone();
        }

        slot.get_or_init(|| self.load(name, &key, source)).clone()
    }

    /// The cached model for `name`, without fetching.
    pub fn get(&self, name: &str) -> Option<Arc<Model>> {
        let slot = self.slots.lock().get(&normalize_name(name))?.clone();
        slot.get()?.as_ref().ok().cloned()
    }

    /// True once `name` has resolved to a model.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of distinct models parsed. A multi-part document's main block is
    /// cached under both the document name and its own name but counts once.
    pub fn len(&self) -> usize {
        self.models().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names that were requested but not found, sorted.
    pub fn missing(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .slots
            .lock()
            .values()
            .filter_map(|slot| match slot.get() {
                Some(Err(ResolveError::Missing(name))) => Some(name.clone()),
                _ => None,
            })
            .collect();
        names.sort();
        names
    }

    /// All distinct cached models, sorted by key. An aliased model is listed
    /// once, under its first key.
    pub fn models(&self) -> Vec<(String, Arc<Model>)> {
        let mut entries: Vec<(String, Arc<Model>)> = self
            .slots
            .lock()
            .iter()
            .filter_map(|(key, slot)| match slot.get() {
                Some(Ok(model)) => Some((key.clone(), model.clone())),
                _ => None,
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut models: Vec<(String, Arc<Model>)> = Vec::with_capacity(entries.len());
        for (key, model) in entries {
            if !models.iter().any(|(_, seen)| Arc::ptr_eq(seen, &model)) {
                models.push((key, model));
            }
        }
        models
    }

    /// Fetch and parse `name`. Runs inside the slot's initializer.
    fn load(&self, name: &str, key: &str, source: &dyn PartSource) -> Result<Arc<Model>, ResolveError> {
        log::debug!("Not yet parsed; loading '{}'", name);

        let text = match source.get_raw_text(name)? {
            Some(text) => text,
            None => {
                log::warn!("Missing part: {}", name);
                return Err(ResolveError::Missing(name.to_string()));
            }
        };

        let mut models = Model::parse_document(name, &text).into_iter().map(Arc::new);
        // parse_document never returns an empty list
        let Some(main) = models.next() else {
            return Err(ResolveError::Missing(name.to_string()));
        };

        // Multi-part documents: register the other blocks too, but only names
        // nobody has asked for yet, so no name is ever parsed twice
        let siblings: Vec<Arc<Model>> = std::iter::once(main.clone()).chain(models).collect();
        if siblings.len() > 1 || normalize_name(main.name()) != key {
            let mut slots = self.slots.lock();
            for model in &siblings {
                let block_key = normalize_name(model.name());
                if block_key == key || slots.contains_key(&block_key) {
                    continue;
                }
                slots.insert(block_key, Arc::new(OnceLock::from(Ok(model.clone()))));
            }
            log::debug!("'{}' is a multi-part document with {} blocks", name, siblings.len());
        }

        Ok(main)
    }
}
