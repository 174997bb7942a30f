//! Explicitly owned counter library.
//!
//! Bundles a snapshot source with the name tables and the category catalog
//! read from its global snapshot. Nothing is cached process-wide: callers
//! build a [`Library`], share it by reference and call [`Library::refresh`]
//! when the set of installed categories may have changed.

use parking_lot::RwLock;
use perfsnap_calc::CounterSample;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::catalog::{Catalog, CategoryEntry};
use crate::decoder::{DecodeOptions, Decoder};
use crate::metrics;
use crate::names::NameTable;
use crate::snapshot::CategorySnapshot;
use crate::source::{GLOBAL_KEY, SnapshotSource};
use crate::{Error, Result};

/// Library configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryConfig {
    /// Source key of the snapshot the catalog is read from.
    pub catalog_key: String,
    /// Options for every category decode.
    pub decode: DecodeOptions,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            catalog_key: GLOBAL_KEY.to_string(),
            decode: DecodeOptions::default(),
        }
    }
}

impl LibraryConfig {
    pub fn with_catalog_key(mut self, key: impl Into<String>) -> Self {
        self.catalog_key = key.into();
        self
    }

    pub fn with_decode(mut self, options: DecodeOptions) -> Self {
        self.decode = options;
        self
    }
}

/// Counter (category) data, keyed by counter name then instance name.
pub type CategoryData = FxHashMap<String, FxHashMap<String, CounterSample>>;

/// Snapshot source plus the tables needed to address counters by name.
pub struct Library {
    source: Box<dyn SnapshotSource>,
    names: NameTable,
    help: NameTable,
    catalog: RwLock<Catalog>,
    config: LibraryConfig,
}

impl Library {
    /// Build a library and read its catalog.
    pub fn new(
        source: Box<dyn SnapshotSource>,
        names: NameTable,
        help: NameTable,
        config: LibraryConfig,
    ) -> Result<Self> {
        let global = source.fetch(&config.catalog_key)?;
        let catalog = Catalog::read(&global, &names)?;
        info!(categories = catalog.len(), "library loaded");
        metrics::record_catalog(catalog.len());

        Ok(Self {
            source,
            names,
            help,
            catalog: RwLock::new(catalog),
            config,
        })
    }

    /// Re-read the catalog from a fresh global snapshot.
    pub fn refresh(&self) -> Result<()> {
        let global = self.source.fetch(&self.config.catalog_key)?;
        let catalog = Catalog::read(&global, &self.names)?;
        debug!(categories = catalog.len(), "catalog refreshed");
        metrics::record_catalog(catalog.len());
        *self.catalog.write() = catalog;
        Ok(())
    }

    pub const fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub const fn names(&self) -> &NameTable {
        &self.names
    }

    pub fn source(&self) -> &dyn SnapshotSource {
        self.source.as_ref()
    }

    /// Category names, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .catalog
            .read()
            .entries()
            .map(|entry| entry.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn category_exists(&self, category: &str) -> bool {
        self.catalog.read().contains(category)
    }

    /// Catalog entry of `category`.
    pub fn category(&self, category: &str) -> Result<CategoryEntry> {
        self.catalog
            .read()
            .get(category)
            .cloned()
            .ok_or_else(|| Error::UnknownCategory(category.to_string()))
    }

    /// Help text of `category`; empty when unknown.
    pub fn category_help(&self, category: &str) -> String {
        self.catalog
            .read()
            .get(category)
            .and_then(|entry| self.help.get(entry.help_id))
            .unwrap_or_default()
            .to_string()
    }

    /// Named counters of `category`, in snapshot order; empty when unknown.
    pub fn counters(&self, category: &str) -> Vec<String> {
        self.catalog
            .read()
            .get(category)
            .map(|entry| {
                entry
                    .counter_ids
                    .iter()
                    .filter_map(|&id| self.names.get(id))
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn counter_exists(&self, category: &str, counter: &str) -> bool {
        self.catalog
            .read()
            .get(category)
            .is_some_and(|entry| entry.counter_position(&self.names, counter).is_some())
    }

    /// Name id of `counter` in `category`.
    pub fn counter_id(&self, category: &str, counter: &str) -> Result<u32> {
        let entry = self.category(category)?;
        entry
            .counter_position(&self.names, counter)
            .map(|position| entry.counter_ids[position])
            .ok_or_else(|| counter_not_found(category, counter))
    }

    /// Help text of `counter`; empty when the help table has no entry.
    pub fn counter_help(&self, category: &str, counter: &str) -> Result<String> {
        let entry = self.category(category)?;
        let position = entry
            .counter_position(&self.names, counter)
            .ok_or_else(|| counter_not_found(category, counter))?;
        Ok(self
            .help
            .get(entry.counter_help_ids[position])
            .unwrap_or_default()
            .to_string())
    }

    /// Fetch and decode the current snapshot of `category`.
    pub fn sample(&self, category: &str) -> Result<CategorySnapshot> {
        let entry = self.category(category)?;
        let raw = self.source.fetch(&entry.object_id.to_string())?;
        Decoder::new(&self.config.decode)
            .with_source(self.source.as_ref())
            .decode(&raw, entry.object_id)
    }

    /// Current instance names of `category`; empty for single-instance categories.
    pub fn instance_names(&self, category: &str) -> Result<Vec<String>> {
        let snapshot = self.sample(category)?;
        let names = snapshot.instance_names().to_vec();
        snapshot.dispose();
        Ok(names)
    }

    pub fn instance_exists(&self, category: &str, instance: &str) -> Result<bool> {
        let snapshot = self.sample(category)?;
        let exists = snapshot.instance_exists(instance);
        snapshot.dispose();
        Ok(exists)
    }

    /// Every named counter of `category` with one sample per instance.
    pub fn read_category(&self, category: &str) -> Result<CategoryData> {
        let entry = self.category(category)?;
        let snapshot = self.sample(category)?;
        let mut all = snapshot.read_all()?;
        snapshot.dispose();

        let mut data = CategoryData::default();
        for id in &entry.counter_ids {
            let Some(name) = self.names.get(*id).filter(|name| !name.is_empty()) else {
                continue;
            };
            // Base counters are not registered and have no samples.
            if let Some(samples) = all.remove(id) {
                data.insert(name.to_string(), samples);
            }
        }
        Ok(data)
    }
}

fn counter_not_found(category: &str, counter: &str) -> Error {
    Error::CounterNotFound {
        category: category.to_string(),
        counter: counter.to_string(),
    }
}
