use tracing::debug;

use crate::types::{ExecutionStats, MonitoringConfig, Opportunity};

pub trait Record: Clone {
    fn id(&self) -> &str;
}

impl Record for Opportunity {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for MonitoringConfig {
    fn id(&self) -> &str {
        &self.id
    }
}

pub trait Filter<R> {
    fn matches(&self, record: &R) -> bool;
}

pub trait Patch<R> {
    fn apply(self, record: &mut R);
}

/// Insertion-ordered table of records addressed by id.
#[derive(Debug, Clone)]
pub struct Table<R> {
    rows: Vec<R>,
}

impl<R: Record> Table<R> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.iter()
    }

    pub fn all(&self) -> Vec<R> {
        self.rows.clone()
    }

    pub fn get<F: Filter<R>>(&self, filter: &F) -> Vec<R> {
        self.rows
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&R> {
        self.rows.iter().find(|record| record.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn insert(&mut self, record: R) -> R {
        debug!("Inserting record {}", record.id());
        self.rows.push(record.clone());
        record
    }

    /// Merges `patch` into the first record with `id`. `None` when no record matches.
    pub fn update<P: Patch<R>>(&mut self, id: &str, patch: P) -> Option<R> {
        let record = self.rows.iter_mut().find(|record| record.id() == id)?;
        patch.apply(record);
        debug!("Updated record {}", id);
        Some(record.clone())
    }

    pub fn replace_all(&mut self, rows: Vec<R>) {
        self.rows = rows;
    }
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns every opportunity and config plus the running execution counters.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    pub opportunities: Table<Opportunity>,
    pub configs: Table<MonitoringConfig>,
    pub stats: ExecutionStats,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}
