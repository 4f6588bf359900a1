//! JSON-seeded in-memory store for loops, stored courses, client keys and
//! evaluation results.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::Result;
use crate::models::{LoopRecord, LoopStep, MethodInfo, PlatformInfo, StoredRate};
use crate::sources::{AccessKeys, LoopPathProvider, RateLookup, ResultSink};

/// Client status that grants access.
pub const ACTIVE_KEY_STATUS: i64 = 2;

#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub currency_from: String,
    pub currency_to: String,
    pub platform_id: i64,
    pub method_id: i64,
    pub rate: f64,
    pub tax: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathEntry {
    pub step_number: u32,
    #[serde(flatten)]
    pub step: LoopStep,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoredLoop {
    pub loop_id: i64,
    pub steps: Vec<PathEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Client {
    pub key: String,
    pub status: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub platforms: Vec<PlatformInfo>,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub loops: Vec<StoredLoop>,
    #[serde(default)]
    pub clients: Vec<Client>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    seed: Seed,
    records: RwLock<Vec<LoopRecord>>,
}

impl MemoryStore {
    pub fn new(seed: Seed) -> Self {
        Self { seed, records: RwLock::new(Vec::new()) }
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let seed: Seed = serde_json::from_str(raw).context("store seed is not valid JSON")?;
        Ok(Self::new(seed))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading store seed {}", path.display()))?;
        let store = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            loops = store.seed.loops.len(),
            courses = store.seed.courses.len(),
            "store seed loaded"
        );
        Ok(store)
    }

    /// Results persisted so far, oldest first.
    pub async fn records(&self) -> Vec<LoopRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl RateLookup for MemoryStore {
    async fn lookup_rate(
        &self,
        currency_from: &str,
        currency_to: &str,
        platform_id: i64,
        method_id: i64,
    ) -> Result<Option<StoredRate>> {
        Ok(self
            .seed
            .courses
            .iter()
            .find(|c| {
                c.platform_id == platform_id
                    && c.method_id == method_id
                    && c.currency_from == currency_from
                    && c.currency_to == currency_to
            })
            .map(|c| StoredRate { rate: c.rate, tax: c.tax }))
    }
}

#[async_trait]
impl LoopPathProvider for MemoryStore {
    async fn load_loop(&self, loop_id: i64) -> Result<Vec<LoopStep>> {
        let Some(stored) = self.seed.loops.iter().find(|l| l.loop_id == loop_id) else {
            return Ok(Vec::new());
        };
        let mut entries = stored.steps.clone();
        entries.sort_by_key(|e| e.step_number);
        Ok(entries.into_iter().map(|e| e.step).collect())
    }

    async fn resolve_method(&self, name: &str) -> Result<Option<MethodInfo>> {
        Ok(self.seed.methods.iter().find(|m| m.method_name == name).cloned())
    }

    async fn resolve_platform(&self, name: &str) -> Result<Option<PlatformInfo>> {
        Ok(self.seed.platforms.iter().find(|p| p.platform_name == name).cloned())
    }
}

#[async_trait]
impl ResultSink for MemoryStore {
    async fn persist_result(&self, record: LoopRecord) -> Result<()> {
        info!(loop_id = record.loop_id, spread = record.spread, max_flow = record.max_flow, "loop info saved");
        self.records.write().await.push(record);
        Ok(())
    }
}

#[async_trait]
impl AccessKeys for MemoryStore {
    async fn check_key(&self, key: &str) -> Result<bool> {
        Ok(self
            .seed
            .clients
            .iter()
            .find(|c| c.key == key)
            .is_some_and(|c| c.status == ACTIVE_KEY_STATUS))
    }
}
