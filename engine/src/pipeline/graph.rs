//! Immutable stage table.
//!
//! Maps every stage id to its handler and the routes it may return. Built
//! once at startup; a route to an unregistered stage fails the build.

use sdk::errors::EngineError;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::stage::{Route, Stage, StageId};

struct StageEntry {
    handler: Arc<dyn Stage>,
    next: BTreeSet<Route>,
}

pub struct StageGraph {
    entry: StageId,
    stages: BTreeMap<StageId, StageEntry>,
}

impl StageGraph {
    pub fn builder(entry: StageId) -> StageGraphBuilder {
        StageGraphBuilder {
            entry,
            stages: BTreeMap::new(),
        }
    }

    pub fn entry(&self) -> StageId {
        self.entry
    }

    pub fn handler(&self, stage: StageId) -> Result<&Arc<dyn Stage>, EngineError> {
        self.stages
            .get(&stage)
            .map(|e| &e.handler)
            .ok_or_else(|| EngineError::StageNotRegistered(stage.to_string()))
    }

    /// Whether `from` may return `route`
    pub fn allows(&self, from: StageId, route: Route) -> bool {
        self.stages
            .get(&from)
            .is_some_and(|e| e.next.contains(&route))
    }

    /// Allowed routes out of `stage`, sorted
    pub fn routes(&self, stage: StageId) -> Vec<Route> {
        self.stages
            .get(&stage)
            .map(|e| e.next.iter().copied().collect())
            .unwrap_or_default()
    }
}

pub struct StageGraphBuilder {
    entry: StageId,
    stages: BTreeMap<StageId, StageEntry>,
}

impl StageGraphBuilder {
    /// Register `handler` with the routes it may return
    pub fn stage(mut self, handler: Arc<dyn Stage>, next: impl IntoIterator<Item = Route>) -> Self {
        let id = handler.id();
        self.stages.insert(
            id,
            StageEntry {
                handler,
                next: next.into_iter().collect(),
            },
        );
        self
    }

    pub fn build(self) -> Result<StageGraph, EngineError> {
        if !self.stages.contains_key(&self.entry) {
            return Err(EngineError::StageNotRegistered(self.entry.to_string()));
        }

        for (from, entry) in &self.stages {
            if entry.next.is_empty() {
                return Err(EngineError::Config(format!("stage {} has no routes", from)));
            }
            for route in &entry.next {
                if let Route::Goto(to) = route {
                    if !self.stages.contains_key(to) {
                        return Err(EngineError::StageNotRegistered(to.to_string()));
                    }
                }
            }
        }

        Ok(StageGraph {
            entry: self.entry,
            stages: self.stages,
        })
    }
}
