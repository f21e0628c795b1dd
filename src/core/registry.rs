//! # Worker registry.
//!
//! Insertion-ordered map `hostname → WorkerProcess`, owned by the control
//! center. Keys are canonical hostnames and are unique: inserting a duplicate
//! hands the worker back untouched.
//!
//! ## Rules
//! - Iteration and resolution follow insertion order.
//! - Resolution canonicalizes requested names and skips unknown ones.

use std::collections::{HashMap, HashSet};

use super::nodes::Nodes;
use crate::workers::{Hostname, WorkerProcess};

#[derive(Default)]
pub(crate) struct Registry {
    order: Vec<String>,
    workers: HashMap<String, WorkerProcess>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn contains(&self, hostname: &str) -> bool {
        self.workers.contains_key(hostname)
    }

    /// Adds `worker` under its canonical hostname; a duplicate is returned as `Err`.
    pub(crate) fn insert(&mut self, worker: WorkerProcess) -> Result<(), WorkerProcess> {
        let key = worker.hostname().to_string();
        if self.workers.contains_key(&key) {
            return Err(worker);
        }
        self.order.push(key.clone());
        self.workers.insert(key, worker);
        Ok(())
    }

    pub(crate) fn remove(&mut self, hostname: &str) -> Option<WorkerProcess> {
        let worker = self.workers.remove(hostname)?;
        self.order.retain(|h| h != hostname);
        Some(worker)
    }

    pub(crate) fn get(&self, hostname: &str) -> Option<&WorkerProcess> {
        self.workers.get(hostname)
    }

    pub(crate) fn get_mut(&mut self, hostname: &str) -> Option<&mut WorkerProcess> {
        self.workers.get_mut(hostname)
    }

    /// Hostnames in insertion order.
    pub(crate) fn hostnames(&self) -> &[String] {
        &self.order
    }

    /// Workers in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &WorkerProcess> {
        self.order.iter().filter_map(|h| self.workers.get(h))
    }

    /// Registered hostnames selected by `nodes`, in insertion order.
    pub(crate) fn resolve(&self, nodes: &Nodes) -> Vec<String> {
        let wanted: HashSet<String> = match nodes {
            Nodes::All => return self.order.clone(),
            Nodes::One(node) => HashSet::from([Hostname::canonical(node).into_string()]),
            Nodes::Many(list) => list
                .iter()
                .map(|n| Hostname::canonical(n).into_string())
                .collect(),
        };
        self.order
            .iter()
            .filter(|h| wanted.contains(*h))
            .cloned()
            .collect()
    }
}
