//! Bounded in-memory caches: engine evals keyed by position, composed
//! explanations keyed by annotated move.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::analysis::ExplainResponse;
use crate::engine::EngineEval;

type EvalKey = (String, u32);

/// Eval cache with single-flight semantics: concurrent requests for the
/// same (fen, depth) share one engine search through a OnceCell.
pub struct EvalCache {
    inner: Mutex<EvalInner>,
    capacity: usize,
}

struct EvalInner {
    map: HashMap<EvalKey, Arc<OnceCell<EngineEval>>>,
    order: VecDeque<EvalKey>,
}

impl EvalCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(EvalInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Return the eval for (fen, depth), running `compute` at most once
    /// per key even under concurrent callers.
    pub async fn get_or_compute<F, Fut>(&self, fen: &str, depth: u32, compute: F) -> EngineEval
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = EngineEval>,
    {
        let cell = {
            let mut inner = self.inner.lock().await;
            let key = (fen.to_string(), depth);
            if let Some(cell) = inner.map.get(&key) {
                Arc::clone(cell)
            } else {
                let cell = Arc::new(OnceCell::new());
                inner.map.insert(key.clone(), Arc::clone(&cell));
                inner.order.push_back(key);
                // Evicting an in-flight cell is fine: its callers still
                // hold the Arc, the cache just stops sharing it.
                while inner.order.len() > self.capacity {
                    if let Some(old) = inner.order.pop_front() {
                        inner.map.remove(&old);
                    }
                }
                cell
            }
        };

        cell.get_or_init(compute).await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.map.len()
    }
}

type ExplainKey = (u32, usize, u32);

/// Composed explanations keyed by (game_id, ply, depth). Entries for a
/// game are dropped when the game itself is evicted from the store.
pub struct ExplanationCache {
    inner: Mutex<ExplainInner>,
    capacity: usize,
}

struct ExplainInner {
    map: HashMap<ExplainKey, ExplainResponse>,
    order: VecDeque<ExplainKey>,
}

impl ExplanationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(ExplainInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub async fn get(&self, game_id: u32, ply: usize, depth: u32) -> Option<ExplainResponse> {
        self.inner.lock().await.map.get(&(game_id, ply, depth)).cloned()
    }

    pub async fn insert(&self, game_id: u32, ply: usize, depth: u32, response: ExplainResponse) {
        let mut inner = self.inner.lock().await;
        let key = (game_id, ply, depth);
        if inner.map.insert(key, response).is_none() {
            inner.order.push_back(key);
        }
        while inner.order.len() > self.capacity {
            if let Some(old) = inner.order.pop_front() {
                inner.map.remove(&old);
            }
        }
    }

    /// Drop every cached explanation for one game.
    pub async fn invalidate_game(&self, game_id: u32) {
        let mut inner = self.inner.lock().await;
        inner.map.retain(|key, _| key.0 != game_id);
        inner.order.retain(|key| key.0 != game_id);
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.map.len()
    }
}
