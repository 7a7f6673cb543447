//! In-memory game store with monotonic ids and bounded size.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::Mutex;

use annotator_core::game::GameRecord;

pub struct GameStore {
    inner: Mutex<StoreInner>,
    capacity: usize,
}

struct StoreInner {
    map: HashMap<u32, Arc<GameRecord>>,
    order: VecDeque<u32>,
    next_id: u32,
}

impl GameStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                map: HashMap::new(),
                order: VecDeque::new(),
                next_id: 1,
            }),
            capacity: capacity.max(1),
        }
    }

    /// Insert a game and return its id plus any ids evicted to stay
    /// bounded. Ids are never reused, so a stale id can only miss.
    pub async fn insert(&self, game: GameRecord) -> (u32, Vec<u32>) {
        let mut inner = self.inner.lock().await;
        let id = inner.next_id;
        inner.next_id += 1;
        inner.map.insert(id, Arc::new(game));
        inner.order.push_back(id);

        let mut evicted = Vec::new();
        while inner.order.len() > self.capacity {
            if let Some(old) = inner.order.pop_front() {
                inner.map.remove(&old);
                evicted.push(old);
            }
        }
        (id, evicted)
    }

    pub async fn get(&self, id: u32) -> Option<Arc<GameRecord>> {
        self.inner.lock().await.map.get(&id).map(Arc::clone)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_game() -> GameRecord {
        GameRecord::from_pgn("1. e4 e5 2. Nf3 Nc6").unwrap()
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let store = GameStore::new(8);
        let (a, _) = store.insert(sample_game()).await;
        let (b, _) = store.insert(sample_game()).await;
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert!(store.get(a).await.is_some());
    }

    #[tokio::test]
    async fn oldest_game_is_evicted() {
        let store = GameStore::new(2);
        let (a, ev) = store.insert(sample_game()).await;
        assert!(ev.is_empty());
        let (_, ev) = store.insert(sample_game()).await;
        assert!(ev.is_empty());
        let (c, ev) = store.insert(sample_game()).await;
        assert_eq!(ev, vec![a]);
        assert!(store.get(a).await.is_none());
        assert!(store.get(c).await.is_some());
        assert_eq!(store.len().await, 2);
    }
}
