use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::debug;

use crate::catalog::Catalog;
use crate::id::PersonId;
use crate::model::{ActiveEvent, Gender, Person, PlayerNotice};
use crate::sim::{GameEngine, SimConfig};

/// Shared, cloneable access to one game for async callers.
///
/// The engine itself is synchronous; the lock serialises turns against
/// concurrent readers.
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<RwLock<GameEngine>>,
}

impl EngineHandle {
    pub fn new(catalog: Catalog, config: SimConfig) -> Self {
        Self::from_engine(GameEngine::new(catalog, config))
    }

    pub fn from_engine(engine: GameEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub async fn end_turn(&self) -> i32 {
        let mut engine = self.inner.write().await;
        engine.end_turn();
        debug!(year = engine.year(), "turn ended");
        engine.year()
    }

    pub async fn init_player(&self, name: &str, gender: Gender, affiliation: &str) -> PersonId {
        self.inner.write().await.init_player(name, gender, affiliation)
    }

    pub async fn init_game(&self) {
        self.inner.write().await.init_game();
    }

    pub async fn set_active_person(&self, id: PersonId) -> bool {
        self.inner.write().await.set_active_person(id)
    }

    pub async fn pop_notice(&self) -> Option<PlayerNotice> {
        self.inner.write().await.pop_notice()
    }

    pub async fn active_person(&self) -> Option<Person> {
        self.inner.read().await.active_person().cloned()
    }

    pub async fn year(&self) -> i32 {
        self.inner.read().await.year()
    }

    pub async fn is_running(&self) -> bool {
        self.inner.read().await.is_running()
    }

    pub async fn population(&self) -> usize {
        self.inner.read().await.population().len()
    }

    pub async fn active_events(&self) -> Vec<ActiveEvent> {
        self.inner.read().await.active_events().to_vec()
    }

    pub async fn active_injuries(&self) -> Vec<String> {
        self.inner.read().await.active_injuries().keys().cloned().collect()
    }

    /// Run a synchronous operation under the write lock.
    pub async fn with_engine<R>(&self, f: impl FnOnce(&mut GameEngine) -> R) -> R {
        let mut engine = self.inner.write().await;
        f(&mut engine)
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, GameEngine> {
        self.inner.read().await
    }
}
