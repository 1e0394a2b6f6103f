//! Best score tracking
//!
//! The store is injected so the game runs the same with LocalStorage in the
//! browser, in memory natively, and in tests.

/// Where the best total score lives between sessions
pub trait ScoreStore {
    fn load_best_score(&self) -> u32;
    fn save_best_score(&mut self, score: u32);
}

/// Store that forgets everything when dropped
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    best: u32,
}

impl MemoryScoreStore {
    pub fn new(best: u32) -> Self {
        Self { best }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load_best_score(&self) -> u32 {
        self.best
    }

    fn save_best_score(&mut self, score: u32) {
        self.best = score;
    }
}

/// Best score loaded once from a store and written back when beaten
pub struct BestScore {
    store: Box<dyn ScoreStore>,
    best: u32,
}

impl BestScore {
    pub fn new(store: Box<dyn ScoreStore>) -> Self {
        let best = store.load_best_score();
        log::info!("Best score so far: {}", best);
        Self { store, best }
    }

    pub fn get(&self) -> u32 {
        self.best
    }

    /// Returns true if `score` beats the stored best (and saves it)
    pub fn record(&mut self, score: u32) -> bool {
        if score == 0 || score <= self.best {
            return false;
        }
        self.best = score;
        self.store.save_best_score(score);
        log::info!("New best score: {}", score);
        true
    }
}

impl std::fmt::Debug for BestScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BestScore").field("best", &self.best).finish()
    }
}

/// Best score kept in LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageScoreStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageScoreStore {
    const STORAGE_KEY: &'static str = "cart_sorter_best_score";

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl ScoreStore for LocalStorageScoreStore {
    fn load_best_score(&self) -> u32 {
        Self::storage()
            .and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten())
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or(0)
    }

    fn save_best_score(&mut self, score: u32) {
        if let Some(storage) = Self::storage() {
            if let Ok(json) = serde_json::to_string(&score) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
            }
        }
    }
}
