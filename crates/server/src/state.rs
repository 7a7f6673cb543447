use std::sync::Arc;

use crate::cache::{EvalCache, ExplanationCache};
use crate::engine::EngineHandle;
use crate::store::GameStore;

/// Shared state handed to every route via an Extension layer.
#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub evals: Arc<EvalCache>,
    pub explanations: Arc<ExplanationCache>,
    pub games: Arc<GameStore>,
}
