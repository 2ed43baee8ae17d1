use std::sync::Arc;

use crate::dispatch::AidDispatchCore;
use crate::observability::Metrics;
use crate::store::EncoderRegistry;

#[derive(Clone)]
pub struct AppState {
    pub core: Arc<AidDispatchCore>,
    pub registry: Arc<EncoderRegistry>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(core: Arc<AidDispatchCore>, registry: Arc<EncoderRegistry>, metrics: Arc<Metrics>) -> Self {
        Self { core, registry, metrics }
    }
}
