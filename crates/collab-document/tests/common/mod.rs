//! Shared fixtures for façade integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use collab_document::{
    AutomergeEngine, DocumentConfig, DocumentEngine, DocumentHandle, DocumentState, EngineError,
    EngineResult, MetaValue, NodeAction, Update,
};

/// Knobs and counters shared between a test and its [`ProbeEngine`]
#[derive(Debug, Default)]
pub struct Probe {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
    stall_ms: AtomicU64,
    fail: AtomicBool,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Hold every engine call for `duration`
    pub fn stall(&self, duration: Duration) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.stall_ms.store(millis, Ordering::SeqCst);
    }

    /// Make every engine call fail
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Highest number of engine calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Engine wrapper that records overlap and can be told to stall or fail
#[derive(Debug)]
pub struct ProbeEngine {
    inner: AutomergeEngine,
    probe: Arc<Probe>,
}

impl ProbeEngine {
    pub fn new(probe: Arc<Probe>) -> Self {
        Self {
            inner: AutomergeEngine::new(),
            probe,
        }
    }

    fn observe<T>(
        &mut self,
        call: impl FnOnce(&mut AutomergeEngine) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let probe = Arc::clone(&self.probe);
        let running = probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        probe.max_in_flight.fetch_max(running, Ordering::SeqCst);
        probe.calls.fetch_add(1, Ordering::SeqCst);

        let stall = probe.stall_ms.load(Ordering::SeqCst);
        if stall > 0 {
            std::thread::sleep(Duration::from_millis(stall));
        }
        let result = if probe.fail.load(Ordering::SeqCst) {
            Err(EngineError::invalid_action("probe failure"))
        } else {
            call(&mut self.inner)
        };

        probe.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl DocumentEngine for ProbeEngine {
    fn create() -> EngineResult<Self> {
        Ok(Self::new(Probe::new()))
    }

    fn apply_actions(&mut self, actions: &[NodeAction]) -> EngineResult<Update> {
        self.observe(|engine| engine.apply_actions(actions))
    }

    fn set_root_node_id(&mut self, id: &str) -> EngineResult<Update> {
        self.observe(|engine| engine.set_root_node_id(id))
    }

    fn apply_updates(&mut self, updates: &[Update]) -> EngineResult<()> {
        self.observe(|engine| engine.apply_updates(updates))
    }

    fn reload_from_updates(&mut self, updates: &[Update]) -> EngineResult<()> {
        self.observe(|engine| engine.reload_from_updates(updates))
    }

    fn document_state(&mut self) -> EngineResult<DocumentState> {
        self.observe(|engine| engine.document_state())
    }

    fn init_empty(&mut self) -> EngineResult<Update> {
        self.observe(|engine| engine.init_empty())
    }

    fn encode_full_state(&mut self) -> EngineResult<Update> {
        self.observe(|engine| engine.encode_full_state())
    }

    fn merge_updates(updates: &[Update]) -> EngineResult<Update> {
        AutomergeEngine::merge_updates(updates)
    }

    fn meta_json(&mut self) -> EngineResult<String> {
        self.observe(|engine| engine.meta_json())
    }

    fn set_meta(&mut self, key: &str, value: MetaValue) -> EngineResult<Update> {
        self.observe(|engine| engine.set_meta(key, value))
    }

    fn push_meta_item(&mut self, key: &str, value: &str) -> EngineResult<Update> {
        self.observe(|engine| engine.push_meta_item(key, value))
    }

    fn remove_meta_item(&mut self, key: &str, value: &str) -> EngineResult<Update> {
        self.observe(|engine| engine.remove_meta_item(key, value))
    }

    fn remove_meta_key(&mut self, key: &str) -> EngineResult<Update> {
        self.observe(|engine| engine.remove_meta_key(key))
    }

    fn set_meta_from_json(&mut self, json: &str) -> EngineResult<Update> {
        self.observe(|engine| engine.set_meta_from_json(json))
    }
}

/// Handle over a probed engine
pub fn probed_handle(doc_id: &str) -> (DocumentHandle<ProbeEngine>, Arc<Probe>) {
    let probe = Probe::new();
    let handle = DocumentHandle::from_engine(
        DocumentConfig::default().with_doc_id(doc_id),
        ProbeEngine::new(Arc::clone(&probe)),
    );
    (handle, probe)
}

/// Wait until some call holds the handle's gate
pub async fn until_locked<E: DocumentEngine>(handle: &DocumentHandle<E>) {
    while !handle.is_locked() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

/// Meta JSON parsed for order-independent comparison
pub async fn meta_of<E: DocumentEngine>(handle: &DocumentHandle<E>) -> serde_json::Value {
    let json = handle.get_all_meta().await.unwrap();
    serde_json::from_str(&json).unwrap()
}
