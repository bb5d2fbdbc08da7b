//! Per-request dispatch stages:
//! Idle → CacheCheck → CacheHit → Done
//!                   → CacheMiss → EngineCall → Validate → CacheWrite → Done
//!                                            → ForceReinstall → EngineRetry → Validate | Fatal
//!                                            → Fatal

use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DispatchStage {
    Idle,
    CacheCheck,
    CacheHit,
    CacheMiss,
    EngineCall,
    ForceReinstall,
    EngineRetry,
    Validate,
    CacheWrite,
    Done,
    Fatal,
}

impl std::fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl DispatchStage {
    /// Returns whether transitioning from `self` to `next` is valid.
    pub fn can_transition_to(self, next: DispatchStage) -> bool {
        use DispatchStage::*;
        matches!(
            (self, next),
            (Idle, CacheCheck)
                | (CacheCheck, CacheHit)
                | (CacheCheck, CacheMiss)
                | (CacheHit, Done)
                | (CacheMiss, EngineCall)
                | (CacheMiss, Fatal) // models not installed
                | (EngineCall, Validate)
                | (EngineCall, ForceReinstall)
                | (EngineCall, Fatal)
                | (ForceReinstall, EngineRetry)
                | (ForceReinstall, Fatal)
                | (EngineRetry, Validate)
                | (EngineRetry, Fatal)
                | (Validate, CacheWrite)
                | (Validate, Done) // output same as input, nothing cached
                | (CacheWrite, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DispatchStage::Done | DispatchStage::Fatal)
    }
}

/// Stage tracker for a single request. Invalid transitions are logged and
/// applied anyway; the tracker only observes the request.
#[derive(Debug)]
pub struct StageTracker {
    request_id: String,
    current: DispatchStage,
    history: Vec<DispatchStage>,
}

impl StageTracker {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            current: DispatchStage::Idle,
            history: vec![DispatchStage::Idle],
        }
    }

    pub fn current(&self) -> DispatchStage {
        self.current
    }

    pub fn history(&self) -> &[DispatchStage] {
        &self.history
    }

    pub fn advance(&mut self, next: DispatchStage) {
        let from = self.current;
        if !from.can_transition_to(next) {
            warn!(request_id = %self.request_id, from = %from, to = %next, "invalid dispatch transition");
        } else {
            debug!(request_id = %self.request_id, from = %from, to = %next, "dispatch_stage");
        }
        self.current = next;
        self.history.push(next);
    }
}
