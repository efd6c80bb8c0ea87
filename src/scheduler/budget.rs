use super::types::{SolverOptions, StopReason};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Drapeau d'annulation partageable entre threads.
///
/// ```
/// use frontdesk::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Limites d'une résolution : nœuds, temps, annulation externe.
#[derive(Debug)]
pub(crate) struct Budget {
    max_nodes: u64,
    time_limit: Duration,
    started: Instant,
    cancel: CancelToken,
}

impl Budget {
    pub(crate) fn new(options: &SolverOptions, cancel: CancelToken) -> Self {
        Self {
            max_nodes: options.max_nodes,
            time_limit: options.time_limit,
            started: Instant::now(),
            cancel,
        }
    }

    /// Part réduite du budget, pour les sondages du diagnostic.
    pub(crate) fn fraction(&self, divisor: u64) -> Self {
        let divisor = divisor.max(1);
        Self {
            max_nodes: (self.max_nodes / divisor).max(1),
            time_limit: self.time_limit / u32::try_from(divisor).unwrap_or(u32::MAX),
            started: Instant::now(),
            cancel: self.cancel.clone(),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// L'horloge et le drapeau ne sont consultés que tous les 256 nœuds.
    pub(crate) fn exhausted(&self, nodes: u64) -> Option<StopReason> {
        if nodes >= self.max_nodes {
            return Some(StopReason::NodeLimit);
        }
        if nodes % 256 != 0 {
            return None;
        }
        if self.cancel.is_cancelled() {
            return Some(StopReason::Cancelled);
        }
        if self.elapsed() >= self.time_limit {
            return Some(StopReason::TimeLimit);
        }
        None
    }
}
