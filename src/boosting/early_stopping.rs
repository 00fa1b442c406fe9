//! Per-class early stopping for the boosting loop.
//!
//! Each class is ACTIVE until its training loss fails to improve for
//! `patience` consecutive rounds, or reaches [`EARLY_STOP_EPSILON`].
//! A stopped class contributes no further trees.

use crate::core::constants::EARLY_STOP_EPSILON;
use crate::core::types::RoundIndex;

/// Loss tracker for a single class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMonitor {
    previous_loss: Option<f64>,
    no_progress: usize,
    stopped: bool,
}

impl ClassMonitor {
    fn new() -> Self {
        ClassMonitor {
            previous_loss: None,
            no_progress: 0,
            stopped: false,
        }
    }

    /// Whether this class stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Rounds in a row without improvement.
    pub fn no_progress(&self) -> usize {
        self.no_progress
    }
}

/// Tracks the ACTIVE/STOPPED state of every class.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    classes: Vec<ClassMonitor>,
}

impl EarlyStopping {
    /// Monitor `num_classes` classes; `patience = 0` disables stopping.
    pub fn new(patience: usize, num_classes: usize) -> Self {
        EarlyStopping {
            patience,
            classes: (0..num_classes).map(|_| ClassMonitor::new()).collect(),
        }
    }

    /// Whether `class` still receives trees.
    pub fn is_active(&self, class: usize) -> bool {
        self.classes.get(class).map_or(false, |c| !c.stopped)
    }

    /// Whether every class stopped.
    pub fn all_stopped(&self) -> bool {
        self.classes.iter().all(|c| c.stopped)
    }

    /// Indices of the classes still ACTIVE.
    pub fn active_classes(&self) -> Vec<usize> {
        (0..self.classes.len())
            .filter(|&c| self.is_active(c))
            .collect()
    }

    /// Monitor of one class.
    pub fn monitor(&self, class: usize) -> Option<&ClassMonitor> {
        self.classes.get(class)
    }

    /// Record the loss of `class` after `round`. Returns `true` when the
    /// class transitions to STOPPED on this call.
    pub fn update(&mut self, class: usize, loss: f64, round: RoundIndex) -> bool {
        let patience = self.patience;
        if patience == 0 {
            return false;
        }
        let monitor = match self.classes.get_mut(class) {
            Some(m) if !m.stopped => m,
            _ => return false,
        };

        if loss <= EARLY_STOP_EPSILON {
            monitor.stopped = true;
            log::info!(
                "class {} reached loss {:.3e} at round {}, stopping",
                class,
                loss,
                round
            );
            return true;
        }

        if let Some(previous) = monitor.previous_loss {
            if previous <= loss {
                monitor.no_progress += 1;
            } else {
                monitor.no_progress = 0;
            }
        }
        monitor.previous_loss = Some(loss);

        if monitor.no_progress >= patience {
            monitor.stopped = true;
            log::info!(
                "class {} made no progress for {} rounds, stopping at round {}",
                class,
                monitor.no_progress,
                round
            );
            return true;
        }
        false
    }
}
