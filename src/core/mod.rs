//! Core infrastructure module for gbtune.
//!
//! - [`types`]: index aliases and the boosting/task/loss selectors
//! - [`constants`]: numeric thresholds and default hyperparameters
//! - [`error`]: the crate error type and helper macros
//!
//! ```rust
//! use gbtune::core::{
//!     constants::DEFAULT_REG_LEARNING_RATE,
//!     error::{GbtuneError, Result},
//!     types::BoostingKind,
//! };
//!
//! let kind = BoostingKind::Regularized;
//! assert!(DEFAULT_REG_LEARNING_RATE > 0.0);
//! # let _ = kind;
//! ```

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{GbtuneError, Result};
pub use types::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static CORE_INIT: Once = Once::new();
static CORE_READY: AtomicBool = AtomicBool::new(false);

/// Install the `env_logger` backend (defaulting to `info` when `RUST_LOG`
/// is unset). Safe to call any number of times.
pub fn initialize_core() -> Result<()> {
    CORE_INIT.call_once(|| {
        let env = env_logger::Env::default().default_filter_or("info");
        // Another logger may already be installed by the host application.
        if env_logger::Builder::from_env(env).try_init().is_err() {
            log::debug!("logger already initialized, keeping the existing one");
        }
        CORE_READY.store(true, Ordering::SeqCst);
    });
    Ok(())
}

/// Check if the core module is initialized
pub fn is_core_initialized() -> bool {
    CORE_READY.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_is_idempotent() {
        initialize_core().unwrap();
        initialize_core().unwrap();
        assert!(is_core_initialized());
    }
}
