//! Numeric constants and default hyperparameter values for gbtune.

/// Loss value below which a class counts as fully fitted and stops early.
pub const EARLY_STOP_EPSILON: f64 = 1e-6;

/// Minimum number of rows each cross-validation fold must receive.
pub const MIN_SAMPLES_PER_FOLD: usize = 2;

/// Smallest usable fold count.
pub const MIN_FOLDS: usize = 2;

/// Derivatives with an absolute value below this are treated as zero by
/// the coordinate search.
pub const GRADIENT_CLOSENESS: f64 = 1e-3;

/// Geometric shrink factor applied to a gradient step that left the box.
pub const STEP_SHRINK: f64 = 0.8;

/// A gradient step is abandoned once it shrinks below this fraction of
/// the initial step size.
pub const MIN_STEP_FRACTION: f64 = 0.1;

/// Default consecutive stalls before the coordinate search moves on.
pub const DEFAULT_MAX_STALLS: usize = 3;

/// Default relative amplitude of a fuzz perturbation.
pub const DEFAULT_FUZZ: f64 = 0.2;

/// Default cross-validation fold count.
pub const DEFAULT_FOLDS: usize = 5;

// Regularized (XGBoost-style) defaults.

/// Default boosting rounds for the regularized variant.
pub const DEFAULT_REG_ROUNDS: usize = 20;
/// Default maximum depth for the regularized variant.
pub const DEFAULT_REG_MAX_DEPTH: usize = 5;
/// Default learning rate for the regularized variant.
pub const DEFAULT_REG_LEARNING_RATE: f64 = 0.3;
/// Default L2 leaf regularization.
pub const DEFAULT_REG_LAMBDA: f64 = 1.5;
/// Default split penalty.
pub const DEFAULT_REG_GAMMA: f64 = 0.2;
/// Default minimum child weight for the regularized variant.
pub const DEFAULT_REG_MIN_CHILD_WEIGHT: f64 = 3.0;
/// Default row subsample fraction for the regularized variant.
pub const DEFAULT_REG_SUBSAMPLE: f64 = 0.8;
/// Default column subsample fraction for the regularized variant.
pub const DEFAULT_REG_COL_SUBSAMPLE: f64 = 0.8;
/// Default base score for the regularized variant.
pub const DEFAULT_REG_BASE_SCORE: f64 = 0.5;
/// Default early-stop patience for the regularized variant.
pub const DEFAULT_REG_EARLY_STOP: usize = 10;
/// Default minimum subsample size for a round to be trained.
pub const DEFAULT_REG_MIN_SAMPLES: usize = 5;

// Plain gradient boosting defaults.

/// Default boosting rounds for plain boosting.
pub const DEFAULT_PLAIN_ROUNDS: usize = 10;
/// Default maximum depth for plain boosting.
pub const DEFAULT_PLAIN_MAX_DEPTH: usize = 4;
/// Default learning rate for plain boosting.
pub const DEFAULT_PLAIN_LEARNING_RATE: f64 = 0.1;
/// Default minimum child weight for plain boosting.
pub const DEFAULT_PLAIN_MIN_CHILD_WEIGHT: f64 = 3.0;

// Coordinate search defaults.

/// Default step size multiplier.
pub const DEFAULT_STEP_SIZE: f64 = 0.1;
/// Default relative perturbation used for finite differences.
pub const DEFAULT_DELTA_FRACTION: f64 = 0.05;
/// Default number of ascent steps per outer grid cell.
pub const DEFAULT_GRADIENT_STEPS: usize = 6;
