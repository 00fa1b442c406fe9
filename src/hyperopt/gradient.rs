//! Finite-difference coordinate ascent over the continuous hyperparameters.

use crate::config::{Options, SearchConfig, SearchSpace};
use crate::core::constants::{GRADIENT_CLOSENESS, MIN_STEP_FRACTION, STEP_SHRINK};
use crate::core::error::Result;
use crate::core::types::BoostingKind;
use crate::dataset::Dataset;
use crate::hyperopt::cross_validation::cross_validate;
use crate::hyperopt::{fuzz_options, search_rng, thread_pool, SearchResult, Tracker};
use rand::Rng;
use rayon::prelude::*;
use std::fmt;

/// A hyperparameter the coordinate ascent moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tunable {
    /// Split penalty
    Gamma,
    /// L2 leaf regularization
    Lambda,
    /// Row subsample fraction
    Subsample,
    /// Column subsample fraction
    ColSubsample,
    /// Shrinkage
    LearningRate,
    /// Boosting rounds
    Rounds,
}

impl Tunable {
    /// Parameters tuned for regularized boosting.
    pub const REGULARIZED: [Tunable; 6] = [
        Tunable::Gamma,
        Tunable::Lambda,
        Tunable::Subsample,
        Tunable::ColSubsample,
        Tunable::LearningRate,
        Tunable::Rounds,
    ];

    /// Parameters tuned for plain boosting, which ignores the others.
    pub const PLAIN: [Tunable; 2] = [Tunable::LearningRate, Tunable::Rounds];

    /// The tunable set of a boosting flavour.
    pub fn for_kind(kind: BoostingKind) -> &'static [Tunable] {
        match kind {
            BoostingKind::Regularized => &Tunable::REGULARIZED,
            BoostingKind::Plain => &Tunable::PLAIN,
        }
    }

    /// Current value in `options`.
    pub fn get(&self, options: &Options) -> f64 {
        match self {
            Tunable::Gamma => options.gamma,
            Tunable::Lambda => options.lambda,
            Tunable::Subsample => options.subsample,
            Tunable::ColSubsample => options.col_subsample,
            Tunable::LearningRate => options.learning_rate,
            Tunable::Rounds => options.rounds as f64,
        }
    }

    /// Copy of `options` with this parameter moved by `delta`. Rounds move
    /// by the truncated delta and never below zero.
    pub fn shifted(&self, options: &Options, delta: f64) -> Options {
        let mut moved = options.clone();
        match self {
            Tunable::Gamma => moved.gamma += delta,
            Tunable::Lambda => moved.lambda += delta,
            Tunable::Subsample => moved.subsample += delta,
            Tunable::ColSubsample => moved.col_subsample += delta,
            Tunable::LearningRate => moved.learning_rate += delta,
            Tunable::Rounds => {
                let rounds = options.rounds as i64 + delta.trunc() as i64;
                moved.rounds = rounds.max(0) as usize;
            }
        }
        moved
    }

    /// Overwrite this parameter in `options`.
    pub fn set(&self, options: &mut Options, value: f64) {
        match self {
            Tunable::Gamma => options.gamma = value,
            Tunable::Lambda => options.lambda = value,
            Tunable::Subsample => options.subsample = value,
            Tunable::ColSubsample => options.col_subsample = value,
            Tunable::LearningRate => options.learning_rate = value,
            Tunable::Rounds => options.rounds = value.max(0.0) as usize,
        }
    }

    /// This parameter's grid step in `space`.
    pub fn range_step(&self, space: &SearchSpace) -> f64 {
        match self {
            Tunable::Gamma => space.gamma.step_f64(),
            Tunable::Lambda => space.lambda.step_f64(),
            Tunable::Subsample => space.subsample.step_f64(),
            Tunable::ColSubsample => space.col_subsample.step_f64(),
            Tunable::LearningRate => space.learning_rate.step_f64(),
            Tunable::Rounds => space.rounds.step_f64(),
        }
    }
}

impl fmt::Display for Tunable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tunable::Gamma => "gamma",
            Tunable::Lambda => "lambda",
            Tunable::Subsample => "subsample",
            Tunable::ColSubsample => "col_subsample",
            Tunable::LearningRate => "learning_rate",
            Tunable::Rounds => "rounds",
        };
        f.write_str(name)
    }
}

/// Result of one ascent step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The point moved
    Moved(Options),
    /// Every derivative is negligible or no move stays in bounds
    Converged,
}

fn admissible(options: &Options, space: &SearchSpace) -> bool {
    space.contains(options) && options.validate().is_ok()
}

/// Probe pair of one parameter: indices into the evaluated probe list and
/// the parameter distance between them.
struct Probe {
    tunable: Tunable,
    upper: usize,
    lower: usize,
    spread: f64,
}

/// Take one finite-difference ascent step from `options`.
///
/// Every tunable is perturbed by `delta_fraction` of its value (both ways
/// with central differences, upward only otherwise) and the probes are
/// cross-validated concurrently. Parameters whose derivative falls below
/// the closeness threshold stay put; the others move by
/// `step_size * range_step * derivative`, shrinking the step until the
/// point stays inside `space` or reverting the parameter.
pub fn gradient_step(
    dataset: &Dataset,
    options: &Options,
    space: &SearchSpace,
    config: &SearchConfig,
    tunables: &[Tunable],
) -> Result<StepOutcome> {
    let pool = probe_pool(config, tunables)?;
    step_on(&pool, dataset, options, space, config, tunables)
}

/// Pool wide enough to evaluate every probe of one step at once.
fn probe_pool(config: &SearchConfig, tunables: &[Tunable]) -> Result<rayon::ThreadPool> {
    let points = if config.central {
        2 * tunables.len()
    } else {
        tunables.len() + 1
    };
    thread_pool(points)
}

fn step_on(
    pool: &rayon::ThreadPool,
    dataset: &Dataset,
    options: &Options,
    space: &SearchSpace,
    config: &SearchConfig,
    tunables: &[Tunable],
) -> Result<StepOutcome> {
    let mut points: Vec<Options> = Vec::new();
    let current = if config.central {
        None
    } else {
        points.push(options.clone());
        Some(0)
    };

    let mut probes = Vec::with_capacity(tunables.len());
    for &tunable in tunables {
        let value = tunable.get(options);
        let delta = value * config.delta_fraction;
        let upper = tunable.shifted(options, delta);
        let lower = match current {
            Some(_) => options.clone(),
            None => tunable.shifted(options, -delta),
        };
        let spread = tunable.get(&upper) - tunable.get(&lower);
        if spread <= 0.0 || upper.validate().is_err() || lower.validate().is_err() {
            log::trace!("no usable probe for {} at {}", tunable, value);
            continue;
        }
        let upper_index = points.len();
        points.push(upper);
        let lower_index = match current {
            Some(index) => index,
            None => {
                points.push(lower);
                points.len() - 1
            }
        };
        probes.push(Probe {
            tunable,
            upper: upper_index,
            lower: lower_index,
            spread,
        });
    }
    if probes.is_empty() {
        return Ok(StepOutcome::Converged);
    }

    let scores: Vec<f64> = pool
        .install(|| {
            points
                .par_iter()
                .map(|probe| cross_validate(dataset, probe, config))
                .collect::<Vec<Result<f64>>>()
        })
        .into_iter()
        .collect::<Result<_>>()?;

    let mut next = options.clone();
    let mut moved = false;
    for probe in &probes {
        let derivative = (scores[probe.upper] - scores[probe.lower]) / probe.spread;
        if derivative.abs() < GRADIENT_CLOSENESS {
            continue;
        }
        let scale = probe.tunable.range_step(space) * derivative;
        let mut step = config.step_size;
        while step > MIN_STEP_FRACTION * config.step_size {
            let candidate = probe.tunable.shifted(options, scale * step);
            if admissible(&candidate, space) {
                let value = probe.tunable.get(&candidate);
                if value != probe.tunable.get(options) {
                    log::debug!(
                        "{}: derivative {:.4}, {} -> {}",
                        probe.tunable,
                        derivative,
                        probe.tunable.get(options),
                        value
                    );
                    probe.tunable.set(&mut next, value);
                    moved = true;
                }
                break;
            }
            step *= STEP_SHRINK;
        }
    }

    Ok(if moved {
        StepOutcome::Moved(next)
    } else {
        StepOutcome::Converged
    })
}

/// Cross-validate `next`. A score below the latest improvement rejects the
/// move and continues from a fuzzed copy of `previous`.
fn compare<R: Rng + ?Sized>(
    dataset: &Dataset,
    next: Options,
    previous: &Options,
    space: &SearchSpace,
    config: &SearchConfig,
    tracker: &mut Tracker,
    rng: &mut R,
) -> Result<Options> {
    let score = cross_validate(dataset, &next, config)?;
    match tracker.last() {
        Some(last) if score < last => {
            log::debug!("step lowered the score to {:.4}, fuzzing back", score);
            Ok(fuzz_options(previous, space, config.fuzz, rng))
        }
        _ => {
            tracker.offer(&next, score);
            Ok(next)
        }
    }
}

/// Probe pool shared by every step of the ascents started from `base`.
pub(crate) fn ascent_pool(base: &Options, config: &SearchConfig) -> Result<rayon::ThreadPool> {
    probe_pool(config, Tunable::for_kind(base.kind))
}

/// Run `config.n_steps` ascent steps from `start`, recording improvements
/// in `tracker`. Consecutive converged steps fuzz the point; after
/// `config.max_stalls` of them the ascent gives up early.
pub(crate) fn ascend<R: Rng + ?Sized>(
    pool: &rayon::ThreadPool,
    dataset: &Dataset,
    start: Options,
    space: &SearchSpace,
    config: &SearchConfig,
    tracker: &mut Tracker,
    rng: &mut R,
) -> Result<()> {
    let tunables = Tunable::for_kind(start.kind);
    let mut current = compare(dataset, start.clone(), &start, space, config, tracker, rng)?;
    let mut stalls = 0;
    for step in 0..config.n_steps {
        match step_on(pool, dataset, &current, space, config, tunables)? {
            StepOutcome::Moved(next) => {
                current = compare(dataset, next, &current, space, config, tracker, rng)?;
                stalls = 0;
            }
            StepOutcome::Converged => {
                stalls += 1;
                log::debug!("step {}: no progress ({} in a row)", step, stalls);
                current = fuzz_options(&current, space, config.fuzz, rng);
                if stalls == config.max_stalls {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Coordinate ascent from the box midpoint of every
/// (min child weight, max depth) grid cell of `space`.
pub fn gradient_search(
    dataset: &Dataset,
    base: &Options,
    space: &SearchSpace,
    config: &SearchConfig,
) -> Result<SearchResult> {
    space.validate()?;
    config.validate()?;
    let pool = ascent_pool(base, config)?;
    let mut rng = search_rng(config.seed);
    let mut tracker = Tracker::default();

    for min_child_weight in space.min_child_weight.values() {
        log::info!("gradient search: min child weight {}", min_child_weight);
        for max_depth in space.max_depth.values() {
            let mut start = space.midpoint(base);
            start.min_child_weight = min_child_weight;
            start.max_depth = max_depth;
            ascend(&pool, dataset, start, space, config, &mut tracker, &mut rng)?;
        }
    }

    tracker.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParamRange;
    use crate::core::error::GbtuneError;
    use ndarray::Array2;

    fn small_space() -> SearchSpace {
        SearchSpace {
            rounds: ParamRange::new(4, 8, 2),
            max_depth: ParamRange::new(2, 2, 1),
            learning_rate: ParamRange::new(0.1, 0.5, 0.1),
            lambda: ParamRange::new(1.0, 2.0, 0.5),
            gamma: ParamRange::new(0.1, 0.3, 0.1),
            min_child_weight: ParamRange::new(1.0, 1.0, 1.0),
            subsample: ParamRange::new(0.8, 1.0, 0.1),
            col_subsample: ParamRange::new(0.8, 1.0, 0.1),
        }
    }

    fn base() -> Options {
        let mut options = Options::regularized();
        options.min_samples_per_tree = 1;
        options.seed = Some(9);
        options
    }

    fn config() -> SearchConfig {
        SearchConfig::regularized()
            .with_folds(2)
            .with_seed(17)
            .with_steps(2)
    }

    #[test]
    fn test_tunable_sets() {
        assert_eq!(Tunable::for_kind(BoostingKind::Regularized).len(), 6);
        assert_eq!(
            Tunable::for_kind(BoostingKind::Plain),
            &[Tunable::LearningRate, Tunable::Rounds]
        );
    }

    #[test]
    fn test_rounds_shift_truncates() {
        let mut options = Options::regularized();
        options.rounds = 10;
        assert_eq!(Tunable::Rounds.shifted(&options, 2.9).rounds, 12);
        assert_eq!(Tunable::Rounds.shifted(&options, -0.5).rounds, 10);
        assert_eq!(Tunable::Rounds.shifted(&options, -50.0).rounds, 0);
        assert_eq!(Tunable::Rounds.get(&options), 10.0);
    }

    #[test]
    fn test_flat_landscape_converges() {
        let features = Array2::from_shape_fn((12, 1), |(i, _)| i as f64);
        let ds = Dataset::new(features, vec![3; 12]).unwrap();
        let start = small_space().midpoint(&base());
        let outcome = gradient_step(
            &ds,
            &start,
            &small_space(),
            &config(),
            Tunable::for_kind(BoostingKind::Regularized),
        )
        .unwrap();
        assert_eq!(outcome, StepOutcome::Converged);
    }

    #[test]
    fn test_shared_pool_steps_match_fresh_pool() {
        let features = Array2::from_shape_fn((24, 2), |(i, j)| {
            ((i % 2) * 5) as f64 + ((i + j) % 3) as f64 * 0.5
        });
        let ds = Dataset::new(features, (0..24).map(|i| (i % 2) as i32).collect()).unwrap();
        let start = small_space().midpoint(&base());
        let pool = ascent_pool(&start, &config()).unwrap();
        assert_eq!(pool.current_num_threads(), 2 * Tunable::REGULARIZED.len());

        let fresh = gradient_step(&ds, &start, &small_space(), &config(), &Tunable::REGULARIZED)
            .unwrap();
        for _ in 0..2 {
            let shared = step_on(
                &pool,
                &ds,
                &start,
                &small_space(),
                &config(),
                &Tunable::REGULARIZED,
            )
            .unwrap();
            assert_eq!(shared, fresh);
        }
    }

    #[test]
    fn test_step_errors_propagate() {
        let features = Array2::from_shape_fn((3, 1), |(i, _)| i as f64);
        let ds = Dataset::new(features, vec![0, 1, 0]).unwrap();
        let start = small_space().midpoint(&base());
        let err = gradient_step(&ds, &start, &small_space(), &config(), &Tunable::REGULARIZED)
            .unwrap_err();
        assert!(matches!(err, GbtuneError::InsufficientData { .. }));
    }

    #[test]
    fn test_search_stays_in_box() {
        let features = Array2::from_shape_fn((24, 2), |(i, j)| {
            ((i % 2) * 5) as f64 + ((i + j) % 3) as f64 * 0.5
        });
        let ds = Dataset::new(features, (0..24).map(|i| (i % 2) as i32).collect()).unwrap();
        let result = gradient_search(&ds, &base(), &small_space(), &config()).unwrap();
        assert!(small_space().contains(&result.best));
        assert!(!result.history.is_empty());
        assert_eq!(result.history.last(), Some(&result.best_score));
        assert!(result.history.windows(2).all(|w| w[1] > w[0]));
    }
}
