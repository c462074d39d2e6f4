//! Outer optimization loop connecting a strategy to a scoring oracle.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::schema::{FeatureId, SearchProgress, SearchResult, SearchStats, StopReason};

use super::error::SearchError;
use super::strategy::SearchStrategy;

/// External, possibly expensive function scoring a feature subset.
///
/// Scores must be finite. Failures are reported to the driver's caller and
/// never retried.
pub trait Oracle {
    type Error: std::error::Error + 'static;

    fn evaluate(&self, features: &[FeatureId]) -> Result<f64, Self::Error>;
}

impl<F, E> Oracle for F
where
    F: Fn(&[FeatureId]) -> Result<f64, E>,
    E: std::error::Error + 'static,
{
    type Error = E;

    fn evaluate(&self, features: &[FeatureId]) -> Result<f64, E> {
        self(features)
    }
}

/// Errors surfaced by [`SearchDriver`].
#[derive(Debug, thiserror::Error)]
pub enum DriverError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("Oracle failed for features {features:?}: {source}")]
    Oracle {
        features: Vec<FeatureId>,
        #[source]
        source: E,
    },
}

type Prefetched = HashMap<Vec<FeatureId>, f64>;

/// Strategy-agnostic driver.
///
/// Repeatedly asks the strategy for its candidate, scores it with the oracle,
/// feeds the score back and advances, until the strategy terminates or the
/// run is cancelled.
pub struct SearchDriver {
    cancelled: Arc<AtomicBool>,
}

impl Default for SearchDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchDriver {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get cancellation handle. Checked between rounds.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Run to completion (blocking).
    pub fn run<O: Oracle>(
        &self,
        strategy: &mut SearchStrategy,
        oracle: &O,
    ) -> Result<SearchResult, DriverError<O::Error>> {
        self.run_with_callback(strategy, oracle, |_| {})
    }

    /// Run to completion, reporting progress after every scored candidate.
    pub fn run_with_callback<O, C>(
        &self,
        strategy: &mut SearchStrategy,
        oracle: &O,
        callback: C,
    ) -> Result<SearchResult, DriverError<O::Error>>
    where
        O: Oracle,
        C: FnMut(&SearchProgress),
    {
        self.drive(strategy, oracle, |_, _, _| Ok(()), callback)
    }

    /// Run to completion, scoring each batch of independent candidates on
    /// the rayon pool.
    ///
    /// Scores are computed ahead of time but fed to the strategy in hand-out
    /// order, so the run is identical to [`SearchDriver::run`] with the same
    /// seed.
    pub fn run_parallel<O>(
        &self,
        strategy: &mut SearchStrategy,
        oracle: &O,
    ) -> Result<SearchResult, DriverError<O::Error>>
    where
        O: Oracle + Sync,
        O::Error: Send,
    {
        self.drive(strategy, oracle, prefetch_batch, |_| {})
    }

    fn drive<O, P, C>(
        &self,
        strategy: &mut SearchStrategy,
        oracle: &O,
        mut prefetch: P,
        mut callback: C,
    ) -> Result<SearchResult, DriverError<O::Error>>
    where
        O: Oracle,
        P: FnMut(&SearchStrategy, &O, &mut Prefetched) -> Result<(), DriverError<O::Error>>,
        C: FnMut(&SearchProgress),
    {
        let start = Instant::now();
        let mut prefetched = Prefetched::new();
        let mut levels = Vec::new();
        let mut cancelled = false;

        log::info!(
            "starting {:?} search ({:?})",
            strategy.kind(),
            strategy.objective()
        );

        while strategy.continue_loop() {
            if self.cancelled.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }

            let features = strategy.included_features();
            if !prefetched.contains_key(&features) {
                prefetch(strategy, oracle, &mut prefetched)?;
            }
            let score = match prefetched.get(&features) {
                Some(&score) => score,
                None => oracle
                    .evaluate(&features)
                    .map_err(|source| DriverError::Oracle {
                        features: features.clone(),
                        source,
                    })?,
            };

            strategy.add_score(score)?;
            if let Some(level) = strategy.completed_level() {
                levels.push(level);
            }

            callback(&SearchProgress {
                strategy: strategy.kind(),
                generation: strategy.generation(),
                total_iterations: strategy.number_of_iterations(),
                evaluations: strategy.evaluations(),
                best_score: strategy.current_best_score(),
                last_score: score,
                last_features: features,
                cached_subsets: strategy.cached_subsets(),
            });

            strategy.prepare_new_round()?;
        }

        let stop_reason = if cancelled {
            StopReason::Cancelled
        } else {
            strategy.stop_reason().unwrap_or(StopReason::MaxGenerations)
        };
        let elapsed = start.elapsed().as_secs_f64();

        log::info!(
            "search finished after {} evaluations: {:?}, best score {}",
            strategy.evaluations(),
            stop_reason,
            strategy.current_best_score()
        );

        Ok(SearchResult {
            best_features: strategy.best_features().unwrap_or_default(),
            best_score: strategy.current_best_score(),
            levels,
            change_label: strategy.name_for_last_change().to_string(),
            stats: SearchStats {
                generations: strategy.generation(),
                evaluations: strategy.evaluations(),
                cached_subsets: strategy.cached_subsets(),
                elapsed_seconds: elapsed,
                stop_reason,
            },
        })
    }
}

/// Score every pending candidate not yet known, in parallel.
fn prefetch_batch<O>(
    strategy: &SearchStrategy,
    oracle: &O,
    prefetched: &mut Prefetched,
) -> Result<(), DriverError<O::Error>>
where
    O: Oracle + Sync,
    O::Error: Send,
{
    let mut batch = strategy.pending_candidates();
    batch.retain(|features| !prefetched.contains_key(features));
    batch.dedup();

    log::debug!("prefetching {} candidates", batch.len());

    let scored: Vec<(Vec<FeatureId>, f64)> = batch
        .into_par_iter()
        .map(|features| match oracle.evaluate(&features) {
            Ok(score) => Ok((features, score)),
            Err(source) => Err(DriverError::Oracle { features, source }),
        })
        .collect::<Result<_, _>>()?;

    prefetched.extend(scored);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::schema::{SearchConfig, StrategyKind};

    fn popcount(features: &[FeatureId]) -> Result<f64, Infallible> {
        Ok(features.len() as f64)
    }

    #[derive(Debug, thiserror::Error)]
    #[error("training failed")]
    struct TrainingFailed;

    #[test]
    fn test_run_reaches_termination() {
        let config = SearchConfig::with_feature_count(5).with_seed(4);
        let mut strategy = SearchStrategy::from_config(&config).unwrap();

        let result = SearchDriver::new().run(&mut strategy, &popcount).unwrap();
        assert!(!strategy.continue_loop());
        assert!(result.best_score <= 5.0);
        assert_eq!(result.best_score, result.best_features.len() as f64);
        assert_eq!(result.levels.len() as u64, result.stats.evaluations);
    }

    #[test]
    fn test_oracle_failure_propagates() {
        let config = SearchConfig::with_feature_count(3).with_seed(5);
        let mut strategy = SearchStrategy::from_config(&config).unwrap();
        let failing = |_: &[FeatureId]| Err::<f64, _>(TrainingFailed);

        let err = SearchDriver::new().run(&mut strategy, &failing).unwrap_err();
        assert!(matches!(err, DriverError::Oracle { .. }));
        assert_eq!(strategy.evaluations(), 0);
    }

    #[test]
    fn test_non_finite_oracle_score_rejected() {
        let config = SearchConfig::with_feature_count(3)
            .with_strategy(StrategyKind::SequentialForward);
        let mut strategy = SearchStrategy::from_config(&config).unwrap();
        let broken = |_: &[FeatureId]| Ok::<_, Infallible>(f64::NAN);

        let err = SearchDriver::new().run(&mut strategy, &broken).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Search(SearchError::NonFiniteScore(_))
        ));
    }

    #[test]
    fn test_cancellation() {
        let config = SearchConfig::with_feature_count(4).with_seed(6);
        let mut strategy = SearchStrategy::from_config(&config).unwrap();
        let driver = SearchDriver::new();
        driver.cancel_handle().store(true, Ordering::Relaxed);

        let result = driver.run(&mut strategy, &popcount).unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::Cancelled);
        assert_eq!(result.stats.evaluations, 0);
        assert!(strategy.continue_loop());
    }

    #[test]
    fn test_progress_callback_sees_every_score() {
        let config = SearchConfig::with_feature_count(4).with_strategy(StrategyKind::SequentialBackward);
        let mut strategy = SearchStrategy::from_config(&config).unwrap();

        let mut seen = Vec::new();
        let result = SearchDriver::new()
            .run_with_callback(&mut strategy, &popcount, |progress| {
                seen.push(progress.evaluations)
            })
            .unwrap();

        assert_eq!(seen.len() as u64, result.stats.evaluations);
        assert!(seen.windows(2).all(|w| w[1] == w[0] + 1));
        assert_eq!(result.change_label, "Removed feature");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let config = SearchConfig::with_feature_count(8).with_seed(21);
        let weights = [0.5, -1.0, 2.0, 0.25, -0.75, 1.5, 0.0, 3.0];
        let oracle = |features: &[FeatureId]| {
            Ok::<_, Infallible>(features.iter().map(|&f| weights[f as usize]).sum())
        };

        let mut sequential = SearchStrategy::from_config(&config).unwrap();
        let mut parallel = SearchStrategy::from_config(&config).unwrap();
        let a = SearchDriver::new().run(&mut sequential, &oracle).unwrap();
        let b = SearchDriver::new().run_parallel(&mut parallel, &oracle).unwrap();

        assert_eq!(a.best_score, b.best_score);
        assert_eq!(a.best_features, b.best_features);
        assert_eq!(a.levels, b.levels);
        assert_eq!(a.stats.evaluations, b.stats.evaluations);
    }
}
