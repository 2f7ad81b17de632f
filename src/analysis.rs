//! Repeated-trial statistics over a sweep of eavesdropping probabilities.
//!
//! For every probability in the sweep the analyzer executes `num_simulations`
//! independent runs and reduces them into a [`BatchStatistics`]. Runs are
//! spread over worker threads with `std::thread::scope`. Each run owns a
//! `RandomSource::derive(seed, sweep_index, run_index)` stream, and results are
//! reduced in run order, so a seeded sweep gives identical statistics no
//! matter how many workers execute it.

use crate::config::BatchConfig;
use crate::core::RandomSource;
use crate::core::errors::ProtocolError;
use crate::protocols::qkd::bb84::{Protocol, RunResult};
use crate::protocols::qkd::transmission::{PhotonChannel, TransmissionModel};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Cooperative cancellation flag, checked between runs.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Welford accumulator for mean and population standard deviation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population standard deviation; 0.0 for fewer than two samples.
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / self.count as f64).sqrt()
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Aggregate over all runs of one sweep entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStatistics {
    pub eavesdrop_prob: f64,
    pub runs: usize,
    pub error_rate_mean: f64,
    pub error_rate_std: f64,
    pub error_rate_min: f64,
    pub error_rate_max: f64,
    pub final_key_length_mean: f64,
    pub final_key_length_std: f64,
    pub sifted_ratio_mean: f64,
    pub secure_runs: usize,
    /// Fraction of runs that passed the error check.
    pub security_rate: f64,
    /// Error rate of every run, in run order.
    pub error_rates: Vec<f64>,
    /// Wall-clock time spent on the whole entry.
    pub execution_time: Duration,
    /// Mean of the runs' own `elapsed`.
    pub run_time_mean: Duration,
}

/// Incremental builder for [`BatchStatistics`].
#[derive(Debug, Clone, Default)]
pub struct BatchAccumulator {
    eavesdrop_prob: f64,
    error_rate: RunningStats,
    final_key_length: RunningStats,
    sifted_ratio: RunningStats,
    secure_runs: usize,
    error_rates: Vec<f64>,
    run_time_total: Duration,
}

impl BatchAccumulator {
    pub fn new(eavesdrop_prob: f64) -> Self {
        Self {
            eavesdrop_prob,
            ..Self::default()
        }
    }

    pub fn push(&mut self, result: &RunResult) {
        self.error_rate.push(result.error_rate);
        self.final_key_length.push(result.final_key_length as f64);
        self.sifted_ratio.push(result.sifted_ratio());
        if result.secure {
            self.secure_runs += 1;
        }
        self.error_rates.push(result.error_rate);
        self.run_time_total += result.elapsed;
    }

    pub fn runs(&self) -> usize {
        self.error_rate.count()
    }

    /// Closes the entry; `execution_time` is its wall-clock duration.
    pub fn finish(self, execution_time: Duration) -> BatchStatistics {
        let runs = self.runs();
        BatchStatistics {
            eavesdrop_prob: self.eavesdrop_prob,
            runs,
            error_rate_mean: self.error_rate.mean(),
            error_rate_std: self.error_rate.std_dev(),
            error_rate_min: self.error_rate.min(),
            error_rate_max: self.error_rate.max(),
            final_key_length_mean: self.final_key_length.mean(),
            final_key_length_std: self.final_key_length.std_dev(),
            sifted_ratio_mean: self.sifted_ratio.mean(),
            secure_runs: self.secure_runs,
            security_rate: if runs == 0 {
                0.0
            } else {
                self.secure_runs as f64 / runs as f64
            },
            error_rates: self.error_rates,
            execution_time,
            run_time_mean: if runs == 0 {
                Duration::ZERO
            } else {
                Duration::from_nanos((self.run_time_total.as_nanos() / runs as u128) as u64)
            },
        }
    }
}

/// Output of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Completed sweep entries, in sweep order. Duplicated probabilities
    /// appear once per occurrence.
    pub statistics: Vec<BatchStatistics>,
    /// The sweep stopped early; entries after the last one listed never ran
    /// to completion and were discarded.
    pub cancelled: bool,
}

impl BatchReport {
    /// First statistics entry recorded for `eavesdrop_prob`.
    pub fn get(&self, eavesdrop_prob: f64) -> Option<&BatchStatistics> {
        self.statistics
            .iter()
            .find(|s| s.eavesdrop_prob == eavesdrop_prob)
    }
}

/// Drives many protocol runs per sweep entry.
#[derive(Debug, Clone, Default)]
pub struct BatchAnalyzer<T = PhotonChannel> {
    protocol: Protocol<T>,
}

impl BatchAnalyzer<PhotonChannel> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: TransmissionModel> BatchAnalyzer<T> {
    pub fn with_transmission(transmission: T) -> Self {
        Self {
            protocol: Protocol::with_transmission(transmission),
        }
    }

    pub fn analyze(&self, config: &BatchConfig) -> Result<BatchReport, ProtocolError> {
        self.analyze_with_cancel(config, &CancelToken::new())
    }

    /// Runs the sweep, stopping between runs once `cancel` is set.
    pub fn analyze_with_cancel(
        &self,
        config: &BatchConfig,
        cancel: &CancelToken,
    ) -> Result<BatchReport, ProtocolError> {
        config.validate()?;
        let seed = config
            .seed
            .unwrap_or_else(|| RandomSource::from_entropy().next_u64());

        let mut statistics = Vec::with_capacity(config.eavesdrop_probs.len());

        for (stream, &prob) in config.eavesdrop_probs.iter().enumerate() {
            let started = Instant::now();
            let Some(results) = self.run_entry(config, prob, seed, stream as u64, cancel)? else {
                warn!(
                    "batch cancelled during eavesdrop_prob={prob}, {} of {} entries complete",
                    statistics.len(),
                    config.eavesdrop_probs.len()
                );
                return Ok(BatchReport {
                    statistics,
                    cancelled: true,
                });
            };

            let mut acc = BatchAccumulator::new(prob);
            for result in &results {
                acc.push(result);
            }
            let stats = acc.finish(started.elapsed());

            info!(
                "eavesdrop_prob={:.2}: qber {:.4} ± {:.4}, key {:.1} ± {:.1}, secure {:.1}%, {:.2?}",
                prob,
                stats.error_rate_mean,
                stats.error_rate_std,
                stats.final_key_length_mean,
                stats.final_key_length_std,
                stats.security_rate * 100.0,
                stats.execution_time
            );
            statistics.push(stats);
        }

        Ok(BatchReport {
            statistics,
            cancelled: false,
        })
    }

    /// Executes all runs of one sweep entry; `None` if cancelled midway.
    fn run_entry(
        &self,
        config: &BatchConfig,
        prob: f64,
        seed: u64,
        stream: u64,
        cancel: &CancelToken,
    ) -> Result<Option<Vec<RunResult>>, ProtocolError> {
        let protocol_config = config.protocol_for(prob);
        let total = config.num_simulations;
        let workers = config.workers.min(total).max(1);
        let next = AtomicUsize::new(0);

        debug!("eavesdrop_prob={prob}: {total} runs on {workers} workers");

        let run_one = |index: usize| {
            let mut rng = RandomSource::derive(seed, stream, index as u64);
            self.protocol.run_with(&protocol_config, &mut rng)
        };

        let worker = || -> Result<Vec<(usize, RunResult)>, ProtocolError> {
            let mut done = Vec::new();
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                let index = next.fetch_add(1, Ordering::Relaxed);
                if index >= total {
                    break;
                }
                done.push((index, run_one(index)?));
            }
            Ok(done)
        };

        let mut collected = if workers == 1 {
            worker()?
        } else {
            let outcomes = thread::scope(|s| {
                let handles: Vec<_> = (0..workers).map(|_| s.spawn(&worker)).collect();
                handles
                    .into_iter()
                    .map(|h| h.join())
                    .collect::<Vec<_>>()
            });
            let mut collected = Vec::with_capacity(total);
            for outcome in outcomes {
                match outcome {
                    Ok(done) => collected.extend(done?),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            collected
        };

        if collected.len() < total {
            return Ok(None);
        }

        collected.sort_unstable_by_key(|(index, _)| *index);
        Ok(Some(collected.into_iter().map(|(_, r)| r).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ConfigError;

    /// Timing fields are the only non-reproducible part of a report.
    fn untimed(mut report: BatchReport) -> BatchReport {
        for stats in &mut report.statistics {
            stats.execution_time = Duration::ZERO;
            stats.run_time_mean = Duration::ZERO;
        }
        report
    }

    fn run_taking(elapsed_ms: u64, secure: bool) -> RunResult {
        RunResult {
            transmitted: 100,
            intercepted: 0,
            sifted_length: 50,
            sample_size: 15,
            error_count: 0,
            error_rate: 0.0,
            empty_sample: false,
            secure,
            final_key_length: 35,
            final_key: None,
            amplified_key: None,
            elapsed: Duration::from_millis(elapsed_ms),
        }
    }

    #[test]
    fn running_stats_match_population_formula() {
        let mut stats = RunningStats::default();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.push(v);
        }
        assert_eq!(stats.count(), 8);
        assert!((stats.mean() - 5.0).abs() < 1e-12);
        assert!((stats.std_dev() - 2.0).abs() < 1e-12);
        assert_eq!(stats.min(), 2.0);
        assert_eq!(stats.max(), 9.0);
    }

    #[test]
    fn single_sample_has_zero_spread() {
        let mut stats = RunningStats::default();
        stats.push(0.25);
        assert_eq!(stats.std_dev(), 0.0);
        assert_eq!(stats.mean(), 0.25);
    }

    #[test]
    fn accumulator_averages_run_time() {
        let mut acc = BatchAccumulator::new(0.0);
        for (ms, secure) in [(10, true), (20, true), (60, false)] {
            acc.push(&run_taking(ms, secure));
        }
        let stats = acc.finish(Duration::from_millis(95));

        assert_eq!(stats.runs, 3);
        assert_eq!(stats.secure_runs, 2);
        assert_eq!(stats.execution_time, Duration::from_millis(95));
        assert_eq!(stats.run_time_mean, Duration::from_millis(30));
        assert_eq!(stats.sifted_ratio_mean, 0.5);
    }

    #[test]
    fn entries_record_their_timing() {
        let config = BatchConfig::new(256, vec![0.0, 0.3], 8)
            .with_seed(21)
            .with_workers(2);
        let report = BatchAnalyzer::new().analyze(&config).unwrap();

        for stats in &report.statistics {
            assert!(stats.execution_time > Duration::ZERO);
            assert!(stats.run_time_mean <= stats.execution_time);
        }
    }

    #[test]
    fn one_simulation_per_entry() {
        let config = BatchConfig::new(64, vec![0.0, 1.0], 1).with_seed(3);
        let report = BatchAnalyzer::new().analyze(&config).unwrap();

        assert!(!report.cancelled);
        assert_eq!(report.statistics.len(), 2);
        for stats in &report.statistics {
            assert_eq!(stats.runs, 1);
            assert_eq!(stats.error_rate_std, 0.0);
            assert_eq!(stats.final_key_length_std, 0.0);
        }
    }

    #[test]
    fn duplicates_are_reported_in_order() {
        let config = BatchConfig::new(400, vec![1.0, 0.0, 1.0], 4)
            .with_seed(10)
            .with_workers(2);
        let report = BatchAnalyzer::new().analyze(&config).unwrap();

        let probs: Vec<f64> = report.statistics.iter().map(|s| s.eavesdrop_prob).collect();
        assert_eq!(probs, vec![1.0, 0.0, 1.0]);
        // Separate sweep positions draw separate streams
        assert_ne!(
            report.statistics[0].error_rates,
            report.statistics[2].error_rates
        );
        assert_eq!(report.get(0.0).unwrap().error_rate_mean, 0.0);
    }

    #[test]
    fn worker_count_does_not_change_results() {
        let base = BatchConfig::new(200, vec![0.0, 0.5], 24).with_seed(1234);
        let serial = BatchAnalyzer::new()
            .analyze(&base.clone().with_workers(1))
            .unwrap();
        let parallel = BatchAnalyzer::new()
            .analyze(&base.with_workers(4))
            .unwrap();
        assert_eq!(untimed(serial), untimed(parallel));
    }

    #[test]
    fn cancelled_before_start_returns_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let config = BatchConfig::new(32, vec![0.1, 0.2], 5).with_seed(1);
        let report = BatchAnalyzer::new()
            .analyze_with_cancel(&config, &token)
            .unwrap();
        assert!(report.cancelled);
        assert!(report.statistics.is_empty());
    }

    #[test]
    fn invalid_batch_is_rejected() {
        let err = BatchAnalyzer::new()
            .analyze(&BatchConfig::new(10, vec![0.5], 0))
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Config(ConfigError::InvalidSimulationCount)
        ));
    }
}
