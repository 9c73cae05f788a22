//! Score Service Module
//!
//! Orchestrates one score request: in-memory result cache lookup →
//! in-flight coalescing → circuit check → readings fetch → pure model →
//! cache write. The central correctness requirement is at most one
//! concurrent computation per cache key; every caller for that key shares
//! the single in-flight outcome.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::compute::{CircuitBreaker, ReadingsProvider};
use crate::config::Config;
use crate::error::{ComputeError, ComputeResult};
use crate::models::{
    AirQualityScore, ComputeSource, ExposureProfile, PollutantReadings, ScoreCategory,
    ScoreOutcome, ScoreRequest,
};

// == Score Model ==
/// The pure calculation: deterministic, no I/O, no shared state.
pub type ScoreModel = fn(&PollutantReadings, &ExposureProfile) -> f64;

// == Compute Config ==
/// Tuning for the computation service.
#[derive(Debug, Clone)]
pub struct ComputeConfig {
    /// TTL for computed scores in the in-memory result cache
    pub score_ttl: Duration,
    /// Consecutive failures that open the circuit breaker
    pub failure_threshold: u32,
    /// Time the breaker stays open before the next real attempt
    pub circuit_cooldown: Duration,
    /// Model duration above which a diagnostic warning is emitted
    pub slow_calc_threshold: Duration,
}

impl From<&Config> for ComputeConfig {
    fn from(config: &Config) -> Self {
        Self {
            score_ttl: config.score_ttl,
            failure_threshold: config.failure_threshold,
            circuit_cooldown: config.circuit_cooldown,
            slow_calc_threshold: config.slow_calc_threshold,
        }
    }
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

// == Internal State ==
/// A computed score with its in-memory expiry.
struct CachedScore {
    score: AirQualityScore,
    expires_at: Instant,
}

type ResultTx = broadcast::Sender<ComputeResult<AirQualityScore>>;

/// Mutable service state. One mutex, never held across an await, guards the
/// check-then-insert on the in-flight map, the breaker counters and the
/// result cache.
struct ServiceState {
    results: HashMap<String, CachedScore>,
    in_flight: HashMap<String, ResultTx>,
    breaker: CircuitBreaker,
}

/// What `calculate` decided to do for a key after one look at the state.
enum Action {
    Join(broadcast::Receiver<ComputeResult<AirQualityScore>>),
    Lead(ResultTx),
}

struct ServiceInner<P> {
    provider: P,
    model: ScoreModel,
    config: ComputeConfig,
    state: Arc<Mutex<ServiceState>>,
}

// == Score Service ==
/// Cached, coalesced, fault-isolated score computation.
pub struct ScoreService<P> {
    inner: Arc<ServiceInner<P>>,
}

impl<P> Clone for ScoreService<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: ReadingsProvider> ScoreService<P> {
    // == Constructor ==
    pub fn new(provider: P, model: ScoreModel, config: ComputeConfig) -> Self {
        let breaker = CircuitBreaker::new(config.failure_threshold, config.circuit_cooldown);
        Self {
            inner: Arc::new(ServiceInner {
                provider,
                model,
                config,
                state: Arc::new(Mutex::new(ServiceState {
                    results: HashMap::new(),
                    in_flight: HashMap::new(),
                    breaker,
                })),
            }),
        }
    }

    // == Calculate ==
    /// Produces the score for `request`, from cache when possible.
    ///
    /// Concurrent calls with the same effective inputs share one
    /// computation; with the circuit open, fails fast with
    /// [`ComputeError::CircuitOpen`] without touching the provider.
    pub async fn calculate(&self, request: &ScoreRequest) -> ComputeResult<ScoreOutcome> {
        let key = request.cache_key();

        let action = {
            let mut state = self.lock_state();
            if let Some(cached) = state.results.get(&key) {
                if Instant::now() < cached.expires_at {
                    return Ok(ScoreOutcome {
                        score: cached.score.clone(),
                        source: ComputeSource::Cached,
                    });
                }
            }
            if let Some(tx) = state.in_flight.get(&key) {
                Action::Join(tx.subscribe())
            } else {
                if let Err(retry_after) = state.breaker.check(Instant::now()) {
                    return Err(ComputeError::CircuitOpen {
                        retry_after_ms: retry_after.as_millis() as u64,
                    });
                }
                let (tx, _rx) = broadcast::channel(1);
                state.in_flight.insert(key.clone(), tx.clone());
                Action::Lead(tx)
            }
        };

        match action {
            Action::Join(mut rx) => {
                debug!(key = %key, "joined in-flight computation");
                match rx.recv().await {
                    Ok(result) => result.map(|score| ScoreOutcome {
                        score,
                        source: ComputeSource::Deduplicated,
                    }),
                    // The leading future was dropped before publishing
                    Err(_) => Err(ComputeError::Failed(
                        "shared computation ended without a result".to_string(),
                    )),
                }
            }
            Action::Lead(tx) => self.lead(&key, request, tx).await,
        }
    }

    /// Runs the computation as the single leader for `key` and publishes the
    /// outcome to every coalesced waiter.
    async fn lead(
        &self,
        key: &str,
        request: &ScoreRequest,
        tx: ResultTx,
    ) -> ComputeResult<ScoreOutcome> {
        // Removes the in-flight record even if this future is dropped
        // mid-await, so later callers are not stranded on a dead channel.
        let mut guard = InFlightGuard {
            state: Arc::clone(&self.inner.state),
            key: key.to_string(),
            armed: true,
        };

        let result = self.execute(key, request).await;

        {
            let mut state = self.lock_state();
            state.in_flight.remove(key);
            match &result {
                Ok(score) => {
                    state.breaker.record_success();
                    let expires_at = Instant::now() + self.inner.config.score_ttl;
                    state.results.retain(|_, cached| cached.expires_at > Instant::now());
                    state.results.insert(
                        key.to_string(),
                        CachedScore {
                            score: score.clone(),
                            expires_at,
                        },
                    );
                }
                Err(err) => {
                    debug!(key = %key, %err, "computation failed");
                    state.breaker.record_failure(Instant::now());
                }
            }
        }
        guard.armed = false;

        // Every waiter subscribed before the record was removed above;
        // send reaches all of them (or no one, which is fine too).
        let _ = tx.send(result.clone());

        result.map(|score| ScoreOutcome {
            score,
            source: ComputeSource::Computed,
        })
    }

    /// Fetches external inputs and runs the pure model.
    async fn execute(&self, key: &str, request: &ScoreRequest) -> ComputeResult<AirQualityScore> {
        let readings = self
            .inner
            .provider
            .fetch_readings(&request.district_id)
            .await?;

        let started = Instant::now();
        let value = (self.inner.model)(&readings, &request.profile);
        let elapsed = started.elapsed();
        if elapsed > self.inner.config.slow_calc_threshold {
            warn!(
                key = %key,
                duration_ms = elapsed.as_millis() as u64,
                "slow score calculation"
            );
        }

        if !value.is_finite() {
            return Err(ComputeError::Failed(format!(
                "model produced a non-finite value for '{key}'"
            )));
        }

        Ok(AirQualityScore {
            district_id: request.district_id.clone(),
            value,
            category: ScoreCategory::for_value(value),
            computed_at: Utc::now(),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, ServiceState> {
        // A poisoned lock only means a previous holder panicked; the state
        // itself stays usable.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<P: ReadingsProvider + 'static> ScoreService<P> {
    // == Calculate Batch ==
    /// Runs one independent `calculate` per request and waits for all of
    /// them. Outcomes are returned in request order; one failure never
    /// cancels or corrupts its siblings.
    pub async fn calculate_batch(
        &self,
        requests: Vec<ScoreRequest>,
    ) -> Vec<ComputeResult<ScoreOutcome>> {
        let handles: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let service = self.clone();
                tokio::spawn(async move { service.calculate(&request).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(match handle.await {
                Ok(result) => result,
                Err(err) => Err(ComputeError::Failed(format!("batch task failed: {err}"))),
            });
        }
        outcomes
    }
}

// == In-Flight Guard ==
/// Drop guard that clears the in-flight record if the leading future never
/// reaches its completion path.
struct InFlightGuard {
    state: Arc<Mutex<ServiceState>>,
    key: String,
    armed: bool,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.in_flight.remove(&self.key);
    }
}
