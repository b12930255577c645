//! Per-connection polling loops
//!
//! Every monitored connection gets one tokio task that executes the stats
//! commands, parses the output, computes rates and publishes a snapshot,
//! then sleeps and repeats. Only the active connection (see
//! [`PollingConfig`]) keeps polling.
//!
//! Cancellation is cooperative. Changing the active connection does not
//! touch running tasks; each loop looks up its context before executing and
//! again before sleeping, and ends itself once it is no longer eligible. A
//! tick that is already executing therefore completes and publishes once
//! more.
//!
//! Retry policy differs per transport:
//!
//! | Transport | success            | exec failure                          |
//! |-----------|--------------------|---------------------------------------|
//! | Direct    | generic interval   | nothing published, generic interval   |
//! | Bastion   | 2 s                | fallback snapshot published, 5 s      |

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::Instrument;

use super::commands::{IDENTITY_COMMAND, tick_commands};
use super::distro::normalize_distro;
use super::exec::{CommandExecutor, ExecError};
use super::metrics::{BASTION_HOSTNAME, MetricsSnapshot, TransportKind};
use super::parser::{IdentitySeed, RawStats, parser_for};
use super::publisher::SnapshotPublisher;
use super::rates::RateCalculator;
use super::settings::{BASTION_INTERVAL_MS, BASTION_RETRY_INTERVAL_MS, PollingConfig};
use crate::tracing::span_names;

/// A connection to start monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    /// Logical connection id (one per terminal tab)
    pub id: String,
    /// How commands reach the host
    pub transport: TransportKind,
    /// Configured host string, reported as IP when none can be recovered
    pub host: String,
}

impl ConnectionTarget {
    /// Creates a target
    #[must_use]
    pub fn new(id: impl Into<String>, transport: TransportKind, host: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transport,
            host: host.into(),
        }
    }
}

/// Lifecycle of a connection's loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No tick pending
    Idle,
    /// Next tick is waiting for its timer
    Scheduled,
    /// Commands are running
    Executing,
}

/// Result of one tick, used to pick the next delay
#[derive(Debug, Clone, PartialEq, Eq)]
enum TickOutcome {
    /// A snapshot was produced
    Published,
    /// The commands could not run
    ExecFailed,
    /// The session is closed
    TransportGone,
    /// The context disappeared while the tick was running
    Dropped,
}

/// Mutable state of one monitored connection
#[derive(Debug)]
struct ConnectionContext {
    /// Fixed when the context is inserted; a context recreated after
    /// `stop_loop` gets a new one, so ticks of the old loop cannot touch it
    instance: u64,
    transport: TransportKind,
    rates: RateCalculator,
    in_flight: u32,
    state: LoopState,
    task: Option<AbortHandle>,
    generation: u64,
    seed: IdentitySeed,
    identity_probed: bool,
}

impl ConnectionContext {
    fn new(target: &ConnectionTarget, generation: u64) -> Self {
        Self {
            instance: generation,
            transport: target.transport,
            rates: RateCalculator::new(),
            in_flight: 0,
            state: LoopState::Scheduled,
            task: None,
            generation,
            seed: IdentitySeed::for_host(&target.host),
            identity_probed: false,
        }
    }

    const fn running(&self) -> bool {
        self.in_flight > 0
    }

    fn stop(&mut self) {
        self.state = LoopState::Idle;
        self.task = None;
    }
}

type Contexts = HashMap<String, ConnectionContext>;

struct Shared {
    config: Arc<PollingConfig>,
    executor: Arc<dyn CommandExecutor>,
    publisher: Arc<dyn SnapshotPublisher>,
    contexts: Mutex<Contexts>,
    next_generation: AtomicU64,
}

/// The context of `id`, unless it was replaced since `instance` was issued
fn owned<'a>(
    contexts: &'a mut Contexts,
    id: &str,
    instance: u64,
) -> Option<&'a mut ConnectionContext> {
    contexts.get_mut(id).filter(|ctx| ctx.instance == instance)
}

/// Schedules the polling loops of all monitored connections
#[derive(Clone)]
pub struct StatsScheduler {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for StatsScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsScheduler")
            .field("config", &self.shared.config)
            .field("connections", &self.connection_ids())
            .finish_non_exhaustive()
    }
}

impl StatsScheduler {
    /// Creates a scheduler around an injected configuration, executor and publisher
    #[must_use]
    pub fn new(
        config: Arc<PollingConfig>,
        executor: Arc<dyn CommandExecutor>,
        publisher: Arc<dyn SnapshotPublisher>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                executor,
                publisher,
                contexts: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// The shared polling configuration
    #[must_use]
    pub fn config(&self) -> &Arc<PollingConfig> {
        &self.shared.config
    }

    /// Starts the polling loop of a connection; the first tick runs immediately.
    ///
    /// Returns `false` when the start was skipped because a Bastion tick of
    /// the same connection is still in flight. A Direct loop that is already
    /// running is superseded by the new one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_monitoring(&self, target: ConnectionTarget) -> bool {
        let shared = &self.shared;
        let generation = shared.next_generation.fetch_add(1, Ordering::Relaxed);
        let mut contexts = shared.contexts();

        let instance = if let Some(ctx) = contexts.get_mut(&target.id) {
            if ctx.transport == TransportKind::Bastion && ctx.running() {
                tracing::debug!(
                    connection_id = %target.id,
                    "Bastion tick still in flight, start skipped"
                );
                return false;
            }
            if let Some(task) = ctx.task.take()
                && !ctx.running()
            {
                task.abort();
            }
            if ctx.transport != target.transport {
                ctx.rates.reset();
                ctx.identity_probed = false;
            }
            ctx.transport = target.transport;
            ctx.seed.host = target.host.clone();
            ctx.generation = generation;
            ctx.state = LoopState::Scheduled;
            ctx.instance
        } else {
            contexts.insert(target.id.clone(), ConnectionContext::new(&target, generation));
            generation
        };

        let span = tracing::debug_span!(
            span_names::STATS_LOOP,
            connection_id = %target.id,
            transport = %target.transport
        );
        let handle = tokio::spawn(
            run_loop(Arc::clone(shared), target.id.clone(), instance, generation).instrument(span),
        );
        if let Some(ctx) = contexts.get_mut(&target.id) {
            ctx.task = Some(handle.abort_handle());
        }

        tracing::debug!(connection_id = %target.id, transport = %target.transport, "Monitoring started");
        true
    }

    /// Makes `target` the active connection, stops every other loop and starts its loop
    pub fn activate(&self, target: ConnectionTarget) -> bool {
        self.shared.config.set_active_connection(target.id.clone());
        self.stop_all_except(&target.id);
        self.start_monitoring(target)
    }

    /// Stops a connection's loop and discards its context.
    ///
    /// A pending timer is cancelled; a tick that is executing completes but
    /// its result is dropped. Returns whether the connection was monitored.
    pub fn stop_loop(&self, connection_id: &str) -> bool {
        let Some(mut ctx) = self.shared.contexts().remove(connection_id) else {
            return false;
        };
        if let Some(task) = ctx.task.take()
            && !ctx.running()
        {
            task.abort();
        }
        tracing::debug!(connection_id, "Monitoring stopped");
        true
    }

    /// Stops every loop except the one of `active_id`
    pub fn stop_all_except(&self, active_id: &str) {
        let others: Vec<String> = self
            .connection_ids()
            .into_iter()
            .filter(|id| id != active_id)
            .collect();
        for id in others {
            self.stop_loop(&id);
        }
    }

    /// Stops every loop
    pub fn shutdown(&self) {
        for id in self.connection_ids() {
            self.stop_loop(&id);
        }
    }

    /// Current loop state of a connection, `None` when not monitored
    #[must_use]
    pub fn loop_state(&self, connection_id: &str) -> Option<LoopState> {
        self.shared.contexts().get(connection_id).map(|ctx| ctx.state)
    }

    /// Whether a tick of the connection is executing
    #[must_use]
    pub fn is_executing(&self, connection_id: &str) -> bool {
        self.shared
            .contexts()
            .get(connection_id)
            .is_some_and(ConnectionContext::running)
    }

    /// Ids of all monitored connections
    #[must_use]
    pub fn connection_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.shared.contexts().keys().cloned().collect();
        ids.sort();
        ids
    }
}

async fn run_loop(shared: Arc<Shared>, id: String, instance: u64, generation: u64) {
    loop {
        let Some(kind) = shared.begin_tick(&id, instance, generation) else {
            return;
        };

        let outcome = match kind {
            TransportKind::Direct => shared.tick_direct(&id, instance).await,
            TransportKind::Bastion => shared.tick_bastion(&id, instance).await,
        };

        let Some(delay) = shared.reschedule(&id, instance, generation, kind, &outcome) else {
            return;
        };
        tokio::time::sleep(delay).await;
    }
}

impl Shared {
    fn contexts(&self) -> MutexGuard<'_, Contexts> {
        self.contexts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Eligibility check before executing; marks the tick as in flight
    fn begin_tick(&self, id: &str, instance: u64, generation: u64) -> Option<TransportKind> {
        let mut contexts = self.contexts();
        let ctx = owned(&mut contexts, id, instance)?;
        if ctx.generation != generation {
            return None;
        }
        if !self.executor.is_open(id) {
            contexts.remove(id);
            tracing::debug!(connection_id = id, "Transport closed, loop ended");
            return None;
        }
        if !self.config.is_active(id) {
            ctx.stop();
            tracing::debug!(connection_id = id, "Connection no longer active, loop ended");
            return None;
        }

        ctx.state = LoopState::Executing;
        ctx.in_flight += 1;
        Some(ctx.transport)
    }

    /// Eligibility check after executing; returns the delay of the next tick
    fn reschedule(
        &self,
        id: &str,
        instance: u64,
        generation: u64,
        kind: TransportKind,
        outcome: &TickOutcome,
    ) -> Option<Duration> {
        let mut contexts = self.contexts();
        let ctx = owned(&mut contexts, id, instance)?;
        ctx.in_flight = ctx.in_flight.saturating_sub(1);

        if *outcome == TickOutcome::TransportGone || !self.executor.is_open(id) {
            contexts.remove(id);
            tracing::debug!(connection_id = id, "Transport closed, loop ended");
            return None;
        }
        if ctx.generation != generation {
            return None;
        }
        if !self.config.is_active(id) {
            ctx.stop();
            tracing::debug!(connection_id = id, "Connection no longer active, loop ended");
            return None;
        }

        let delay = match (kind, outcome) {
            (TransportKind::Direct, _) => self.config.polling_interval(),
            (TransportKind::Bastion, TickOutcome::ExecFailed) => {
                Duration::from_millis(BASTION_RETRY_INTERVAL_MS)
            }
            (TransportKind::Bastion, _) => Duration::from_millis(BASTION_INTERVAL_MS),
        };
        ctx.state = LoopState::Scheduled;
        Some(delay)
    }

    fn seed(&self, id: &str, instance: u64) -> Option<(IdentitySeed, bool)> {
        owned(&mut self.contexts(), id, instance)
            .map(|ctx| (ctx.seed.clone(), ctx.identity_probed))
    }

    /// Fetches hostname and distro once per context
    async fn probe_identity(
        &self,
        id: &str,
        instance: u64,
        seed: &IdentitySeed,
    ) -> Result<(), ExecError> {
        let output = self.executor.exec(id, IDENTITY_COMMAND).await?;
        let hostname = output
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string);
        let distro = normalize_distro(&output, &seed.distro);

        if let Some(ctx) = owned(&mut self.contexts(), id, instance) {
            if let Some(hostname) = hostname {
                ctx.seed.hostname = hostname;
            }
            ctx.seed.distro = distro;
            ctx.identity_probed = true;
        }
        Ok(())
    }

    async fn tick_direct(&self, id: &str, instance: u64) -> TickOutcome {
        let Some((seed, probed)) = self.seed(id, instance) else {
            return TickOutcome::Dropped;
        };

        if !probed && let Err(err) = self.probe_identity(id, instance, &seed).await {
            if err.is_transport_gone() {
                return TickOutcome::TransportGone;
            }
            tracing::debug!(connection_id = id, error = %err, "Identity probe failed");
        }

        let output = match self.exec_all(id, tick_commands(TransportKind::Direct)).await {
            Ok(output) => output,
            Err(err) if err.is_transport_gone() => return TickOutcome::TransportGone,
            Err(err) => {
                tracing::debug!(connection_id = id, error = %err, "Stats command failed");
                return TickOutcome::ExecFailed;
            }
        };

        let Some((seed, _)) = self.seed(id, instance) else {
            return TickOutcome::Dropped;
        };
        let raw = parser_for(TransportKind::Direct).parse(&output, &seed);
        self.finish_tick(id, instance, raw)
    }

    async fn tick_bastion(&self, id: &str, instance: u64) -> TickOutcome {
        let Some((seed, _)) = self.seed(id, instance) else {
            return TickOutcome::Dropped;
        };

        match self.exec_all(id, tick_commands(TransportKind::Bastion)).await {
            Ok(output) => {
                let raw = parser_for(TransportKind::Bastion).parse(&output, &seed);
                self.finish_tick(id, instance, raw)
            }
            Err(err) if err.is_transport_gone() => TickOutcome::TransportGone,
            Err(err) => {
                tracing::warn!(connection_id = id, error = %err, "Bastion stats command failed");
                let Some((current, _)) = self.seed(id, instance) else {
                    tracing::debug!(connection_id = id, "Connection stopped mid-tick, fallback dropped");
                    return TickOutcome::Dropped;
                };
                self.publisher
                    .publish(id, MetricsSnapshot::bastion_fallback(&seed.host, &current.distro));
                TickOutcome::ExecFailed
            }
        }
    }

    /// Runs commands in order and joins their output
    async fn exec_all(&self, id: &str, commands: &[&str]) -> Result<String, ExecError> {
        let mut output = String::new();
        for command in commands {
            let part = self.executor.exec(id, command).await?;
            if part.trim().is_empty() {
                return Err(ExecError::EmptyOutput);
            }
            output.push_str(&part);
            if !part.ends_with('\n') {
                output.push('\n');
            }
        }
        Ok(output)
    }

    /// Computes rates, updates the identity seed and publishes the snapshot
    fn finish_tick(&self, id: &str, instance: u64, raw: RawStats) -> TickOutcome {
        let snapshot = {
            let mut contexts = self.contexts();
            let Some(ctx) = owned(&mut contexts, id, instance) else {
                tracing::debug!(connection_id = id, "Connection stopped mid-tick, snapshot dropped");
                return TickOutcome::Dropped;
            };

            let now = tokio::time::Instant::now().into_std();
            let cpu_load_percent = ctx.rates.cpu_load(raw.cpu);
            let network = ctx.rates.network_rates(raw.network, now);

            ctx.seed.distro = raw.distro.clone();
            if raw.hostname != BASTION_HOSTNAME {
                ctx.seed.hostname = raw.hostname.clone();
            }

            raw.into_snapshot(cpu_load_percent, network)
        };

        self.publisher.publish(id, snapshot);
        TickOutcome::Published
    }
}
