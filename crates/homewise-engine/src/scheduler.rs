//! Periodic recommendation scheduler.
//!
//! One tokio task wakes on a fixed interval, runs the per-user pipeline for
//! every active user with bounded parallelism, then does the cycle-end
//! maintenance (expiry sweep, undelivered retry, stale-session cleanup).
//! A user failure never aborts the batch; it is counted in the cycle report.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use homewise_core::collaborators::UserDirectory;
use homewise_core::config::EngineConfig;
use homewise_core::types::{Mode, RecommendationId};
use homewise_memory::{InteractionEntry, MemoryService};

use crate::context::ContextCollector;
use crate::decision::DecisionEngine;
use crate::error::Result;
use crate::records::RecommendationService;

/// Outcome of one per-user pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleResult {
    /// A recommendation was created and (attempted to be) delivered.
    Recommended(RecommendationId),
    /// Nothing to recommend: no controllable device, or the model declined.
    Skipped,
}

/// Summary of one full scheduled cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub elapsed: Duration,
}

/// Snapshot of the scheduler state.
#[derive(Debug, Clone)]
pub struct SchedulerStatus {
    pub running: bool,
    pub interval: Duration,
    pub last_run_at: Option<DateTime<Utc>>,
}

/// Session key grouping a user's proactive recommendations, one per day.
pub fn session_id_for(user_id: &str, at: DateTime<Utc>) -> String {
    format!("proactive-{}-{}", user_id, at.format("%Y-%m-%d"))
}

/// Drives the recommendation pipeline on a fixed interval.
pub struct RecommendationScheduler {
    users: Arc<dyn UserDirectory>,
    context: Arc<ContextCollector>,
    decision: Arc<DecisionEngine>,
    records: Arc<RecommendationService>,
    memory: Arc<MemoryService>,
    config: EngineConfig,
    running: AtomicBool,
    last_run_at: RwLock<Option<DateTime<Utc>>>,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RecommendationScheduler {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        context: Arc<ContextCollector>,
        decision: Arc<DecisionEngine>,
        records: Arc<RecommendationService>,
        memory: Arc<MemoryService>,
        config: EngineConfig,
    ) -> Self {
        Self {
            users,
            context,
            decision,
            records,
            memory,
            config,
            running: AtomicBool::new(false),
            last_run_at: RwLock::new(None),
            stop_tx: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// Run the pipeline for one user. Same code path as the scheduled case.
    pub async fn trigger_once(&self, user_id: &str, mode: Mode) -> Result<CycleResult> {
        let env = self.context.collect(user_id).await?;
        if !env.has_controllable_device() {
            tracing::debug!(user_id, "cycle skipped, no controllable devices");
            return Ok(CycleResult::Skipped);
        }

        let session_id = session_id_for(user_id, Utc::now());
        let memory_ctx = self
            .memory
            .full_context(user_id, &session_id, env.time_period)
            .await?;

        let Some(draft) = self.decision.generate(user_id, &env, &memory_ctx).await? else {
            return Ok(CycleResult::Skipped);
        };

        let record = self
            .records
            .create(user_id, draft, mode, env.time_period)
            .await?;

        // Remember the proposal itself; feedback fills in `accepted` later.
        if let Some(control) = &record.device_control {
            let entry = InteractionEntry::new(
                control.device_id.clone().unwrap_or_default(),
                record.title.clone(),
                control.device_type.clone(),
                control
                    .actions
                    .first()
                    .map(|a| a.action.clone())
                    .unwrap_or_default(),
            );
            // Key the entry by the record's creation time so the proposal
            // always lands in the session of the day it was made.
            self.memory
                .short_term()
                .add_interaction(&session_id_for(user_id, record.created_at), entry)
                .await;
        }

        Ok(CycleResult::Recommended(record.id))
    }

    /// Run one full cycle over every active user, then the maintenance
    /// sweeps. Per-user failures are isolated and counted.
    pub async fn run_cycle(&self) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport {
            succeeded: 0,
            failed: 0,
            skipped: 0,
            elapsed: Duration::ZERO,
        };

        let users = match self.users.active_users().await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = %e, "could not fetch active users, skipping cycle");
                report.elapsed = started.elapsed();
                return report;
            }
        };

        let results: Vec<(String, Result<CycleResult>)> = stream::iter(users)
            .map(|user_id| async move {
                let result = self.trigger_once(&user_id, Mode::Production).await;
                (user_id, result)
            })
            .buffer_unordered(self.config.max_parallel_users)
            .collect()
            .await;

        for (user_id, result) in results {
            match result {
                Ok(CycleResult::Recommended(id)) => {
                    tracing::info!(user_id, recommendation_id = %id, "cycle produced recommendation");
                    report.succeeded += 1;
                }
                Ok(CycleResult::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "user cycle failed");
                    report.failed += 1;
                }
            }
        }

        self.run_maintenance().await;

        *self.last_run_at.write().await = Some(Utc::now());
        report.elapsed = started.elapsed();
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "recommendation cycle finished"
        );
        report
    }

    /// Cycle-end maintenance: expire stale pendings, retry undelivered
    /// pushes, drop idle sessions.
    async fn run_maintenance(&self) {
        if let Err(e) = self
            .records
            .expire_older_than(self.config.recommendation_expiry_hours)
            .await
        {
            tracing::warn!(error = %e, "expiry sweep failed");
        }
        match self.records.retry_undelivered().await {
            Ok(0) => {}
            Ok(delivered) => tracing::info!(delivered, "undelivered recommendations re-pushed"),
            Err(e) => tracing::warn!(error = %e, "undelivered retry failed"),
        }
        let dropped = self
            .memory
            .short_term()
            .cleanup_old_sessions(self.config.session_max_age_hours)
            .await;
        if dropped > 0 {
            tracing::debug!(dropped, "stale sessions cleaned up");
        }
    }

    /// Start the periodic task. Idempotent: a second call while running is a
    /// no-op.
    pub async fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let (tx, mut rx) = watch::channel(false);
        *self.stop_tx.lock().await = Some(tx);

        let scheduler = Arc::clone(&self);
        let interval = self.config.schedule_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so the first cycle
            // runs one full interval after start.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        scheduler.run_cycle().await;
                    }
                    _ = rx.changed() => {
                        if *rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("scheduler stopped");
        });
        *self.handle.lock().await = Some(handle);
        tracing::info!(interval_secs = interval.as_secs(), "scheduler started");
    }

    /// Stop the periodic task. An in-flight cycle finishes; no new cycle
    /// starts.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(tx) = self.stop_tx.lock().await.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.handle.lock().await.take() {
            let _ = handle.await;
        }
    }

    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.running.load(Ordering::SeqCst),
            interval: self.config.schedule_interval,
            last_run_at: *self.last_run_at.read().await,
        }
    }
}
