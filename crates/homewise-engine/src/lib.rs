//! Proactive recommendation engine.
//!
//! Wires the context collector, decision engine, record service,
//! confirmation handler, and scheduler into one [`Engine`] facade. The
//! facade is constructed explicitly from its collaborators; there is no
//! global state.

pub mod confirm;
pub mod context;
pub mod decision;
pub mod error;
pub mod records;
pub mod scheduler;

use std::sync::Arc;

use homewise_core::collaborators::{
    DeviceExecutor, DeviceInventory, HardwareChannel, UserDirectory, WeatherProvider,
};
use homewise_core::config::EngineConfig;
use homewise_core::llm::LlmRuntime;
use homewise_core::storage::{PreferenceStore, RecommendationStore};
use homewise_core::types::{Mode, Recommendation, RecommendationId, UserResponse};
use homewise_memory::{LongTermMemory, MemoryService, ShortTermMemory};

pub use confirm::{ConfirmOutcome, ConfirmationHandler};
pub use context::{ContextCollector, EnvironmentContext, WEATHER_UNAVAILABLE};
pub use decision::{DecisionEngine, RecommendationDraft};
pub use error::{EngineError, Result};
pub use records::{RecommendationService, RecordStatistics};
pub use scheduler::{
    session_id_for, CycleReport, CycleResult, RecommendationScheduler, SchedulerStatus,
};

/// Everything the engine needs from the outside world.
pub struct EngineDeps {
    pub llm: Arc<dyn LlmRuntime>,
    pub weather: Arc<dyn WeatherProvider>,
    pub inventory: Arc<dyn DeviceInventory>,
    pub executor: Arc<dyn DeviceExecutor>,
    pub hardware: Arc<dyn HardwareChannel>,
    pub users: Arc<dyn UserDirectory>,
    pub recommendation_store: Arc<dyn RecommendationStore>,
    pub preference_store: Arc<dyn PreferenceStore>,
}

/// The recommendation engine facade.
pub struct Engine {
    records: Arc<RecommendationService>,
    confirm: ConfirmationHandler,
    scheduler: Arc<RecommendationScheduler>,
    memory: Arc<MemoryService>,
}

impl Engine {
    pub fn new(deps: EngineDeps, config: EngineConfig) -> Self {
        let memory = Arc::new(MemoryService::with_parts(
            ShortTermMemory::with_capacity(config.short_term_capacity),
            LongTermMemory::new(deps.preference_store).with_pattern_cap(config.pattern_list_cap),
        ));
        let records = Arc::new(RecommendationService::new(
            deps.recommendation_store,
            deps.hardware,
        ));
        let context = Arc::new(ContextCollector::new(deps.weather, deps.inventory));
        let decision = Arc::new(DecisionEngine::new(deps.llm));
        let confirm = ConfirmationHandler::new(
            Arc::clone(&records),
            deps.executor,
            Arc::clone(&memory),
        );
        let scheduler = Arc::new(RecommendationScheduler::new(
            deps.users,
            context,
            decision,
            Arc::clone(&records),
            Arc::clone(&memory),
            config,
        ));

        tracing::info!("recommendation engine initialized");
        Self {
            records,
            confirm,
            scheduler,
            memory,
        }
    }

    /// Run the pipeline for one user and return the created record, or
    /// `None` when the cycle decided there is nothing to recommend.
    pub async fn create_recommendation(
        &self,
        user_id: &str,
        mode: Mode,
    ) -> Result<Option<Recommendation>> {
        match self.scheduler.trigger_once(user_id, mode).await? {
            CycleResult::Recommended(id) => Ok(self.records.get(&id).await?),
            CycleResult::Skipped => Ok(None),
        }
    }

    /// Apply a user's YES/NO response to a pending recommendation.
    pub async fn confirm_recommendation(
        &self,
        id: &RecommendationId,
        response: UserResponse,
    ) -> Result<ConfirmOutcome> {
        self.confirm.confirm(id, response).await
    }

    /// Run the per-user pipeline once, outside the schedule.
    pub async fn run_cycle_once(&self, user_id: &str) -> Result<CycleResult> {
        self.scheduler.trigger_once(user_id, Mode::Production).await
    }

    /// Start the periodic scheduler.
    pub async fn start_scheduler(&self) {
        Arc::clone(&self.scheduler).start().await;
    }

    /// Stop the periodic scheduler. An in-flight cycle finishes first.
    pub async fn stop_scheduler(&self) {
        self.scheduler.stop().await;
    }

    pub async fn scheduler_status(&self) -> SchedulerStatus {
        self.scheduler.status().await
    }

    /// The record service, for status queries and maintenance.
    pub fn records(&self) -> &RecommendationService {
        &self.records
    }

    /// The memory service, for direct preference queries and updates.
    pub fn memory(&self) -> &MemoryService {
        &self.memory
    }

    /// The scheduler, for running a full multi-user cycle on demand.
    pub fn scheduler(&self) -> &Arc<RecommendationScheduler> {
        &self.scheduler
    }
}
