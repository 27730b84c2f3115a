use parking_lot::RwLock;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

use crate::{
    arbitrage::ordering::OrderSpec,
    database::{
        ConfigFilter, ConfigPatch, OpportunityFilter, OpportunityPatch, Patch, RecordStore, StatsSummary,
    },
    error::{ServiceError, ServiceResult},
    types::{generate_id, ExecutionStats, MonitoringConfig, Opportunity, OpportunityStatus},
};

pub const DEFAULT_LIMIT: usize = 50;

/// Result of asking the service to execute an opportunity.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Executed(Opportunity),
    AlreadyExecuted,
    NotFound,
}

/// Query, mutation and aggregation over the record store. Cheap to clone;
/// all clones share one store.
#[derive(Clone)]
pub struct ArbitrageService {
    store: Arc<RwLock<RecordStore>>,
    execution_delay: Duration,
}

impl ArbitrageService {
    pub fn new(execution_delay: Duration) -> Self {
        Self::with_store(RecordStore::new(), execution_delay)
    }

    pub fn with_store(store: RecordStore, execution_delay: Duration) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            execution_delay,
        }
    }

    /// `None` and `"all"` disable the status filter.
    pub fn parse_status_filter(status: Option<&str>) -> ServiceResult<Option<OpportunityStatus>> {
        match status.map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(label) => label.parse::<OpportunityStatus>().map(Some),
        }
    }

    pub fn get_opportunities(
        &self,
        order: &OrderSpec,
        limit: usize,
        status: Option<&str>,
    ) -> ServiceResult<Vec<Opportunity>> {
        let filter = match Self::parse_status_filter(status)? {
            Some(status) => OpportunityFilter::with_status(status),
            None => OpportunityFilter::default(),
        };

        self.query_opportunities(&filter, order, limit)
    }

    pub fn query_opportunities(
        &self,
        filter: &OpportunityFilter,
        order: &OrderSpec,
        limit: usize,
    ) -> ServiceResult<Vec<Opportunity>> {
        let mut opportunities = self.store.read().opportunities.get(filter);

        order.sort(&mut opportunities);
        opportunities.truncate(limit);

        debug!(
            "Opportunity query order={} limit={} returned {} records",
            order,
            limit,
            opportunities.len()
        );

        Ok(opportunities)
    }

    pub fn get_opportunity(&self, id: &str) -> Option<Opportunity> {
        self.store.read().opportunities.find(id).cloned()
    }

    pub fn insert_opportunity(&self, mut opportunity: Opportunity) -> ServiceResult<Opportunity> {
        if opportunity.id.trim().is_empty() {
            opportunity.id = generate_id();
        }
        opportunity.validate()?;

        let mut store = self.store.write();
        if store.opportunities.contains(&opportunity.id) {
            return Err(ServiceError::validation(format!(
                "Opportunity {} already exists",
                opportunity.id
            )));
        }

        Ok(store.opportunities.insert(opportunity))
    }

    pub fn seed_opportunities(&self, opportunities: Vec<Opportunity>) -> ServiceResult<usize> {
        let count = opportunities.len();
        for opportunity in opportunities {
            self.insert_opportunity(opportunity)?;
        }
        Ok(count)
    }

    /// Marks the opportunity executed and folds its net profit into the running stats.
    /// An opportunity that is already executed is not counted twice.
    pub async fn execute(&self, id: &str) -> ExecutionOutcome {
        if !self.execution_delay.is_zero() {
            tokio::time::sleep(self.execution_delay).await;
        }

        let mut store = self.store.write();

        match store.opportunities.find(id) {
            None => {
                warn!("Execution requested for unknown opportunity {}", id);
                return ExecutionOutcome::NotFound;
            }
            Some(opportunity) if opportunity.status == OpportunityStatus::Executed => {
                warn!("Opportunity {} was already executed", id);
                return ExecutionOutcome::AlreadyExecuted;
            }
            Some(_) => {}
        }

        let patch = OpportunityPatch {
            status: Some(OpportunityStatus::Executed),
        };

        match store.opportunities.update(id, patch) {
            Some(executed) => {
                store.stats.total_executed += 1;
                store.stats.total_profit += executed.net_profit;

                info!(
                    "Executed opportunity {} ({} {} -> {}), net profit: {}",
                    executed.id, executed.token_pair, executed.dex_buy, executed.dex_sell, executed.net_profit
                );

                ExecutionOutcome::Executed(executed)
            }
            None => ExecutionOutcome::NotFound,
        }
    }

    pub async fn execute_opportunity(&self, id: &str) -> bool {
        matches!(self.execute(id).await, ExecutionOutcome::Executed(_))
    }

    pub fn get_configs(&self) -> Vec<MonitoringConfig> {
        self.store.read().configs.all()
    }

    pub fn get_configs_filtered(&self, filter: &ConfigFilter) -> Vec<MonitoringConfig> {
        self.store.read().configs.get(filter)
    }

    pub fn create_config(&self, mut config: MonitoringConfig) -> ServiceResult<MonitoringConfig> {
        if config.id.trim().is_empty() {
            config.id = generate_id();
        }
        config.validate()?;

        let mut store = self.store.write();
        if store.configs.contains(&config.id) {
            return Err(ServiceError::validation(format!("Config {} already exists", config.id)));
        }

        let stored = store.configs.insert(config);
        info!("Created monitoring config {} for {}", stored.id, stored.token_symbol);
        Ok(stored)
    }

    pub fn update_config(&self, id: &str, patch: ConfigPatch) -> ServiceResult<Option<MonitoringConfig>> {
        let mut store = self.store.write();

        let Some(current) = store.configs.find(id) else {
            return Ok(None);
        };

        let mut candidate = current.clone();
        patch.clone().apply(&mut candidate);
        candidate.validate()?;

        Ok(store.configs.update(id, patch))
    }

    /// Full replacement of the config table.
    pub fn replace_configs(&self, configs: Vec<MonitoringConfig>) -> ServiceResult<Vec<MonitoringConfig>> {
        let mut configs = configs;
        for config in configs.iter_mut() {
            if config.id.trim().is_empty() {
                config.id = generate_id();
            }
            config.validate()?;
        }

        for (i, config) in configs.iter().enumerate() {
            if configs[..i].iter().any(|other| other.id == config.id) {
                return Err(ServiceError::validation(format!("Duplicate config id {}", config.id)));
            }
        }

        self.store.write().configs.replace_all(configs.clone());
        info!("Replaced monitoring configs ({} total)", configs.len());
        Ok(configs)
    }

    pub fn get_stats(&self) -> StatsSummary {
        let store = self.store.read();

        let (active_opportunities, total_potential_profit) = store
            .opportunities
            .iter()
            .filter(|opportunity| opportunity.is_active())
            .fold((0, 0.0), |(count, sum), opportunity| (count + 1, sum + opportunity.net_profit));

        StatsSummary {
            active_opportunities,
            total_opportunities: store.opportunities.len(),
            total_potential_profit,
            active_configs: store.configs.iter().filter(|config| config.is_active).count(),
            system_status: "online".to_string(),
        }
    }

    pub fn execution_stats(&self) -> ExecutionStats {
        self.store.read().stats.clone()
    }
}
