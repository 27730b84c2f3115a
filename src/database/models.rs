use serde::{Deserialize, Serialize};

use crate::{
    database::store::{Filter, Patch},
    types::{MonitoringConfig, Opportunity, OpportunityStatus},
};

/// Equality filter over opportunities. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OpportunityFilter {
    pub status: Option<OpportunityStatus>,
    pub token_pair: Option<String>,
    pub dex_buy: Option<String>,
    pub dex_sell: Option<String>,
}

impl OpportunityFilter {
    pub fn with_status(status: OpportunityStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl Filter<Opportunity> for OpportunityFilter {
    fn matches(&self, record: &Opportunity) -> bool {
        self.status.map_or(true, |status| record.status == status)
            && self.token_pair.as_ref().map_or(true, |pair| &record.token_pair == pair)
            && self.dex_buy.as_ref().map_or(true, |dex| &record.dex_buy == dex)
            && self.dex_sell.as_ref().map_or(true, |dex| &record.dex_sell == dex)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigFilter {
    pub token_symbol: Option<String>,
    pub is_active: Option<bool>,
}

impl Filter<MonitoringConfig> for ConfigFilter {
    fn matches(&self, record: &MonitoringConfig) -> bool {
        self.token_symbol
            .as_ref()
            .map_or(true, |symbol| &record.token_symbol == symbol)
            && self.is_active.map_or(true, |active| record.is_active == active)
    }
}

/// Opportunities only ever change status after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpportunityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OpportunityStatus>,
}

impl Patch<Opportunity> for OpportunityPatch {
    fn apply(self, record: &mut Opportunity) {
        if let Some(status) = self.status {
            record.status = status;
        }
    }
}

/// Field update for a monitoring config. There is no `id` field: ids never change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigPatch {
    pub token_symbol: Option<String>,
    pub token_address: Option<String>,
    pub min_spread: Option<f64>,
    pub min_profit: Option<f64>,
    pub max_loan_amount: Option<f64>,
    pub enabled_dexs: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl Patch<MonitoringConfig> for ConfigPatch {
    fn apply(self, record: &mut MonitoringConfig) {
        if let Some(token_symbol) = self.token_symbol {
            record.token_symbol = token_symbol;
        }
        if let Some(token_address) = self.token_address {
            record.token_address = token_address;
        }
        if let Some(min_spread) = self.min_spread {
            record.min_spread = min_spread;
        }
        if let Some(min_profit) = self.min_profit {
            record.min_profit = min_profit;
        }
        if let Some(max_loan_amount) = self.max_loan_amount {
            record.max_loan_amount = max_loan_amount;
        }
        if let Some(enabled_dexs) = self.enabled_dexs {
            record.enabled_dexs = enabled_dexs;
        }
        if let Some(is_active) = self.is_active {
            record.is_active = is_active;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub active_opportunities: usize,
    pub total_opportunities: usize,
    /// Sum of `net_profit` over active opportunities only.
    pub total_potential_profit: f64,
    pub active_configs: usize,
    pub system_status: String,
}
