use anyhow::{anyhow, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    config::RemoteConfig,
    database::OpportunityPatch,
    error::{ServiceError, ServiceResult},
    types::{MonitoringConfig, Opportunity},
};

const OPPORTUNITY_ENTITY: &str = "ArbitrageOpportunity";
const CONFIG_ENTITY: &str = "MonitoringConfig";

/// Client for the hosted entity backend the dashboard can read from instead of
/// the local store.
pub struct RemoteEntityClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    api_key: String,
}

impl RemoteEntityClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        if config.app_id.is_empty() || config.api_key.is_empty() {
            return Err(anyhow!("Remote backend requires an app id and an api key"));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        info!(
            "Remote entity backend: {} (app {}, key {})",
            config.base_url,
            config.app_id,
            mask_secret(&config.api_key)
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn entity_url(&self, entity: &str) -> String {
        format!("{}/apps/{}/entities/{}", self.base_url, self.app_id, entity)
    }

    pub async fn list_entities<T: DeserializeOwned>(&self, entity: &str) -> ServiceResult<Vec<T>> {
        let url = self.entity_url(entity);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("api_key", &self.api_key)
            .send()
            .await
            .map_err(|e| remote_error(None, format!("Failed to reach remote backend: {}", e)))?;

        Self::decode(response, entity).await
    }

    pub async fn update_entity<P: Serialize, T: DeserializeOwned>(
        &self,
        entity: &str,
        id: &str,
        patch: &P,
    ) -> ServiceResult<T> {
        let url = format!("{}/{}", self.entity_url(entity), id);
        debug!("PUT {}", url);

        let response = self
            .http
            .put(&url)
            .header("api_key", &self.api_key)
            .json(patch)
            .send()
            .await
            .map_err(|e| remote_error(None, format!("Failed to reach remote backend: {}", e)))?;

        Self::decode(response, entity).await
    }

    pub async fn list_opportunities(&self) -> ServiceResult<Vec<Opportunity>> {
        self.list_entities(OPPORTUNITY_ENTITY).await
    }

    pub async fn list_configs(&self) -> ServiceResult<Vec<MonitoringConfig>> {
        self.list_entities(CONFIG_ENTITY).await
    }

    pub async fn update_opportunity(&self, id: &str, patch: &OpportunityPatch) -> ServiceResult<Opportunity> {
        self.update_entity(OPPORTUNITY_ENTITY, id, patch).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, entity: &str) -> ServiceResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(remote_error(
                Some(status.as_u16()),
                format!("{} request failed with {}: {}", entity, status, body),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| remote_error(Some(status.as_u16()), format!("Invalid {} payload: {}", entity, e)))
    }
}

fn remote_error(status: Option<u16>, message: String) -> ServiceError {
    ServiceError::Remote { status, message }
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        return "****".to_string();
    }
    format!("{}****", visible)
}
