//! Readings Provider Module
//!
//! The external air-quality data source consumed by the computation
//! service: fallible, latency-bearing, isolated behind the circuit breaker.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::ProviderError;
use crate::models::PollutantReadings;

// == Provider Trait ==
/// A source of current pollutant readings for a district.
#[async_trait]
pub trait ReadingsProvider: Send + Sync {
    async fn fetch_readings(&self, district_id: &str)
        -> Result<PollutantReadings, ProviderError>;
}

#[async_trait]
impl<P: ReadingsProvider + ?Sized> ReadingsProvider for std::sync::Arc<P> {
    async fn fetch_readings(
        &self,
        district_id: &str,
    ) -> Result<PollutantReadings, ProviderError> {
        (**self).fetch_readings(district_id).await
    }
}

// == HTTP Provider ==
/// Provider backed by the regional air-quality HTTP API.
#[derive(Debug, Clone)]
pub struct HttpReadingsProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReadingsProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn readings_url(&self, district_id: &str) -> String {
        format!(
            "{}/districts/{}/readings",
            self.base_url.trim_end_matches('/'),
            district_id
        )
    }
}

#[async_trait]
impl ReadingsProvider for HttpReadingsProvider {
    async fn fetch_readings(
        &self,
        district_id: &str,
    ) -> Result<PollutantReadings, ProviderError> {
        let response = self
            .client
            .get(self.readings_url(district_id))
            .send()
            .await
            .map_err(|err| ProviderError::Request(err.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(district_id.to_string()));
        }
        let response = response
            .error_for_status()
            .map_err(|err| ProviderError::Request(err.to_string()))?;

        response
            .json::<PollutantReadings>()
            .await
            .map_err(|err| ProviderError::Malformed(err.to_string()))
    }
}
