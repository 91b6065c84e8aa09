// ============================================================================
// API Client : Polygon.io
// ============================================================================
// Récupère les contrats d'option et leurs prix depuis Polygon.io
//
// Trois endpoints :
// - /v3/reference/options/contracts : liste des contrats d'un sous-jacent
// - /v2/aggs/ticker/<OPTION>/prev   : OHLC de la séance précédente
// - /v3/trades/<OPTION>?limit=1     : dernier trade
//
// CONCEPTS RUST :
// 1. async/await : chaque appel est une Future, awaitée séquentiellement
// 2. Generics + DeserializeOwned : enveloppe "results" commune aux endpoints
// 3. Option vs Result : le listing remonte ses erreurs, les lookups non
// ============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::api::error::ListContractsError;
use crate::models::{Contract, LastTrade, PriceAggregate};

/// URL de production de l'API
pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Timeout fixe par requête
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Structures pour parser les réponses JSON de Polygon
// ============================================================================
// Tous les endpoints utilisés renvoient { "results": [...] , ... }
// "results" peut être absent ou null : traité comme une liste vide
// ============================================================================

#[derive(Debug, Deserialize)]
struct ResultsEnvelope<T> {
    #[serde(default)]
    results: Option<Vec<T>>,
}

impl<T> ResultsEnvelope<T> {
    fn into_results(self) -> Vec<T> {
        self.results.unwrap_or_default()
    }
}

// ============================================================================
// Client
// ============================================================================

/// Client HTTP Polygon
///
/// La clé API vit dans le client : elle est en lecture seule pendant un fetch.
#[derive(Debug, Clone)]
pub struct PolygonClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl PolygonClient {
    /// Client vers l'API de production avec le timeout standard
    pub fn polygon(api_key: &str) -> Result<Self> {
        Self::new(DEFAULT_BASE_URL, api_key, REQUEST_TIMEOUT)
    }

    /// Client vers une URL arbitraire (serveur de test, proxy, ...)
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("optionpanel/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Liste les contrats d'option d'un sous-jacent
    ///
    /// - `underlying` est mis en majuscules
    /// - `limit` est transmis tel quel (pas de contrôle de bornes ici)
    ///
    /// # Retourne
    /// * `Ok(contracts)` - possiblement vide (symbole inconnu)
    /// * `Err(ListContractsError)` - erreur réseau, HTTP ou de parsing
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn list_contracts(
        &self,
        underlying: &str,
        limit: u32,
    ) -> Result<Vec<Contract>, ListContractsError> {
        let symbol = underlying.trim().to_uppercase();
        let url = format!("{}/v3/reference/options/contracts", self.base_url);
        let limit_param = limit.to_string();

        debug!(symbol = %symbol, "Requesting option contracts");
        let response = self
            .http
            .get(&url)
            .query(&[
                ("underlying_ticker", symbol.as_str()),
                ("limit", limit_param.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                let detail = describe_transport_error(e, self.timeout);
                error!(error = %detail, "Contracts request failed");
                ListContractsError::Request(detail)
            })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if status != StatusCode::OK {
            let body = response.bytes().await.unwrap_or_default();
            let message = upstream_message(&body)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!(status = %status, message = %message, "Polygon returned error status");
            return Err(ListContractsError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(|e| {
            ListContractsError::Request(describe_transport_error(e, self.timeout))
        })?;

        let envelope: ResultsEnvelope<Contract> = serde_json::from_slice(&body).map_err(|e| {
            error!(error = %e, "Failed to parse contracts response");
            ListContractsError::Decode(e.to_string())
        })?;

        let contracts = envelope.into_results();
        info!(symbol = %symbol, count = contracts.len(), "Fetched option contracts");
        Ok(contracts)
    }

    /// OHLC de la séance précédente d'un contrat
    ///
    /// Toute erreur (réseau, HTTP, parsing, résultats vides) donne None.
    #[instrument(skip(self))]
    pub async fn get_previous_aggregate(&self, option_ticker: &str) -> Option<PriceAggregate> {
        let url = format!("{}/v2/aggs/ticker/{}/prev", self.base_url, option_ticker);

        let envelope: ResultsEnvelope<PriceAggregate> = self.get_json(&url, &[]).await?;
        let aggregate = envelope.into_results().into_iter().next();

        if aggregate.is_none() {
            debug!("No previous aggregate for contract");
        }
        aggregate
    }

    /// Prix du dernier trade d'un contrat
    ///
    /// Toute erreur (réseau, HTTP, parsing, résultats vides) donne None.
    #[instrument(skip(self))]
    pub async fn get_last_trade(&self, option_ticker: &str) -> Option<LastTrade> {
        let url = format!("{}/v3/trades/{}", self.base_url, option_ticker);

        let envelope: ResultsEnvelope<Map<String, Value>> =
            self.get_json(&url, &[("limit", "1")]).await?;
        let trade = envelope
            .into_results()
            .first()
            .and_then(LastTrade::from_fields);

        if trade.is_none() {
            debug!("No last trade for contract");
        }
        trade
    }

    /// GET + parsing JSON, les échecs sont loggés puis absorbés
    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Option<T> {
        let response = match self
            .http
            .get(url)
            .query(query)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %describe_transport_error(e, self.timeout), "Lookup request failed");
                return None;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = %status, "Lookup returned non-200 status");
            return None;
        }

        match response.json::<T>().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(error = %e.without_url(), "Failed to parse lookup response");
                None
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Extrait le champ "message" d'un corps d'erreur Polygon
fn upstream_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get("message")?.as_str().map(str::to_string)
}

/// Décrit une erreur réseau sans l'URL (qui contient la clé API)
///
/// Concatène la chaîne des causes : "error sending request: operation timed out"
fn describe_transport_error(err: reqwest::Error, timeout: Duration) -> String {
    let is_timeout = err.is_timeout();
    let err = err.without_url();

    let mut detail = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }

    if is_timeout {
        format!("timed out after {}s ({})", timeout.as_secs_f32(), detail)
    } else {
        detail
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
