// ============================================================================
// Fetch : listing + enrichissement → tableau
// ============================================================================
// Pipeline linéaire déclenché par l'utilisateur :
//   clé API → listing des contrats → (OHLC puis trade) par contrat → tableau
//
// CONCEPT : Séquentiel par construction
// - Chaque .await termine avant le suivant : 2 allers-retours par contrat
// - Pas de join!, pas de batch : l'ordre des requêtes est déterministe
// ============================================================================

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::api::{ListContractsError, PolygonClient, REQUEST_TIMEOUT};
use crate::config::{require_api_key, ConfigError};
use crate::models::{Contract, EnrichedRow, ResultTable};

/// Paramètres d'un fetch déclenché par l'utilisateur
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Sous-jacent tel que saisi (mis en majuscules au listing)
    pub underlying: String,
    /// Nombre de contrats demandés
    pub limit: u32,
    /// URL de l'API (production ou serveur de test)
    pub base_url: String,
}

/// Résultat d'un fetch réussi
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Au moins un contrat, enrichi
    Table(ResultTable),
    /// Listing vide : avertissement, pas une erreur
    NoContracts { underlying: String },
}

/// Échecs qui interrompent un fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// Clé API absente : aucun appel réseau n'a été fait
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Échec du listing : pas de tableau partiel
    #[error(transparent)]
    Listing(#[from] ListContractsError),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// Exécute un fetch complet à partir d'une clé API résolue (ou non)
///
/// La clé est vérifiée avant toute construction de client.
pub async fn run_fetch(
    request: &FetchRequest,
    api_key: Option<String>,
) -> Result<FetchOutcome, FetchError> {
    let api_key = require_api_key(api_key)?;

    let client = PolygonClient::new(&request.base_url, &api_key, REQUEST_TIMEOUT)
        .map_err(|e| FetchError::Client(format!("{:#}", e)))?;

    fetch_option_table(&client, &request.underlying, request.limit).await
}

/// Liste les contrats puis construit le tableau enrichi
#[instrument(skip(client))]
pub async fn fetch_option_table(
    client: &PolygonClient,
    underlying: &str,
    limit: u32,
) -> Result<FetchOutcome, FetchError> {
    let contracts = client.list_contracts(underlying, limit).await?;
    let underlying = underlying.trim().to_uppercase();

    if contracts.is_empty() {
        info!(underlying = %underlying, "No contracts found");
        return Ok(FetchOutcome::NoContracts { underlying });
    }

    let table = build_table(client, &underlying, contracts).await;
    Ok(FetchOutcome::Table(table))
}

/// Enrichit chaque contrat (OHLC puis dernier trade) dans l'ordre
///
/// Les échecs d'enrichissement sont déjà absorbés en None par le client.
pub async fn build_table(
    client: &PolygonClient,
    underlying: &str,
    contracts: Vec<Contract>,
) -> ResultTable {
    let total = contracts.len();
    let mut rows = Vec::with_capacity(total);

    for (i, contract) in contracts.into_iter().enumerate() {
        debug!(ticker = %contract.ticker, progress = i + 1, total, "Enriching contract");

        let (aggregate, last_trade) = if contract.has_ticker() {
            let aggregate = client.get_previous_aggregate(&contract.ticker).await;
            let last_trade = client.get_last_trade(&contract.ticker).await;
            (aggregate, last_trade)
        } else {
            (None, None)
        };

        rows.push(EnrichedRow::new(contract, aggregate, last_trade));
    }

    info!(underlying = %underlying, rows = rows.len(), "Built option table");
    ResultTable::new(underlying.to_string(), rows)
}

// ============================================================================
// Tests unitaires
// ============================================================================
