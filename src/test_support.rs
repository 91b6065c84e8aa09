// ============================================================================
// Support de tests : faux serveur Polygon
// ============================================================================
// Un Router axum bindé sur 127.0.0.1:0, lancé dans une tâche tokio.
// Chaque requête reçue est enregistrée (chemin + query) pour vérifier
// l'ordre et le nombre d'appels réseau.
// ============================================================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serveur HTTP local pour les tests
pub struct StubServer {
    pub base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl StubServer {
    /// Lance le router sur un port libre
    pub async fn spawn(router: Router) -> Self {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let recorder = hits.clone();

        let router = router.layer(middleware::from_fn(move |req: Request, next: Next| {
            let recorder = recorder.clone();
            async move {
                let target = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_default();
                recorder.lock().unwrap().push(target);
                next.run(req).await
            }
        }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
            handle,
        }
    }

    /// Requêtes reçues, dans l'ordre d'arrivée
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Réponses canned des trois endpoints Polygon
///
/// Un ticker absent des maps répond 404 (comme Polygon pour un contrat inconnu).
#[derive(Debug, Clone)]
pub struct PolygonFixture {
    contracts_status: u16,
    contracts: Value,
    aggregates: HashMap<String, Value>,
    trades: HashMap<String, Value>,
}

impl Default for PolygonFixture {
    fn default() -> Self {
        Self {
            contracts_status: 200,
            contracts: json!({"results": []}),
            aggregates: HashMap::new(),
            trades: HashMap::new(),
        }
    }
}

impl PolygonFixture {
    pub fn with_contracts(mut self, body: Value) -> Self {
        self.contracts = body;
        self
    }

    pub fn with_contracts_status(mut self, status: u16, body: Value) -> Self {
        self.contracts_status = status;
        self.contracts = body;
        self
    }

    pub fn with_aggregate(mut self, ticker: &str, body: Value) -> Self {
        self.aggregates.insert(ticker.to_string(), body);
        self
    }

    pub fn with_trade(mut self, ticker: &str, body: Value) -> Self {
        self.trades.insert(ticker.to_string(), body);
        self
    }

    /// Construit le router axum des trois endpoints
    pub fn router(self) -> Router {
        let status = StatusCode::from_u16(self.contracts_status).unwrap();
        let contracts = Arc::new(self.contracts);
        let aggregates = Arc::new(self.aggregates);
        let trades = Arc::new(self.trades);

        Router::new()
            .route(
                "/v3/reference/options/contracts",
                get(move || {
                    let contracts = contracts.clone();
                    async move { (status, Json((*contracts).clone())) }
                }),
            )
            .route(
                "/v2/aggs/ticker/:ticker/prev",
                get(move |Path(ticker): Path<String>| {
                    let aggregates = aggregates.clone();
                    async move { lookup(&aggregates, &ticker) }
                }),
            )
            .route(
                "/v3/trades/:ticker",
                get(move |Path(ticker): Path<String>| {
                    let trades = trades.clone();
                    async move { lookup(&trades, &ticker) }
                }),
            )
    }
}

fn lookup(bodies: &HashMap<String, Value>, ticker: &str) -> axum::response::Response {
    match bodies.get(ticker) {
        Some(body) => Json(body.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"status": "NOT_FOUND", "message": "ticker not found"})),
        )
            .into_response(),
    }
}
