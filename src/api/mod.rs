// ============================================================================
// Module : api
// ============================================================================
// Client de l'API Polygon.io (contrats d'option, OHLC, derniers trades)
// ============================================================================

pub mod error;   // Erreurs du listing
pub mod polygon; // Client API Polygon

// Re-export des éléments principaux
pub use error::ListContractsError;
pub use polygon::{PolygonClient, DEFAULT_BASE_URL, REQUEST_TIMEOUT};
