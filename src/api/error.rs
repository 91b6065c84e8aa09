// ============================================================================
// Erreurs du client Polygon
// ============================================================================
// Seul le listing des contrats remonte des erreurs à l'utilisateur.
// Les enrichissements (OHLC, dernier trade) dégradent en "pas de données".
// ============================================================================

use thiserror::Error;

/// Échec du listing des contrats d'option
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListContractsError {
    /// Erreur réseau (connexion, timeout, ...)
    #[error("Request error: {0}")]
    Request(String),

    /// Réponse non-200 de Polygon
    /// message : champ "message" de la réponse, sinon "HTTP <status>"
    #[error("Failed to fetch contracts: {message}")]
    Upstream { status: u16, message: String },

    /// Réponse 200 dont le corps n'est pas le JSON attendu
    #[error("Failed to fetch contracts: invalid response body ({0})")]
    Decode(String),
}
