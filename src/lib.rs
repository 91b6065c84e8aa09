// ============================================================================
// OptionPanel - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;       // API Polygon.io
pub mod app;       // État de l'application
pub mod config;    // Résolution de la clé API
pub mod fetch;     // Pipeline listing → enrichissement → tableau
pub mod models;    // Structures de données
pub mod ui;        // Interface utilisateur

#[cfg(test)]
mod test_support;  // Faux serveur Polygon pour les tests
