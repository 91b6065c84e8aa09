// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (TUI + rendu texte du mode --print)
// ============================================================================

pub mod events;    // Gestion des événements clavier
pub mod dashboard; // Rendu de l'interface principale
pub mod plain;     // Tableau texte pour stdout

// Re-exports pour simplifier les imports
pub use events::{Event, EventHandler};
pub use dashboard::render;
pub use plain::render_plain_table;
