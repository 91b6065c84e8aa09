// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod contract; // Contrat d'option (call/put, strike, expiration)
pub mod price;    // OHLC précédent et dernier trade
pub mod row;      // Ligne enrichie + prime dérivée
pub mod table;    // Tableau de résultats et filtres

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use optionpanel::models::contract::Contract;
// On peut faire : use optionpanel::models::Contract;
pub use contract::{Contract, ContractType};
pub use price::{LastTrade, PriceAggregate};
pub use row::{format_decimal, EnrichedRow, PremiumSource, COLUMN_HEADERS};
pub use table::{FilterError, PremiumRange, ResultTable, TableFilter};
