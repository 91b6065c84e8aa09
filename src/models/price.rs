// ============================================================================
// Structures : PriceAggregate et LastTrade
// ============================================================================
// Les deux enrichissements de prix d'un contrat :
// - PriceAggregate : OHLC de la séance précédente (/v2/aggs/ticker/.../prev)
// - LastTrade : prix du dernier trade exécuté (/v3/trades/...)
//
// CONCEPT RUST : #[serde(rename = "...")]
// - Polygon utilise des clés d'une lettre ("o", "h", "l", "c")
// - On garde des noms lisibles côté Rust
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OHLC d'une séance pour un contrat
///
/// Chaque champ est optionnel : Polygon peut omettre une valeur.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceAggregate {
    #[serde(rename = "o", default)]
    pub open: Option<f64>,

    #[serde(rename = "h", default)]
    pub high: Option<f64>,

    #[serde(rename = "l", default)]
    pub low: Option<f64>,

    #[serde(rename = "c", default)]
    pub close: Option<f64>,
}

impl PriceAggregate {
    /// Crée un agrégat complet
    pub fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
        }
    }
}

/// Clés possibles du prix dans un trade, par ordre de priorité
const TRADE_PRICE_KEYS: [&str; 2] = ["p", "price"];

/// Dernier trade exécuté sur un contrat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastTrade {
    pub price: f64,
}

impl LastTrade {
    pub fn new(price: f64) -> Self {
        Self { price }
    }

    /// Extrait le prix d'un trade Polygon
    ///
    /// La première clé présente et non-null gagne ("p" puis "price").
    /// Si sa valeur n'est pas convertible en nombre, pas de fallback :
    /// le trade est considéré absent.
    pub fn from_fields(fields: &Map<String, Value>) -> Option<Self> {
        let raw = TRADE_PRICE_KEYS
            .iter()
            .find_map(|key| fields.get(*key).filter(|value| !value.is_null()))?;

        coerce_decimal(raw).map(Self::new)
    }
}

/// Convertit une valeur JSON en décimal (nombre ou chaîne numérique)
fn coerce_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
