// ============================================================================
// Structure : Contract
// ============================================================================
// Représente un contrat d'option (call ou put) tel que listé par Polygon
//
// CONCEPTS RUST :
// 1. #[serde(default)] : un champ absent du JSON prend sa valeur par défaut
// 2. #[serde(other)] : variant "fourre-tout" pour les valeurs inconnues
// 3. NaiveDate : date calendaire sans timezone (chrono)
// 4. deserialize_with : un champ null ou mal formé prend sa valeur vide,
//    un contrat bancal ne fait pas échouer tout le listing
// ============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Type de contrat d'option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    /// Option d'achat
    Call,
    /// Option de vente
    Put,
    /// Valeur inconnue ou absente côté Polygon
    #[default]
    #[serde(other)]
    Unknown,
}

impl ContractType {
    /// Retourne le label pour l'affichage (identique au JSON Polygon)
    pub fn label(&self) -> &'static str {
        match self {
            ContractType::Call => "call",
            ContractType::Put => "put",
            ContractType::Unknown => "?",
        }
    }
}

/// Contrat d'option sur un sous-jacent
///
/// Immutable une fois récupéré : toutes les valeurs viennent de la réponse
/// `/v3/reference/options/contracts`. Les autres champs Polygon
/// (exercise_style, shares_per_contract, ...) sont ignorés.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contract {
    /// Ticker de l'option (ex: "O:AAPL240816C00180000")
    #[serde(default, deserialize_with = "lenient_ticker")]
    pub ticker: String,

    /// Call ou put
    #[serde(default, deserialize_with = "lenient_contract_type")]
    pub contract_type: ContractType,

    /// Prix d'exercice
    #[serde(default, deserialize_with = "lenient_strike")]
    pub strike_price: Option<f64>,

    /// Date d'expiration (format "YYYY-MM-DD" côté API)
    #[serde(default, deserialize_with = "lenient_date")]
    pub expiration_date: Option<NaiveDate>,
}

impl Contract {
    /// Constructeur : crée un contrat complet
    pub fn new(
        ticker: String,
        contract_type: ContractType,
        strike_price: f64,
        expiration_date: NaiveDate,
    ) -> Self {
        Self {
            ticker,
            contract_type,
            strike_price: Some(strike_price),
            expiration_date: Some(expiration_date),
        }
    }

    /// Vérifie si le contrat a un ticker exploitable pour les lookups de prix
    pub fn has_ticker(&self) -> bool {
        !self.ticker.trim().is_empty()
    }
}

// ============================================================================
// Désérialisation tolérante
// ============================================================================
// Chaque helper lit d'abord une Value quelconque (null compris), puis tente
// une conversion. Échec → valeur vide.
// ============================================================================

fn lenient_ticker<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(ticker) => ticker,
        _ => String::new(),
    })
}

fn lenient_contract_type<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ContractType, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Nombre JSON ou chaîne numérique (ex: "180.5")
fn lenient_strike<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================
