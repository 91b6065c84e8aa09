// ============================================================================
// Structure : EnrichedRow
// ============================================================================
// Une ligne du tableau : contrat + OHLC précédent + dernier trade,
// avec la prime dérivée et sa provenance
//
// CONCEPTS RUST :
// 1. Champs privés + getters : la prime ne peut pas diverger de sa source
// 2. Pattern matching sur tuple d'Options : règle de priorité explicite
// ============================================================================

use serde::Serialize;

use crate::models::{Contract, LastTrade, PriceAggregate};

/// En-têtes des colonnes affichées, dans l'ordre de `EnrichedRow::cells`
pub const COLUMN_HEADERS: [&str; 9] = [
    "Option Ticker",
    "Type",
    "Strike",
    "Expiration",
    "Premium",
    "PremiumSource",
    "Open",
    "High",
    "Low",
];

/// Provenance de la prime affichée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PremiumSource {
    /// Prix du dernier trade
    Real,
    /// Close de la séance précédente
    Close,
    /// Aucune donnée de prix
    #[serde(rename = "none")]
    Absent,
}

impl PremiumSource {
    pub fn label(&self) -> &'static str {
        match self {
            PremiumSource::Real => "real",
            PremiumSource::Close => "close",
            PremiumSource::Absent => "none",
        }
    }
}

/// Ligne enrichie du tableau de résultats
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
    contract: Contract,
    aggregate: Option<PriceAggregate>,
    last_trade: Option<LastTrade>,
    premium: Option<f64>,
    premium_source: PremiumSource,
}

impl EnrichedRow {
    /// Assemble une ligne et calcule la prime
    ///
    /// Priorité : dernier trade, sinon close précédent, sinon rien.
    pub fn new(
        contract: Contract,
        aggregate: Option<PriceAggregate>,
        last_trade: Option<LastTrade>,
    ) -> Self {
        let previous_close = aggregate.and_then(|agg| agg.close);

        let (premium, premium_source) = match (last_trade, previous_close) {
            (Some(trade), _) => (Some(trade.price), PremiumSource::Real),
            (None, Some(close)) => (Some(close), PremiumSource::Close),
            (None, None) => (None, PremiumSource::Absent),
        };

        Self {
            contract,
            aggregate,
            last_trade,
            premium,
            premium_source,
        }
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn aggregate(&self) -> Option<&PriceAggregate> {
        self.aggregate.as_ref()
    }

    pub fn last_trade(&self) -> Option<&LastTrade> {
        self.last_trade.as_ref()
    }

    pub fn premium(&self) -> Option<f64> {
        self.premium
    }

    pub fn premium_source(&self) -> PremiumSource {
        self.premium_source
    }

    /// Prime formatée, suffixée " C" quand elle vient du close
    ///
    /// Exemple : 0.8 (close) → "0.8 C", 1.25 (trade) → "1.25"
    pub fn premium_display(&self) -> String {
        match (self.premium, self.premium_source) {
            (Some(p), PremiumSource::Close) => format!("{} C", format_decimal(p)),
            (Some(p), _) => format_decimal(p),
            (None, _) => String::new(),
        }
    }

    /// Cellules de la ligne, alignées sur `COLUMN_HEADERS`
    pub fn cells(&self) -> [String; 9] {
        let agg = self.aggregate.as_ref();

        [
            self.contract.ticker.clone(),
            self.contract.contract_type.label().to_string(),
            format_optional(self.contract.strike_price),
            self.contract
                .expiration_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            self.premium_display(),
            match self.premium_source {
                PremiumSource::Absent => String::new(),
                source => source.label().to_string(),
            },
            format_optional(agg.and_then(|a| a.open)),
            format_optional(agg.and_then(|a| a.high)),
            format_optional(agg.and_then(|a| a.low)),
        ]
    }
}

/// Représentation décimale la plus courte (ex: 0.8, 1.25, 180)
pub fn format_decimal(value: f64) -> String {
    format!("{}", value)
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_decimal).unwrap_or_default()
}

// ============================================================================
// Tests unitaires
// ============================================================================
