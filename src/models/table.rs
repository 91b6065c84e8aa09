// ============================================================================
// Structures : ResultTable et TableFilter
// ============================================================================
// Le tableau de résultats d'un fetch et les filtres appliqués à l'affichage
//
// CONCEPTS RUST :
// 1. Iterator chaining : filter + collect sans réordonner les lignes
// 2. fold : calcul des bornes min/max en une passe
// 3. thiserror : erreur typée pour une plage invalide
// ============================================================================

use thiserror::Error;

use crate::models::{ContractType, EnrichedRow};

/// Tableau ordonné de lignes enrichies
///
/// L'ordre est celui de la réponse Polygon : jamais trié.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    /// Sous-jacent interrogé (en majuscules)
    pub underlying: String,
    rows: Vec<EnrichedRow>,
}

impl ResultTable {
    pub fn new(underlying: String, rows: Vec<EnrichedRow>) -> Self {
        Self { underlying, rows }
    }

    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lignes visibles avec ce filtre, dans l'ordre du tableau
    pub fn filtered(&self, filter: &TableFilter) -> Vec<&EnrichedRow> {
        self.rows.iter().filter(|row| filter.matches(row)).collect()
    }

    /// Bornes (min, max) des primes présentes
    ///
    /// Sert à initialiser les contrôles de plage. None si aucune prime.
    pub fn premium_bounds(&self) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .filter_map(|row| row.premium())
            .fold(None, |bounds, p| match bounds {
                None => Some((p, p)),
                Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
            })
    }
}

/// Erreur de construction d'une plage de primes
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("Invalid premium range: min {min} is greater than max {max}")]
    InvertedRange { min: f64, max: f64 },
}

/// Plage de primes inclusive [min, max]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PremiumRange {
    min: f64,
    max: f64,
}

impl PremiumRange {
    pub fn new(min: f64, max: f64) -> Result<Self, FilterError> {
        // `!(min <= max)` rejette aussi NaN
        if !(min <= max) {
            return Err(FilterError::InvertedRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Filtres d'affichage du tableau
///
/// Par défaut : calls et puts sélectionnés, pas de plage de primes.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFilter {
    pub show_calls: bool,
    pub show_puts: bool,
    premium_range: Option<PremiumRange>,
}

impl TableFilter {
    pub fn new() -> Self {
        Self {
            show_calls: true,
            show_puts: true,
            premium_range: None,
        }
    }

    /// Vérifie si une ligne passe le filtre
    ///
    /// - Le type doit être sélectionné (un type inconnu ne l'est jamais)
    /// - Avec une plage active, la prime doit exister et être dans la plage
    pub fn matches(&self, row: &EnrichedRow) -> bool {
        let type_selected = match row.contract().contract_type {
            ContractType::Call => self.show_calls,
            ContractType::Put => self.show_puts,
            ContractType::Unknown => false,
        };
        if !type_selected {
            return false;
        }

        match self.premium_range {
            None => true,
            Some(range) => row.premium().map(|p| range.contains(p)).unwrap_or(false),
        }
    }

    pub fn toggle_calls(&mut self) {
        self.show_calls = !self.show_calls;
    }

    pub fn toggle_puts(&mut self) {
        self.show_puts = !self.show_puts;
    }

    pub fn premium_range(&self) -> Option<PremiumRange> {
        self.premium_range
    }

    pub fn set_premium_range(&mut self, range: PremiumRange) {
        self.premium_range = Some(range);
    }

    /// Fixe la borne basse, la borne haute vient de la plage actuelle
    /// ou des bornes des données (sinon +∞)
    pub fn set_min_premium(
        &mut self,
        min: f64,
        bounds: Option<(f64, f64)>,
    ) -> Result<(), FilterError> {
        let max = self
            .premium_range
            .map(|r| r.max)
            .or(bounds.map(|(_, hi)| hi))
            .unwrap_or(f64::INFINITY);
        self.premium_range = Some(PremiumRange::new(min, max)?);
        Ok(())
    }

    /// Fixe la borne haute, symétrique de `set_min_premium` (sinon 0)
    pub fn set_max_premium(
        &mut self,
        max: f64,
        bounds: Option<(f64, f64)>,
    ) -> Result<(), FilterError> {
        let min = self
            .premium_range
            .map(|r| r.min)
            .or(bounds.map(|(lo, _)| lo))
            .unwrap_or(0.0);
        self.premium_range = Some(PremiumRange::new(min, max)?);
        Ok(())
    }

    pub fn reset_premium_range(&mut self) {
        self.premium_range = None;
    }

    /// Label des types sélectionnés (ex: "call, put")
    pub fn types_label(&self) -> String {
        let mut types = Vec::new();
        if self.show_calls {
            types.push("call");
        }
        if self.show_puts {
            types.push("put");
        }
        if types.is_empty() {
            "aucun".to_string()
        } else {
            types.join(", ")
        }
    }

    /// Label de la plage (ex: "0.8..1.25" ou "toutes")
    pub fn range_label(&self) -> String {
        match self.premium_range {
            Some(range) => format!("{}..{}", range.min, range.max),
            None => "toutes".to_string(),
        }
    }
}

impl Default for TableFilter {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contract, LastTrade, PriceAggregate};
    use chrono::NaiveDate;

    fn row(ticker: &str, kind: ContractType, trade: Option<f64>, close: Option<f64>) -> EnrichedRow {
        let contract = Contract::new(
            ticker.to_string(),
            kind,
            100.0,
            NaiveDate::from_ymd_opt(2025, 1, 17).unwrap(),
        );
        let aggregate = close.map(|c| PriceAggregate {
            close: Some(c),
            ..PriceAggregate::default()
        });
        EnrichedRow::new(contract, aggregate, trade.map(LastTrade::new))
    }

    fn sample_table() -> ResultTable {
        ResultTable::new(
            "AAPL".to_string(),
            vec![
                row("O:C1", ContractType::Call, Some(1.25), Some(1.10)),
                row("O:P1", ContractType::Put, None, Some(0.80)),
                row("O:C2", ContractType::Call, None, None),
                row("O:P2", ContractType::Put, Some(3.0), None),
                row("O:U1", ContractType::Unknown, Some(2.0), None),
            ],
        )
    }

    fn tickers(rows: &[&EnrichedRow]) -> Vec<String> {
        rows.iter().map(|r| r.contract().ticker.clone()).collect()
    }

    #[test]
    fn test_default_filter_keeps_order() {
        let table = sample_table();
        let visible = table.filtered(&TableFilter::default());
        assert_eq!(tickers(&visible), vec!["O:C1", "O:P1", "O:C2", "O:P2"]);
    }

    #[test]
    fn test_type_filter() {
        let table = sample_table();
        let mut filter = TableFilter::default();

        filter.toggle_puts();
        assert_eq!(tickers(&table.filtered(&filter)), vec!["O:C1", "O:C2"]);

        filter.toggle_calls();
        assert!(table.filtered(&filter).is_empty());
        assert_eq!(filter.types_label(), "aucun");
    }

    #[test]
    fn test_premium_range_filter() {
        let table = sample_table();
        let mut filter = TableFilter::default();
        filter.set_premium_range(PremiumRange::new(0.8, 1.25).unwrap());

        // Bornes inclusives, lignes sans prime exclues
        assert_eq!(tickers(&table.filtered(&filter)), vec!["O:C1", "O:P1"]);

        filter.reset_premium_range();
        assert_eq!(table.filtered(&filter).len(), 4);
    }

    #[test]
    fn test_premium_bounds() {
        assert_eq!(sample_table().premium_bounds(), Some((0.8, 3.0)));

        let empty = ResultTable::new("ZZZZ".to_string(), Vec::new());
        assert!(empty.premium_bounds().is_none());
    }

    #[test]
    fn test_set_min_and_max_premium() {
        let bounds = Some((0.8, 3.0));
        let mut filter = TableFilter::default();

        filter.set_min_premium(1.0, bounds).unwrap();
        let range = filter.premium_range().unwrap();
        assert_eq!((range.min(), range.max()), (1.0, 3.0));

        filter.set_max_premium(2.0, bounds).unwrap();
        let range = filter.premium_range().unwrap();
        assert_eq!((range.min(), range.max()), (1.0, 2.0));

        // Plage inversée refusée, l'état reste inchangé
        assert!(filter.set_min_premium(5.0, bounds).is_err());
        assert_eq!(filter.premium_range().unwrap().min(), 1.0);
    }

    #[test]
    fn test_range_rejects_nan() {
        assert!(PremiumRange::new(f64::NAN, 1.0).is_err());
        assert!(PremiumRange::new(2.0, 1.0).is_err());
        assert!(PremiumRange::new(1.0, 1.0).is_ok());
    }
}
