// ============================================================================
// Plain - Rendu texte du tableau (mode --print)
// ============================================================================
// Colonnes alignées à gauche, largeur = cellule la plus longue
// ============================================================================

use crate::models::{EnrichedRow, COLUMN_HEADERS};

/// Séparateur entre colonnes
const COLUMN_GAP: &str = "  ";

/// Rend les lignes sous forme de tableau texte (en-tête + séparateur + lignes)
pub fn render_plain_table(rows: &[&EnrichedRow]) -> String {
    let body: Vec<[String; 9]> = rows.iter().map(|row| row.cells()).collect();

    let mut widths = COLUMN_HEADERS.map(|h| h.chars().count());
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, COLUMN_HEADERS.iter().copied(), &widths);

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, rule.iter().map(String::as_str), &widths);

    for cells in &body {
        push_line(&mut out, cells.iter().map(String::as_str), &widths);
    }

    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize; 9]) {
    let line: Vec<String> = cells
        .zip(widths.iter())
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect();

    out.push_str(line.join(COLUMN_GAP).trim_end());
    out.push('\n');
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contract, ContractType, LastTrade, PriceAggregate};
    use chrono::NaiveDate;

    fn sample_rows() -> Vec<EnrichedRow> {
        let date = NaiveDate::from_ymd_opt(2024, 8, 16).unwrap();
        vec![
            EnrichedRow::new(
                Contract::new("O:AAPL240816C00180000".to_string(), ContractType::Call, 180.0, date),
                Some(PriceAggregate::new(1.0, 1.3, 0.9, 1.10)),
                Some(LastTrade::new(1.25)),
            ),
            EnrichedRow::new(
                Contract::new("O:AAPL240816P00175000".to_string(), ContractType::Put, 175.0, date),
                Some(PriceAggregate::new(0.7, 0.9, 0.6, 0.80)),
                None,
            ),
        ]
    }

    #[test]
    fn test_plain_table_contents() {
        let rows = sample_rows();
        let refs: Vec<&EnrichedRow> = rows.iter().collect();

        let text = render_plain_table(&refs);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Option Ticker"));
        assert!(lines[0].ends_with("Low"));
        assert!(lines[1].starts_with("---"));
        assert!(lines[2].contains("1.25"));
        assert!(lines[2].contains("real"));
        assert!(lines[3].contains("0.8 C"));
        assert!(lines[3].contains("close"));
    }

    #[test]
    fn test_plain_table_columns_aligned() {
        let rows = sample_rows();
        let refs: Vec<&EnrichedRow> = rows.iter().collect();

        let text = render_plain_table(&refs);
        let lines: Vec<&str> = text.lines().collect();

        // La colonne Type commence au même offset sur chaque ligne
        let offset = lines[0].find("Type").unwrap();
        assert_eq!(&lines[2][offset..offset + 4], "call");
        assert_eq!(&lines[3][offset..offset + 3], "put");
    }

    #[test]
    fn test_plain_table_without_rows() {
        let text = render_plain_table(&[]);
        assert_eq!(text.lines().count(), 2);
    }
}
