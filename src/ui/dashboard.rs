// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine l'interface TUI en utilisant les widgets de ratatui
//
// Layout vertical :
//   ┌ header ─────────────────────────────┐
//   ├ filtres (ticker, nombre, types, plage)
//   ├ tableau des contrats (ou message)   │
//   └ footer (statut + raccourcis / saisie)
//
// CONCEPTS RATATUI :
// 1. Table widget : lignes + en-tête + largeurs de colonnes
// 2. Layout : découpage de l'espace en zones
// 3. Style : couleurs selon la provenance de la prime
// 4. TableState : sélection + défilement des lignes hors écran
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, Screen, StatusLevel};
use crate::models::{PremiumSource, COLUMN_HEADERS};

/// Largeurs des colonnes, alignées sur COLUMN_HEADERS
const COLUMN_WIDTHS: [Constraint; 9] = [
    Constraint::Length(24), // Option Ticker
    Constraint::Length(5),  // Type
    Constraint::Length(8),  // Strike
    Constraint::Length(11), // Expiration
    Constraint::Length(10), // Premium
    Constraint::Length(13), // PremiumSource
    Constraint::Length(8),  // Open
    Constraint::Length(8),  // High
    Constraint::Length(8),  // Low
];

/// Dessine l'interface complète
///
/// Le mode saisie garde le tableau visible et remplace le footer.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, chunks[0]);
    render_filters(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);

    match app.current_screen {
        Screen::Table => render_footer(frame, app, chunks[3]),
        Screen::InputMode => render_input_footer(frame, app, chunks[3]),
    }
}

/// Crée le layout principal (header, filtres, contenu, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Filtres
            Constraint::Min(0),    // Tableau : tout le reste
            Constraint::Length(4), // Footer : statut + raccourcis
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header et filtres
// ============================================================================

fn render_header(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" OptionPanel ")
        .title_alignment(Alignment::Center);

    let text = Line::from(Span::styled(
        "Options Price Panel (Polygon.io)",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ));

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Ligne des paramètres de fetch et des filtres actifs
fn render_filters(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Filtres ");

    let label = Style::default().fg(Color::Gray);
    let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

    let line = Line::from(vec![
        Span::styled("Ticker ", label),
        Span::styled(app.ticker.clone(), value),
        Span::styled("   Options ", label),
        Span::styled(app.limit.to_string(), value),
        Span::styled("   Types ", label),
        Span::styled(app.filter.types_label(), value),
        Span::styled("   Premium ", label),
        Span::styled(app.filter.range_label(), value),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

// ============================================================================
// Main Content : tableau des contrats
// ============================================================================

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.table {
        Some(table) => format!(
            " 📊 {} : {} / {} contrats ",
            table.underlying,
            app.visible_rows().len(),
            table.len()
        ),
        None => " 📊 Contrats ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    // Chargement : l'indicateur couvre toute la séquence fetch + enrichissement
    if app.is_loading_data() {
        let message = app
            .loading_message
            .clone()
            .unwrap_or_else(|| "Fetching data...".to_string());
        render_message(frame, area, block, &format!("⏳ {}", message), Color::Yellow);
        return;
    }

    let rows = app.visible_rows();

    if rows.is_empty() {
        let message = if app.table.is_some() {
            "Aucun contrat ne correspond aux filtres"
        } else {
            "Appuyez sur [Enter] pour charger les contrats"
        };
        render_message(frame, area, block, message, Color::Gray);
        return;
    }

    // Couleur selon la provenance de la prime
    let table_rows: Vec<Row> = rows
        .iter()
        .map(|row| {
            let style = match row.premium_source() {
                PremiumSource::Real => Style::default().fg(Color::Green),
                PremiumSource::Close => Style::default().fg(Color::Yellow),
                PremiumSource::Absent => Style::default().fg(Color::Gray),
            };
            Row::new(row.cells()).style(style)
        })
        .collect();

    let header = Row::new(COLUMN_HEADERS).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(table_rows, COLUMN_WIDTHS)
        .header(header)
        .block(block)
        .column_spacing(1)
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::REVERSED),
        );

    // TableState : ratatui décale l'offset pour garder la sélection visible
    let mut state = TableState::default();
    state.select(Some(app.selected_index));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_message(frame: &mut Frame, area: Rect, block: Block, message: &str, color: Color) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(color))),
    ];

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Footer : statut + raccourcis
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let status_line = match &app.status {
        Some(status) => {
            let (icon, color) = match status.level {
                StatusLevel::Info => ("✓", Color::Green),
                StatusLevel::Warning => ("⚠", Color::Yellow),
                StatusLevel::Error => ("✗", Color::Red),
            };
            Line::from(Span::styled(
                format!("{} {}", icon, status.text),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
        }
        None => Line::from(""),
    };

    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("[Enter/f]", key),
            Span::raw(" Fetch  "),
            Span::styled("[t]", key),
            Span::raw(" Ticker  "),
            Span::styled("[n]", key),
            Span::raw(" Count  "),
            Span::styled("[c/p]", key),
            Span::raw(" Calls/Puts  "),
            Span::styled("[m/M]", key),
            Span::raw(" Min/Max  "),
            Span::styled("[r]", key),
            Span::raw(" Reset  "),
            Span::styled("[q]", key),
            Span::raw(" Quit"),
        ])
    };

    let paragraph = Paragraph::new(vec![status_line, shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Footer en mode saisie : prompt + buffer + curseur
fn render_input_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green)); // Vert pour indiquer mode input

    let prompt = app.input_field.map(|f| f.prompt()).unwrap_or_default();

    let input_line = Line::from(vec![
        Span::styled(
            prompt,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.input_buffer.as_str(), Style::default().fg(Color::White)),
        Span::styled(
            "█", // Curseur
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ),
    ]);

    let help_line = Line::from(vec![
        Span::styled(
            "[Enter]",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" Confirm  "),
        Span::styled(
            "[ESC]",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" Cancel"),
    ]);

    let paragraph = Paragraph::new(vec![input_line, help_line])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================
