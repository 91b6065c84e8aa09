// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Enums avec données : messages de statut, champs de saisie
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Garantit la cohérence de l'état
// ============================================================================

use crate::fetch::{FetchError, FetchOutcome, FetchRequest};
use crate::models::{EnrichedRow, ResultTable, TableFilter};

/// Sous-jacent proposé au démarrage
pub const DEFAULT_TICKER: &str = "AAPL";

/// Nombre de contrats proposé au démarrage
pub const DEFAULT_LIMIT: u32 = 5;

/// Bornes du nombre de contrats
pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 50;

// ============================================================================
// Enum : Screen
// ============================================================================
// CONCEPT RUST : Enums pour state machines
// - Un seul écran actif à la fois
// - Le compilateur force à gérer tous les cas (exhaustivité)
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : filtres + tableau
    Table,

    /// Mode saisie : capture du texte pour un champ
    /// - Enter valide, ESC annule
    InputMode,
}

/// Champ en cours d'édition en mode saisie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Ticker,
    Limit,
    MinPremium,
    MaxPremium,
}

impl InputField {
    /// Prompt affiché en bas de l'écran
    pub fn prompt(&self) -> &'static str {
        match self {
            InputField::Ticker => "Underlying ticker: ",
            InputField::Limit => "Number of options (1-50): ",
            InputField::MinPremium => "Min premium: ",
            InputField::MaxPremium => "Max premium: ",
        }
    }
}

/// Gravité d'un message de statut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Message affiché dans le footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Sous-jacent à interroger (ex: "AAPL")
    pub ticker: String,

    /// Nombre de contrats à demander (1-50)
    pub limit: u32,

    /// Filtres d'affichage (types, plage de primes)
    pub filter: TableFilter,

    /// Dernier tableau reçu (None : pas encore de fetch, ou échec)
    pub table: Option<ResultTable>,

    /// Index de la ligne sélectionnée parmi les lignes visibles
    pub selected_index: usize,

    /// Two-step quit : première pression de 'q' → confirmation
    pub confirm_quit: bool,

    /// Fetch en cours (indicateur de chargement)
    pub is_loading: bool,

    /// Message de chargement optionnel
    pub loading_message: Option<String>,

    /// Buffer de saisie pour le mode Input
    pub input_buffer: String,

    /// Champ édité en mode Input
    pub input_field: Option<InputField>,

    /// Dernier message de statut (info, avertissement, erreur)
    pub status: Option<StatusMessage>,

    /// Le worker thread ne répond plus (plus aucun fetch possible)
    pub worker_lost: bool,
}

impl App {
    /// Crée une App avec un sous-jacent et un nombre de contrats initiaux
    pub fn new(ticker: String, limit: u32) -> Self {
        Self {
            running: true,
            current_screen: Screen::Table,
            ticker,
            limit: limit.clamp(MIN_LIMIT, MAX_LIMIT),
            filter: TableFilter::default(),
            table: None,
            selected_index: 0,
            confirm_quit: false,
            is_loading: false,
            loading_message: None,
            input_buffer: String::new(),
            input_field: None,
            status: None,
            worker_lost: false,
        }
    }

    /// Quitte l'application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Vérifie si l'application doit continuer
    pub fn is_running(&self) -> bool {
        self.running
    }

    // ========================================================================
    // Tableau et navigation
    // ========================================================================

    /// Lignes visibles avec les filtres actuels
    ///
    /// CONCEPT RUST : Option + map_or_else
    /// - Pas de tableau : liste vide
    pub fn visible_rows(&self) -> Vec<&EnrichedRow> {
        self.table
            .as_ref()
            .map_or_else(Vec::new, |table| table.filtered(&self.filter))
    }

    /// Bornes des primes du tableau actuel
    pub fn premium_bounds(&self) -> Option<(f64, f64)> {
        self.table.as_ref().and_then(|t| t.premium_bounds())
    }

    /// Navigue vers le haut dans le tableau
    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Navigue vers le bas dans le tableau
    pub fn navigate_down(&mut self) {
        let max_index = self.visible_rows().len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    /// Ligne sélectionnée parmi les lignes visibles
    pub fn selected_row(&self) -> Option<&EnrichedRow> {
        self.visible_rows().get(self.selected_index).copied()
    }

    /// Ramène la sélection dans les bornes après un changement de filtre
    fn clamp_selection(&mut self) {
        let max_index = self.visible_rows().len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max_index);
    }

    // ========================================================================
    // Filtres
    // ========================================================================

    pub fn toggle_calls(&mut self) {
        self.filter.toggle_calls();
        self.clamp_selection();
    }

    pub fn toggle_puts(&mut self) {
        self.filter.toggle_puts();
        self.clamp_selection();
    }

    pub fn reset_premium_range(&mut self) {
        self.filter.reset_premium_range();
        self.clamp_selection();
    }

    // ========================================================================
    // Fetch
    // ========================================================================

    /// Paramètres du prochain fetch
    pub fn fetch_request(&self, base_url: &str) -> FetchRequest {
        FetchRequest {
            underlying: self.ticker.clone(),
            limit: self.limit,
            base_url: base_url.to_string(),
        }
    }

    /// Démarre le chargement avec un message optionnel
    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    /// Termine le chargement
    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    /// Vérifie si des données sont en cours de chargement
    pub fn is_loading_data(&self) -> bool {
        self.is_loading
    }

    /// Applique le résultat d'un fetch
    ///
    /// - Tableau : remplace l'ancien, réinitialise la sélection et la plage
    /// - Aucun contrat : avertissement, pas de tableau
    /// - Erreur : message unique, pas de tableau partiel
    pub fn apply_fetch_result(&mut self, result: Result<FetchOutcome, FetchError>) {
        self.selected_index = 0;

        match result {
            Ok(FetchOutcome::Table(table)) => {
                self.set_status(
                    StatusLevel::Info,
                    format!("{} contracts loaded for {}", table.len(), table.underlying),
                );
                self.filter.reset_premium_range();
                self.table = Some(table);
            }
            Ok(FetchOutcome::NoContracts { underlying }) => {
                self.table = None;
                self.set_status(
                    StatusLevel::Warning,
                    format!("No contracts found for the specified underlying ticker ({}).", underlying),
                );
            }
            Err(e) => {
                self.table = None;
                self.set_status(StatusLevel::Error, e.to_string());
            }
        }
    }

    /// Enregistre la perte du worker thread
    ///
    /// Retourne true uniquement au premier appel.
    pub fn mark_worker_lost(&mut self) -> bool {
        if self.worker_lost {
            return false;
        }

        self.worker_lost = true;
        self.stop_loading();
        self.set_status(
            StatusLevel::Error,
            "Background worker stopped unexpectedly".to_string(),
        );
        true
    }

    // ========================================================================
    // Statut
    // ========================================================================

    pub fn set_status(&mut self, level: StatusLevel, text: String) {
        self.status = Some(StatusMessage { level, text });
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    // ========================================================================
    // Quit Confirmation Management
    // ========================================================================

    /// Demande la confirmation de quitter
    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    /// Annule la demande de quit
    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    /// Vérifie si on attend la confirmation de quit
    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Input Mode Management
    // ========================================================================

    /// Entre en mode input pour un champ
    ///
    /// Le buffer est pré-rempli avec la valeur actuelle du champ.
    pub fn start_input(&mut self, field: InputField) {
        self.current_screen = Screen::InputMode;
        self.input_field = Some(field);
        self.input_buffer = match field {
            InputField::Ticker => self.ticker.clone(),
            InputField::Limit => self.limit.to_string(),
            InputField::MinPremium => self
                .filter
                .premium_range()
                .map(|r| r.min().to_string())
                .unwrap_or_default(),
            InputField::MaxPremium => self
                .filter
                .premium_range()
                .map(|r| r.max().to_string())
                .unwrap_or_default(),
        };
    }

    /// Annule le mode input et retourne au tableau
    pub fn cancel_input(&mut self) {
        self.current_screen = Screen::Table;
        self.input_field = None;
        self.input_buffer.clear();
    }

    /// Valide la saisie et l'applique au champ édité
    ///
    /// Une saisie invalide laisse l'état inchangé et affiche une erreur.
    pub fn submit_input(&mut self) {
        let value = self.input_buffer.trim().to_string();
        let field = self.input_field;
        self.cancel_input();

        let Some(field) = field else {
            return;
        };

        let outcome = match field {
            InputField::Ticker => self.apply_ticker(&value),
            InputField::Limit => self.apply_limit(&value),
            InputField::MinPremium => parse_premium(&value).and_then(|min| {
                let bounds = self.premium_bounds();
                self.filter
                    .set_min_premium(min, bounds)
                    .map_err(|e| e.to_string())
            }),
            InputField::MaxPremium => parse_premium(&value).and_then(|max| {
                let bounds = self.premium_bounds();
                self.filter
                    .set_max_premium(max, bounds)
                    .map_err(|e| e.to_string())
            }),
        };

        match outcome {
            Ok(()) => {
                self.clear_status();
                self.clamp_selection();
            }
            Err(message) => self.set_status(StatusLevel::Error, message),
        }
    }

    fn apply_ticker(&mut self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Err("Ticker cannot be empty".to_string());
        }
        self.ticker = value.to_uppercase();
        Ok(())
    }

    fn apply_limit(&mut self, value: &str) -> Result<(), String> {
        match value.parse::<u32>() {
            Ok(limit) if (MIN_LIMIT..=MAX_LIMIT).contains(&limit) => {
                self.limit = limit;
                Ok(())
            }
            _ => Err(format!(
                "Number of options must be an integer between {} and {}",
                MIN_LIMIT, MAX_LIMIT
            )),
        }
    }

    /// Ajoute un caractère au buffer d'input
    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    /// Supprime le dernier caractère du buffer
    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }

    /// Vérifie si on est en mode input
    pub fn is_in_input_mode(&self) -> bool {
        self.current_screen == Screen::InputMode
    }
}

fn parse_premium(value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("Invalid premium value: {:?}", value))
}

impl Default for App {
    fn default() -> Self {
        Self::new(DEFAULT_TICKER.to_string(), DEFAULT_LIMIT)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ListContractsError;
    use crate::config::ConfigError;
    use crate::models::{Contract, ContractType, LastTrade, PriceAggregate};
    use chrono::NaiveDate;

    fn table() -> ResultTable {
        let expiry = NaiveDate::from_ymd_opt(2024, 8, 16).unwrap();
        ResultTable::new(
            "AAPL".to_string(),
            vec![
                EnrichedRow::new(
                    Contract::new("O:A".to_string(), ContractType::Call, 180.0, expiry),
                    Some(PriceAggregate::new(1.0, 1.3, 0.9, 1.1)),
                    Some(LastTrade::new(1.25)),
                ),
                EnrichedRow::new(
                    Contract::new("O:B".to_string(), ContractType::Put, 175.0, expiry),
                    Some(PriceAggregate::new(0.7, 0.9, 0.6, 0.8)),
                    None,
                ),
                EnrichedRow::new(
                    Contract::new("O:C".to_string(), ContractType::Call, 185.0, expiry),
                    None,
                    None,
                ),
            ],
        )
    }

    fn loaded_app() -> App {
        let mut app = App::default();
        app.apply_fetch_result(Ok(FetchOutcome::Table(table())));
        app
    }

    fn type_and_submit(app: &mut App, field: InputField, text: &str) {
        app.start_input(field);
        app.input_buffer.clear();
        text.chars().for_each(|c| app.append_char(c));
        app.submit_input();
    }

    #[test]
    fn test_app_creation() {
        let app = App::default();
        assert!(app.is_running());
        assert_eq!(app.ticker, "AAPL");
        assert_eq!(app.limit, 5);
        assert!(app.visible_rows().is_empty());
    }

    #[test]
    fn test_limit_clamped_on_creation() {
        assert_eq!(App::new("SPY".to_string(), 0).limit, 1);
        assert_eq!(App::new("SPY".to_string(), 500).limit, 50);
    }

    #[test]
    fn test_app_quit() {
        let mut app = App::default();
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_apply_table() {
        let app = loaded_app();
        assert_eq!(app.visible_rows().len(), 3);
        assert_eq!(app.status.as_ref().unwrap().level, StatusLevel::Info);
        assert_eq!(app.premium_bounds(), Some((0.8, 1.25)));
    }

    #[test]
    fn test_apply_no_contracts() {
        let mut app = loaded_app();
        app.apply_fetch_result(Ok(FetchOutcome::NoContracts {
            underlying: "ZZZZ".to_string(),
        }));

        assert!(app.table.is_none());
        let status = app.status.unwrap();
        assert_eq!(status.level, StatusLevel::Warning);
        assert!(status.text.starts_with("No contracts found"));
    }

    #[test]
    fn test_apply_errors_clear_table() {
        let mut app = loaded_app();
        app.apply_fetch_result(Err(FetchError::Listing(ListContractsError::Request(
            "timed out after 10s".to_string(),
        ))));

        assert!(app.table.is_none());
        let status = app.status.clone().unwrap();
        assert_eq!(status.level, StatusLevel::Error);
        assert_eq!(status.text, "Request error: timed out after 10s");

        app.apply_fetch_result(Err(FetchError::Config(ConfigError::MissingApiKey)));
        assert!(app.status.unwrap().text.starts_with("API key is missing"));
    }

    #[test]
    fn test_navigation_follows_filter() {
        let mut app = loaded_app();

        app.navigate_down();
        app.navigate_down();
        app.navigate_down();
        assert_eq!(app.selected_index, 2);
        assert_eq!(app.selected_row().unwrap().contract().ticker, "O:C");

        // Masquer les calls : une seule ligne visible, sélection ramenée
        app.toggle_calls();
        assert_eq!(app.visible_rows().len(), 1);
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.selected_row().unwrap().contract().ticker, "O:B");

        app.navigate_up();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_submit_ticker_and_limit() {
        let mut app = App::default();

        type_and_submit(&mut app, InputField::Ticker, " msft ");
        assert_eq!(app.ticker, "MSFT");
        assert!(!app.is_in_input_mode());

        type_and_submit(&mut app, InputField::Limit, "12");
        assert_eq!(app.limit, 12);

        let request = app.fetch_request("http://localhost");
        assert_eq!(request.underlying, "MSFT");
        assert_eq!(request.limit, 12);
    }

    #[test]
    fn test_invalid_input_keeps_state() {
        let mut app = App::default();

        type_and_submit(&mut app, InputField::Limit, "51");
        assert_eq!(app.limit, 5);
        assert_eq!(app.status.as_ref().unwrap().level, StatusLevel::Error);

        type_and_submit(&mut app, InputField::Ticker, "   ");
        assert_eq!(app.ticker, "AAPL");

        type_and_submit(&mut app, InputField::MinPremium, "abc");
        assert!(app.filter.premium_range().is_none());
    }

    #[test]
    fn test_premium_range_input() {
        let mut app = loaded_app();

        type_and_submit(&mut app, InputField::MinPremium, "1");
        let range = app.filter.premium_range().unwrap();
        assert_eq!((range.min(), range.max()), (1.0, 1.25));
        assert_eq!(app.visible_rows().len(), 1);

        type_and_submit(&mut app, InputField::MaxPremium, "0.5");
        assert_eq!(app.status.as_ref().unwrap().level, StatusLevel::Error);
        assert_eq!(app.filter.premium_range().unwrap().max(), 1.25);

        app.reset_premium_range();
        assert_eq!(app.visible_rows().len(), 3);
    }

    #[test]
    fn test_input_prefilled_and_cancel() {
        let mut app = App::default();
        app.start_input(InputField::Ticker);
        assert_eq!(app.input_buffer, "AAPL");

        app.backspace();
        app.cancel_input();
        assert_eq!(app.ticker, "AAPL");
        assert!(app.input_buffer.is_empty());
    }

    #[test]
    fn test_worker_lost_reported_once() {
        let mut app = App::default();
        app.start_loading(None);

        assert!(app.mark_worker_lost());
        assert!(!app.is_loading_data());
        assert_eq!(app.status.as_ref().unwrap().level, StatusLevel::Error);

        // Les appels suivants ne signalent plus rien
        assert!(!app.mark_worker_lost());
        assert!(!app.mark_worker_lost());
    }
}
