// ============================================================================
// OptionPanel - Tableau de bord des options (Polygon.io)
// ============================================================================
// Deux modes :
// - TUI (par défaut) : filtres, fetch à la demande, tableau interactif
// - --print : un fetch, le tableau sur stdout, puis sortie
//
// CONCEPTS RUST CLÉS :
// 1. Clap derive : arguments CLI typés, avec fallback sur l'environnement
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Worker thread : runtime tokio dédié pour les appels API
// 4. Channels mpsc : commandes vers le worker, résultats vers l'UI
// ============================================================================

use std::io;
use std::process::ExitCode;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};

use optionpanel::api::DEFAULT_BASE_URL;
use optionpanel::app::{App, InputField, StatusLevel, DEFAULT_LIMIT, DEFAULT_TICKER, MAX_LIMIT, MIN_LIMIT};
use optionpanel::config::{resolve_api_key, BASE_URL_ENV};
use optionpanel::fetch::{run_fetch, FetchError, FetchOutcome, FetchRequest};
use optionpanel::models::{FilterError, PremiumRange, ResultTable, TableFilter};
use optionpanel::ui::events::{Event, EventHandler};
use optionpanel::ui::{render, render_plain_table};

// ============================================================================
// Arguments CLI
// ============================================================================

/// Options price panel backed by Polygon.io
#[derive(Debug, Parser)]
#[command(name = "optionpanel", version, about)]
struct Cli {
    /// Underlying ticker (ex: AAPL)
    #[arg(short, long, default_value = DEFAULT_TICKER)]
    ticker: String,

    /// Number of option contracts to list
    #[arg(
        short = 'n',
        long,
        default_value_t = DEFAULT_LIMIT,
        value_parser = clap::value_parser!(u32).range(MIN_LIMIT as i64..=MAX_LIMIT as i64)
    )]
    limit: u32,

    /// Fetch once, print the table to stdout and exit
    #[arg(long)]
    print: bool,

    /// Polygon API base URL
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Only show calls
    #[arg(long, conflicts_with = "puts_only")]
    calls_only: bool,

    /// Only show puts
    #[arg(long)]
    puts_only: bool,

    /// Lower premium bound (inclusive)
    #[arg(long)]
    min_premium: Option<f64>,

    /// Upper premium bound (inclusive)
    #[arg(long)]
    max_premium: Option<f64>,
}

impl Cli {
    /// Filtre de départ : types sélectionnés par les flags
    fn type_filter(&self) -> TableFilter {
        let mut filter = TableFilter::new();
        filter.show_calls = !self.puts_only;
        filter.show_puts = !self.calls_only;
        filter
    }

    /// Filtre complet pour un tableau donné
    ///
    /// Une borne absente est prise dans les primes du tableau.
    fn table_filter(&self, table: &ResultTable) -> Result<TableFilter, FilterError> {
        let mut filter = self.type_filter();

        if self.min_premium.is_none() && self.max_premium.is_none() {
            return Ok(filter);
        }

        let bounds = table.premium_bounds();
        let min = self
            .min_premium
            .or(bounds.map(|(lo, _)| lo))
            .unwrap_or(0.0);
        let max = self
            .max_premium
            .or(bounds.map(|(_, hi)| hi))
            .unwrap_or(f64::INFINITY);

        filter.set_premium_range(PremiumRange::new(min, max)?);
        Ok(filter)
    }
}

// ============================================================================
// AppCommand / AppResult : messages du worker thread
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum AppCommand {
    /// Lister puis enrichir les contrats d'un sous-jacent
    Fetch(FetchRequest),
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    FetchCompleted(Result<FetchOutcome, FetchError>),
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers
// ./logs/optionpanel.log (rotation quotidienne)
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// ```bash
/// tail -f logs/optionpanel.log
/// RUST_LOG=optionpanel=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = std::path::PathBuf::from("./logs");

    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "optionpanel.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true)
                .with_thread_ids(true) // Worker vs UI
                .with_line_number(true),
        )
        .with(
            // RUST_LOG prioritaire, sinon debug pour optionpanel et info pour le reste
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "optionpanel=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(ticker = %cli.ticker, limit = cli.limit, print = cli.print, "OptionPanel starting up");

    let result = if cli.print {
        run_print(&cli)
    } else {
        run_tui(&cli)
    };

    match result {
        Ok(code) => {
            info!("Application exited normally");
            code
        }
        Err(e) => {
            error!(error = ?e, "Application exited with error");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Mode --print
// ============================================================================

/// Un fetch bloquant, puis le tableau filtré sur stdout
///
/// - Aucun contrat : avertissement sur stderr, code 0
/// - Erreur (clé, listing) : message sur stderr, code 1
fn run_print(cli: &Cli) -> Result<ExitCode> {
    let runtime = Runtime::new().context("Impossible de créer le runtime tokio")?;

    let request = FetchRequest {
        underlying: cli.ticker.clone(),
        limit: cli.limit,
        base_url: cli.base_url.clone(),
    };

    match runtime.block_on(run_fetch(&request, resolve_api_key())) {
        Ok(FetchOutcome::Table(table)) => {
            let filter = cli.table_filter(&table)?;
            let rows = table.filtered(&filter);

            info!(rows = table.len(), shown = rows.len(), "Printing option table");
            print!("{}", render_plain_table(&rows));
            Ok(ExitCode::SUCCESS)
        }
        Ok(FetchOutcome::NoContracts { underlying }) => {
            warn!(underlying = %underlying, "No contracts to print");
            eprintln!(
                "No contracts found for the specified underlying ticker ({}).",
                underlying
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "Fetch failed");
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

// ============================================================================
// Mode TUI
// ============================================================================

fn run_tui(cli: &Cli) -> Result<ExitCode> {
    let mut app = App::new(cli.ticker.trim().to_uppercase(), cli.limit);
    app.filter = cli.type_filter();

    // Arc<Mutex<>> : état partagé entre l'UI et le worker
    let app = Arc::new(Mutex::new(app));

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    // Runtime créé ici pour propager l'erreur, puis déplacé dans le worker
    let runtime = Runtime::new().context("Impossible de créer le runtime tokio")?;
    info!("Spawning background worker thread");
    spawn_background_worker(runtime, command_rx, result_tx);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(
        &mut terminal,
        app,
        &events,
        &command_tx,
        &result_rx,
        &cli.base_url,
    );

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    result.map(|_| ExitCode::SUCCESS)
}

/// Verrouille l'état partagé, même si un autre thread a paniqué en le tenant
fn lock_app(app: &Mutex<App>) -> MutexGuard<'_, App> {
    app.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// - Reçoit des AppCommand via command_rx
// - block_on() bloque le worker, pas l'UI
// - Renvoie des AppResult via result_tx
// ============================================================================

fn spawn_background_worker(
    runtime: Runtime,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
) {
    std::thread::spawn(move || {
        // recv() échoue quand l'UI a lâché le Sender : fin du worker
        while let Ok(command) = command_rx.recv() {
            info!(?command, "Worker received command");

            match command {
                AppCommand::Fetch(request) => {
                    // Clé relue à chaque fetch (.env ou secrets modifiés entre deux fetchs)
                    let api_key = resolve_api_key();
                    let result = runtime.block_on(run_fetch(&request, api_key));

                    match &result {
                        Ok(FetchOutcome::Table(table)) => {
                            info!(underlying = %table.underlying, rows = table.len(), "Fetch completed")
                        }
                        Ok(FetchOutcome::NoContracts { underlying }) => {
                            warn!(underlying = %underlying, "Fetch returned no contracts")
                        }
                        Err(e) => error!(error = %e, "Fetch failed"),
                    }

                    if result_tx.send(AppResult::FetchCompleted(result)).is_err() {
                        break;
                    }
                }
            }
        }

        info!("Background worker stopped");
    });
}

// ============================================================================
// Event Loop
// ============================================================================
// 0. Résultats du worker (try_recv, non bloquant)
// 1. Render
// 2. Input
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: Arc<Mutex<App>>,
    events: &EventHandler,
    command_tx: &mpsc::Sender<AppCommand>,
    result_rx: &mpsc::Receiver<AppResult>,
    base_url: &str,
) -> Result<()> {
    loop {
        if !lock_app(&app).is_running() {
            break;
        }

        // ========================================
        // 0. RÉSULTATS
        // ========================================
        match result_rx.try_recv() {
            Ok(AppResult::FetchCompleted(result)) => {
                let mut app_lock = lock_app(&app);
                app_lock.stop_loading();
                app_lock.apply_fetch_result(result);
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                // Reste déconnecté : on ne logge que la première fois
                if lock_app(&app).mark_worker_lost() {
                    error!("Worker thread disconnected!");
                }
            }
        }

        // ========================================
        // 1. RENDER
        // ========================================
        terminal.draw(|frame| {
            let app_lock = lock_app(&app);
            render(frame, &app_lock);
        })?;

        // ========================================
        // 2. INPUT
        // ========================================
        match events.next() {
            Ok(event) => {
                let mut app_lock = lock_app(&app);
                handle_event(&mut app_lock, event, command_tx, base_url);
            }
            Err(e) => {
                debug!(error = %e, "Failed to read terminal event");
            }
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================
// Le mode saisie passe en premier : 'q', 'c', 'p'... y sont du texte.
// ============================================================================

fn handle_event(
    app: &mut App,
    event: Event,
    command_tx: &mpsc::Sender<AppCommand>,
    base_url: &str,
) {
    use optionpanel::ui::events::{
        get_char_from_event, is_backspace_event, is_down_event, is_edit_limit_event,
        is_edit_ticker_event, is_enter_event, is_escape_event, is_fetch_event,
        is_input_char_event, is_max_premium_event, is_min_premium_event, is_quit_event,
        is_reset_range_event, is_toggle_calls_event, is_toggle_puts_event, is_up_event,
    };

    // ========================================
    // Input Mode
    // ========================================
    if app.is_in_input_mode() {
        if is_escape_event(&event) {
            info!("User cancelled input");
            app.cancel_input();
        } else if is_enter_event(&event) {
            let field = app.input_field;
            app.submit_input();
            info!(?field, ticker = %app.ticker, limit = app.limit, range = %app.filter.range_label(), "User submitted input");
        } else if is_backspace_event(&event) {
            app.backspace();
        } else if is_input_char_event(&event) {
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }
        return;
    }

    match event {
        Event::Key(_) if is_quit_event(&event) => {
            // Two-step : première pression → confirmation, deuxième → quit
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        Event::Key(_) if is_fetch_event(&event) => {
            app.cancel_quit();

            // Un seul fetch à la fois
            if app.is_loading_data() {
                debug!("Fetch already in progress, ignoring");
                return;
            }

            let request = app.fetch_request(base_url);
            info!(underlying = %request.underlying, limit = request.limit, "User requested fetch");

            app.start_loading(Some(format!(
                "Fetching {} option contracts for {}...",
                request.limit, request.underlying
            )));

            if command_tx.send(AppCommand::Fetch(request)).is_err() {
                error!("Worker thread unavailable");
                app.stop_loading();
                app.set_status(
                    StatusLevel::Error,
                    "Background worker unavailable".to_string(),
                );
            }
        }

        Event::Key(_) if is_edit_ticker_event(&event) => {
            app.cancel_quit();
            app.start_input(InputField::Ticker);
        }
        Event::Key(_) if is_edit_limit_event(&event) => {
            app.cancel_quit();
            app.start_input(InputField::Limit);
        }
        Event::Key(_) if is_min_premium_event(&event) => {
            app.cancel_quit();
            app.start_input(InputField::MinPremium);
        }
        Event::Key(_) if is_max_premium_event(&event) => {
            app.cancel_quit();
            app.start_input(InputField::MaxPremium);
        }

        Event::Key(_) if is_toggle_calls_event(&event) => {
            app.cancel_quit();
            app.toggle_calls();
            debug!(types = %app.filter.types_label(), "User toggled calls");
        }
        Event::Key(_) if is_toggle_puts_event(&event) => {
            app.cancel_quit();
            app.toggle_puts();
            debug!(types = %app.filter.types_label(), "User toggled puts");
        }
        Event::Key(_) if is_reset_range_event(&event) => {
            app.cancel_quit();
            app.reset_premium_range();
            debug!("User reset premium range");
        }

        Event::Key(_) if is_up_event(&event) => {
            app.cancel_quit();
            app.navigate_up();
        }
        Event::Key(_) if is_down_event(&event) => {
            app.cancel_quit();
            app.navigate_down();
        }

        Event::Tick => {}

        Event::Key(_) => {
            // Toute autre touche : annule la confirmation de quit
            app.cancel_quit();
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    // Alternate screen : l'écran précédent est restauré à la sortie
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;

    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;

    terminal.show_cursor()?;

    Ok(())
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use optionpanel::models::{Contract, ContractType, EnrichedRow, LastTrade, PriceAggregate};

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    fn sample_table() -> ResultTable {
        let date = NaiveDate::from_ymd_opt(2024, 8, 16).unwrap();
        ResultTable::new(
            "AAPL".to_string(),
            vec![
                EnrichedRow::new(
                    Contract::new("O:A".to_string(), ContractType::Call, 180.0, date),
                    Some(PriceAggregate::new(1.0, 1.3, 0.9, 1.10)),
                    Some(LastTrade::new(1.25)),
                ),
                EnrichedRow::new(
                    Contract::new("O:B".to_string(), ContractType::Put, 175.0, date),
                    Some(PriceAggregate::new(0.7, 0.9, 0.6, 0.80)),
                    None,
                ),
            ],
        )
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["optionpanel"]).unwrap();
        assert_eq!(cli.ticker, "AAPL");
        assert_eq!(cli.limit, 5);
        assert!(!cli.print);
    }

    #[test]
    fn test_cli_rejects_out_of_range_limit() {
        assert!(Cli::try_parse_from(["optionpanel", "--limit", "0"]).is_err());
        assert!(Cli::try_parse_from(["optionpanel", "--limit", "51"]).is_err());
        assert!(Cli::try_parse_from(["optionpanel", "--limit", "50"]).is_ok());
    }

    #[test]
    fn test_cli_type_flags_conflict() {
        assert!(Cli::try_parse_from(["optionpanel", "--calls-only", "--puts-only"]).is_err());
    }

    #[test]
    fn test_print_filter_with_min_only() {
        let cli = Cli::try_parse_from(["optionpanel", "--print", "--min-premium", "1"]).unwrap();
        let table = sample_table();

        let filter = cli.table_filter(&table).unwrap();
        let rows = table.filtered(&filter);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].contract().ticker, "O:A");
    }

    #[test]
    fn test_print_filter_puts_only() {
        let cli = Cli::try_parse_from(["optionpanel", "--puts-only"]).unwrap();
        let table = sample_table();

        let filter = cli.table_filter(&table).unwrap();
        let rows = table.filtered(&filter);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].contract().ticker, "O:B");
    }

    #[test]
    fn test_print_filter_inverted_range() {
        let cli = Cli::try_parse_from([
            "optionpanel",
            "--min-premium",
            "2",
            "--max-premium",
            "1",
        ])
        .unwrap();

        assert!(cli.table_filter(&sample_table()).is_err());
    }

    #[test]
    fn test_input_mode_treats_q_as_text() {
        let (tx, _rx) = mpsc::channel();
        let mut app = App::default();
        app.start_input(InputField::Ticker);
        app.input_buffer.clear();

        handle_event(&mut app, key('q'), &tx, "http://localhost");

        assert!(app.is_running());
        assert!(!app.is_awaiting_quit_confirmation());
        assert_eq!(app.input_buffer, "q");
    }

    #[test]
    fn test_fetch_ignored_while_loading() {
        let (tx, rx) = mpsc::channel();
        let mut app = App::default();

        handle_event(&mut app, key('f'), &tx, "http://localhost");
        handle_event(&mut app, key('f'), &tx, "http://localhost");

        assert!(app.is_loading_data());
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn test_quit_requires_two_presses() {
        let (tx, _rx) = mpsc::channel();
        let mut app = App::default();

        handle_event(&mut app, key('q'), &tx, "http://localhost");
        assert!(app.is_running());
        handle_event(&mut app, key('x'), &tx, "http://localhost");
        handle_event(&mut app, key('q'), &tx, "http://localhost");
        assert!(app.is_running());
        handle_event(&mut app, key('q'), &tx, "http://localhost");
        assert!(!app.is_running());
    }
}
