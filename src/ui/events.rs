// ============================================================================
// Gestion des événements
// ============================================================================
// Lecture du clavier (crossterm) et helpers de reconnaissance des touches
//
// Raccourcis de l'écran principal :
//   t ticker   n nombre   Entrée/f fetch   c calls   p puts
//   m / M prime min / max   r reset plage   j k navigation   q quitter
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

/// Délai max d'attente d'une touche avant de renvoyer un Tick
const POLL_TIMEOUT: Duration = Duration::from_millis(250);

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Pas de touche pendant POLL_TIMEOUT (permet de redessiner le loading)
    Tick,
}

/// Gestionnaire d'événements (sans état)
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend au plus POLL_TIMEOUT
    /// - Les Release (Windows) et les autres événements deviennent des Tick
    pub fn next(&self) -> Result<Event> {
        if !event::poll(POLL_TIMEOUT)? {
            return Ok(Event::Tick);
        }

        match event::read()? {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
            _ => Ok(Event::Tick),
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helper : Convertir KeyEvent en action
// ============================================================================
// CONCEPT RUST : Pattern matching avancé
// - Match sur KeyCode pour identifier la touche
// - Peut aussi matcher sur les modifiers (Ctrl, Alt, Shift)
// ============================================================================

/// Vérifie si l'événement est la touche 'q' (quitter)
pub fn is_quit_event(event: &Event) -> bool {
    // CONCEPT RUST : Pattern matching avec if let
    // - Destructure Event::Key et vérifie le KeyCode en une ligne
    // - Plus élégant que match pour un seul cas
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
    } else {
        false
    }
}

/// Vérifie si l'événement est exactement le caractère `c` (sensible à la casse)
fn is_char_event(event: &Event, c: char) -> bool {
    if let Event::Key(key) = event {
        key.code == KeyCode::Char(c)
    } else {
        false
    }
}

/// Vérifie si l'événement est Échap
pub fn is_escape_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Esc)
    } else {
        false
    }
}

/// Vérifie si l'événement est Entrée
pub fn is_enter_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Enter)
    } else {
        false
    }
}

/// Vérifie si l'événement déclenche un fetch (Entrée ou 'f')
pub fn is_fetch_event(event: &Event) -> bool {
    is_enter_event(event) || is_char_event(event, 'f')
}

/// Vérifie si l'événement est la flèche vers le haut ou 'k' (vim)
///
/// CONCEPT RUST : Multiple patterns avec |
/// - KeyCode::Up | KeyCode::Char('k') : match l'un ou l'autre
pub fn is_up_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K'))
    } else {
        false
    }
}

/// Vérifie si l'événement est la flèche vers le bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J'))
    } else {
        false
    }
}

/// 't' : éditer le sous-jacent
pub fn is_edit_ticker_event(event: &Event) -> bool {
    is_char_event(event, 't')
}

/// 'n' : éditer le nombre de contrats
pub fn is_edit_limit_event(event: &Event) -> bool {
    is_char_event(event, 'n')
}

/// 'c' : afficher/masquer les calls
pub fn is_toggle_calls_event(event: &Event) -> bool {
    is_char_event(event, 'c')
}

/// 'p' : afficher/masquer les puts
pub fn is_toggle_puts_event(event: &Event) -> bool {
    is_char_event(event, 'p')
}

/// 'm' : éditer la prime minimale
pub fn is_min_premium_event(event: &Event) -> bool {
    is_char_event(event, 'm')
}

/// 'M' : éditer la prime maximale
pub fn is_max_premium_event(event: &Event) -> bool {
    is_char_event(event, 'M')
}

/// 'r' : réinitialiser la plage de primes
pub fn is_reset_range_event(event: &Event) -> bool {
    is_char_event(event, 'r')
}

/// Vérifie si l'événement est Backspace
pub fn is_backspace_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Backspace)
    } else {
        false
    }
}

/// Vérifie si l'événement est un caractère saisissable
/// (alphanumérique, '-', '.', ':' pour tickers et nombres)
pub fn is_input_char_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char(c) if c.is_alphanumeric() || matches!(c, '-' | '.' | ':'))
    } else {
        false
    }
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    if let Event::Key(key) = event {
        if let KeyCode::Char(c) = key.code {
            return Some(c);
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), event::KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key('q')));
        assert!(!is_quit_event(&key('a')));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_premium_keys_are_case_sensitive() {
        assert!(is_min_premium_event(&key('m')));
        assert!(!is_min_premium_event(&key('M')));
        assert!(is_max_premium_event(&key('M')));
    }

    #[test]
    fn test_fetch_event() {
        let enter = Event::Key(KeyEvent::new(KeyCode::Enter, event::KeyModifiers::empty()));
        assert!(is_fetch_event(&enter));
        assert!(is_fetch_event(&key('f')));
        assert!(!is_fetch_event(&Event::Tick));
    }

    #[test]
    fn test_input_chars() {
        assert!(is_input_char_event(&key('A')));
        assert!(is_input_char_event(&key('.')));
        assert!(is_input_char_event(&key(':')));
        assert!(!is_input_char_event(&key(' ')));
        assert_eq!(get_char_from_event(&key('7')), Some('7'));
    }
}
