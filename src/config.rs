// ============================================================================
// Configuration : résolution de la clé API Polygon
// ============================================================================
// Ordre de résolution :
// 1. Variable d'environnement POLYGON_API_KEY (un fichier .env est chargé avant)
// 2. Fichier de secrets TOML, clé "polygon_api_key"
//    - ./.secrets.toml
//    - ~/.config/optionpanel/secrets.toml (Linux, via dirs)
//
// Aucune validation au-delà de la présence : une valeur vide = non configurée.
// ============================================================================

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Variable d'environnement portant la clé API
pub const API_KEY_ENV: &str = "POLYGON_API_KEY";

/// Nom de la clé dans le fichier de secrets
pub const API_KEY_SECRET: &str = "polygon_api_key";

/// Variable d'environnement pour surcharger l'URL de l'API
pub const BASE_URL_ENV: &str = "POLYGON_BASE_URL";

/// Erreurs de configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key is missing. Set POLYGON_API_KEY env var or add polygon_api_key to the secrets file.")]
    MissingApiKey,

    #[error("Failed to read secrets file {path}: {source}")]
    SecretsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse secrets file {path}: {source}")]
    SecretsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ============================================================================
// SecretsStore : fichier de secrets TOML
// ============================================================================

/// Store de secrets clé → valeur (table TOML de premier niveau)
#[derive(Debug, Clone, Default)]
pub struct SecretsStore {
    values: toml::Table,
}

impl SecretsStore {
    /// Store vide (aucun fichier trouvé)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse un contenu TOML
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let values: toml::Table = toml::from_str(content)?;
        Ok(Self { values })
    }

    /// Charge un fichier de secrets
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::SecretsIo {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content).map_err(|source| ConfigError::SecretsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Charge le premier fichier existant parmi les emplacements connus
    ///
    /// Un fichier illisible est loggé et traité comme absent.
    pub fn discover() -> Self {
        Self::discover_in(&secrets_candidates())
    }

    /// Comme `discover`, sur une liste de chemins explicite
    pub fn discover_in(candidates: &[PathBuf]) -> Self {
        let Some(path) = candidates.iter().find(|p| p.is_file()) else {
            debug!("No secrets file found");
            return Self::empty();
        };

        match Self::load(path) {
            Ok(store) => {
                debug!(path = %path.display(), "Loaded secrets file");
                store
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable secrets file");
                Self::empty()
            }
        }
    }

    /// Retourne une valeur string du store
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }
}

/// Emplacements du fichier de secrets, par ordre de priorité
pub fn secrets_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(".secrets.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("optionpanel").join("secrets.toml"));
    }
    candidates
}

// ============================================================================
// Résolution de la clé API
// ============================================================================

/// Résout la clé API depuis l'environnement puis le store de secrets
///
/// Retourne None si la clé n'est configurée nulle part.
pub fn resolve_api_key() -> Option<String> {
    // .env ne remplace pas une variable déjà définie
    dotenv::dotenv().ok();

    let from_env = std::env::var(API_KEY_ENV).ok();
    resolve_api_key_from(from_env, &SecretsStore::discover())
}

/// Règle de priorité : env non-vide, sinon secret non-vide
pub fn resolve_api_key_from(env_value: Option<String>, secrets: &SecretsStore) -> Option<String> {
    if let Some(key) = env_value.filter(|k| !k.trim().is_empty()) {
        debug!(source = "env", "API key resolved");
        return Some(key);
    }

    let from_secrets = secrets
        .get(API_KEY_SECRET)
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string);

    if from_secrets.is_some() {
        debug!(source = "secrets", "API key resolved");
    }
    from_secrets
}

/// Transforme l'absence de clé en erreur de configuration
pub fn require_api_key(api_key: Option<String>) -> Result<String, ConfigError> {
    api_key.ok_or(ConfigError::MissingApiKey)
}

// ============================================================================
// Tests unitaires
// ============================================================================
