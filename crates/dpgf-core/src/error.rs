use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DpgfError {
    #[error("Erreur de connexion API: {0}")]
    Transport(String),

    #[error("Le serveur a répondu {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Réponse illisible: {0}")]
    Decode(String),

    #[error("Fichier non pris en charge: {0} (seuls les fichiers .xlsx sont acceptés)")]
    UnsupportedFile(String),

    #[error("Route inconnue: {0}")]
    InvalidRoute(String),

    #[error("Configuration invalide: {0}")]
    Config(String),
}

impl DpgfError {
    /// Whether a read may be retried after this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, DpgfError::Transport(_) | DpgfError::Status { .. })
    }
}

impl From<serde_json::Error> for DpgfError {
    fn from(err: serde_json::Error) -> Self {
        DpgfError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DpgfError>;
