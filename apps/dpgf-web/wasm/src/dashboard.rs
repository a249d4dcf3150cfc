//! Dashboard: document list, client picker and the two creation forms

use chrono::NaiveDate;
use dpgf_core::Route;
use dpgf_types::{Client, DocumentSummary, NewClient, NewDocument};
use serde::Serialize;

pub const TITLE: &str = "DPGF";
pub const COLUMNS: [&str; 3] = ["Projet", "Date", "Action"];
pub const LINK_LABEL: &str = "View";
pub const REFRESH_LABEL: &str = "Rafraîchir";
pub const UPLOAD_HEADING: &str = "Créer nouveau DPGF depuis un fichier";
pub const UPLOAD_BUTTON: &str = "Choisir un fichier";
pub const UPLOAD_ACCEPT: &str = ".xlsx";
pub const LOADING_MESSAGE: &str = "Loading...";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRow {
    pub id: i64,
    pub project: String,
    /// Shown as the backend sent it
    pub date: String,
    pub link: String,
    pub link_label: String,
}

impl DocumentRow {
    pub fn new(summary: &DocumentSummary) -> Self {
        Self {
            id: summary.id_dpgf,
            project: summary.nom_projet.clone(),
            date: summary.date_dpgf.clone(),
            link: Route::Document {
                id: summary.id_dpgf,
            }
            .path(),
            link_label: LINK_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<DocumentRow>,
    pub refresh_label: String,
    pub upload_heading: String,
    pub upload_button: String,
    pub upload_accept: String,
}

impl Dashboard {
    pub fn new(documents: &[DocumentSummary]) -> Self {
        Self {
            title: TITLE.to_string(),
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: documents.iter().map(DocumentRow::new).collect(),
            refresh_label: REFRESH_LABEL.to_string(),
            upload_heading: UPLOAD_HEADING.to_string(),
            upload_button: UPLOAD_BUTTON.to_string(),
            upload_accept: UPLOAD_ACCEPT.to_string(),
        }
    }
}

/// Entry of the client `<select>` in the new-document form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientOption {
    pub value: String,
    pub label: String,
}

/// Options for the client picker, placeholder first
pub fn client_options(clients: &[Client]) -> Vec<ClientOption> {
    std::iter::once(ClientOption {
        value: String::new(),
        label: "-- Client --".to_string(),
    })
    .chain(clients.iter().map(|c| ClientOption {
        value: c.id_client.to_string(),
        label: c.nom_client.clone(),
    }))
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    MissingClientName,
    MissingProjectName,
    InvalidDate(String),
    MissingClient,
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::MissingClientName => write!(f, "Le nom du client est obligatoire"),
            FormError::MissingProjectName => write!(f, "Le nom du projet est obligatoire"),
            FormError::InvalidDate(raw) => write!(f, "Date invalide: {:?}", raw),
            FormError::MissingClient => write!(f, "Veuillez choisir un client"),
        }
    }
}

impl std::error::Error for FormError {}

/// Raw fields of the "Nouveau Client" dialog
#[derive(Debug, Clone, Default)]
pub struct ClientForm {
    pub name: String,
}

impl ClientForm {
    pub fn validate(&self) -> Result<NewClient, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingClientName);
        }
        Ok(NewClient::new(name))
    }
}

/// Raw fields of the "Nouveau DPGF" dialog, as the inputs hold them
#[derive(Debug, Clone, Default)]
pub struct DocumentForm {
    pub project_name: String,
    /// `yyyy-mm-dd` from a date input
    pub date: String,
    /// Selected option value, empty for the placeholder
    pub client_id: String,
}

impl DocumentForm {
    pub fn validate(&self) -> Result<NewDocument, FormError> {
        let project_name = self.project_name.trim();
        if project_name.is_empty() {
            return Err(FormError::MissingProjectName);
        }
        let date = self.date.trim();
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(FormError::InvalidDate(date.to_string()));
        }
        let id_client = self
            .client_id
            .trim()
            .parse::<i64>()
            .map_err(|_| FormError::MissingClient)?;

        Ok(NewDocument {
            nom_projet: project_name.to_string(),
            date_dpgf: date.to_string(),
            id_client,
        })
    }
}
