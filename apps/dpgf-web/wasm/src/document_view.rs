//! Document page: header, hierarchical view and spreadsheet-style table
//!
//! The page holds the fetched structure as an `Arc` snapshot. Totals and the
//! flat row list are memoized against that snapshot, so switching between
//! the two modes (or re-rendering either) never walks the tree again until a
//! refetch swaps the snapshot.
//!
//! `DocumentSlot` owns the open document and applies fetches in issue order:
//! a structure that arrives after a newer load was started is dropped.

use std::sync::Arc;

use dpgf_core::flatten::{flatten, grand_total, indent_px, FlatRow, HIERARCHY_INDENT_PX, TABLE_INDENT_PX};
use dpgf_core::{DpgfError, Memo, Rollup, StaleGuard, Ticket};
use dpgf_types::{DpgfStructure, LineItem, Section};
use serde::{Deserialize, Serialize};

use crate::boundary::ViewError;
use crate::format::{format_date, format_quantity, plain_euros};

pub const LOADING_MESSAGE: &str = "Chargement du DPGF...";
pub const LOAD_ERROR_MESSAGE: &str = "Erreur lors du chargement du DPGF";
pub const NOT_FOUND_MESSAGE: &str = "DPGF non trouvé";
pub const NO_STATUS: &str = "Non défini";
pub const NO_LOTS: &str = "Aucun lot trouvé pour ce DPGF";
pub const NO_SECTIONS: &str = "Aucune section dans ce lot";
pub const NO_ITEMS_IN_SECTION: &str = "Aucun élément dans cette section";
pub const NO_ITEMS: &str = "Aucun élément trouvé pour ce DPGF";
pub const TABLE_TITLE: &str = "Détails des éléments du DPGF (Format Excel)";

pub const ITEM_COLUMNS: [&str; 5] = ["Désignation", "Unité", "Qté", "PU HT", "Total HT"];
pub const TABLE_COLUMNS: [&str; 9] = [
    "N° Lot",
    "Nom Lot",
    "N° Section",
    "Titre Section",
    "Désignation",
    "Unité",
    "Qté",
    "PU HT",
    "Total HT",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Lots, then sections, then items ("Vue Hiérarchique")
    #[default]
    Hierarchy,
    /// One row per item ("Vue Excel")
    Table,
}

impl ViewMode {
    pub fn parse(mode: &str) -> Option<Self> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "hierarchy" | "bylots" | "lots" => Some(ViewMode::Hierarchy),
            "table" | "excel" => Some(ViewMode::Table),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Hierarchy => "Vue Hiérarchique",
            ViewMode::Table => "Vue Excel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentHeader {
    pub title: String,
    pub client: String,
    pub date: String,
    pub status: String,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRow {
    pub id: i64,
    pub designation: String,
    pub unit: String,
    pub quantity: String,
    pub unit_price: String,
    pub total: String,
}

impl ItemRow {
    fn new(item: &LineItem) -> Self {
        Self {
            id: item.id_element,
            designation: item.designation_exacte.clone(),
            unit: item.unite.clone(),
            quantity: format_quantity(item.quantite),
            unit_price: plain_euros(item.prix_unitaire_ht),
            total: plain_euros(item.prix_total_ht),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionBlock {
    pub id: i64,
    pub number: String,
    pub title: String,
    pub indent_px: u32,
    pub rows: Vec<ItemRow>,
    pub empty_message: Option<String>,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotBlock {
    pub id: i64,
    /// `Lot 02 - Gros œuvre`
    pub heading: String,
    pub sections: Vec<SectionBlock>,
    pub empty_message: Option<String>,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyView {
    pub lots: Vec<LotBlock>,
    pub empty_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub lot_number: String,
    pub lot_name: String,
    pub section_number: String,
    pub section_title: String,
    pub indent_px: u32,
    /// Rows of even lot ids get a shaded background
    pub shaded: bool,
    pub item: ItemRow,
}

impl TableRow {
    fn new(row: &FlatRow) -> Self {
        Self {
            lot_number: row.lot_number.clone(),
            lot_name: row.lot_name.clone(),
            section_number: row.section_number.clone(),
            section_title: row.section_title.clone(),
            indent_px: row.indent_px(TABLE_INDENT_PX),
            shaded: row.is_even_lot(),
            item: ItemRow::new(&row.item),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    pub total_label: String,
    pub total: String,
    pub empty_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DocumentBody {
    Hierarchy(HierarchyView),
    Table(TableView),
}

/// Everything the page shell needs for one render
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DocumentPage {
    Loading {
        message: String,
    },
    Failed {
        message: String,
        detail: String,
    },
    NotFound {
        message: String,
    },
    Ready {
        header: DocumentHeader,
        mode: ViewMode,
        body: DocumentBody,
    },
}

impl DocumentPage {
    pub fn loading() -> Self {
        DocumentPage::Loading {
            message: LOADING_MESSAGE.to_string(),
        }
    }

    /// Page for a failed structure fetch; a 404 reads as "not found"
    pub fn from_error(err: &DpgfError) -> Self {
        match err {
            DpgfError::Status { status: 404, .. } => DocumentPage::NotFound {
                message: NOT_FOUND_MESSAGE.to_string(),
            },
            other => DocumentPage::Failed {
                message: LOAD_ERROR_MESSAGE.to_string(),
                detail: other.to_string(),
            },
        }
    }
}

/// Derived views of one fetched document
pub struct DocumentView {
    structure: Arc<DpgfStructure>,
    rollup: Memo<DpgfStructure, Rollup>,
    rows: Memo<DpgfStructure, Vec<FlatRow>>,
}

impl DocumentView {
    pub fn new(structure: Arc<DpgfStructure>) -> Self {
        Self {
            structure,
            rollup: Memo::new(),
            rows: Memo::new(),
        }
    }

    pub fn structure(&self) -> &Arc<DpgfStructure> {
        &self.structure
    }

    /// Swap in a refetched snapshot; derived values follow on next access
    pub fn replace(&mut self, structure: Arc<DpgfStructure>) {
        self.structure = structure;
    }

    pub fn rollup(&mut self) -> &Rollup {
        self.rollup.get_or_compute(&self.structure, Rollup::compute)
    }

    pub fn rows(&mut self) -> &[FlatRow] {
        self.rows.get_or_compute(&self.structure, flatten)
    }

    pub fn header(&mut self) -> Result<DocumentHeader, ViewError> {
        let total = checked_total("total du DPGF", self.rollup().total)?;
        let doc = &self.structure;
        Ok(DocumentHeader {
            title: doc.nom_projet.clone(),
            client: doc
                .client
                .as_ref()
                .map(|c| c.nom_client.clone())
                .unwrap_or_default(),
            date: format_date(&doc.date_dpgf),
            status: doc
                .statut_offre
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| NO_STATUS.to_string()),
            total: plain_euros(Some(total)),
        })
    }

    pub fn hierarchy(&mut self) -> Result<HierarchyView, ViewError> {
        let structure = Arc::clone(&self.structure);
        let rollup = self.rollup();

        if structure.lots.is_empty() {
            return Ok(HierarchyView {
                lots: Vec::new(),
                empty_message: Some(NO_LOTS.to_string()),
            });
        }

        let lots = structure
            .lots
            .iter()
            .enumerate()
            .map(|(lot_idx, lot)| -> Result<LotBlock, ViewError> {
                let sections = lot
                    .sections
                    .iter()
                    .enumerate()
                    .map(|(section_idx, section)| {
                        section_block(section, rollup.section(lot_idx, section_idx))
                    })
                    .collect::<Result<Vec<_>, ViewError>>()?;
                Ok(LotBlock {
                    id: lot.id_lot,
                    heading: format!("Lot {} - {}", lot.numero_lot, lot.nom_lot),
                    sections,
                    empty_message: lot.sections.is_empty().then(|| NO_SECTIONS.to_string()),
                    total: plain_euros(Some(checked_total("total de lot", rollup.lot(lot_idx))?)),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HierarchyView {
            lots,
            empty_message: None,
        })
    }

    pub fn table(&mut self) -> Result<TableView, ViewError> {
        let rows = self.rows();
        Ok(TableView {
            title: TABLE_TITLE.to_string(),
            columns: TABLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows.iter().map(TableRow::new).collect(),
            total_label: "TOTAL GÉNÉRAL".to_string(),
            total: plain_euros(Some(checked_total("total général", grand_total(rows))?)),
            empty_message: rows.is_empty().then(|| NO_ITEMS.to_string()),
        })
    }

    pub fn page(&mut self, mode: ViewMode) -> Result<DocumentPage, ViewError> {
        let body = match mode {
            ViewMode::Hierarchy => DocumentBody::Hierarchy(self.hierarchy()?),
            ViewMode::Table => DocumentBody::Table(self.table()?),
        };
        Ok(DocumentPage::Ready {
            header: self.header()?,
            mode,
            body,
        })
    }
}

/// A sum past `f64::MAX` has no meaningful rendering
fn checked_total(what: &'static str, total: f64) -> Result<f64, ViewError> {
    if total.is_finite() {
        Ok(total)
    } else {
        Err(ViewError::malformed(what, "montant hors limites"))
    }
}

fn section_block(section: &Section, total: f64) -> Result<SectionBlock, ViewError> {
    Ok(SectionBlock {
        id: section.id_section,
        number: section.numero_section.clone(),
        title: section.titre_section.clone(),
        indent_px: indent_px(section.niveau_hierarchique, HIERARCHY_INDENT_PX),
        rows: section.elements.iter().map(ItemRow::new).collect(),
        empty_message: section
            .elements
            .is_empty()
            .then(|| NO_ITEMS_IN_SECTION.to_string()),
        total: plain_euros(Some(checked_total("total de section", total)?)),
    })
}

/// How a finished fetch was applied
#[derive(Debug)]
pub enum Applied {
    /// The structure is now the open document
    Opened,
    /// The fetch failed; the open document was closed
    Failed(DpgfError),
    /// A newer load was started meanwhile; nothing changed
    Stale,
}

/// The open document, fed by loads that may resolve out of order
#[derive(Default)]
pub struct DocumentSlot {
    view: Option<DocumentView>,
    guard: StaleGuard,
}

impl DocumentSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading `id`, superseding every load still in flight
    pub fn begin(&mut self, id: i64) -> Ticket<i64> {
        self.guard.issue(id)
    }

    /// Apply the outcome of the load `ticket` was issued for
    pub fn resolve(
        &mut self,
        ticket: &Ticket<i64>,
        outcome: Result<Arc<DpgfStructure>, DpgfError>,
    ) -> Applied {
        let Some(outcome) = self.guard.accept(ticket, outcome) else {
            return Applied::Stale;
        };
        match outcome {
            Ok(structure) => {
                match self.view.as_mut() {
                    // same document again: keep the memos, they key on the snapshot
                    Some(view) if view.structure().id_dpgf == structure.id_dpgf => {
                        view.replace(structure)
                    }
                    _ => self.view = Some(DocumentView::new(structure)),
                }
                Applied::Opened
            }
            Err(err) => {
                self.view = None;
                Applied::Failed(err)
            }
        }
    }

    /// Drop the open document; loads still in flight resolve as stale
    pub fn close(&mut self) {
        self.guard.supersede();
        self.view = None;
    }

    pub fn view_mut(&mut self) -> Option<&mut DocumentView> {
        self.view.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpgf_types::{ClientRef, Lot};
    use pretty_assertions::assert_eq;

    fn item(id: i64, total: Option<f64>) -> LineItem {
        LineItem {
            id_element: id,
            designation_exacte: format!("Élément {}", id),
            unite: "m²".to_string(),
            quantite: Some(2.0),
            prix_unitaire_ht: total.map(|t| t / 2.0),
            prix_total_ht: total,
            offre_acceptee: false,
        }
    }

    fn sample() -> Arc<DpgfStructure> {
        Arc::new(DpgfStructure {
            id_dpgf: 3,
            nom_projet: "Groupe scolaire".to_string(),
            date_dpgf: "2024-02-29".to_string(),
            statut_offre: None,
            client: Some(ClientRef {
                id_client: 1,
                nom_client: "Ville de Lyon".to_string(),
            }),
            lots: vec![
                Lot {
                    id_lot: 1,
                    numero_lot: "01".to_string(),
                    nom_lot: "Gros œuvre".to_string(),
                    sections: vec![
                        Section {
                            id_section: 10,
                            numero_section: "1.1".to_string(),
                            titre_section: "Fondations".to_string(),
                            niveau_hierarchique: 1,
                            elements: vec![item(100, Some(100.0))],
                        },
                        Section {
                            id_section: 11,
                            numero_section: "1.1.1".to_string(),
                            titre_section: "Semelles".to_string(),
                            niveau_hierarchique: 3,
                            elements: vec![item(101, Some(50.5)), item(102, None)],
                        },
                    ],
                },
                Lot {
                    id_lot: 2,
                    numero_lot: "02".to_string(),
                    nom_lot: "Charpente".to_string(),
                    sections: vec![],
                },
            ],
        })
    }

    #[test]
    fn test_header() {
        let mut view = DocumentView::new(sample());
        assert_eq!(
            view.header().unwrap(),
            DocumentHeader {
                title: "Groupe scolaire".to_string(),
                client: "Ville de Lyon".to_string(),
                date: "29/02/2024".to_string(),
                status: NO_STATUS.to_string(),
                total: "150.50 €".to_string(),
            }
        );
    }

    #[test]
    fn test_hierarchy_totals_and_placeholders() {
        let mut view = DocumentView::new(sample());
        let hierarchy = view.hierarchy().unwrap();

        assert_eq!(hierarchy.empty_message, None);
        assert_eq!(hierarchy.lots.len(), 2);

        let first = &hierarchy.lots[0];
        assert_eq!(first.heading, "Lot 01 - Gros œuvre");
        assert_eq!(first.total, "150.50 €");
        assert_eq!(first.sections[0].indent_px, 0);
        assert_eq!(first.sections[1].indent_px, 40);
        assert_eq!(first.sections[1].total, "50.50 €");
        assert_eq!(first.sections[1].rows[1].total, "0.00 €");
        assert_eq!(first.sections[1].rows[0].quantity, "2");

        let second = &hierarchy.lots[1];
        assert_eq!(second.empty_message.as_deref(), Some(NO_SECTIONS));
        assert_eq!(second.total, "0.00 €");
    }

    #[test]
    fn test_empty_document() {
        let mut view = DocumentView::new(Arc::new(DpgfStructure::default()));

        assert_eq!(view.hierarchy().unwrap().empty_message.as_deref(), Some(NO_LOTS));
        let table = view.table().unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(table.empty_message.as_deref(), Some(NO_ITEMS));
        assert_eq!(table.total, "0.00 €");
        assert_eq!(view.header().unwrap().total, "0.00 €");
    }

    #[test]
    fn test_table_rows_follow_traversal() {
        let mut view = DocumentView::new(sample());
        let table = view.table().unwrap();

        let ids: Vec<i64> = table.rows.iter().map(|r| r.item.id).collect();
        assert_eq!(ids, vec![100, 101, 102]);
        assert_eq!(table.rows[1].indent_px, 24);
        assert!(!table.rows[0].shaded);
        assert_eq!(table.total, "150.50 €");
        assert_eq!(table.columns.len(), 9);
    }

    #[test]
    fn test_mode_switch_does_not_recompute() {
        let snapshot = sample();
        let mut view = DocumentView::new(Arc::clone(&snapshot));

        view.page(ViewMode::Hierarchy).unwrap();
        view.page(ViewMode::Table).unwrap();
        view.page(ViewMode::Hierarchy).unwrap();
        assert_eq!(view.rollup.computations(), 1);
        assert_eq!(view.rows.computations(), 1);

        view.replace(Arc::new((*snapshot).clone()));
        view.page(ViewMode::Table).unwrap();
        assert_eq!(view.rollup.computations(), 2);
        assert_eq!(view.rows.computations(), 2);
    }

    #[test]
    fn test_error_pages() {
        let not_found = DpgfError::Status {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(
            DocumentPage::from_error(&not_found),
            DocumentPage::NotFound {
                message: NOT_FOUND_MESSAGE.to_string()
            }
        );

        let down = DpgfError::Transport("Failed to fetch".to_string());
        match DocumentPage::from_error(&down) {
            DocumentPage::Failed { message, .. } => assert_eq!(message, LOAD_ERROR_MESSAGE),
            other => panic!("unexpected page {:?}", other),
        }
    }

    #[test]
    fn test_view_mode_parse() {
        assert_eq!(ViewMode::parse("excel"), Some(ViewMode::Table));
        assert_eq!(ViewMode::parse("Hierarchy"), Some(ViewMode::Hierarchy));
        assert_eq!(ViewMode::parse("grid"), None);
    }

    #[test]
    fn test_overflowing_total_is_a_view_error() {
        let mut doc = (*sample()).clone();
        doc.lots[0].sections[0].elements = vec![item(1, Some(f64::MAX)), item(2, Some(f64::MAX))];
        let mut view = DocumentView::new(Arc::new(doc));

        let err = view.page(ViewMode::Table).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Données invalides (total général): montant hors limites"
        );
        assert!(view.page(ViewMode::Hierarchy).is_err());
    }

    fn structure(id: i64, name: &str) -> Arc<DpgfStructure> {
        Arc::new(DpgfStructure {
            id_dpgf: id,
            nom_projet: name.to_string(),
            ..Default::default()
        })
    }

    fn open_title(slot: &mut DocumentSlot) -> Option<String> {
        slot.view_mut()
            .map(|view| view.structure().nom_projet.clone())
    }

    #[test]
    fn test_late_load_does_not_replace_newer_document() {
        let mut slot = DocumentSlot::new();
        let first = slot.begin(1);
        let second = slot.begin(2);

        assert!(matches!(
            slot.resolve(&second, Ok(structure(2, "Médiathèque"))),
            Applied::Opened
        ));
        assert!(matches!(
            slot.resolve(&first, Ok(structure(1, "Gymnase"))),
            Applied::Stale
        ));
        assert_eq!(open_title(&mut slot).as_deref(), Some("Médiathèque"));
    }

    #[test]
    fn test_late_failure_does_not_close_newer_document() {
        let mut slot = DocumentSlot::new();
        let first = slot.begin(1);
        let second = slot.begin(2);

        slot.resolve(&second, Ok(structure(2, "Médiathèque")));
        let late = slot.resolve(&first, Err(DpgfError::Transport("Failed to fetch".to_string())));

        assert!(matches!(late, Applied::Stale));
        assert_eq!(open_title(&mut slot).as_deref(), Some("Médiathèque"));
    }

    #[test]
    fn test_current_failure_closes_document() {
        let mut slot = DocumentSlot::new();
        let first = slot.begin(1);
        slot.resolve(&first, Ok(structure(1, "Gymnase")));

        let second = slot.begin(1);
        let not_found = DpgfError::Status {
            status: 404,
            message: "Not Found".to_string(),
        };
        match slot.resolve(&second, Err(not_found)) {
            Applied::Failed(err) => assert!(matches!(
                DocumentPage::from_error(&err),
                DocumentPage::NotFound { .. }
            )),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(open_title(&mut slot).is_none());
    }

    #[test]
    fn test_reload_of_same_document_keeps_memos() {
        let mut slot = DocumentSlot::new();
        let snapshot = sample();
        let first = slot.begin(3);
        slot.resolve(&first, Ok(Arc::clone(&snapshot)));
        slot.view_mut().unwrap().page(ViewMode::Table).unwrap();

        let second = slot.begin(3);
        slot.resolve(&second, Ok(Arc::clone(&snapshot)));
        let view = slot.view_mut().unwrap();
        view.page(ViewMode::Table).unwrap();
        assert_eq!(view.rows.computations(), 1);
    }

    #[test]
    fn test_close_turns_in_flight_loads_stale() {
        let mut slot = DocumentSlot::new();
        let ticket = slot.begin(1);
        slot.close();

        assert!(matches!(
            slot.resolve(&ticket, Ok(structure(1, "Gymnase"))),
            Applied::Stale
        ));
        assert!(open_title(&mut slot).is_none());
    }
}
