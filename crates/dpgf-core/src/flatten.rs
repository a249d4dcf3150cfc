//! Flat tabular projection of a document
//!
//! One row per line item, visiting lots, then sections, then items in the
//! order the server sent them. Empty or missing collections produce no rows.

use dpgf_types::{DpgfStructure, LineItem};
use serde::Serialize;

/// Indent step of the hierarchical view, in pixels per level
pub const HIERARCHY_INDENT_PX: u32 = 20;

/// Indent step of the table view, in pixels per level
pub const TABLE_INDENT_PX: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    pub lot_id: i64,
    pub lot_number: String,
    pub lot_name: String,
    pub section_id: i64,
    pub section_number: String,
    pub section_title: String,
    pub section_level: i32,
    pub item: LineItem,
}

impl FlatRow {
    /// Rows of even-numbered lots are shaded in the table view
    pub fn is_even_lot(&self) -> bool {
        self.lot_id % 2 == 0
    }

    pub fn indent_px(&self, step: u32) -> u32 {
        indent_px(self.section_level, step)
    }
}

pub fn flatten(document: &DpgfStructure) -> Vec<FlatRow> {
    let mut rows = Vec::new();
    for lot in &document.lots {
        for section in &lot.sections {
            for item in &section.elements {
                rows.push(FlatRow {
                    lot_id: lot.id_lot,
                    lot_number: lot.numero_lot.clone(),
                    lot_name: lot.nom_lot.clone(),
                    section_id: section.id_section,
                    section_number: section.numero_section.clone(),
                    section_title: section.titre_section.clone(),
                    section_level: section.niveau_hierarchique,
                    item: item.clone(),
                });
            }
        }
    }
    rows
}

/// Sum of line item totals over flattened rows
pub fn grand_total(rows: &[FlatRow]) -> f64 {
    rows.iter().map(|row| row.item.total()).sum()
}

/// Left indentation for a section at `level`; level 1 and below are flush
pub fn indent_px(level: i32, step: u32) -> u32 {
    let depth = level.saturating_sub(1).max(0) as u32;
    depth.saturating_mul(step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollup::fixtures::*;
    use crate::rollup::document_total;

    #[test]
    fn test_rows_follow_traversal_order() {
        let doc = document(vec![
            lot(
                2,
                vec![
                    section(20, 1, vec![item(1, Some(1.0)), item(2, Some(2.0))]),
                    section(21, 2, vec![item(3, Some(3.0))]),
                ],
            ),
            lot(1, vec![section(10, 1, vec![item(4, Some(4.0))])]),
        ]);

        let rows = flatten(&doc);
        let ids: Vec<i64> = rows.iter().map(|r| r.item.id_element).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(rows[2].section_level, 2);
        assert_eq!(rows[3].lot_number, "01");
    }

    #[test]
    fn test_grand_total_matches_document_total() {
        let doc = document(vec![lot(
            1,
            vec![
                section(1, 1, vec![item(1, Some(100.0))]),
                section(2, 1, vec![item(2, Some(50.5))]),
            ],
        )]);
        let rows = flatten(&doc);
        assert_eq!(grand_total(&rows), document_total(&doc));
        assert!((grand_total(&rows) - 150.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_collections_yield_no_rows() {
        assert!(flatten(&document(vec![])).is_empty());

        let doc = document(vec![lot(1, vec![]), lot(2, vec![section(1, 1, vec![])])]);
        assert!(flatten(&doc).is_empty());
        assert_eq!(grand_total(&flatten(&doc)), 0.0);
    }

    #[test]
    fn test_lot_parity() {
        let doc = document(vec![
            lot(1, vec![section(1, 1, vec![item(1, Some(1.0))])]),
            lot(2, vec![section(2, 1, vec![item(2, Some(1.0))])]),
        ]);
        let rows = flatten(&doc);
        assert!(!rows[0].is_even_lot());
        assert!(rows[1].is_even_lot());
    }

    #[test]
    fn test_indent() {
        assert_eq!(indent_px(1, HIERARCHY_INDENT_PX), 0);
        assert_eq!(indent_px(3, HIERARCHY_INDENT_PX), 40);
        assert_eq!(indent_px(2, TABLE_INDENT_PX), 12);
        assert_eq!(indent_px(0, TABLE_INDENT_PX), 0);
        assert_eq!(indent_px(-4, TABLE_INDENT_PX), 0);
    }
}
