//! Totals at section, lot and document granularity
//!
//! Every level sums the server-supplied `prix_total_ht` of the line items
//! below it. Missing collections and missing totals contribute zero.
//!
//! Lot and document totals accumulate line items in traversal order rather
//! than adding up partial sums, so they are bit-identical to summing the rows
//! produced by [`crate::flatten::flatten`].

use dpgf_types::{DpgfStructure, LineItem, Lot, Section};
use serde::Serialize;

pub fn section_total(section: &Section) -> f64 {
    section.elements.iter().map(LineItem::total).sum()
}

pub fn lot_total(lot: &Lot) -> f64 {
    lot_items(lot).map(LineItem::total).sum()
}

pub fn document_total(document: &DpgfStructure) -> f64 {
    document.lots.iter().flat_map(lot_items).map(LineItem::total).sum()
}

fn lot_items(lot: &Lot) -> impl Iterator<Item = &LineItem> {
    lot.sections.iter().flat_map(|section| section.elements.iter())
}

/// All totals of a document, per lot and per section
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rollup {
    pub total: f64,
    /// One entry per lot, in document order
    pub lots: Vec<LotRollup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LotRollup {
    pub id_lot: i64,
    pub total: f64,
    /// One entry per section, in lot order
    pub sections: Vec<SectionRollup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionRollup {
    pub id_section: i64,
    pub total: f64,
    pub item_count: usize,
}

impl Rollup {
    /// Totals for every level of `document`
    pub fn compute(document: &DpgfStructure) -> Self {
        let lots: Vec<LotRollup> = document
            .lots
            .iter()
            .map(|lot| {
                let sections: Vec<SectionRollup> = lot
                    .sections
                    .iter()
                    .map(|section| SectionRollup {
                        id_section: section.id_section,
                        total: section_total(section),
                        item_count: section.elements.len(),
                    })
                    .collect();
                LotRollup {
                    id_lot: lot.id_lot,
                    total: lot_total(lot),
                    sections,
                }
            })
            .collect();

        Self {
            total: document_total(document),
            lots,
        }
    }

    /// Total of the lot at `lot_idx`, zero when out of range
    pub fn lot(&self, lot_idx: usize) -> f64 {
        self.lots.get(lot_idx).map_or(0.0, |l| l.total)
    }

    /// Total of a section addressed by position, zero when out of range
    pub fn section(&self, lot_idx: usize, section_idx: usize) -> f64 {
        self.lots
            .get(lot_idx)
            .and_then(|l| l.sections.get(section_idx))
            .map_or(0.0, |s| s.total)
    }

    pub fn item_count(&self) -> usize {
        self.lots
            .iter()
            .flat_map(|l| l.sections.iter())
            .map(|s| s.item_count)
            .sum()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_two_sections_one_lot() {
        let doc = document(vec![lot(
            1,
            vec![
                section(1, 1, vec![item(1, Some(100.0))]),
                section(2, 1, vec![item(2, Some(50.5))]),
            ],
        )]);

        assert!((document_total(&doc) - 150.5).abs() < 1e-9);
        assert!((lot_total(&doc.lots[0]) - 150.5).abs() < 1e-9);
        assert_eq!(section_total(&doc.lots[0].sections[1]), 50.5);
    }

    #[test]
    fn test_empty_document_totals_zero() {
        let doc = document(vec![]);
        assert_eq!(document_total(&doc), 0.0);

        let rollup = Rollup::compute(&doc);
        assert_eq!(rollup.total, 0.0);
        assert!(rollup.lots.is_empty());
    }

    #[test]
    fn test_missing_totals_contribute_zero() {
        let doc = document(vec![lot(
            1,
            vec![
                section(1, 1, vec![item(1, None), item(2, Some(10.0))]),
                section(2, 2, vec![]),
            ],
        )]);
        assert_eq!(document_total(&doc), 10.0);
    }

    #[test]
    fn test_rollup_matches_per_level_functions() {
        let doc = document(vec![
            lot(1, vec![section(1, 1, vec![item(1, Some(12.0)), item(2, Some(8.0))])]),
            lot(2, vec![]),
            lot(
                3,
                vec![
                    section(2, 1, vec![item(3, Some(3.25))]),
                    section(3, 2, vec![item(4, Some(1.75))]),
                ],
            ),
        ]);
        let rollup = Rollup::compute(&doc);

        assert_eq!(rollup.total, document_total(&doc));
        assert_eq!(rollup.lot(0), 20.0);
        assert_eq!(rollup.lot(1), 0.0);
        assert_eq!(rollup.lot(2), 5.0);
        assert_eq!(rollup.section(2, 1), 1.75);
        assert_eq!(rollup.section(9, 0), 0.0);
        assert_eq!(rollup.item_count(), 4);
    }
}
