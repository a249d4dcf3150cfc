//! Property tests over generated documents and search inputs
//!
//! Run with: cargo test -p dpgf-core --test property_tests

use std::sync::Arc;

use dpgf_core::config::SearchSettings;
use dpgf_core::flatten::{flatten, grand_total};
use dpgf_core::rollup::{document_total, Rollup};
use dpgf_core::search::{SearchMachine, SearchVariant};
use dpgf_core::{format_price_tolerant, Memo};
use dpgf_types::{DpgfStructure, LineItem, Lot, Section};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn line_item() -> impl Strategy<Value = LineItem> {
    (
        0i64..10_000,
        proptest::option::of(-1_000_000.0f64..1_000_000.0),
        proptest::option::of(0.0f64..500.0),
    )
        .prop_map(|(id, total, quantity)| LineItem {
            id_element: id,
            designation_exacte: format!("Ouvrage {}", id),
            unite: "m²".to_string(),
            quantite: quantity,
            prix_unitaire_ht: None,
            prix_total_ht: total,
            offre_acceptee: false,
        })
}

fn section() -> impl Strategy<Value = Section> {
    (0i64..1000, -2i32..6, prop::collection::vec(line_item(), 0..6)).prop_map(
        |(id, level, elements)| Section {
            id_section: id,
            numero_section: id.to_string(),
            titre_section: format!("Section {}", id),
            niveau_hierarchique: level,
            elements,
        },
    )
}

fn lot() -> impl Strategy<Value = Lot> {
    (0i64..100, prop::collection::vec(section(), 0..5)).prop_map(|(id, sections)| Lot {
        id_lot: id,
        numero_lot: format!("{:02}", id),
        nom_lot: format!("Lot {}", id),
        sections,
    })
}

fn document() -> impl Strategy<Value = DpgfStructure> {
    prop::collection::vec(lot(), 0..5).prop_map(|lots| DpgfStructure {
        id_dpgf: 1,
        nom_projet: "Groupe scolaire".to_string(),
        lots,
        ..Default::default()
    })
}

// ============================================================================
// Aggregation
// ============================================================================

proptest! {
    #[test]
    fn prop_rollup_equals_flattened_sum(doc in document()) {
        let rows = flatten(&doc);
        prop_assert_eq!(document_total(&doc), grand_total(&rows));
        prop_assert_eq!(Rollup::compute(&doc).total, grand_total(&rows));
    }

    #[test]
    fn prop_flatten_has_one_row_per_item(doc in document()) {
        let expected: usize = doc
            .lots
            .iter()
            .flat_map(|l| l.sections.iter())
            .map(|s| s.elements.len())
            .sum();
        let rows = flatten(&doc);
        prop_assert_eq!(rows.len(), expected);
        prop_assert_eq!(Rollup::compute(&doc).item_count(), expected);
    }

    #[test]
    fn prop_flatten_preserves_traversal_order(doc in document()) {
        let expected: Vec<i64> = doc
            .lots
            .iter()
            .flat_map(|l| l.sections.iter())
            .flat_map(|s| s.elements.iter())
            .map(|e| e.id_element)
            .collect();
        let actual: Vec<i64> = flatten(&doc).iter().map(|r| r.item.id_element).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_memo_computes_once_per_snapshot(doc in document(), reads in 1usize..8) {
        let snapshot = Arc::new(doc);
        let mut memo: Memo<DpgfStructure, f64> = Memo::new();
        for _ in 0..reads {
            memo.get_or_compute(&snapshot, document_total);
        }
        prop_assert_eq!(memo.computations(), 1);
    }

    #[test]
    fn prop_formatter_total_is_never_empty(amount in proptest::option::of(any::<f64>())) {
        let text = format_price_tolerant(amount);
        prop_assert!(text.ends_with('€'));
    }
}

// ============================================================================
// Search debouncing
// ============================================================================

proptest! {
    /// Keystrokes closer together than the quiet period fire exactly one
    /// query, carrying the last text, one period after the last keystroke
    #[test]
    fn prop_burst_fires_once(gaps in prop::collection::vec(0u64..500, 1..12)) {
        let settings = SearchSettings::default();
        let mut machine = SearchMachine::new(SearchVariant::fuzzy(&settings), &settings);

        let mut now = 0;
        let mut last_text = String::new();
        let mut fired = Vec::new();
        for (i, gap) in gaps.iter().enumerate() {
            now += gap;
            last_text = format!("béton {}", i);
            machine.input(last_text.clone(), now);
            if let Some(out) = machine.poll(now) {
                fired.push((now, out));
            }
        }
        let last_keystroke = now;
        for t in last_keystroke..=last_keystroke + 1000 {
            if let Some(out) = machine.poll(t) {
                fired.push((t, out));
            }
        }

        prop_assert_eq!(fired.len(), 1);
        let (at, (ticket, request)) = &fired[0];
        prop_assert_eq!(*at, last_keystroke + settings.debounce_ms);
        prop_assert_eq!(ticket.key(), &request.query_key());
        prop_assert_eq!(
            request.endpoint().query().first().map(|(_, v)| v.clone()),
            Some(last_text)
        );
    }
}
