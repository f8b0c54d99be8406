//! Flattens units, dossiers, and documents into one printable sequence.
//!
//! Ordering is a pure string sort over (unit path, sort key, node key).
//! Each dossier/document contributes a sort-key segment made of a tier
//! marker plus its order token; segments are dot-joined down the nesting
//! chain. The tier markers make dossiers sort before documents at the
//! same nesting point, and zero-padded order tokens make lexicographic
//! order equal numeric order.
//!
//! Dossier nesting is externally owned and assumed acyclic; a cycle
//! found during traversal is reported per subtree instead of looping,
//! and unaffected subtrees still emit.

use std::collections::HashMap;

use archivio_entity::catalog::refs::{DocumentRef, DossierRef};
use archivio_entity::inventory::row::{
    DOCUMENT_TIER, DOSSIER_TIER, InventoryRow, RowKind, order_token,
};
use archivio_entity::location::model::LocationNode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dossier ids implicated in a nesting inconsistency under one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MalformedSubtree {
    /// The unit whose listing is affected.
    pub unit_id: Uuid,
    /// The dossiers on the broken parent chain, in traversal order.
    pub dossier_ids: Vec<i64>,
}

/// The flattened listing plus any subtrees skipped as malformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlattenReport {
    /// Ordered printable rows.
    pub rows: Vec<InventoryRow>,
    /// Subtrees skipped because of dossier nesting cycles.
    pub malformed: Vec<MalformedSubtree>,
}

/// Resolved position of a dossier within its unit listing.
#[derive(Debug, Clone)]
struct Resolved {
    level: u32,
    sort_key: String,
    parent_key: String,
}

/// Row key for a unit.
fn unit_key(id: Uuid) -> String {
    format!("U:{id}")
}

/// Row key for a dossier.
fn dossier_key(id: i64) -> String {
    format!("F:{id}")
}

/// Row key for a document.
fn document_key(id: i64) -> String {
    format!("D:{id}")
}

/// Produce the ordered inventory for the given root units.
///
/// Pure function of its inputs: no side effects, stable under
/// re-invocation. Dossiers and documents listed under units outside
/// `units` are ignored (scoped printing).
pub fn flatten(
    units: &[LocationNode],
    dossiers: &[DossierRef],
    documents: &[DocumentRef],
) -> FlattenReport {
    let unit_paths: HashMap<Uuid, &str> = units
        .iter()
        .map(|u| (u.id, u.full_path.as_str()))
        .collect();
    let by_id: HashMap<i64, &DossierRef> = dossiers.iter().map(|d| (d.id, d)).collect();

    let mut rows: Vec<InventoryRow> = Vec::new();
    let mut malformed: Vec<MalformedSubtree> = Vec::new();

    for unit in units {
        rows.push(InventoryRow {
            node_key: unit_key(unit.id),
            kind: RowKind::Unit,
            level: 0,
            sort_key: String::new(),
            unit_path: unit.full_path.clone(),
            label: unit.name.clone(),
            parent_node_key: None,
            code: unit.code.clone(),
        });
    }

    // Resolve every dossier's level and sort key by walking parent
    // chains, memoized. A dossier whose parent is missing or listed
    // under a different unit starts a fresh chain at level 1.
    let mut resolved: HashMap<i64, Option<Resolved>> = HashMap::new();
    for dossier in dossiers {
        resolve(dossier, &by_id, &unit_paths, &mut resolved, &mut malformed);
    }

    for dossier in dossiers {
        let Some(unit_path) = unit_paths.get(&dossier.unit_id) else {
            continue;
        };
        let Some(Some(pos)) = resolved.get(&dossier.id) else {
            continue; // malformed chain, already reported
        };
        rows.push(InventoryRow {
            node_key: dossier_key(dossier.id),
            kind: RowKind::Dossier,
            level: pos.level,
            sort_key: pos.sort_key.clone(),
            unit_path: (*unit_path).to_string(),
            label: dossier.title.clone(),
            parent_node_key: Some(pos.parent_key.clone()),
            code: dossier.code.clone(),
        });
    }

    for document in documents {
        let Some(unit_path) = unit_paths.get(&document.unit_id) else {
            continue;
        };
        let segment = format!(
            "{DOCUMENT_TIER}{}",
            order_token(&document.code, document.progressive, document.id)
        );
        let parent = document
            .dossier_id
            .and_then(|d| resolved.get(&d).cloned().flatten());
        let row = match (document.dossier_id, parent) {
            (Some(dossier_id), Some(pos)) => InventoryRow {
                node_key: document_key(document.id),
                kind: RowKind::Document,
                level: pos.level + 1,
                sort_key: format!("{}.{segment}", pos.sort_key),
                unit_path: (*unit_path).to_string(),
                label: document.title.clone(),
                parent_node_key: Some(dossier_key(dossier_id)),
                code: document.code.clone(),
            },
            (Some(_), None) => continue, // parent dossier skipped as malformed
            (None, _) => InventoryRow {
                node_key: document_key(document.id),
                kind: RowKind::Document,
                level: 1,
                sort_key: segment,
                unit_path: (*unit_path).to_string(),
                label: document.title.clone(),
                parent_node_key: Some(unit_key(document.unit_id)),
                code: document.code.clone(),
            },
        };
        rows.push(row);
    }

    rows.sort_by(|a, b| {
        (a.unit_path.as_str(), a.sort_key.as_str(), a.node_key.as_str()).cmp(&(
            b.unit_path.as_str(),
            b.sort_key.as_str(),
            b.node_key.as_str(),
        ))
    });

    FlattenReport { rows, malformed }
}

/// Resolve one dossier's position, walking its parent chain iteratively
/// so nesting depth is unbounded. Memoizes into `resolved`; `None`
/// marks a dossier on a broken (cyclic) chain.
fn resolve(
    dossier: &DossierRef,
    by_id: &HashMap<i64, &DossierRef>,
    unit_paths: &HashMap<Uuid, &str>,
    resolved: &mut HashMap<i64, Option<Resolved>>,
    malformed: &mut Vec<MalformedSubtree>,
) {
    if resolved.contains_key(&dossier.id) || !unit_paths.contains_key(&dossier.unit_id) {
        return;
    }

    // Collect the unresolved tail of the parent chain, nearest first.
    let mut chain: Vec<i64> = Vec::new();
    let mut cursor = Some(dossier.id);
    let base: Option<(i64, Resolved)> = loop {
        let Some(id) = cursor else {
            break None; // reached a root dossier
        };
        if let Some(hit) = resolved.get(&id) {
            break match hit {
                Some(pos) => Some((id, pos.clone())),
                None => {
                    // Chain joins an already-condemned subtree.
                    for member in &chain {
                        resolved.insert(*member, None);
                    }
                    return;
                }
            };
        }
        if chain.contains(&id) {
            // Cycle: condemn every dossier on the walked chain.
            for member in &chain {
                resolved.insert(*member, None);
            }
            malformed.push(MalformedSubtree {
                unit_id: dossier.unit_id,
                dossier_ids: chain,
            });
            return;
        }
        chain.push(id);
        cursor = by_id.get(&id).and_then(|d| {
            // A parent outside this unit does not nest; treat as root.
            d.parent_id
                .filter(|p| by_id.get(p).is_some_and(|pd| pd.unit_id == d.unit_id))
        });
    };

    // Unwind: compute positions root-most first.
    let mut parent = base;
    for id in chain.into_iter().rev() {
        let d = by_id[&id];
        let segment = format!(
            "{DOSSIER_TIER}{}",
            order_token(&d.code, d.progressive, d.id)
        );
        let pos = match &parent {
            Some((parent_id, p)) => Resolved {
                level: p.level + 1,
                sort_key: format!("{}.{segment}", p.sort_key),
                parent_key: dossier_key(*parent_id),
            },
            None => Resolved {
                level: 1,
                sort_key: segment,
                parent_key: unit_key(d.unit_id),
            },
        };
        resolved.insert(id, Some(pos.clone()));
        parent = Some((id, pos));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivio_entity::location::kind::LocationKind;
    use chrono::Utc;

    fn unit(code: &str, name: &str) -> LocationNode {
        LocationNode {
            id: Uuid::new_v4(),
            kind: LocationKind::Office,
            prefix: "OFF".to_string(),
            sequence: 1,
            code: code.to_string(),
            name: name.to_string(),
            sort_order: 0,
            active: true,
            notes: None,
            full_path: code.to_string(),
            parent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn dossier(id: i64, code: &str, unit_id: Uuid, parent: Option<i64>) -> DossierRef {
        DossierRef {
            id,
            code: code.to_string(),
            title: format!("Dossier {id}"),
            unit_id,
            parent_id: parent,
            progressive: None,
        }
    }

    fn document(id: i64, code: &str, unit_id: Uuid, dossier: Option<i64>) -> DocumentRef {
        DocumentRef {
            id,
            code: code.to_string(),
            title: format!("Document {id}"),
            unit_id,
            dossier_id: dossier,
            progressive: None,
        }
    }

    #[test]
    fn test_fixture_ordering() {
        // Unit A holds dossier D1 holding Doc1, plus Doc2 directly on
        // the unit. Dossier tier beats document tier at the same nesting
        // point, and the two documents compare by their parents' keys.
        let a = unit("A001", "Archive A");
        let d1 = dossier(1, "D001", a.id, None);
        let doc1 = document(1, "00000001", a.id, Some(1));
        let doc2 = document(2, "", a.id, None);

        let report = flatten(&[a.clone()], &[d1], &[doc1, doc2]);
        assert!(report.malformed.is_empty());

        let kinds: Vec<(RowKind, u32)> =
            report.rows.iter().map(|r| (r.kind, r.level)).collect();
        assert_eq!(
            kinds,
            vec![
                (RowKind::Unit, 0),
                (RowKind::Dossier, 1),
                (RowKind::Document, 2),
                (RowKind::Document, 1),
            ]
        );
        assert_eq!(report.rows[1].code, "D001");
        assert_eq!(report.rows[2].parent_node_key.as_deref(), Some("F:1"));
        let unit_row_key = format!("U:{}", a.id);
        assert_eq!(
            report.rows[3].parent_node_key.as_deref(),
            Some(unit_row_key.as_str())
        );
    }

    #[test]
    fn test_units_sort_by_path_and_nothing_leaks_across() {
        let a = unit("A001", "First");
        let b = unit("B001", "Second");
        let da = dossier(1, "ZZZ", a.id, None);
        let db = dossier(2, "AAA", b.id, None);

        let report = flatten(&[b.clone(), a.clone()], &[da, db], &[]);
        let keys: Vec<&str> = report.rows.iter().map(|r| r.node_key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                format!("U:{}", a.id).as_str(),
                "F:1",
                format!("U:{}", b.id).as_str(),
                "F:2",
            ]
        );
    }

    #[test]
    fn test_sub_dossier_nesting_unbounded() {
        let a = unit("A001", "Archive A");
        let chain: Vec<DossierRef> = (0..50)
            .map(|i| dossier(i, "", a.id, if i == 0 { None } else { Some(i - 1) }))
            .collect();

        let report = flatten(&[a], &chain, &[]);
        assert!(report.malformed.is_empty());
        let last = report.rows.last().unwrap();
        assert_eq!(last.node_key, "F:49");
        assert_eq!(last.level, 50);
        assert_eq!(last.parent_node_key.as_deref(), Some("F:48"));
    }

    #[test]
    fn test_dossier_cycle_is_reported_not_looped() {
        let a = unit("A001", "Archive A");
        // 1 -> 2 -> 1 is a cycle; 3 is independent and must survive.
        let d1 = dossier(1, "", a.id, Some(2));
        let d2 = dossier(2, "", a.id, Some(1));
        let d3 = dossier(3, "OK", a.id, None);
        let doc = document(10, "", a.id, Some(1)); // attached to the cycle

        let report = flatten(&[a], &[d1, d2, d3], &[doc]);
        assert_eq!(report.malformed.len(), 1);
        let bad = &report.malformed[0];
        assert!(bad.dossier_ids.contains(&1) && bad.dossier_ids.contains(&2));

        let keys: Vec<&str> = report.rows.iter().map(|r| r.node_key.as_str()).collect();
        assert!(keys.contains(&"F:3"));
        assert!(!keys.iter().any(|k| *k == "F:1" || *k == "F:2" || *k == "D:10"));
    }

    #[test]
    fn test_missing_progressive_falls_back_to_padded_id() {
        let a = unit("A001", "Archive A");
        // Codeless dossiers order by zero-padded id: 9 before 10.
        let d9 = dossier(9, "", a.id, None);
        let d10 = dossier(10, "", a.id, None);

        let report = flatten(&[a], &[d10, d9], &[]);
        let keys: Vec<&str> = report.rows.iter().map(|r| r.node_key.as_str()).collect();
        assert_eq!(keys[1], "F:9");
        assert_eq!(keys[2], "F:10");
    }

    #[test]
    fn test_flatten_is_stable_under_reinvocation() {
        let a = unit("A001", "Archive A");
        let dossiers = vec![dossier(1, "D001", a.id, None), dossier(2, "", a.id, Some(1))];
        let documents = vec![document(1, "", a.id, Some(2)), document(2, "", a.id, None)];

        let first = flatten(std::slice::from_ref(&a), &dossiers, &documents);
        let second = flatten(std::slice::from_ref(&a), &dossiers, &documents);
        let keys = |r: &FlattenReport| {
            r.rows
                .iter()
                .map(|row| (row.node_key.clone(), row.sort_key.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(&first), keys(&second));
    }

    #[test]
    fn test_parent_in_other_unit_starts_fresh_chain() {
        let a = unit("A001", "Archive A");
        let b = unit("B001", "Archive B");
        let parent = dossier(1, "", b.id, None);
        // Listed under A but pointing at a parent listed under B:
        // nesting only applies within the same unit.
        let stray = dossier(2, "", a.id, Some(1));

        let report = flatten(&[a.clone(), b], &[parent, stray], &[]);
        assert!(report.malformed.is_empty());
        let row = report.rows.iter().find(|r| r.node_key == "F:2").unwrap();
        assert_eq!(row.level, 1);
        assert_eq!(row.parent_node_key.as_deref(), Some(format!("U:{}", a.id).as_str()));
    }
}
