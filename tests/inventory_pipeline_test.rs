//! End-to-end test of the pure allocation and flattening pipeline:
//! allocate sequences, render codes, build paths, and print the
//! resulting forest in inventory order.

use chrono::Utc;
use uuid::Uuid;

use archivio_entity::catalog::refs::{DocumentRef, DossierRef};
use archivio_entity::inventory::row::RowKind;
use archivio_entity::location::kind::LocationKind;
use archivio_entity::location::model::LocationNode;
use archivio_service::allocator::state::{BucketState, render};
use archivio_service::inventory::flatten;
use archivio_service::location::paths;

fn node(
    kind: LocationKind,
    prefix: &str,
    sequence: i32,
    name: &str,
    parent: Option<&LocationNode>,
) -> LocationNode {
    let code = render(prefix, sequence).unwrap();
    let full_path = paths::join(parent.map(|p| p.full_path.as_str()), &code);
    LocationNode {
        id: Uuid::new_v4(),
        kind,
        prefix: prefix.to_string(),
        sequence,
        code,
        name: name.to_string(),
        sort_order: 0,
        active: true,
        notes: None,
        full_path,
        parent_id: parent.map(|p| p.id),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn test_allocated_codes_produce_ordered_paths() {
    // Two offices out of one root-scope bucket.
    let mut root_bucket = BucketState::default();
    let first = root_bucket.allocate(None, false).unwrap();
    let second = root_bucket.allocate(None, false).unwrap();
    assert!(first < second);

    let office_a = node(LocationKind::Office, "OFF", first, "Main office", None);
    let office_b = node(LocationKind::Office, "OFF", second, "Branch office", None);
    assert!(office_a.full_path < office_b.full_path);

    // A room and a box chain under office A, each from its parent's bucket.
    let mut room_bucket = BucketState::default();
    let room = node(
        LocationKind::Room,
        "ROOM",
        room_bucket.allocate(None, false).unwrap(),
        "Archive room",
        Some(&office_a),
    );
    assert_eq!(paths::parent_of(&room.full_path), Some(office_a.full_path.as_str()));
}

#[test]
fn test_full_inventory_over_two_units() {
    let office_a = node(LocationKind::Office, "OFF", 0, "Main office", None);
    let office_b = node(LocationKind::Office, "OFF", 1, "Branch office", None);

    let d_parent = DossierRef {
        id: 1,
        code: "PR001".to_string(),
        title: "Estate case".to_string(),
        unit_id: office_a.id,
        parent_id: None,
        progressive: None,
    };
    let d_child = DossierRef {
        id: 2,
        code: String::new(),
        title: "Appeal sub-file".to_string(),
        unit_id: office_a.id,
        parent_id: Some(1),
        progressive: Some(4),
    };
    let d_other = DossierRef {
        id: 3,
        code: "AA001".to_string(),
        title: "Branch case".to_string(),
        unit_id: office_b.id,
        parent_id: None,
        progressive: None,
    };
    let doc_nested = DocumentRef {
        id: 10,
        code: String::new(),
        title: "Deed".to_string(),
        unit_id: office_a.id,
        dossier_id: Some(2),
        progressive: Some(1),
    };
    let doc_loose = DocumentRef {
        id: 11,
        code: String::new(),
        title: "Unfiled letter".to_string(),
        unit_id: office_a.id,
        dossier_id: None,
        progressive: None,
    };

    let report = flatten(
        &[office_b.clone(), office_a.clone()],
        &[d_parent, d_child, d_other],
        &[doc_nested, doc_loose],
    );
    assert!(report.malformed.is_empty());

    let summary: Vec<(RowKind, u32, &str)> = report
        .rows
        .iter()
        .map(|r| (r.kind, r.level, r.label.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (RowKind::Unit, 0, "Main office"),
            (RowKind::Dossier, 1, "Estate case"),
            (RowKind::Dossier, 2, "Appeal sub-file"),
            (RowKind::Document, 3, "Deed"),
            (RowKind::Document, 1, "Unfiled letter"),
            (RowKind::Unit, 0, "Branch office"),
            (RowKind::Dossier, 1, "Branch case"),
        ]
    );

    // Every non-unit row points at a row that exists earlier in the listing.
    for (i, row) in report.rows.iter().enumerate() {
        if let Some(parent_key) = &row.parent_node_key {
            let parent_pos = report
                .rows
                .iter()
                .position(|r| &r.node_key == parent_key);
            match parent_pos {
                Some(p) => assert!(p < i, "parent of {} must precede it", row.node_key),
                None => panic!("dangling parent key {parent_key}"),
            }
        }
    }
}
