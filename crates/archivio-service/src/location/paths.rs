//! Pure full-path computation helpers.
//!
//! The invariant maintained everywhere: a node's full path equals its
//! parent's full path, a slash, and the node's code (roots carry just
//! their code). Move and recode cascades rewrite descendant paths with
//! `rebase`, one locked row at a time.

/// Join a parent path and a code into a child path.
pub fn join(parent_path: Option<&str>, code: &str) -> String {
    match parent_path {
        Some(parent) => format!("{parent}/{code}"),
        None => code.to_string(),
    }
}

/// The parent portion of a full path, or None for roots.
pub fn parent_of(full_path: &str) -> Option<&str> {
    full_path.rsplit_once('/').map(|(parent, _)| parent)
}

/// Rewrite a descendant's path after its ancestor moved from `old_root`
/// to `new_root`. Returns None when the path is not inside the moved
/// subtree.
pub fn rebase(path: &str, old_root: &str, new_root: &str) -> Option<String> {
    let rest = path.strip_prefix(old_root)?;
    if !rest.starts_with('/') {
        return None;
    }
    Some(format!("{new_root}{rest}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_root_and_child() {
        assert_eq!(join(None, "OFF001"), "OFF001");
        assert_eq!(join(Some("OFF001"), "ROOM001"), "OFF001/ROOM001");
    }

    #[test]
    fn test_six_level_chain() {
        // Office > Room > Shelf > ShelfLevel > Box > Folder, each the
        // first child created at its level.
        let mut path: Option<String> = None;
        for code in ["OFF001", "ROOM001", "SHELF001", "LVL001", "BOX001", "FLD001"] {
            path = Some(join(path.as_deref(), code));
        }
        assert_eq!(
            path.unwrap(),
            "OFF001/ROOM001/SHELF001/LVL001/BOX001/FLD001"
        );
    }

    #[test]
    fn test_parent_of() {
        assert_eq!(parent_of("OFF001"), None);
        assert_eq!(parent_of("OFF001/ROOM001/BOX001"), Some("OFF001/ROOM001"));
    }

    #[test]
    fn test_rebase_descendants() {
        assert_eq!(
            rebase("OFF001/ROOM001/BOX001", "OFF001/ROOM001", "OFF001/ROOM002").as_deref(),
            Some("OFF001/ROOM002/BOX001")
        );
        // A sibling whose path merely shares the prefix string is untouched.
        assert_eq!(rebase("OFF001/ROOM0010", "OFF001/ROOM001", "X"), None);
        assert_eq!(rebase("OFF002/ROOM001", "OFF001", "X"), None);
    }

    #[test]
    fn test_rebase_cascade_over_subtree() {
        // A box subtree moves from one room to another; every descendant
        // path, however deep, follows, and each level still equals its
        // parent plus "/" plus its own code.
        let old_root = "OFF001/ROOM001/SHELF001";
        let new_root = "OFF001/ROOM002/SHELF003";
        let descendants = [
            "OFF001/ROOM001/SHELF001/LVL001",
            "OFF001/ROOM001/SHELF001/LVL001/BOX001",
            "OFF001/ROOM001/SHELF001/LVL001/BOX001/FLD001",
            "OFF001/ROOM001/SHELF001/LVL002",
        ];
        let rebased: Vec<String> = descendants
            .iter()
            .map(|p| rebase(p, old_root, new_root).unwrap())
            .collect();
        assert_eq!(
            rebased,
            [
                "OFF001/ROOM002/SHELF003/LVL001",
                "OFF001/ROOM002/SHELF003/LVL001/BOX001",
                "OFF001/ROOM002/SHELF003/LVL001/BOX001/FLD001",
                "OFF001/ROOM002/SHELF003/LVL002",
            ]
        );
        for path in &rebased {
            let (parent, code) = path.rsplit_once('/').unwrap();
            assert_eq!(join(Some(parent), code), *path);
        }
    }

    #[test]
    fn test_rebase_preserves_parent_identity() {
        // After rebasing, each level still equals parent + "/" + code.
        let moved = rebase("A/B/C/D", "A/B", "Z/Y").unwrap();
        assert_eq!(moved, "Z/Y/C/D");
        assert_eq!(parent_of(&moved), Some("Z/Y/C"));
    }
}
