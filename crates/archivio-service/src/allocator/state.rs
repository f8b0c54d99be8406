//! Pure allocation state for a single (scope, prefix) bucket.
//!
//! The database repository is the source of truth at runtime; this state
//! machine holds the same rules in memory so they can be exercised
//! without a database and reused when rebuilding allocator state during
//! bulk import.

use std::collections::BTreeSet;

use archivio_core::error::AppError;
use archivio_core::result::AppResult;

/// Fixed zero-padding width of the numeric part of a code.
pub const CODE_WIDTH: usize = 3;

/// Largest sequence representable at [`CODE_WIDTH`] digits.
pub const MAX_SEQUENCE: i32 = 999;

/// Render a code from its prefix and sequence.
///
/// Overflow past the padding capacity is an error, never a silent
/// truncation.
pub fn render(prefix: &str, sequence: i32) -> AppResult<String> {
    if !(0..=MAX_SEQUENCE).contains(&sequence) {
        return Err(AppError::code_exhausted(format!(
            "Sequence {sequence} does not fit {CODE_WIDTH} digits for prefix '{prefix}'"
        )));
    }
    Ok(format!("{prefix}{sequence:0width$}", width = CODE_WIDTH))
}

/// Validate and canonicalize a code prefix.
///
/// Prefixes flow into codes and materialized paths, so only ASCII
/// letters and digits are accepted; everything else is rejected before
/// it can reach a path or a query pattern.
pub fn normalize_prefix(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::validation(format!(
            "Prefix '{raw}' must contain only letters and digits"
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// In-memory allocation state for one (scope, prefix) bucket.
#[derive(Debug, Clone, Default)]
pub struct BucketState {
    /// Sequences currently in use.
    used: BTreeSet<i32>,
    /// High-water mark: the next value handed out when no gap reuse
    /// applies.
    next: i32,
}

impl BucketState {
    /// Rebuild state from existing used sequences.
    ///
    /// Rows must be supplied in ascending id order so that re-derivation
    /// is repeatable; the high-water mark lands one past the largest
    /// value seen.
    pub fn from_used(rows: impl IntoIterator<Item = i32>) -> Self {
        let mut state = Self::default();
        for seq in rows {
            state.used.insert(seq);
            if seq >= state.next {
                state.next = seq + 1;
            }
        }
        state
    }

    /// The current high-water mark.
    pub fn high_water(&self) -> i32 {
        self.next
    }

    /// Whether a sequence is currently in use.
    pub fn is_used(&self, sequence: i32) -> bool {
        self.used.contains(&sequence)
    }

    /// Allocate a sequence.
    ///
    /// A free `preferred` value is reused as-is (idempotent
    /// re-assignment during import/renumbering). Otherwise the
    /// high-water value is taken, probing upward past values recorded by
    /// manual edits. With `gap_fill` the lowest free value wins instead.
    pub fn allocate(&mut self, preferred: Option<i32>, gap_fill: bool) -> AppResult<i32> {
        if let Some(p) = preferred {
            if !(0..=MAX_SEQUENCE).contains(&p) {
                return Err(AppError::code_exhausted(format!(
                    "Preferred sequence {p} does not fit {CODE_WIDTH} digits"
                )));
            }
            if !self.used.contains(&p) {
                self.used.insert(p);
                if p >= self.next {
                    self.next = p + 1;
                }
                return Ok(p);
            }
        }

        let mut candidate = if gap_fill { 0 } else { self.next };
        while candidate <= MAX_SEQUENCE && self.used.contains(&candidate) {
            candidate += 1;
        }
        if candidate > MAX_SEQUENCE {
            return Err(AppError::code_exhausted(format!(
                "Bucket exhausted: all {} sequences are in use",
                MAX_SEQUENCE + 1
            )));
        }

        self.used.insert(candidate);
        if candidate >= self.next {
            self.next = candidate + 1;
        }
        Ok(candidate)
    }

    /// Release a sequence so a later preferred allocation can reuse it.
    /// The high-water mark never moves backward.
    pub fn release(&mut self, sequence: i32) -> bool {
        self.used.remove(&sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivio_core::error::ErrorKind;

    #[test]
    fn test_render_pads_to_three_digits() {
        assert_eq!(render("BOX", 1).unwrap(), "BOX001");
        assert_eq!(render("OFF", 999).unwrap(), "OFF999");
    }

    #[test]
    fn test_render_rejects_overflow() {
        let err = render("BOX", 1000).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CodeExhausted);
        assert_eq!(render("BOX", -1).unwrap_err().kind, ErrorKind::CodeExhausted);
    }

    #[test]
    fn test_normalize_prefix_uppercases() {
        assert_eq!(normalize_prefix("box").unwrap(), "BOX");
        assert_eq!(normalize_prefix("  b12 ").unwrap(), "B12");
    }

    #[test]
    fn test_normalize_prefix_rejects_non_alphanumeric() {
        // LIKE metacharacters, path separators and blanks all fail the
        // same way.
        for raw in ["X_", "A%", "A/B", "BOX 1", "", "  "] {
            let err = normalize_prefix(raw).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "prefix {raw:?}");
        }
    }

    #[test]
    fn test_sequences_are_distinct_and_increasing() {
        let mut state = BucketState::default();
        let allocated: Vec<i32> = (0..10)
            .map(|_| state.allocate(None, false).unwrap())
            .collect();
        assert_eq!(allocated, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_preferred_reuse_after_release() {
        let mut state = BucketState::default();
        for _ in 0..5 {
            state.allocate(None, false).unwrap();
        }
        assert!(state.release(2));
        // The freed value is reused only when explicitly preferred.
        assert_eq!(state.allocate(Some(2), false).unwrap(), 2);
        // Plain allocation keeps advancing the mark.
        assert_eq!(state.allocate(None, false).unwrap(), 5);
    }

    #[test]
    fn test_preferred_in_use_falls_back_to_mark() {
        let mut state = BucketState::from_used([0, 1, 2]);
        assert_eq!(state.allocate(Some(1), false).unwrap(), 3);
    }

    #[test]
    fn test_mark_probes_past_manual_entries() {
        // Manual edit recorded 5 without advancing allocations 0..=4.
        let mut state = BucketState::from_used([0, 5]);
        assert_eq!(state.high_water(), 6);
        let mut gapless = BucketState::default();
        gapless.allocate(None, false).unwrap(); // 0
        gapless.used.insert(1); // simulated manual edit at the mark
        assert_eq!(gapless.allocate(None, false).unwrap(), 2);
    }

    #[test]
    fn test_gap_fill_takes_lowest_free() {
        let mut state = BucketState::from_used([0, 1, 3, 4]);
        assert_eq!(state.allocate(None, true).unwrap(), 2);
        assert_eq!(state.allocate(None, true).unwrap(), 5);
    }

    #[test]
    fn test_exhaustion_at_padding_capacity() {
        let mut state = BucketState::from_used(0..=MAX_SEQUENCE);
        let err = state.allocate(None, false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CodeExhausted);
        let err = state.allocate(None, true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CodeExhausted);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let a = BucketState::from_used([3, 1, 7]);
        let b = BucketState::from_used([3, 1, 7]);
        assert_eq!(a.high_water(), b.high_water());
        assert_eq!(a.high_water(), 8);
    }
}
