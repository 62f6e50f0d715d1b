//! The parsed ledger mapping.

use std::collections::HashMap;

/// Ledger rows mapping a source key (internal ledger number) to a target
/// invoice identifier.
///
/// Row order is significant and duplicates are allowed: a repeated source
/// key is classified once per row, and a target declared by several rows is
/// a duplicate-declaration warning. Read-only after loading.
#[derive(Debug, Clone, Default)]
pub struct LedgerMapping {
    source_keys: Vec<String>,
    mapping: HashMap<String, String>,
    declared_order: Vec<String>,
    declared_counts: HashMap<String, usize>,
}

impl LedgerMapping {
    /// Append one ledger row. A repeated source key overwrites the previous
    /// target (last-seen wins); a changed target is logged so the ambiguity
    /// stays visible.
    pub fn push_row(&mut self, source_key: impl Into<String>, target: impl Into<String>) {
        let source_key = source_key.into();
        let target = target.into();

        if let Some(previous) = self.mapping.insert(source_key.clone(), target.clone()) {
            if previous != target {
                tracing::warn!(
                    source_key = %source_key,
                    previous = %previous,
                    new = %target,
                    "source key redeclared with a different invoice; keeping the last row"
                );
            }
        }
        self.source_keys.push(source_key);

        match self.declared_counts.get_mut(&target) {
            Some(count) => *count += 1,
            None => {
                self.declared_order.push(target.clone());
                self.declared_counts.insert(target, 1);
            }
        }
    }

    /// Source keys in row order, duplicates included.
    pub fn source_keys(&self) -> &[String] {
        &self.source_keys
    }

    pub fn target_for(&self, source_key: &str) -> Option<&str> {
        self.mapping.get(source_key).map(String::as_str)
    }

    /// Whether `id` is declared as any row's target.
    pub fn declares(&self, id: &str) -> bool {
        self.declared_counts.contains_key(id)
    }

    /// Number of rows declaring `id` as their target.
    pub fn declaration_count(&self, id: &str) -> usize {
        self.declared_counts.get(id).copied().unwrap_or(0)
    }

    /// Targets declared by more than one row, first-seen order.
    pub fn declared_duplicates(&self) -> impl Iterator<Item = (&str, usize)> {
        self.declared_order.iter().filter_map(|id| {
            let count = self.declared_counts[id];
            (count > 1).then_some((id.as_str(), count))
        })
    }

    pub fn row_count(&self) -> usize {
        self.source_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_source_key_keeps_last_target() {
        let mut m = LedgerMapping::default();
        m.push_row("ST/1", "FV/1/PL/2501");
        m.push_row("ST/1", "FV/2/PL/2501");

        assert_eq!(m.target_for("ST/1"), Some("FV/2/PL/2501"));
        // Both rows still count as source keys
        assert_eq!(m.row_count(), 2);
    }

    #[test]
    fn declaration_duplicates_count_rows() {
        let mut m = LedgerMapping::default();
        m.push_row("ST/1", "FV/1/PL/2501");
        m.push_row("ST/2", "FV/1/PL/2501");
        m.push_row("ST/3", "FV/2/PL/2501");

        assert_eq!(m.declaration_count("FV/1/PL/2501"), 2);
        let dups: Vec<_> = m.declared_duplicates().collect();
        assert_eq!(dups, vec![("FV/1/PL/2501", 2)]);
        assert!(m.declares("FV/2/PL/2501"));
        assert!(!m.declares("FV/9/PL/2501"));
    }
}
