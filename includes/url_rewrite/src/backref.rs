//! Capture-group storage used to resolve back-references while
//! a single rule is evaluated.

use super::error::BackReferenceError;

/// Ordered, append-only list of capture-group sets.
///
/// Global index `0` resolves to group 0 (the whole match) of the
/// first set that was pushed. Indices keep counting through each set
/// in the order the sets were appended, so a set of three groups
/// followed by a set of two is addressable as `0..=4`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackReferences {
    sets: Vec<Vec<String>>,
    len: usize,
}

impl BackReferences {
    /// Append another set of captured groups.
    pub fn push(&mut self, groups: Vec<String>) {
        self.len += groups.len();
        self.sets.push(groups);
    }

    /// Resolve a global back-reference index into its captured value.
    pub fn get(&self, index: usize) -> Result<&str, BackReferenceError> {
        let mut offset = index;
        for set in self.sets.iter() {
            match set.get(offset) {
                Some(group) => return Ok(group.as_str()),
                None => offset -= set.len(),
            }
        }
        Err(BackReferenceError::OutOfRange {
            index,
            len: self.len,
        })
    }

    /// Total number of groups across every recorded set.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over the recorded sets in append order.
    pub fn sets(&self) -> impl Iterator<Item = &[String]> {
        self.sets.iter().map(|s| s.as_slice())
    }

    pub fn clear(&mut self) {
        self.sets.clear();
        self.len = 0;
    }
}

/// Capture state of one rule evaluation.
///
/// `rule` holds the groups of the initial match (`{R:N}` / `$N`) and
/// `conditions` the groups of matching conditions (`{C:N}` / `%N`).
/// A fresh instance is created for every rule that is evaluated, so
/// captures never leak between rules or requests.
#[derive(Clone, Debug, Default)]
pub struct Captures {
    rule: BackReferences,
    conditions: BackReferences,
}

impl Captures {
    #[inline]
    pub fn rule(&self) -> &BackReferences {
        &self.rule
    }

    #[inline]
    pub fn conditions(&self) -> &BackReferences {
        &self.conditions
    }

    pub(crate) fn record_rule(&mut self, groups: Vec<String>) {
        self.rule.clear();
        if !groups.is_empty() {
            self.rule.push(groups);
        }
    }

    /// Record condition groups, either appending to the earlier ones
    /// (track-all-captures) or replacing them.
    pub(crate) fn record_condition(&mut self, groups: Vec<String>, append: bool) {
        if groups.is_empty() {
            return;
        }
        if !append {
            self.conditions.clear();
        }
        self.conditions.push(groups);
    }
}
