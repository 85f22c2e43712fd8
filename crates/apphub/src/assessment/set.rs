//! Unordered set of tag ids.

use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    members: HashSet<i64>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: i64) {
        self.members.insert(id);
    }

    pub fn contains(&self, id: i64) -> bool {
        self.members.contains(&id)
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// `self ⊇ other`; with `strict`, also `|self| > |other|`.
    pub fn superset(&self, other: &TagSet, strict: bool) -> bool {
        if strict && self.size() <= other.size() {
            return false;
        }
        self.members.is_superset(&other.members)
    }

    /// `self ⊆ other`; with `strict`, also `|self| < |other|`.
    pub fn subset(&self, other: &TagSet, strict: bool) -> bool {
        other.superset(self, strict)
    }

    pub fn intersects(&self, other: &TagSet) -> bool {
        !self.members.is_disjoint(&other.members)
    }

    /// Members in no particular order.
    pub fn members(&self) -> impl Iterator<Item = i64> + '_ {
        self.members.iter().copied()
    }
}

impl FromIterator<i64> for TagSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

impl Extend<i64> for TagSet {
    fn extend<I: IntoIterator<Item = i64>>(&mut self, iter: I) {
        self.members.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[i64]) -> TagSet {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_superset_and_subset() {
        let a = set(&[1, 2]);
        let b = set(&[1, 2, 3]);
        assert!(b.superset(&a, false));
        assert!(b.superset(&a, true));
        assert!(a.subset(&b, true));
        assert!(!a.superset(&b, false));

        let same = set(&[2, 1]);
        assert!(a.superset(&same, false));
        assert!(!a.superset(&same, true));
        assert!(!a.subset(&same, true));
    }

    #[test]
    fn test_empty_set() {
        let empty = TagSet::new();
        let a = set(&[1]);
        assert!(a.superset(&empty, true));
        assert!(empty.subset(&a, true));
        assert!(empty.superset(&empty, false));
        assert!(!empty.intersects(&a));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_add_contains_intersects() {
        let mut a = TagSet::new();
        a.add(4);
        a.add(4);
        a.extend([5, 6]);
        assert_eq!(a.size(), 3);
        assert!(a.contains(5));
        assert!(a.intersects(&set(&[6, 7])));
        assert!(!a.intersects(&set(&[7])));

        let mut members: Vec<i64> = a.members().collect();
        members.sort_unstable();
        assert_eq!(members, vec![4, 5, 6]);
    }
}
