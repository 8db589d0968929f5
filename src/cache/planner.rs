//! Invalidation planning.
//!
//! Turns a single catalog mutation into the set of key patterns whose cached
//! payloads it makes stale.

use std::collections::BTreeSet;
use std::fmt;

use uuid::Uuid;

use super::keys::{KeyPattern, Lineage};

/// What happened to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Created,
    Updated,
    Deleted,
}

/// Patterns to evict after a mutation. Ordered and deduplicated.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvalidationPlan {
    patterns: BTreeSet<KeyPattern>,
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InvalidationPlan {{ patterns: [")?;
        for (idx, pattern) in self.patterns.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{pattern}")?;
        }
        write!(f, "] }}")
    }
}

impl InvalidationPlan {
    /// Plan for `change` applied to the entity at `lineage`.
    ///
    /// - created: the lists of the entity's kind and of every ancestor kind
    ///   (their counts moved), the ancestors' own keys, and the entity's key.
    /// - updated: the list of the entity's kind and the entity's key.
    /// - deleted: every list, the ancestors' own keys, and the entity's
    ///   subtree (the store cascades the delete).
    pub fn for_change(change: Change, lineage: &Lineage) -> Self {
        let mut plan = Self::default();
        match change {
            Change::Created => {
                plan.insert(KeyPattern::list(lineage.kind()));
                for ancestor in lineage.ancestors() {
                    plan.insert(KeyPattern::list(ancestor.kind()));
                    plan.insert(KeyPattern::entity(&ancestor));
                }
                plan.insert(KeyPattern::entity(lineage));
            }
            Change::Updated => {
                plan.insert(KeyPattern::list(lineage.kind()));
                plan.insert(KeyPattern::entity(lineage));
            }
            Change::Deleted => {
                plan.insert(KeyPattern::all_lists());
                for ancestor in lineage.ancestors() {
                    plan.insert(KeyPattern::entity(&ancestor));
                }
                plan.insert(subtree(lineage));
            }
        }
        plan
    }

    /// An entity re-attached to a different parent: it leaves the old
    /// lineage and joins the new one.
    pub fn for_move(from: &Lineage, to: &Lineage) -> Self {
        let mut plan = Self::for_change(Change::Deleted, from);
        plan.merge(Self::for_change(Change::Created, to));
        plan
    }

    /// Fallback for a submenu whose owning menu is not known: every list and
    /// the submenu subtree under any menu.
    pub fn for_unknown_menu(submenu_id: Uuid) -> Self {
        let mut plan = Self::default();
        plan.insert(KeyPattern::all_lists());
        plan.insert(KeyPattern::submenu_tree_any_menu(submenu_id));
        plan
    }

    pub fn merge(&mut self, other: InvalidationPlan) {
        self.patterns.extend(other.patterns);
    }

    pub fn patterns(&self) -> impl Iterator<Item = &KeyPattern> {
        self.patterns.iter()
    }

    pub fn contains(&self, pattern: &KeyPattern) -> bool {
        self.patterns.contains(pattern)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn insert(&mut self, pattern: KeyPattern) {
        self.patterns.insert(pattern);
    }
}

fn subtree(lineage: &Lineage) -> KeyPattern {
    match *lineage {
        Lineage::Menu { menu_id } => KeyPattern::menu_tree(menu_id),
        Lineage::Submenu {
            menu_id,
            submenu_id,
        } => KeyPattern::submenu_tree(menu_id, submenu_id),
        Lineage::Dish { .. } => KeyPattern::entity(lineage),
    }
}
