//! Cache key scheme.
//!
//! Single entities live under colon-delimited keys built from their lineage:
//! `<menu>::`, `<menu>:<submenu>:` and `<menu>:<submenu>:<dish>`. Lists live in
//! one hash per kind (`list:menu`, `list:submenu`, `list:dish`) whose fields
//! are the parent scope, so dropping a list key drops every scope of that kind.

use std::fmt;

use uuid::Uuid;

use crate::domain::types::EntityKind;

const LIST_PREFIX: &str = "list:";

/// Position of an entity in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lineage {
    Menu {
        menu_id: Uuid,
    },
    Submenu {
        menu_id: Uuid,
        submenu_id: Uuid,
    },
    Dish {
        menu_id: Uuid,
        submenu_id: Uuid,
        dish_id: Uuid,
    },
}

impl Lineage {
    pub fn menu(menu_id: Uuid) -> Self {
        Self::Menu { menu_id }
    }

    pub fn submenu(menu_id: Uuid, submenu_id: Uuid) -> Self {
        Self::Submenu {
            menu_id,
            submenu_id,
        }
    }

    pub fn dish(menu_id: Uuid, submenu_id: Uuid, dish_id: Uuid) -> Self {
        Self::Dish {
            menu_id,
            submenu_id,
            dish_id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Lineage::Menu { .. } => EntityKind::Menu,
            Lineage::Submenu { .. } => EntityKind::Submenu,
            Lineage::Dish { .. } => EntityKind::Dish,
        }
    }

    pub fn menu_id(&self) -> Uuid {
        match *self {
            Lineage::Menu { menu_id }
            | Lineage::Submenu { menu_id, .. }
            | Lineage::Dish { menu_id, .. } => menu_id,
        }
    }

    /// Cache key of the entity itself.
    pub fn key(&self) -> String {
        match self {
            Lineage::Menu { menu_id } => format!("{menu_id}::"),
            Lineage::Submenu {
                menu_id,
                submenu_id,
            } => format!("{menu_id}:{submenu_id}:"),
            Lineage::Dish {
                menu_id,
                submenu_id,
                dish_id,
            } => format!("{menu_id}:{submenu_id}:{dish_id}"),
        }
    }

    /// Lineages of the ancestors, nearest last.
    pub fn ancestors(&self) -> Vec<Lineage> {
        match *self {
            Lineage::Menu { .. } => Vec::new(),
            Lineage::Submenu { menu_id, .. } => vec![Lineage::menu(menu_id)],
            Lineage::Dish {
                menu_id,
                submenu_id,
                ..
            } => vec![
                Lineage::menu(menu_id),
                Lineage::submenu(menu_id, submenu_id),
            ],
        }
    }
}

/// Parent scope of a cached list; becomes the field inside the kind's list hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListScope {
    AllMenus,
    Menu(Uuid),
    Submenu { menu_id: Uuid, submenu_id: Uuid },
}

impl ListScope {
    pub fn kind(&self) -> EntityKind {
        match self {
            ListScope::AllMenus => EntityKind::Menu,
            ListScope::Menu(_) => EntityKind::Submenu,
            ListScope::Submenu { .. } => EntityKind::Dish,
        }
    }

    pub fn field(&self) -> String {
        match self {
            ListScope::AllMenus => String::new(),
            ListScope::Menu(menu_id) => menu_id.to_string(),
            ListScope::Submenu {
                menu_id,
                submenu_id,
            } => format!("{menu_id}:{submenu_id}"),
        }
    }
}

/// Key of the list hash for `kind`.
pub fn list_key(kind: EntityKind) -> String {
    format!("{LIST_PREFIX}{}", kind.as_str())
}

/// Glob-style key pattern understood by every cache backend.
///
/// Supports `*`, `?`, `[abc]`, `[a-z]`, `[^a]` and backslash escapes, the same
/// dialect as Redis `KEYS`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyPattern(String);

impl KeyPattern {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Matches exactly one key.
    pub fn exact(key: &str) -> Self {
        let mut escaped = String::with_capacity(key.len());
        for ch in key.chars() {
            if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
                escaped.push('\\');
            }
            escaped.push(ch);
        }
        Self(escaped)
    }

    pub fn entity(lineage: &Lineage) -> Self {
        Self::exact(&lineage.key())
    }

    pub fn list(kind: EntityKind) -> Self {
        Self::exact(&list_key(kind))
    }

    /// Every list hash of every kind.
    pub fn all_lists() -> Self {
        Self(format!("{LIST_PREFIX}*"))
    }

    /// The menu and every descendant key.
    pub fn menu_tree(menu_id: Uuid) -> Self {
        Self(format!("{menu_id}:*"))
    }

    /// The submenu and every dish key below it.
    pub fn submenu_tree(menu_id: Uuid, submenu_id: Uuid) -> Self {
        Self(format!("{menu_id}:{submenu_id}:*"))
    }

    /// The submenu subtree under whichever menu owns it.
    pub fn submenu_tree_any_menu(submenu_id: Uuid) -> Self {
        Self(format!("*:{submenu_id}:*"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, key: &str) -> bool {
        let pattern: Vec<char> = self.0.chars().collect();
        let key: Vec<char> = key.chars().collect();
        glob_match(&pattern, &key)
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Redis `KEYS`-style glob: `*`, `?`, `[...]` classes with `^`/`!` negation
/// and ranges, and `\` escapes. An unterminated class matches nothing; a
/// trailing `\` is a literal backslash.
fn glob_match(pattern: &[char], key: &[char]) -> bool {
    let (mut p, mut k) = (0, 0);
    // Position to resume from after the most recent `*`.
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        if p < pattern.len() {
            match pattern[p] {
                '*' => {
                    backtrack = Some((p, k));
                    p += 1;
                    continue;
                }
                '?' => {
                    p += 1;
                    k += 1;
                    continue;
                }
                '[' => {
                    if let Some((true, next)) = match_class(pattern, p, key[k]) {
                        p = next;
                        k += 1;
                        continue;
                    }
                }
                '\\' if p + 1 < pattern.len() => {
                    if pattern[p + 1] == key[k] {
                        p += 2;
                        k += 1;
                        continue;
                    }
                }
                literal => {
                    if literal == key[k] {
                        p += 1;
                        k += 1;
                        continue;
                    }
                }
            }
        }

        match backtrack {
            Some((star, consumed)) => {
                p = star + 1;
                k = consumed + 1;
                backtrack = Some((star, consumed + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&ch| ch == '*')
}

/// Evaluate the class starting at `pattern[start] == '['`. Returns whether `ch`
/// matched and the index just past the closing bracket, or `None` when the
/// class is unterminated.
fn match_class(pattern: &[char], start: usize, ch: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negated = matches!(pattern.get(i), Some('^') | Some('!'));
    if negated {
        i += 1;
    }

    let mut matched = false;
    let mut first = true;
    while i < pattern.len() {
        let mut current = pattern[i];
        if current == ']' && !first {
            return Some((matched != negated, i + 1));
        }
        first = false;
        if current == '\\' && i + 1 < pattern.len() {
            i += 1;
            current = pattern[i];
        }
        if i + 2 < pattern.len() && pattern[i + 1] == '-' && pattern[i + 2] != ']' {
            let (low, high) = (current, pattern[i + 2]);
            if low <= ch && ch <= high {
                matched = true;
            }
            i += 3;
        } else {
            if current == ch {
                matched = true;
            }
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Uuid, Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn entity_keys_follow_lineage() {
        let (m, s, d) = ids();
        assert_eq!(Lineage::menu(m).key(), format!("{m}::"));
        assert_eq!(Lineage::submenu(m, s).key(), format!("{m}:{s}:"));
        assert_eq!(Lineage::dish(m, s, d).key(), format!("{m}:{s}:{d}"));
    }

    #[test]
    fn list_scopes_map_to_hash_fields() {
        let (m, s, _) = ids();
        assert_eq!(list_key(EntityKind::Dish), "list:dish");
        assert_eq!(ListScope::AllMenus.field(), "");
        assert_eq!(ListScope::Menu(m).field(), m.to_string());
        assert_eq!(
            ListScope::Submenu {
                menu_id: m,
                submenu_id: s
            }
            .field(),
            format!("{m}:{s}")
        );
        assert_eq!(ListScope::Menu(m).kind(), EntityKind::Submenu);
    }

    #[test]
    fn menu_tree_covers_descendants_only() {
        let (m, s, d) = ids();
        let other = Uuid::new_v4();
        let pattern = KeyPattern::menu_tree(m);

        assert!(pattern.matches(&Lineage::menu(m).key()));
        assert!(pattern.matches(&Lineage::submenu(m, s).key()));
        assert!(pattern.matches(&Lineage::dish(m, s, d).key()));
        assert!(!pattern.matches(&Lineage::menu(other).key()));
        assert!(!pattern.matches("list:menu"));
    }

    #[test]
    fn submenu_tree_leaves_menu_key_alone() {
        let (m, s, d) = ids();
        let pattern = KeyPattern::submenu_tree(m, s);

        assert!(pattern.matches(&Lineage::submenu(m, s).key()));
        assert!(pattern.matches(&Lineage::dish(m, s, d).key()));
        assert!(!pattern.matches(&Lineage::menu(m).key()));
    }

    #[test]
    fn exact_pattern_escapes_metacharacters() {
        let pattern = KeyPattern::exact("a*b?[c]");
        assert!(pattern.matches("a*b?[c]"));
        assert!(!pattern.matches("axxb?[c]"));
        assert!(!pattern.matches("a*bz[c]"));
    }

    #[test]
    fn glob_dialect() {
        assert!(KeyPattern::new("h?llo").matches("hello"));
        assert!(KeyPattern::new("h*llo").matches("heeeello"));
        assert!(KeyPattern::new("h*llo").matches("hllo"));
        assert!(KeyPattern::new("h[ae]llo").matches("hallo"));
        assert!(!KeyPattern::new("h[ae]llo").matches("hillo"));
        assert!(KeyPattern::new("h[^e]llo").matches("hallo"));
        assert!(!KeyPattern::new("h[^e]llo").matches("hello"));
        assert!(KeyPattern::new("h[a-c]llo").matches("hbllo"));
        assert!(!KeyPattern::new("h[a-c]llo").matches("hdllo"));
        assert!(KeyPattern::new("*").matches(""));
        assert!(!KeyPattern::new("list:*").matches("list"));
        assert!(KeyPattern::new("*:*:").matches("a:b:"));
        assert!(!KeyPattern::new("abc").matches("abcd"));
    }

    #[test]
    fn escapes_and_unterminated_classes() {
        assert!(KeyPattern::new(r"a\*b").matches("a*b"));
        assert!(!KeyPattern::new(r"a\*b").matches("axb"));
        assert!(KeyPattern::new(r"[\]]").matches("]"));
        assert!(KeyPattern::new("a\\").matches("a\\"));
        assert!(!KeyPattern::new("h[ae").matches("ha"));
        assert!(!KeyPattern::new("h[ae").matches("h[ae"));
        assert!(!KeyPattern::new("*[ae").matches("xa"));
    }
}
