use std::sync::RwLock;

/// One level of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Exact(String),
    /// `+`: exactly one level.
    Single,
    /// `#`: zero or more remaining levels. Only valid last.
    Multi,
}

/// An MQTT-style path pattern.
///
/// - `lotes/state` matches only itself
/// - `lotes/+` matches `lotes/state`, `lotes/scanner`
/// - `lotes/#` matches `lotes`, `lotes/state`, `lotes/a/b`
/// - `#` matches everything
///
/// A `#` that is not the last segment is treated as a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(raw: &str) -> Self {
        let parts: Vec<&str> = raw.split('/').collect();
        let last = parts.len() - 1;
        let segments = parts
            .iter()
            .enumerate()
            .map(|(i, part)| match *part {
                "+" => Segment::Single,
                "#" if i == last => Segment::Multi,
                other => Segment::Exact(other.to_string()),
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Does this pattern match the concrete `path`?
    pub fn matches(&self, path: &str) -> bool {
        let mut levels = path.split('/');
        for segment in &self.segments {
            match segment {
                Segment::Multi => return true,
                Segment::Single => {
                    if levels.next().is_none() {
                        return false;
                    }
                }
                Segment::Exact(want) => match levels.next() {
                    Some(level) if level == want => {}
                    _ => return false,
                },
            }
        }
        levels.next().is_none()
    }
}

/// Thread-safe list of `(pattern, value)` entries, queried by concrete path.
///
/// Entries are returned in registration order, so handlers run in the
/// order they were added.
pub struct PatternTable<T> {
    entries: RwLock<Vec<(Pattern, T)>>,
}

impl<T: Clone> PatternTable<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn insert(&self, pattern: &str, value: T) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push((Pattern::parse(pattern), value));
    }

    /// Values of every entry whose pattern matches `path`.
    pub fn match_path(&self, path: &str) -> Vec<T> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|(pattern, _)| pattern.matches(path))
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Remove entries registered under exactly `pattern` for which `pred`
    /// holds. Returns how many were removed.
    pub fn remove<F>(&self, pattern: &str, pred: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|(p, value)| !(p.as_str() == pattern && pred(value)));
        before - entries.len()
    }

    /// Is anything registered under exactly `pattern`?
    pub fn has_pattern(&self, pattern: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.iter().any(|(p, _)| p.as_str() == pattern)
    }
}

impl<T: Clone> Default for PatternTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        let p = Pattern::parse("lotes/state");
        assert!(p.matches("lotes/state"));
        assert!(!p.matches("lotes"));
        assert!(!p.matches("lotes/state/x"));
        assert!(!p.matches("lotes/scanner"));
    }

    #[test]
    fn single_level_wildcard() {
        let p = Pattern::parse("lotes/+");
        assert!(p.matches("lotes/state"));
        assert!(p.matches("lotes/scanner"));
        assert!(!p.matches("lotes"));
        assert!(!p.matches("lotes/a/b"));

        let p = Pattern::parse("+/state");
        assert!(p.matches("lotes/state"));
        assert!(p.matches("lote-form/state"));
        assert!(!p.matches("lotes/created"));
    }

    #[test]
    fn multi_level_wildcard() {
        let p = Pattern::parse("lotes/#");
        assert!(p.matches("lotes"));
        assert!(p.matches("lotes/state"));
        assert!(p.matches("lotes/a/b/c"));
        assert!(!p.matches("lote-form/state"));

        assert!(Pattern::parse("#").matches("anything/at/all"));
    }

    #[test]
    fn hash_in_the_middle_is_literal() {
        let p = Pattern::parse("a/#/b");
        assert!(p.matches("a/#/b"));
        assert!(!p.matches("a/x/b"));
    }

    #[test]
    fn table_returns_matches_in_insert_order() {
        let table = PatternTable::new();
        table.insert("#", 1);
        table.insert("lotes/state", 2);
        table.insert("lotes/+", 3);
        table.insert("lote-form/state", 4);

        assert_eq!(table.match_path("lotes/state"), vec![1, 2, 3]);
        assert_eq!(table.match_path("app/route"), vec![1]);
    }

    #[test]
    fn table_remove_by_predicate() {
        let table = PatternTable::new();
        table.insert("lotes/state", 1);
        table.insert("lotes/state", 2);
        table.insert("lotes/+", 1);

        assert_eq!(table.remove("lotes/state", |v| *v == 1), 1);
        assert_eq!(table.match_path("lotes/state"), vec![2, 1]);
        assert!(table.has_pattern("lotes/+"));
        assert!(!table.has_pattern("lotes/#"));
    }
}
