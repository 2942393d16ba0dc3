//! Placeholder mapping.

/// Ordered mapping from a literal placeholder token (e.g. `[cpf]`) to its
/// replacement text.
///
/// Inserting an existing token overrides its value but keeps its original
/// position, so iteration order is the order in which tokens first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    entries: Vec<(String, String)>,
}

impl PlaceholderMap {
    /// Create a new empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or override a token.
    pub fn insert(&mut self, token: impl Into<String>, value: impl ToString) {
        let token = token.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((token, value)),
        }
    }

    /// Insert every entry of `other`, overriding existing tokens.
    pub fn extend_from(&mut self, other: &PlaceholderMap) {
        for (token, value) in other.iter() {
            self.insert(token, value);
        }
    }

    /// Get the replacement for a token.
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(token, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    /// Tokens in insertion order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for PlaceholderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (token, value) in iter {
            map.insert(token, value);
        }
        map
    }
}

/// Bracketed token for an interactively collected field: `categoria` -> `[categoria]`.
pub fn field_token(field: &str) -> String {
    format!("[{}]", field)
}
