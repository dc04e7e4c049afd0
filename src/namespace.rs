//! Conversion between the short `prefix:local` tag form and Clark notation (`{uri}local`).

/// Ordered prefix → URI table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces {
    entries: Vec<(String, String)>,
}

impl Namespaces {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut namespaces = Self::default();
        for (prefix, uri) in pairs {
            namespaces.insert(prefix, uri);
        }
        namespaces
    }

    /// Binds `prefix` to `uri`, replacing an existing binding in place.
    pub fn insert(&mut self, prefix: &str, uri: &str) {
        match self.entries.iter_mut().find(|(p, _)| p == prefix) {
            Some(entry) => entry.1 = uri.to_string(),
            None => self.entries.push((prefix.to_string(), uri.to_string())),
        }
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A new table with `other` layered on top of `self`.
    pub fn merged(&self, other: &Namespaces) -> Namespaces {
        let mut merged = self.clone();
        for (prefix, uri) in other.iter() {
            merged.insert(prefix, uri);
        }
        merged
    }
}

/// Replaces every `prefix:` in `tag` with `{uri}`.
pub fn qualify(tag: &str, namespaces: &Namespaces) -> String {
    let mut tag = tag.to_string();
    for (prefix, uri) in namespaces.iter() {
        let short = format!("{prefix}:");
        if tag.contains(&short) {
            tag = tag.replace(&short, &format!("{{{uri}}}"));
        }
    }
    tag
}

/// Replaces every `{uri}` in `tag` with the first prefix bound to it.
pub fn unqualify(tag: &str, namespaces: &Namespaces) -> String {
    let mut tag = tag.to_string();
    for (prefix, uri) in namespaces.iter() {
        let long = format!("{{{uri}}}");
        if tag.contains(&long) {
            tag = tag.replace(&long, &format!("{prefix}:"));
        }
    }
    tag
}
