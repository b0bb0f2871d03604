//! The set of constituents tracked through a train.

/// Ordered, duplicate-free constituent names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstituentSet {
    names: Vec<String>,
}

impl ConstituentSet {
    /// Build from the list a train declares. Names are trimmed; blanks and
    /// repeats are dropped; first-seen order is kept.
    pub fn from_declared<I, S>(declared: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for name in declared {
            let name = name.as_ref().trim();
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        Self { names }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
