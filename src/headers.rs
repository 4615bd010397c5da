//! Header accumulation with per-name merge rules.
//!
//! Every write is kept. At render time a rule table decides how the values
//! for one name collapse into a single header line: `Prefer` joins them with
//! commas, everything else keeps the last value written.

pub const PREFER: &str = "Prefer";
pub const ACCEPT: &str = "Accept";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCEPT_PROFILE: &str = "Accept-Profile";
pub const CONTENT_PROFILE: &str = "Content-Profile";

/// How the values recorded for one header name are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRule {
    Join(&'static str),
    Last,
}

impl HeaderRule {
    pub fn for_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case(PREFER) {
            HeaderRule::Join(",")
        } else {
            HeaderRule::Last
        }
    }

    fn render(&self, values: &[String]) -> Option<String> {
        match self {
            HeaderRule::Join(sep) => {
                if values.is_empty() {
                    None
                } else {
                    Some(values.join(sep))
                }
            }
            HeaderRule::Last => values.last().cloned(),
        }
    }
}

/// Insertion-ordered, case-insensitive multimap of header values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, Vec<String>)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value. The first spelling of a name is the one rendered.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Append every value recorded in `other`, name by name.
    pub fn merge(&mut self, other: HeaderMap) {
        for (name, values) in other.entries {
            for value in values {
                self.append(name.clone(), value);
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// The value `name` would render to.
    pub fn get(&self, name: &str) -> Option<String> {
        let (_, values) = &self.entries[self.position(name)?];
        HeaderRule::for_name(name).render(values)
    }

    /// Collapse every name to one line, in first-write order.
    pub fn render(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter_map(|(name, values)| {
                HeaderRule::for_name(name)
                    .render(values)
                    .map(|v| (name.clone(), v))
            })
            .collect()
    }

    /// Forget every value recorded for `name`.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}
