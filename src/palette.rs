// Categorical colors for grouped series

use serde::Serialize;

/// First colors of the category10 scheme, used for post types
pub const POST_TYPE_COLORS: [&str; 3] = ["#1f77b4", "#ff7f0e", "#2ca02c"];

/// Maps categories to palette colors by position in the domain.
///
/// The domain keeps first-seen order, so the same sequence of keys always
/// produces the same assignment. Palettes shorter than the domain wrap around.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrdinalColorScale {
    domain: Vec<String>,
    palette: Vec<String>,
}

impl OrdinalColorScale {
    pub fn new<I, S>(palette: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domain: Vec::new(),
            palette: palette.into_iter().map(Into::into).collect(),
        }
    }

    /// Scale with a fixed domain; duplicate keys keep their first position
    pub fn with_domain<I, S, P, Q>(domain: I, palette: P) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        P: IntoIterator<Item = Q>,
        Q: Into<String>,
    {
        let mut scale = Self::new(palette);
        for key in domain {
            scale.encode(key.as_ref());
        }
        scale
    }

    /// Color for `key`, appending it to the domain when unseen
    pub fn encode(&mut self, key: &str) -> Option<&str> {
        let idx = match self.domain.iter().position(|d| d == key) {
            Some(idx) => idx,
            None => {
                self.domain.push(key.to_string());
                self.domain.len() - 1
            }
        };
        self.color_at(idx)
    }

    /// Color for a key already in the domain
    pub fn get(&self, key: &str) -> Option<&str> {
        let idx = self.domain.iter().position(|d| d == key)?;
        self.color_at(idx)
    }

    fn color_at(&self, idx: usize) -> Option<&str> {
        if self.palette.is_empty() {
            return None;
        }
        Some(self.palette[idx % self.palette.len()].as_str())
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }
}
