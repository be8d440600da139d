use serde::Deserialize;

/// Limit/offset window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// Replace a non-positive limit with `default_limit` and clamp a negative offset to zero.
    pub fn normalized(self, default_limit: i64) -> Self {
        Self {
            limit: if self.limit <= 0 { default_limit } else { self.limit },
            offset: self.offset.max(0),
        }
    }

    /// Apply the window to an already ordered iterator.
    pub fn slice<T, I>(&self, items: I) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
    {
        items
            .into_iter()
            .skip(self.offset.max(0) as usize)
            .take(self.limit.max(0) as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: 50, offset: 0 }
    }
}
