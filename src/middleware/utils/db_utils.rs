use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_count")]
    pub count: u16,
    #[serde(default)]
    pub start: u32,
}

fn default_count() -> u16 {
    20
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            count: default_count(),
            start: 0,
        }
    }
}

impl Pagination {
    pub const MAX_COUNT: u16 = 100;

    /// Count clamped to `1..=MAX_COUNT`.
    pub fn limit(&self) -> u16 {
        self.count.clamp(1, Self::MAX_COUNT)
    }
}
