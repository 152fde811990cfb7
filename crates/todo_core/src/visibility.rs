//! Page visibility signal consumed by the sync engine

use serde::{Deserialize, Serialize};

/// Whether the embedding page is currently visible.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub fn is_hidden(self) -> bool {
        self == Visibility::Hidden
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Visible
    }
}
