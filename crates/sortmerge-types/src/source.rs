use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one input source within a run.
///
/// Assigned in command-line order when the run starts, so it doubles as
/// the active-set position used for tie-breaking.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(usize);

impl SourceId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the source in the input list.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_index() {
        let id = SourceId::new(3);
        assert_eq!(id.index(), 3);
        assert_eq!(id.to_string(), "src#3");
        assert_eq!(format!("{id:?}"), "SourceId(3)");
    }

    #[test]
    fn ordering_follows_index() {
        assert!(SourceId::new(0) < SourceId::new(1));
    }
}
