//! Snapshot differ: whole-string change detection over the page's visible
//! cookie jar.
//!
//! Detection is deliberately a byte-for-byte comparison of the serialized
//! jar, not a per-cookie diff. Two mutations inside one poll period collapse
//! into a single reported transition; the intermediate state is not
//! observable.

/// Holds the last known serialized cookie jar for one page context.
#[derive(Debug)]
pub struct SnapshotDiffer {
    previous: String,
}

impl SnapshotDiffer {
    /// Seed the differ with the jar state at monitor startup. The initial
    /// state never fires a change on its own.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            previous: initial.into(),
        }
    }

    /// Compare a fresh snapshot against the stored one.
    ///
    /// Returns `(previous, current)` only when they differ; in all cases the
    /// stored value is advanced to `current` before returning.
    pub fn tick(&mut self, current: &str) -> Option<(String, String)> {
        if self.previous == current {
            return None;
        }

        let previous = std::mem::replace(&mut self.previous, current.to_string());
        Some((previous, current.to_string()))
    }

    /// The snapshot the differ currently considers "last known".
    pub fn last_snapshot(&self) -> &str {
        &self.previous
    }
}
