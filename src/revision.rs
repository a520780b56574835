//! Request tagging for out-of-order async responses.
//!
//! Every request is tagged with the revision that was current when it was
//! issued. A response may only be committed while its revision is still
//! the latest one issued for that input; anything older is discarded.

use std::fmt;

/// Monotonic tag identifying one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Revision(u64);

impl Revision {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Tracks the latest revision issued for one input.
#[derive(Debug, Clone, Default)]
pub struct RevisionCounter {
    latest: Revision,
}

impl RevisionCounter {
    /// Issue a new revision, superseding all earlier ones.
    pub fn next(&mut self) -> Revision {
        self.latest = Revision(self.latest.0 + 1);
        self.latest
    }

    pub fn latest(&self) -> Revision {
        self.latest
    }

    pub fn is_current(&self, revision: Revision) -> bool {
        revision == self.latest
    }
}

/// Outcome of trying to commit a tagged response.
#[derive(Debug, Clone, PartialEq)]
pub enum Commit<T> {
    Applied(T),
    /// The response was superseded and dropped without touching state.
    Stale { revision: Revision, latest: Revision },
}

impl<T> Commit<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Commit::Applied(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Commit::Stale { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_supersedes() {
        let mut counter = RevisionCounter::default();
        let first = counter.next();
        let second = counter.next();

        assert!(first < second);
        assert!(!counter.is_current(first));
        assert!(counter.is_current(second));
        assert_eq!(counter.latest().get(), 2);
        assert_eq!(second.to_string(), "r2");
    }

    #[test]
    fn test_default_revision_is_never_current_after_issue() {
        let mut counter = RevisionCounter::default();
        counter.next();
        assert!(!counter.is_current(Revision::default()));
    }
}
