use std::collections::HashSet;

/// Set of artist names already claimed for processing.
///
/// The registry is the single source of truth for deduplication: an artist
/// that passed [`try_claim`](VisitedRegistry::try_claim) is never traversed
/// or persisted a second time, even if persistence later fails. Names are
/// compared exactly as returned by the service; no case folding or
/// whitespace normalization is applied.
///
/// Mutation goes through `&mut self`, so ownership rules keep the registry
/// single-writer. Parallelizing the traversal would require an atomic claim
/// operation instead.
#[derive(Debug, Default)]
pub struct VisitedRegistry {
    claimed: HashSet<String>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for processing.
    ///
    /// Returns `true` and records the name if it was not previously claimed;
    /// returns `false` with no side effect otherwise. There is no way to
    /// release a claim: the set grows monotonically for the life of the crawl.
    pub fn try_claim(&mut self, name: &str) -> bool {
        if self.claimed.contains(name) {
            false
        } else {
            self.claimed.insert(name.to_string());
            true
        }
    }

    /// Number of artists claimed so far.
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
