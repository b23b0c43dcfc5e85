use crate::error::Result;
use crate::lastfm::MetadataService;
use crate::pool::{PersistTask, SnapshotPool};
use crate::registry::VisitedRegistry;

/// Counters reported after a finished walk.
#[derive(Debug, Default, Clone, Copy)]
pub struct WalkStats {
    /// Artists claimed in the registry, seed included.
    pub artists_claimed: usize,
    /// Persist tasks handed to the pool (the seed's task is submitted by the
    /// caller, not by the walk).
    pub tasks_submitted: usize,
    /// Neighbor queries issued.
    pub queries: usize,
}

/// Sequential depth-first traversal of the similar-artist graph.
///
/// The walker is the only writer of the registry (enforced by the `&mut`
/// borrow) and never waits on persistence: discovered artists are handed to
/// the pool fire-and-forget, and the walk moves on. A neighbor query failure
/// propagates out of [`walk`](Walker::walk) and ends the whole traversal;
/// callers wanting per-branch recovery would catch it around this call.
pub struct Walker<'a, S: MetadataService> {
    service: &'a S,
    registry: &'a mut VisitedRegistry,
    pool: &'a SnapshotPool,
}

impl<'a, S: MetadataService> Walker<'a, S> {
    pub fn new(service: &'a S, registry: &'a mut VisitedRegistry, pool: &'a SnapshotPool) -> Self {
        Self {
            service,
            registry,
            pool,
        }
    }

    /// Walk the graph reachable from `seed`.
    ///
    /// Every artist passes the registry exactly once: the seed is claimed up
    /// front, each neighbor at the moment it is first seen, strictly before
    /// its persist task is created. Already-claimed artists (including the
    /// seed reappearing in a cycle) are skipped without a task, which is what
    /// terminates the walk on a finite component.
    ///
    /// Runs an explicit work stack instead of native recursion so graph depth
    /// cannot exhaust the call stack; pop order still yields exact
    /// depth-first traversal in the order the service lists neighbors.
    pub async fn walk(&mut self, seed: &str) -> Result<WalkStats> {
        let mut stats = WalkStats::default();

        if !self.registry.try_claim(seed) {
            return Ok(stats);
        }
        stats.artists_claimed += 1;

        let mut stack = vec![seed.to_string()];
        while let Some(artist) = stack.pop() {
            let neighbors = self.service.similar_artists(&artist).await?;
            stats.queries += 1;
            log::info!(
                "Processing artist {}, number of similar: {}",
                artist,
                neighbors.len()
            );

            let mut newly_claimed = Vec::new();
            for neighbor in neighbors {
                if self.registry.try_claim(&neighbor) {
                    stats.artists_claimed += 1;
                    self.pool.submit(PersistTask {
                        artist: neighbor.clone(),
                    });
                    stats.tasks_submitted += 1;
                    newly_claimed.push(neighbor);
                }
            }

            // Reverse push so the first-listed neighbor's entire subtree is
            // exhausted before the next neighbor begins.
            for neighbor in newly_claimed.into_iter().rev() {
                stack.push(neighbor);
            }
        }

        Ok(stats)
    }
}
