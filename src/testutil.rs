//! In-memory fake of the metadata service for walker and pool tests.

use crate::error::{FmexportError, Result};
use crate::lastfm::{MetadataService, Snapshot};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Fake similarity graph with call recording and injectable failures.
pub struct FakeService {
    graph: HashMap<String, Vec<String>>,
    similar_calls: Mutex<Vec<String>>,
    detail_calls: Mutex<Vec<String>>,
    fail_similar: HashSet<String>,
    fail_detail: HashSet<String>,
}

impl FakeService {
    /// Build from an edge list; artists without an entry have no neighbors.
    pub fn new(edges: Vec<(&str, Vec<&str>)>) -> Self {
        let graph = edges
            .into_iter()
            .map(|(from, to)| {
                (
                    from.to_string(),
                    to.into_iter().map(str::to_string).collect(),
                )
            })
            .collect();
        Self {
            graph,
            similar_calls: Mutex::new(Vec::new()),
            detail_calls: Mutex::new(Vec::new()),
            fail_similar: HashSet::new(),
            fail_detail: HashSet::new(),
        }
    }

    /// Make `similar_artists` fail for `name`.
    pub fn fail_similar(mut self, name: &str) -> Self {
        self.fail_similar.insert(name.to_string());
        self
    }

    /// Make `artist_detail` fail for `name`.
    pub fn fail_detail(mut self, name: &str) -> Self {
        self.fail_detail.insert(name.to_string());
        self
    }

    /// Neighbor queries made, in order.
    pub fn similar_calls(&self) -> Vec<String> {
        self.similar_calls.lock().unwrap().clone()
    }

    /// Detail fetches made, in order of execution.
    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().unwrap().clone()
    }
}

impl MetadataService for FakeService {
    async fn similar_artists(&self, name: &str) -> Result<Vec<String>> {
        self.similar_calls.lock().unwrap().push(name.to_string());
        if self.fail_similar.contains(name) {
            return Err(FmexportError::Api(format!(
                "injected getsimilar failure for '{}'",
                name
            )));
        }
        Ok(self.graph.get(name).cloned().unwrap_or_default())
    }

    async fn artist_detail(&self, name: &str) -> Result<Snapshot> {
        self.detail_calls.lock().unwrap().push(name.to_string());
        if self.fail_detail.contains(name) {
            return Err(FmexportError::Api(format!(
                "injected getinfo failure for '{}'",
                name
            )));
        }
        Ok(format!(r#"{{"artist":{{"name":"{}"}}}}"#, name))
    }
}
