//! Canonical resource/connection graph for one diagram session.
//!
//! The store is the only owner of resources and connections. Every mutation
//! runs to completion synchronously and leaves the graph referentially valid;
//! a rejected mutation changes nothing. Consumers observe changes through a
//! `watch` subscription instead of holding their own copies.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    max_id_suffix, Connection, ConnectionDraft, GraphError, Resource, ResourceDraft,
    CONNECTION_ID_PREFIX, RESOURCE_ID_PREFIX,
};

/// What the latest mutation did.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphChange {
    Initial,
    ResourceAdded { id: String },
    ResourceRemoved { id: String, cascaded: Vec<String> },
    ConnectionAdded { id: String },
    ConnectionRemoved { id: String },
    Replaced,
    Reset,
}

/// Published state after a mutation.
///
/// `resources_version` and `connections_version` only move when the
/// corresponding sequence changed, so a subscriber that missed intermediate
/// notifications can still tell which side needs recomputing.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    pub revision: u64,
    pub resources_version: u64,
    pub connections_version: u64,
    pub change: GraphChange,
    pub resources: Arc<Vec<Resource>>,
    pub connections: Arc<Vec<Connection>>,
}

pub struct GraphStore {
    resources: Arc<Vec<Resource>>,
    connections: Arc<Vec<Connection>>,
    resource_seq: u64,
    connection_seq: u64,
    revision: u64,
    resources_version: u64,
    connections_version: u64,
    notifier: watch::Sender<GraphSnapshot>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        let resources = Arc::new(Vec::new());
        let connections = Arc::new(Vec::new());
        let (notifier, _) = watch::channel(GraphSnapshot {
            revision: 0,
            resources_version: 0,
            connections_version: 0,
            change: GraphChange::Initial,
            resources: resources.clone(),
            connections: connections.clone(),
        });
        Self {
            resources,
            connections,
            resource_seq: 0,
            connection_seq: 0,
            revision: 0,
            resources_version: 0,
            connections_version: 0,
            notifier,
        }
    }

    /// Subscribe to change notifications. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<GraphSnapshot> {
        self.notifier.subscribe()
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn contains_resource(&self, id: &str) -> bool {
        self.resources.iter().any(|r| r.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.connections.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.notifier.borrow().clone()
    }

    pub fn add_resource(&mut self, draft: ResourceDraft) -> Resource {
        let id = next_id(
            &mut self.resource_seq,
            self.resources.iter().map(|r| r.id.as_str()),
            RESOURCE_ID_PREFIX,
        );
        let resource = Resource {
            id,
            name: draft.name,
            resource_type: draft.resource_type,
            description: draft.description,
            position: draft.position,
        };
        Arc::make_mut(&mut self.resources).push(resource.clone());
        self.resources_version += 1;
        tracing::debug!(id = %resource.id, kind = %resource.resource_type, "resource added");
        self.publish(GraphChange::ResourceAdded {
            id: resource.id.clone(),
        });
        resource
    }

    /// Remove a resource and every connection touching it.
    /// Returns false (and publishes nothing) when the id is absent.
    pub fn remove_resource(&mut self, id: &str) -> bool {
        if !self.contains_resource(id) {
            return false;
        }
        let cascaded: Vec<String> = self
            .connections
            .iter()
            .filter(|c| c.touches(id))
            .map(|c| c.id.clone())
            .collect();

        Arc::make_mut(&mut self.resources).retain(|r| r.id != id);
        self.resources_version += 1;
        if !cascaded.is_empty() {
            Arc::make_mut(&mut self.connections).retain(|c| !c.touches(id));
            self.connections_version += 1;
        }
        tracing::debug!(id, cascaded = cascaded.len(), "resource removed");
        self.publish(GraphChange::ResourceRemoved {
            id: id.to_string(),
            cascaded,
        });
        true
    }

    pub fn add_connection(&mut self, draft: ConnectionDraft) -> Result<Connection, GraphError> {
        for endpoint in [&draft.source, &draft.target] {
            if !self.contains_resource(endpoint) {
                return Err(GraphError::InvalidReference {
                    id: endpoint.clone(),
                });
            }
        }
        let id = next_id(
            &mut self.connection_seq,
            self.connections.iter().map(|c| c.id.as_str()),
            CONNECTION_ID_PREFIX,
        );
        let connection = Connection {
            id,
            source: draft.source,
            target: draft.target,
            connection_type: draft.connection_type,
            label: draft.label,
        };
        Arc::make_mut(&mut self.connections).push(connection.clone());
        self.connections_version += 1;
        tracing::debug!(
            id = %connection.id,
            source = %connection.source,
            target = %connection.target,
            "connection added"
        );
        self.publish(GraphChange::ConnectionAdded {
            id: connection.id.clone(),
        });
        Ok(connection)
    }

    pub fn remove_connection(&mut self, id: &str) -> bool {
        if !self.connections.iter().any(|c| c.id == id) {
            return false;
        }
        Arc::make_mut(&mut self.connections).retain(|c| c.id != id);
        self.connections_version += 1;
        self.publish(GraphChange::ConnectionRemoved { id: id.to_string() });
        true
    }

    /// Swap the whole graph in one step. Nothing changes when the incoming
    /// graph has duplicate resource ids or a dangling connection.
    pub fn replace_all(
        &mut self,
        resources: Vec<Resource>,
        connections: Vec<Connection>,
    ) -> Result<(), GraphError> {
        validate(&resources, &connections)?;
        tracing::debug!(
            resources = resources.len(),
            connections = connections.len(),
            "graph replaced"
        );
        if *self.resources != resources {
            self.resources = Arc::new(resources);
            self.resources_version += 1;
        }
        if *self.connections != connections {
            self.connections = Arc::new(connections);
            self.connections_version += 1;
        }
        self.publish(GraphChange::Replaced);
        Ok(())
    }

    /// Empty the store. A reset store numbers ids from 1 again.
    pub fn reset(&mut self) {
        if !self.resources.is_empty() {
            self.resources = Arc::new(Vec::new());
            self.resources_version += 1;
        }
        if !self.connections.is_empty() {
            self.connections = Arc::new(Vec::new());
            self.connections_version += 1;
        }
        self.resource_seq = 0;
        self.connection_seq = 0;
        self.publish(GraphChange::Reset);
    }

    /// Re-check the integrity invariant over the current contents.
    pub fn check_integrity(&self) -> Result<(), GraphError> {
        validate(&self.resources, &self.connections)
    }

    fn publish(&mut self, change: GraphChange) {
        self.revision += 1;
        self.notifier.send_replace(GraphSnapshot {
            revision: self.revision,
            resources_version: self.resources_version,
            connections_version: self.connections_version,
            change,
            resources: self.resources.clone(),
            connections: self.connections.clone(),
        });
    }
}

fn validate(resources: &[Resource], connections: &[Connection]) -> Result<(), GraphError> {
    let mut ids = HashSet::with_capacity(resources.len());
    for r in resources {
        if !ids.insert(r.id.as_str()) {
            return Err(GraphError::invalid_graph(format!(
                "duplicate resource id '{}'",
                r.id
            )));
        }
    }
    for c in connections {
        for endpoint in [&c.source, &c.target] {
            if !ids.contains(endpoint.as_str()) {
                return Err(GraphError::invalid_graph(format!(
                    "connection '{}' references missing resource '{}'",
                    c.id, endpoint
                )));
            }
        }
    }
    Ok(())
}

/// Allocate the next `{prefix}{N}` id past both `seq` and every id present.
///
/// Once the numbering is exhausted (a present id already carries `u64::MAX`),
/// `seq` stays put and the id comes from a `{prefix}{u64::MAX}-{k}` range that
/// `id_suffix` never parses, so later allocations cannot collide with it.
fn next_id<'a>(seq: &mut u64, present: impl Iterator<Item = &'a str> + Clone, prefix: &str) -> String {
    let highest = max_id_suffix(present.clone(), prefix);
    if let Some(next) = (*seq).max(highest).checked_add(1) {
        *seq = next;
        return format!("{prefix}{next}");
    }
    let taken: HashSet<&str> = present.collect();
    let id = (1u64..)
        .map(|k| format!("{prefix}{}-{k}", u64::MAX))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| format!("{prefix}{}-0", u64::MAX));
    tracing::warn!(%id, "id numbering exhausted, using overflow id");
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConnectionType, ResourceType};

    fn draft(name: &str) -> ResourceDraft {
        ResourceDraft::new(name, ResourceType::AppService)
    }

    fn link(store: &mut GraphStore, source: &str, target: &str) -> Connection {
        store
            .add_connection(ConnectionDraft::new(source, target, ConnectionType::DataFlow))
            .unwrap()
    }

    fn resource(id: &str) -> Resource {
        Resource {
            id: id.to_string(),
            name: id.to_string(),
            resource_type: ResourceType::KeyVault,
            description: None,
            position: None,
        }
    }

    fn connection(id: &str, source: &str, target: &str) -> Connection {
        Connection {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            connection_type: ConnectionType::Dependency,
            label: None,
        }
    }

    #[test]
    fn ids_are_sequential_and_not_reused_after_delete() {
        let mut store = GraphStore::new();
        assert_eq!(store.add_resource(draft("a")).id, "resource-1");
        assert_eq!(store.add_resource(draft("b")).id, "resource-2");
        assert!(store.remove_resource("resource-2"));
        assert_eq!(store.add_resource(draft("c")).id, "resource-3");
    }

    #[test]
    fn add_after_replace_skips_streamed_ids() {
        let mut store = GraphStore::new();
        store
            .replace_all(vec![resource("resource-1"), resource("resource-5")], vec![])
            .unwrap();
        assert_eq!(store.add_resource(draft("next")).id, "resource-6");
    }

    #[test]
    fn connection_to_missing_resource_is_rejected() {
        let mut store = GraphStore::new();
        let a = store.add_resource(draft("a"));
        let err = store
            .add_connection(ConnectionDraft::new(&a.id, "resource-9", ConnectionType::Network))
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::InvalidReference {
                id: "resource-9".into()
            }
        );
        assert!(store.connections().is_empty());
    }

    #[test]
    fn removing_resource_cascades_only_its_connections() {
        let mut store = GraphStore::new();
        let a = store.add_resource(draft("a"));
        let b = store.add_resource(draft("b"));
        let c = store.add_resource(draft("c"));
        let d = store.add_resource(draft("d"));
        link(&mut store, &a.id, &b.id);
        link(&mut store, &c.id, &a.id);
        let unrelated = link(&mut store, &c.id, &d.id);

        let mut rx = store.subscribe();
        assert!(store.remove_resource(&a.id));

        assert_eq!(store.connections(), &[unrelated]);
        store.check_integrity().unwrap();
        let snap = rx.borrow_and_update().clone();
        assert_eq!(
            snap.change,
            GraphChange::ResourceRemoved {
                id: a.id.clone(),
                cascaded: vec!["connection-1".into(), "connection-2".into()],
            }
        );
    }

    #[test]
    fn removing_absent_ids_is_a_no_op() {
        let mut store = GraphStore::new();
        store.add_resource(draft("a"));
        let before = store.revision();
        assert!(!store.remove_resource("resource-42"));
        assert!(!store.remove_connection("connection-42"));
        assert_eq!(store.revision(), before);
    }

    #[test]
    fn replace_all_is_atomic_on_dangling_connection() {
        let mut store = GraphStore::new();
        let a = store.add_resource(draft("a"));
        let before_resources = store.resources().to_vec();

        let err = store
            .replace_all(
                vec![resource("resource-1"), resource("resource-2")],
                vec![connection("connection-1", "resource-1", "resource-3")],
            )
            .unwrap_err();

        assert!(matches!(err, GraphError::InvalidGraph { .. }));
        assert_eq!(store.resources(), before_resources.as_slice());
        assert_eq!(store.resources()[0].id, a.id);
    }

    #[test]
    fn replace_all_rejects_duplicate_resource_ids() {
        let mut store = GraphStore::new();
        let err = store
            .replace_all(vec![resource("resource-1"), resource("resource-1")], vec![])
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidGraph { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn versions_track_which_sequence_changed() {
        let mut store = GraphStore::new();
        let rx = store.subscribe();
        let a = store.add_resource(draft("a"));
        let b = store.add_resource(draft("b"));
        let after_resources = rx.borrow().clone();
        link(&mut store, &a.id, &b.id);
        let after_link = rx.borrow().clone();

        assert_eq!(after_link.resources_version, after_resources.resources_version);
        assert_eq!(
            after_link.connections_version,
            after_resources.connections_version + 1
        );
        assert_eq!(after_link.connections.len(), 1);
    }

    #[test]
    fn reset_empties_and_restarts_numbering() {
        let mut store = GraphStore::new();
        let a = store.add_resource(draft("a"));
        let b = store.add_resource(draft("b"));
        link(&mut store, &a.id, &b.id);
        store.reset();
        assert!(store.is_empty());
        assert_eq!(store.snapshot().change, GraphChange::Reset);
        assert_eq!(store.add_resource(draft("again")).id, "resource-1");
    }

    #[test]
    fn integrity_holds_across_mixed_operations() {
        let mut store = GraphStore::new();
        let mut ids = Vec::new();
        for i in 0..6 {
            ids.push(store.add_resource(draft(&format!("r{i}"))).id);
        }
        for i in 0..6 {
            for j in 0..6 {
                if (i + j) % 3 == 0 && i != j {
                    link(&mut store, &ids[i], &ids[j]);
                    store.check_integrity().unwrap();
                }
            }
        }
        for (step, id) in ids.iter().enumerate() {
            if step % 2 == 0 {
                store.remove_resource(id);
            } else if let Some(conn) = store.connections().first().cloned() {
                store.remove_connection(&conn.id);
            }
            store.check_integrity().unwrap();
            for c in store.connections() {
                assert!(store.contains_resource(&c.source));
                assert!(store.contains_resource(&c.target));
            }
        }
    }

    #[test]
    fn exhausted_resource_numbering_falls_back_to_free_ids() {
        let mut store = GraphStore::new();
        let top = format!("resource-{}", u64::MAX);
        store
            .replace_all(vec![resource(&top), resource("resource-3")], vec![])
            .unwrap();

        let first = store.add_resource(draft("late"));
        let second = store.add_resource(draft("later"));
        assert_eq!(first.id, format!("resource-{}-1", u64::MAX));
        assert_eq!(second.id, format!("resource-{}-2", u64::MAX));
        assert_eq!(store.resources().len(), 4);
        store.check_integrity().unwrap();

        store.reset();
        assert_eq!(store.add_resource(draft("fresh")).id, "resource-1");
    }

    #[test]
    fn exhausted_connection_numbering_falls_back_to_free_ids() {
        let mut store = GraphStore::new();
        let top = format!("connection-{}", u64::MAX);
        store
            .replace_all(
                vec![resource("resource-1"), resource("resource-2")],
                vec![connection(&top, "resource-1", "resource-2")],
            )
            .unwrap();

        let added = link(&mut store, "resource-2", "resource-1");
        assert_eq!(added.id, format!("connection-{}-1", u64::MAX));
        assert_ne!(added.id, top);
        assert_eq!(store.connections().len(), 2);
        store.check_integrity().unwrap();
    }
}
