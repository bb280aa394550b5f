//! Bipartite graph - identities on one side, objects on the other
//!
//! Vertices and edges live in arenas addressed by generational keys, with
//! adjacency stored as key lists. Edges are only ever created between an
//! identity and an object, so the bipartite invariant holds by construction.
//! Cloning the graph is a plain structural copy.

use std::collections::HashMap;

use affinity_core::{Identity, ObjectId, WeightedEdge};

/// Arena slot key: index plus the generation it was issued in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SlotKey {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena with free-list reuse. A removed slot bumps its generation,
/// so keys issued before the removal no longer resolve.
#[derive(Debug, Clone)]
struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Arena<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    fn insert(&mut self, value: T) -> SlotKey {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return SlotKey {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        SlotKey {
            index,
            generation: 0,
        }
    }

    fn get(&self, key: SlotKey) -> Option<&T> {
        self.slots
            .get(key.index as usize)
            .filter(|s| s.generation == key.generation)
            .and_then(|s| s.value.as_ref())
    }

    fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|s| s.generation == key.generation)
            .and_then(|s| s.value.as_mut())
    }

    fn remove(&mut self, key: SlotKey) -> Option<T> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        self.len -= 1;
        Some(value)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|s| s.value.as_ref())
    }
}

/// Stable handle to a vertex in the bipartite graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexKey(SlotKey);

/// Stable handle to an edge in the bipartite graph
///
/// Keys are generational: once the edge is removed the key never resolves
/// again, even if its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(SlotKey);

/// A vertex of the access graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Vertex {
    Identity(Identity),
    Object(ObjectId),
}

#[derive(Debug, Clone)]
struct VertexEntry {
    vertex: Vertex,
    edges: Vec<EdgeKey>,
}

#[derive(Debug, Clone)]
struct EdgeEntry {
    identity: VertexKey,
    object: VertexKey,
    edge: WeightedEdge,
}

/// Result of subtracting an expired delta from an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDecay {
    /// The key no longer resolves
    Missing,
    /// The edge survives with the given weight
    Decremented(u64),
    /// The edge reached zero and was removed, along with this many
    /// endpoints that were left without edges
    Removed { vertices_removed: usize },
}

/// Bipartite identity/object graph
#[derive(Debug, Clone)]
pub struct BipartiteGraph {
    vertices: Arena<VertexEntry>,
    edges: Arena<EdgeEntry>,
    identities: HashMap<Identity, VertexKey>,
    objects: HashMap<ObjectId, VertexKey>,
    /// (identity, object) -> edge
    edge_index: HashMap<(VertexKey, VertexKey), EdgeKey>,
}

impl BipartiteGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self {
            vertices: Arena::new(),
            edges: Arena::new(),
            identities: HashMap::new(),
            objects: HashMap::new(),
            edge_index: HashMap::new(),
        }
    }

    fn ensure_identity(&mut self, identity: &Identity) -> VertexKey {
        if let Some(&key) = self.identities.get(identity) {
            return key;
        }
        let key = VertexKey(self.vertices.insert(VertexEntry {
            vertex: Vertex::Identity(identity.clone()),
            edges: Vec::new(),
        }));
        self.identities.insert(identity.clone(), key);
        key
    }

    fn ensure_object(&mut self, object: ObjectId) -> VertexKey {
        if let Some(&key) = self.objects.get(&object) {
            return key;
        }
        let key = VertexKey(self.vertices.insert(VertexEntry {
            vertex: Vertex::Object(object),
            edges: Vec::new(),
        }));
        self.objects.insert(object, key);
        key
    }

    /// Find or create the edge between `identity` and `object` and bump its
    /// weight by one. New edges start at weight 1.
    pub fn increment_edge(&mut self, identity: &Identity, object: ObjectId) -> EdgeKey {
        let id_key = self.ensure_identity(identity);
        let obj_key = self.ensure_object(object);

        if let Some(&edge_key) = self.edge_index.get(&(id_key, obj_key)) {
            if let Some(entry) = self.edges.get_mut(edge_key.0) {
                entry.edge.increment();
                return edge_key;
            }
        }

        let edge_key = EdgeKey(self.edges.insert(EdgeEntry {
            identity: id_key,
            object: obj_key,
            edge: WeightedEdge::new(),
        }));
        self.edge_index.insert((id_key, obj_key), edge_key);
        for vertex in [id_key, obj_key] {
            if let Some(entry) = self.vertices.get_mut(vertex.0) {
                entry.edges.push(edge_key);
            }
        }
        edge_key
    }

    /// Subtract an expired delta from an edge.
    ///
    /// If the edge's weight does not exceed `amount` the edge is removed,
    /// together with any endpoint left at degree zero.
    pub fn decay_edge(&mut self, key: EdgeKey, amount: u64) -> EdgeDecay {
        let Some(entry) = self.edges.get_mut(key.0) else {
            return EdgeDecay::Missing;
        };

        if entry.edge.weight() > amount {
            return EdgeDecay::Decremented(entry.edge.subtract(amount));
        }

        let Some(entry) = self.edges.remove(key.0) else {
            return EdgeDecay::Missing;
        };
        self.edge_index.remove(&(entry.identity, entry.object));

        let mut vertices_removed = 0;
        for vertex in [entry.identity, entry.object] {
            let orphaned = match self.vertices.get_mut(vertex.0) {
                Some(v) => {
                    v.edges.retain(|e| *e != key);
                    v.edges.is_empty()
                }
                None => false,
            };
            if orphaned {
                if let Some(removed) = self.vertices.remove(vertex.0) {
                    match removed.vertex {
                        Vertex::Identity(id) => {
                            self.identities.remove(&id);
                        }
                        Vertex::Object(obj) => {
                            self.objects.remove(&obj);
                        }
                    }
                    vertices_removed += 1;
                }
            }
        }

        EdgeDecay::Removed { vertices_removed }
    }

    /// Weight of the edge between `identity` and `object`, if present
    pub fn edge_weight(&self, identity: &Identity, object: ObjectId) -> Option<u64> {
        let id_key = self.identities.get(identity)?;
        let obj_key = self.objects.get(&object)?;
        let edge_key = self.edge_index.get(&(*id_key, *obj_key))?;
        self.edges.get(edge_key.0).map(|e| e.edge.weight())
    }

    /// Weight of the edge behind `key`, if it still exists
    pub fn weight_of(&self, key: EdgeKey) -> Option<u64> {
        self.edges.get(key.0).map(|e| e.edge.weight())
    }

    /// Objects accessed by `identity`, with edge weights
    pub fn identity_edges<'a>(
        &'a self,
        identity: &Identity,
    ) -> impl Iterator<Item = (ObjectId, u64)> + 'a {
        self.incident(self.identities.get(identity).copied())
            .filter_map(move |e| match self.vertices.get(e.object.0) {
                Some(VertexEntry {
                    vertex: Vertex::Object(obj),
                    ..
                }) => Some((*obj, e.edge.weight())),
                _ => None,
            })
    }

    /// Identities that accessed `object`, with edge weights
    pub fn object_edges(&self, object: ObjectId) -> impl Iterator<Item = (&Identity, u64)> + '_ {
        self.incident(self.objects.get(&object).copied())
            .filter_map(move |e| match self.vertices.get(e.identity.0) {
                Some(VertexEntry {
                    vertex: Vertex::Identity(id),
                    ..
                }) => Some((id, e.edge.weight())),
                _ => None,
            })
    }

    fn incident(&self, vertex: Option<VertexKey>) -> impl Iterator<Item = &EdgeEntry> + '_ {
        vertex
            .and_then(|key| self.vertices.get(key.0))
            .map(|v| v.edges.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |key| self.edges.get(key.0))
    }

    /// Every edge as (identity, object, weight)
    pub fn edges(&self) -> impl Iterator<Item = (&Identity, ObjectId, u64)> + '_ {
        self.edges.iter().filter_map(move |e| {
            let identity = match &self.vertices.get(e.identity.0)?.vertex {
                Vertex::Identity(id) => id,
                Vertex::Object(_) => return None,
            };
            let object = match &self.vertices.get(e.object.0)?.vertex {
                Vertex::Object(obj) => *obj,
                Vertex::Identity(_) => return None,
            };
            Some((identity, object, e.edge.weight()))
        })
    }

    /// Every vertex
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter().map(|v| &v.vertex)
    }

    /// Identity vertices, unordered
    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.identities.keys()
    }

    /// Object vertices, unordered
    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    pub fn contains_identity(&self, identity: &Identity) -> bool {
        self.identities.contains_key(identity)
    }

    pub fn contains_object(&self, object: ObjectId) -> bool {
        self.objects.contains_key(&object)
    }

    /// Number of edges incident to `vertex`
    pub fn degree(&self, vertex: &Vertex) -> usize {
        let key = match vertex {
            Vertex::Identity(id) => self.identities.get(id),
            Vertex::Object(obj) => self.objects.get(obj),
        };
        key.and_then(|k| self.vertices.get(k.0))
            .map(|v| v.edges.len())
            .unwrap_or(0)
    }

    pub fn identity_count(&self) -> usize {
        self.identities.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.len() == 0
    }
}

impl Default for BipartiteGraph {
    fn default() -> Self {
        Self::new()
    }
}
