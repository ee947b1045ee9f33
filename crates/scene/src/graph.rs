use backdrop_common::{Color, NodeId, ResourceId, Transform};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What a node draws. Every variant refers to backend-owned resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Drawable {
    /// A batched cloud of point sprites.
    Points {
        geometry: ResourceId,
        material: ResourceId,
        count: u32,
    },
    /// A single mesh instance tinted with its own color.
    Mesh {
        geometry: ResourceId,
        material: ResourceId,
        color: Color,
        opacity: f32,
    },
    /// A line set carrying per-vertex colors (ground grid).
    Lines {
        geometry: ResourceId,
        material: ResourceId,
    },
}

impl Drawable {
    pub fn geometry(&self) -> ResourceId {
        match self {
            Self::Points { geometry, .. }
            | Self::Mesh { geometry, .. }
            | Self::Lines { geometry, .. } => *geometry,
        }
    }

    pub fn material(&self) -> ResourceId {
        match self {
            Self::Points { material, .. }
            | Self::Mesh { material, .. }
            | Self::Lines { material, .. } => *material,
        }
    }
}

/// A drawable unit with transform state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub drawable: Drawable,
    pub visible: bool,
}

/// Number of nodes of each drawable kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawableCounts {
    pub point_clouds: usize,
    /// Total points across all clouds.
    pub points: usize,
    pub meshes: usize,
    pub line_sets: usize,
}

/// Flat scene graph rooted at the origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    nodes: BTreeMap<NodeId, SceneNode>,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a visible node and return its id.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        drawable: Drawable,
    ) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            SceneNode {
                name: name.into(),
                transform,
                drawable,
                visible: true,
            },
        );
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        self.nodes.remove(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, SceneNode> {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node. Resources referenced by them are not released here.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Every distinct resource referenced by a node, in ascending order.
    pub fn referenced_resources(&self) -> BTreeSet<ResourceId> {
        self.nodes
            .values()
            .flat_map(|n| [n.drawable.geometry(), n.drawable.material()])
            .collect()
    }

    pub fn counts(&self) -> DrawableCounts {
        let mut counts = DrawableCounts::default();
        for node in self.nodes.values() {
            match node.drawable {
                Drawable::Points { count, .. } => {
                    counts.point_clouds += 1;
                    counts.points += count as usize;
                }
                Drawable::Mesh { .. } => counts.meshes += 1,
                Drawable::Lines { .. } => counts.line_sets += 1,
            }
        }
        counts
    }
}
