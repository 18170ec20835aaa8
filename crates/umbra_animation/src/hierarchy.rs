//! Node hierarchy of an imported scene.
//!
//! The tree is stored as an arena in depth-first pre-order: `nodes[0]` is the
//! root and every parent precedes its children. A single forward pass over
//! the arena therefore visits parents before children, which is all the
//! animator needs to accumulate transforms without recursion.

use glam::Mat4;
use smallvec::SmallVec;

use umbra_core::{ImportedScene, Result, UmbraError, mat4_from_import};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(u32);

impl NodeIndex {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub name: String,
    /// Bind transform relative to the parent.
    pub transform: Mat4,
    pub parent: Option<NodeIndex>,
    pub children: SmallVec<[NodeIndex; 4]>,
}

#[derive(Debug, Clone)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
}

impl Hierarchy {
    /// Copies the scene's node tree below its root.
    ///
    /// Fails when the scene has no root, when a node is reachable twice
    /// (cycles or shared children), when a child index is out of range, or
    /// when nesting exceeds `max_depth`.
    pub fn from_imported(scene: &ImportedScene, max_depth: usize) -> Result<Self> {
        let root = scene
            .root
            .filter(|&idx| idx < scene.nodes.len())
            .ok_or_else(|| UmbraError::MissingRoot(scene.label.clone()))?;

        let mut visited = vec![false; scene.nodes.len()];
        let mut nodes: Vec<HierarchyNode> = Vec::with_capacity(scene.nodes.len());
        // (source index, parent in the new arena, depth)
        let mut stack: Vec<(usize, Option<NodeIndex>, usize)> = vec![(root, None, 0)];

        while let Some((src_idx, parent, depth)) = stack.pop() {
            let Some(src) = scene.nodes.get(src_idx) else {
                return Err(UmbraError::InvalidHierarchy(format!(
                    "node index {src_idx} out of range ({} nodes)",
                    scene.nodes.len()
                )));
            };
            if visited[src_idx] {
                return Err(UmbraError::InvalidHierarchy(format!(
                    "node '{}' is reachable more than once",
                    src.name
                )));
            }
            if depth > max_depth {
                return Err(UmbraError::InvalidHierarchy(format!(
                    "node '{}' nests deeper than {max_depth}",
                    src.name
                )));
            }
            visited[src_idx] = true;

            let idx = NodeIndex(nodes.len() as u32);
            if let Some(parent) = parent {
                nodes[parent.index()].children.push(idx);
            }
            nodes.push(HierarchyNode {
                name: src.name.clone(),
                transform: mat4_from_import(&src.transform),
                parent,
                children: SmallVec::new(),
            });

            // Reverse so the first child is popped (and numbered) first
            for &child in src.children.iter().rev() {
                stack.push((child, Some(idx), depth + 1));
            }
        }

        Ok(Self { nodes })
    }

    #[must_use]
    pub fn root(&self) -> &HierarchyNode {
        &self.nodes[0]
    }

    #[must_use]
    pub fn get(&self, idx: NodeIndex) -> Option<&HierarchyNode> {
        self.nodes.get(idx.index())
    }

    /// All nodes in depth-first pre-order.
    #[must_use]
    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(|i| NodeIndex(i as u32))
    }

    #[must_use]
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.nodes
            .get(idx.index())
            .map_or(&[], |n| n.children.as_slice())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a hierarchy has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
