//! Hierarchical 2D transforms.
//!
//! Nodes are stored in an arena and refer to their parents and children by key,
//! so removing a node never leaves a dangling reference behind.

use crate::math::{self as m, Angle, Mat3, Vec2};

use thunderdome as td;

/// Key type to look up a transform stored in a [`TransformTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransformKey(pub(crate) td::Index);

impl TransformKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// Errors from editing the structure of a [`TransformTree`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    #[error("The transform does not exist (it may have been removed)")]
    MissingNode,
    #[error("Setting this parent would make the transform its own ancestor")]
    ParentCycle,
}

/// Position, rotation and scale of a node relative to its parent.
///
/// `center` is the pivot that rotation and scaling happen around,
/// expressed in the node's own unscaled frame.
#[derive(Clone, Debug)]
pub struct Transform {
    pub local_position: Vec2,
    /// Rotation in radians.
    pub local_rotation: f32,
    pub local_scale: Vec2,
    pub center: Vec2,
    parent: Option<TransformKey>,
    children: Vec<TransformKey>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            local_position: Vec2::zero(),
            local_rotation: 0.0,
            local_scale: Vec2::new(1.0, 1.0),
            center: Vec2::zero(),
            parent: None,
            children: Vec::new(),
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.local_position = position;
        self
    }

    #[inline]
    pub fn with_rotation(mut self, angle: Angle) -> Self {
        self.local_rotation = angle.rad();
        self
    }

    #[inline]
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.local_scale = scale;
        self
    }

    #[inline]
    pub fn with_center(mut self, center: Vec2) -> Self {
        self.center = center;
        self
    }

    /// Local rotation as an angle.
    #[inline]
    pub fn rotation(&self) -> Angle {
        Angle::Rad(self.local_rotation)
    }

    #[inline]
    pub fn rotation_deg(&self) -> f32 {
        self.rotation().deg()
    }

    #[inline]
    pub fn set_rotation(&mut self, angle: Angle) {
        self.local_rotation = angle.rad();
    }

    #[inline]
    pub fn parent(&self) -> Option<TransformKey> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[TransformKey] {
        &self.children
    }

    /// Matrix from this node's space to its parent's, given the parent's pivot.
    fn to_parent(&self, parent_center: Vec2) -> Mat3 {
        m::translation(self.local_position)
            * m::translation(parent_center)
            * m::rotation(self.local_rotation)
            * m::scale(self.local_scale)
            * m::translation(-self.center)
    }

    /// Exact inverse of [`to_parent`][Self::to_parent] where the scale is non-zero.
    fn from_parent(&self, parent_center: Vec2) -> Mat3 {
        m::translation(self.center)
            * m::inverse_scale(self.local_scale)
            * m::rotation(-self.local_rotation)
            * m::translation(-parent_center)
            * m::translation(-self.local_position)
    }
}

/// Arena of transform nodes linked into a forest.
///
/// Matrices are computed on demand by walking up through parents.
#[derive(Default)]
pub struct TransformTree {
    nodes: td::Arena<Transform>,
}

impl TransformTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a transform as a root node.
    /// Any parent or children carried by the value are discarded.
    pub fn insert(&mut self, mut transform: Transform) -> TransformKey {
        transform.parent = None;
        transform.children.clear();
        TransformKey(self.nodes.insert(transform))
    }

    #[inline]
    pub fn get(&self, key: TransformKey) -> Option<&Transform> {
        self.nodes.get(key.0)
    }

    #[inline]
    pub fn get_mut(&mut self, key: TransformKey) -> Option<&mut Transform> {
        self.nodes.get_mut(key.0)
    }

    #[inline]
    pub fn contains(&self, key: TransformKey) -> bool {
        self.nodes.contains(key.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove a transform, returning it if it still existed.
    ///
    /// Its children become root nodes and keep their local values.
    pub fn remove(&mut self, key: TransformKey) -> Option<Transform> {
        let removed = self.nodes.remove(key.0)?;
        if let Some(parent) = removed.parent.and_then(|p| self.nodes.get_mut(p.0)) {
            parent.children.retain(|c| *c != key);
        }
        for child in &removed.children {
            if let Some(child) = self.nodes.get_mut(child.0) {
                child.parent = None;
            }
        }
        Some(removed)
    }

    #[inline]
    pub fn parent(&self, key: TransformKey) -> Option<TransformKey> {
        self.get(key).and_then(|t| t.parent)
    }

    #[inline]
    pub fn children(&self, key: TransformKey) -> &[TransformKey] {
        self.get(key).map(|t| t.children()).unwrap_or(&[])
    }

    /// Attach `child` under `parent`, or detach it with `None`.
    /// Local values are kept as they are, so the child moves along with its new parent.
    pub fn set_parent(
        &mut self,
        child: TransformKey,
        parent: Option<TransformKey>,
    ) -> Result<(), TransformError> {
        if !self.contains(child) {
            return Err(TransformError::MissingNode);
        }
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(TransformError::MissingNode);
            }
            if self.ancestors_inclusive(parent).any(|a| a == child) {
                return Err(TransformError::ParentCycle);
            }
        }

        let old_parent = self.nodes[child.0].parent;
        if let Some(old) = old_parent.and_then(|p| self.nodes.get_mut(p.0)) {
            old.children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = parent;
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(child);
        }
        Ok(())
    }

    /// Iterate from a node up to its root, starting with the node itself.
    fn ancestors_inclusive(&self, key: TransformKey) -> impl '_ + Iterator<Item = TransformKey> {
        std::iter::successors(Some(key).filter(|k| self.contains(*k)), move |k| {
            self.parent(*k)
        })
    }

    fn parent_center(&self, transform: &Transform) -> Vec2 {
        transform
            .parent
            .and_then(|p| self.get(p))
            .map(|p| p.center)
            .unwrap_or_else(Vec2::zero)
    }

    /// Matrix from a node's local space to its parent's space
    /// (world space for root nodes).
    pub fn local_to_parent(&self, key: TransformKey) -> Option<Mat3> {
        let tr = self.get(key)?;
        Some(tr.to_parent(self.parent_center(tr)))
    }

    /// Matrix from a node's parent space to its local space.
    pub fn parent_to_local(&self, key: TransformKey) -> Option<Mat3> {
        let tr = self.get(key)?;
        Some(tr.from_parent(self.parent_center(tr)))
    }

    /// Matrix from a node's local space to world space:
    /// the parent's local-to-world times this node's local-to-parent.
    pub fn local_to_world(&self, key: TransformKey) -> Option<Mat3> {
        self.get(key)?;
        Some(
            self.ancestors_inclusive(key)
                .filter_map(|k| self.local_to_parent(k))
                .fold(Mat3::identity(), |acc, to_parent| to_parent * acc),
        )
    }

    /// Matrix from world space to a node's local space,
    /// the product of per-node inverses in reverse order.
    pub fn world_to_local(&self, key: TransformKey) -> Option<Mat3> {
        self.get(key)?;
        Some(
            self.ancestors_inclusive(key)
                .filter_map(|k| self.parent_to_local(k))
                .fold(Mat3::identity(), |acc, from_parent| acc * from_parent),
        )
    }

    /// Matrix from a node's parent space to world space (identity for roots).
    fn parent_to_world(&self, key: TransformKey) -> Option<Mat3> {
        match self.get(key)?.parent {
            Some(parent) => self.local_to_world(parent),
            None => Some(Mat3::identity()),
        }
    }

    fn world_to_parent(&self, key: TransformKey) -> Option<Mat3> {
        match self.get(key)?.parent {
            Some(parent) => self.world_to_local(parent),
            None => Some(Mat3::identity()),
        }
    }

    /// World-space position of a node's pivot.
    pub fn position(&self, key: TransformKey) -> Option<Vec2> {
        let center = self.get(key)?.center;
        Some(m::transform_point(&self.local_to_world(key)?, center))
    }

    /// Move a node so that its pivot ends up at the given world-space position.
    pub fn set_position(
        &mut self,
        key: TransformKey,
        position: Vec2,
    ) -> Result<(), TransformError> {
        let to_parent = self.world_to_parent(key).ok_or(TransformError::MissingNode)?;
        let parent_center = self
            .get(key)
            .map(|tr| self.parent_center(tr))
            .ok_or(TransformError::MissingNode)?;
        let local = m::transform_point(&to_parent, position) - parent_center;
        if let Some(tr) = self.get_mut(key) {
            tr.local_position = local;
        }
        Ok(())
    }

    /// Move a node by a world-space displacement.
    pub fn translate(&mut self, key: TransformKey, offset: Vec2) -> Result<(), TransformError> {
        let to_parent = self.world_to_parent(key).ok_or(TransformError::MissingNode)?;
        let local_offset = m::transform_vector(&to_parent, offset);
        if let Some(tr) = self.get_mut(key) {
            tr.local_position += local_offset;
        }
        Ok(())
    }

    /// Accumulated rotation of a node and all its ancestors.
    pub fn rotation(&self, key: TransformKey) -> Option<Angle> {
        self.get(key)?;
        Some(Angle::Rad(
            self.ancestors_inclusive(key)
                .filter_map(|k| self.get(k))
                .map(|tr| tr.local_rotation)
                .sum(),
        ))
    }

    /// Convert a point from world space into the local space of a node.
    #[inline]
    pub fn world_point_to_local(&self, key: TransformKey, point: Vec2) -> Option<Vec2> {
        Some(m::transform_point(&self.world_to_local(key)?, point))
    }

    /// Convert a point from the local space of a node into world space.
    #[inline]
    pub fn local_point_to_world(&self, key: TransformKey, point: Vec2) -> Option<Vec2> {
        Some(m::transform_point(&self.local_to_world(key)?, point))
    }

    /// Matrix used by the parent-to-world conversion, exposed for renderers that
    /// draw a node relative to its parent.
    #[inline]
    pub fn parent_matrix(&self, key: TransformKey) -> Option<Mat3> {
        self.parent_to_world(key)
    }
}
