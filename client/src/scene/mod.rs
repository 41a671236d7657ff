//! # Scene Mutation Hooks
//!
//! The boundary between the reconciler and whatever actually renders.
//! The reconciler never touches meshes directly; it asks these hooks to
//! create, move, and remove renderable instances and holds only opaque
//! handles to them. The rendering side is assumed infallible — a mesh
//! factory failure is outside this subsystem's scope.

use std::collections::HashMap;

use campfire_shared::player::AvatarKind;
use campfire_shared::types::{Color, Transform};

/// Opaque handle to one renderable instance owned by the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneHandle(pub u64);

/// Companion animal species at the fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompanionSpecies {
    Deer,
    Fox,
    Cow,
}

/// Every mesh shape the factory can build: player avatars and companions
/// come out of the same voxel-mesh factory, differing only in shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Avatar(AvatarKind),
    Companion(CompanionSpecies),
}

/// Factory and mutation surface of the scene graph
pub trait SceneHooks {
    /// Build a renderable instance of the given shape and tint at `transform`
    fn create(&mut self, kind: MeshKind, tint: Color, transform: Transform) -> SceneHandle;

    /// Current transform of an instance (render loop may have animated it)
    fn transform(&self, handle: SceneHandle) -> Transform;

    fn set_transform(&mut self, handle: SceneHandle, transform: Transform);

    /// Destroy an instance and free its resources
    fn remove(&mut self, handle: SceneHandle);

    /// Release UI attached to an identity, e.g. the floating name label
    fn release_label(&mut self, identity: &str);
}

/// One recorded scene mutation
#[derive(Debug, Clone, PartialEq)]
pub enum SceneOp {
    Create {
        handle: SceneHandle,
        kind: MeshKind,
        tint: Color,
    },
    Remove {
        handle: SceneHandle,
    },
    ReleaseLabel {
        identity: String,
    },
}

/// A headless scene: tracks live instances and records every mutation.
/// Used as the rendering stand-in in tests and when running without a
/// display.
#[derive(Debug, Default)]
pub struct RecordingScene {
    next_handle: u64,
    instances: HashMap<SceneHandle, Transform>,
    ops: Vec<SceneOp>,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutations recorded since the last `take_ops`
    pub fn take_ops(&mut self) -> Vec<SceneOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn ops(&self) -> &[SceneOp] {
        &self.ops
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn contains(&self, handle: SceneHandle) -> bool {
        self.instances.contains_key(&handle)
    }
}

impl SceneHooks for RecordingScene {
    fn create(&mut self, kind: MeshKind, tint: Color, transform: Transform) -> SceneHandle {
        let handle = SceneHandle(self.next_handle);
        self.next_handle += 1;
        self.instances.insert(handle, transform);
        self.ops.push(SceneOp::Create { handle, kind, tint });
        handle
    }

    fn transform(&self, handle: SceneHandle) -> Transform {
        self.instances.get(&handle).copied().unwrap_or_else(Transform::identity)
    }

    fn set_transform(&mut self, handle: SceneHandle, transform: Transform) {
        if let Some(slot) = self.instances.get_mut(&handle) {
            *slot = transform;
        }
    }

    fn remove(&mut self, handle: SceneHandle) {
        self.instances.remove(&handle);
        self.ops.push(SceneOp::Remove { handle });
    }

    fn release_label(&mut self, identity: &str) {
        self.ops.push(SceneOp::ReleaseLabel { identity: identity.to_string() });
    }
}
