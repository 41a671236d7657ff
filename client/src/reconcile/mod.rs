//! # Snapshot Reconciliation
//!
//! Maps full-state player snapshots onto locally owned renderable
//! instances. The store never says what changed — every snapshot is the
//! complete current state of the room — so this module diffs each snapshot
//! against its private instance table and applies the minimal
//! create/update/remove operations through `SceneHooks`.
//!
//! The reconciler is the sole writer of the instance table. It runs
//! synchronously inside the snapshot-delivery path and must stay
//! idempotent: replaying the same snapshot produces no scene mutations.

use std::collections::HashMap;

use log::debug;

use campfire_shared::constants::scene::AVATAR_RING_RADIUS;
use campfire_shared::player::{AvatarKind, PlayerDoc};
use campfire_shared::types::{Color, Transform};

use crate::scene::{MeshKind, SceneHandle, SceneHooks};

/// The reconciler's private record for one remote player: the scene handle
/// plus the last-applied attributes, used to tell no-op snapshots from
/// real changes. Never shared outside this module.
#[derive(Debug, Clone)]
struct LocalInstance {
    handle: SceneHandle,
    kind: AvatarKind,
    tint: Color,
    name: String,
}

/// Reconciles player snapshots against the local scene
#[derive(Debug, Default)]
pub struct EntityReconciler {
    instances: HashMap<String, LocalInstance>,
}

impl EntityReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one full snapshot of the players collection.
    ///
    /// Idempotent and callable with arbitrary frequency and content,
    /// including the empty snapshot. Operations for a single identity are
    /// applied as one unit; ordering across identities is unspecified.
    pub fn reconcile(
        &mut self,
        snapshot: &HashMap<String, PlayerDoc>,
        scene: &mut dyn SceneHooks,
    ) {
        // Additions and updates
        for (uid, player) in snapshot {
            match self.instances.get_mut(uid) {
                None => {
                    let transform = Transform::on_ring(player.angle, AVATAR_RING_RADIUS);
                    let handle =
                        scene.create(MeshKind::Avatar(player.kind), player.color, transform);
                    debug!("spawned avatar for {uid} ({})", player.kind.as_str());
                    self.instances.insert(
                        uid.clone(),
                        LocalInstance {
                            handle,
                            kind: player.kind,
                            tint: player.color,
                            name: player.name.clone(),
                        },
                    );
                }
                Some(instance) => {
                    // Name changes are metadata only; no geometry churn.
                    if instance.name != player.name {
                        instance.name = player.name.clone();
                    }
                    if instance.kind != player.kind || instance.tint != player.color {
                        // Rebuild the mesh, but inherit the old transform
                        // so the avatar doesn't jump.
                        let transform = scene.transform(instance.handle);
                        scene.remove(instance.handle);
                        let handle =
                            scene.create(MeshKind::Avatar(player.kind), player.color, transform);
                        debug!("rebuilt avatar for {uid} ({})", player.kind.as_str());
                        instance.handle = handle;
                        instance.kind = player.kind;
                        instance.tint = player.color;
                    }
                }
            }
        }

        // Removals: locally known, absent from the snapshot
        let departed: Vec<String> = self
            .instances
            .keys()
            .filter(|uid| !snapshot.contains_key(*uid))
            .cloned()
            .collect();
        for uid in departed {
            if let Some(instance) = self.instances.remove(&uid) {
                scene.remove(instance.handle);
                scene.release_label(&uid);
                debug!("removed avatar for departed {uid}");
            }
        }
    }

    /// Identities currently mirrored into the scene
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.instances.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Last-applied display name for an identity, if known
    pub fn display_name(&self, uid: &str) -> Option<&str> {
        self.instances.get(uid).map(|i| i.name.as_str())
    }
}

/// Validate a raw collection snapshot into the reconciler's input map,
/// skipping documents that fail validation.
pub fn snapshot_from_documents(docs: &[serde_json::Value]) -> HashMap<String, PlayerDoc> {
    let mut snapshot = HashMap::with_capacity(docs.len());
    for doc in docs {
        match PlayerDoc::from_document(doc) {
            Some(player) => {
                snapshot.insert(player.uid.clone(), player);
            }
            None => debug!("ignoring malformed player document: {doc}"),
        }
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{RecordingScene, SceneOp};
    use serde_json::json;

    fn player(uid: &str, name: &str, kind: AvatarKind, color: &str, angle: f32) -> PlayerDoc {
        PlayerDoc {
            uid: uid.to_string(),
            name: name.to_string(),
            kind,
            color: Color::from_hex(color).unwrap(),
            angle,
            last_seen: 0,
        }
    }

    fn snapshot(players: &[PlayerDoc]) -> HashMap<String, PlayerDoc> {
        players.iter().map(|p| (p.uid.clone(), p.clone())).collect()
    }

    #[test]
    fn reconcile_creates_one_instance_per_identity() {
        let mut reconciler = EntityReconciler::new();
        let mut scene = RecordingScene::new();

        let snap = snapshot(&[
            player("a", "Ash", AvatarKind::Human, "#1d4ed8", 0.0),
            player("b", "Brook", AvatarKind::Mage, "#15803d", 1.0),
        ]);
        reconciler.reconcile(&snap, &mut scene);

        assert_eq!(reconciler.len(), 2);
        assert_eq!(scene.len(), 2);
        assert_eq!(
            scene.ops().iter().filter(|op| matches!(op, SceneOp::Create { .. })).count(),
            2
        );
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut reconciler = EntityReconciler::new();
        let mut scene = RecordingScene::new();
        let snap = snapshot(&[player("a", "Ash", AvatarKind::Human, "#1d4ed8", 0.0)]);

        reconciler.reconcile(&snap, &mut scene);
        scene.take_ops();

        // Second pass with the identical snapshot: zero scene mutations
        reconciler.reconcile(&snap, &mut scene);
        assert!(scene.ops().is_empty());
    }

    #[test]
    fn instance_table_matches_snapshot_exactly() {
        let mut reconciler = EntityReconciler::new();
        let mut scene = RecordingScene::new();

        reconciler.reconcile(
            &snapshot(&[
                player("a", "Ash", AvatarKind::Human, "#1d4ed8", 0.0),
                player("b", "Brook", AvatarKind::Dog, "#b91c1c", 1.0),
                player("c", "Cole", AvatarKind::Mage, "#15803d", 2.0),
            ]),
            &mut scene,
        );
        reconciler.reconcile(
            &snapshot(&[player("b", "Brook", AvatarKind::Dog, "#b91c1c", 1.0)]),
            &mut scene,
        );

        let mut ids: Vec<&str> = reconciler.identities().collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(scene.len(), 1);

        reconciler.reconcile(&HashMap::new(), &mut scene);
        assert!(reconciler.is_empty());
        assert!(scene.is_empty());
    }

    #[test]
    fn name_only_change_does_not_rebuild_geometry() {
        let mut reconciler = EntityReconciler::new();
        let mut scene = RecordingScene::new();

        reconciler.reconcile(
            &snapshot(&[player("a", "Ash", AvatarKind::Human, "#1d4ed8", 0.0)]),
            &mut scene,
        );
        scene.take_ops();

        reconciler.reconcile(
            &snapshot(&[player("a", "Ashlyn", AvatarKind::Human, "#1d4ed8", 0.0)]),
            &mut scene,
        );
        assert!(scene.ops().is_empty());
        assert_eq!(reconciler.display_name("a"), Some("Ashlyn"));
    }

    #[test]
    fn avatar_change_rebuilds_in_place() {
        let mut reconciler = EntityReconciler::new();
        let mut scene = RecordingScene::new();

        reconciler.reconcile(
            &snapshot(&[player("a", "Ash", AvatarKind::Human, "#1d4ed8", 0.5)]),
            &mut scene,
        );
        let old_handle = match scene.take_ops().as_slice() {
            [SceneOp::Create { handle, .. }] => *handle,
            ops => panic!("expected one create, got {ops:?}"),
        };

        // Render loop nudged the avatar since it was spawned
        let mut drifted = scene.transform(old_handle);
        drifted.position.y = 0.02;
        scene.set_transform(old_handle, drifted);

        reconciler.reconcile(
            &snapshot(&[player("a", "Ash", AvatarKind::Skeleton, "#1d4ed8", 0.5)]),
            &mut scene,
        );
        let ops = scene.take_ops();
        let new_handle = match ops.as_slice() {
            [SceneOp::Remove { handle }, SceneOp::Create { handle: new, kind, .. }] => {
                assert_eq!(*handle, old_handle);
                assert_eq!(*kind, MeshKind::Avatar(AvatarKind::Skeleton));
                *new
            }
            other => panic!("expected remove+create, got {other:?}"),
        };

        // The replacement inherits the drifted transform, not the ring spawn
        assert_eq!(scene.transform(new_handle), drifted);
    }

    #[test]
    fn departure_removes_mesh_and_label() {
        let mut reconciler = EntityReconciler::new();
        let mut scene = RecordingScene::new();

        reconciler.reconcile(
            &snapshot(&[
                player("a", "Ash", AvatarKind::Human, "#1d4ed8", 0.0),
                player("b", "Brook", AvatarKind::Mage, "#15803d", 1.0),
            ]),
            &mut scene,
        );
        scene.take_ops();

        reconciler.reconcile(
            &snapshot(&[player("a", "Ash", AvatarKind::Human, "#1d4ed8", 0.0)]),
            &mut scene,
        );
        let ops = scene.take_ops();
        assert_eq!(ops.len(), 2);
        assert!(ops.iter().any(|op| matches!(op, SceneOp::Remove { .. })));
        assert!(ops
            .iter()
            .any(|op| matches!(op, SceneOp::ReleaseLabel { identity } if identity == "b")));
    }

    #[test]
    fn malformed_documents_are_skipped() {
        let docs = vec![
            json!({"uid": "a", "type": "human", "color": "#1d4ed8", "angle": 0.0}),
            json!({"type": "mage", "color": "#15803d", "angle": 1.0}),
            json!({"uid": "c", "type": "wizard", "color": "#15803d", "angle": 1.0}),
        ];
        let snap = snapshot_from_documents(&docs);
        assert_eq!(snap.len(), 1);
        assert!(snap.contains_key("a"));
    }
}
