//! Skin reduction and bone baking
//!
//! Influences of every skinned mesh are merged into one global bone list.
//! Each vertex keeps its two strongest weights, renormalised, strongest
//! first. Bones are baked in their current pose relative to the nearest
//! ancestor that is itself an influence.

use glam::DMat4;
use hashbrown::HashMap;
use jsmodel_shared::{
    DECIMALS_POS, DECIMALS_ROT, DECIMALS_WEIGHTS, MAX_INFLUENCES, NO_BONE, round_array, round_to,
};
use tracing::debug;

use crate::document::Bone;
use crate::error::{ExportError, Result, SourceError, SourceResult};
use crate::scene::{SceneSource, SkinBinding};

/// A (bone index, weight) pair
pub type Influence = (i32, f64);

/// The pair used to pad an unused slot
pub const EMPTY_INFLUENCE: Influence = (NO_BONE, 0.0);

/// Reduce one vertex's weights to the two strongest, strongest first
///
/// Indices in the result refer to positions in `weights`. Equal weights keep
/// their source order, so the later of two equal weights ranks higher. A
/// vertex with a single non-zero weight gets `(i, 1.0)` and an empty pair.
pub fn reduce_weights(weights: &[f64]) -> [Influence; MAX_INFLUENCES] {
    let mut ranked: Vec<(i32, f64)> = weights
        .iter()
        .enumerate()
        .map(|(i, &w)| (i as i32, w))
        .collect();
    // stable, ascending
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    let Some(&(high, high_w)) = ranked.last() else {
        return [EMPTY_INFLUENCE; MAX_INFLUENCES];
    };

    match ranked.len().checked_sub(2).map(|i| ranked[i]) {
        Some((low, low_w)) if low_w > 0.0 => {
            let total = low_w + high_w;
            [
                (high, round_to(high_w / total, DECIMALS_WEIGHTS)),
                (low, round_to(low_w / total, DECIMALS_WEIGHTS)),
            ]
        }
        _ => [(high, 1.0), EMPTY_INFLUENCE],
    }
}

/// Strip DAG path and namespace prefixes from a node name
pub fn short_name(name: &str) -> &str {
    let leaf = name.rsplit('|').next().unwrap_or(name);
    leaf.rsplit(':').next().unwrap_or(leaf)
}

/// Collects influences across meshes and bakes the bone list
#[derive(Debug, Default)]
pub struct SkeletonReducer {
    joints: Vec<String>,
    index: HashMap<String, i32>,
}

impl SkeletonReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Influence joints in bone order
    pub fn joints(&self) -> &[String] {
        &self.joints
    }

    fn intern(&mut self, joint: &str) -> i32 {
        if let Some(&index) = self.index.get(joint) {
            return index;
        }
        let index = self.joints.len() as i32;
        self.joints.push(joint.to_string());
        self.index.insert(joint.to_string(), index);
        index
    }

    /// Reduce a mesh's skin to two global (bone, weight) pairs per vertex
    pub fn reduce(
        &mut self,
        mesh: &str,
        skin: &SkinBinding,
        vertex_count: usize,
    ) -> SourceResult<Vec<[Influence; MAX_INFLUENCES]>> {
        if skin.weights.len() != vertex_count {
            return Err(SourceError::invalid(
                mesh,
                format!(
                    "skin has weights for {} vertices, mesh has {}",
                    skin.weights.len(),
                    vertex_count
                ),
            ));
        }

        let global: Vec<i32> = skin.influences.iter().map(|j| self.intern(j)).collect();

        skin.weights
            .iter()
            .enumerate()
            .map(|(vertex, row)| {
                if row.len() != global.len() {
                    return Err(SourceError::invalid(
                        mesh,
                        format!(
                            "vertex {} has {} weights for {} influences",
                            vertex,
                            row.len(),
                            global.len()
                        ),
                    ));
                }
                Ok(reduce_weights(row).map(|(local, weight)| {
                    if local == NO_BONE {
                        EMPTY_INFLUENCE
                    } else {
                        (global[local as usize], weight)
                    }
                }))
            })
            .collect()
    }

    /// Index of the nearest ancestor that is also an influence
    pub fn parent_of<S: SceneSource + ?Sized>(&self, source: &S, joint: &str) -> SourceResult<i32> {
        let ancestors = source.joint_ancestors(joint)?;
        Ok(ancestors
            .iter()
            .find_map(|a| self.index.get(a.as_str()).copied())
            .unwrap_or(NO_BONE))
    }

    /// Bake the bone list from the joints' current world transforms
    pub fn bake_bones<S: SceneSource + ?Sized>(&self, source: &S) -> Result<Vec<Bone>> {
        self.joints
            .iter()
            .map(|joint| {
                self.bake_bone(source, joint)
                    .map_err(|source| ExportError::Skeleton {
                        joint: joint.clone(),
                        source,
                    })
            })
            .collect()
    }

    fn bake_bone<S: SceneSource + ?Sized>(&self, source: &S, joint: &str) -> SourceResult<Bone> {
        let parent = self.parent_of(source, joint)?;
        let world = source.joint_world_matrix(joint, None)?;
        let local = if parent == NO_BONE {
            world
        } else {
            let parent_world = source.joint_world_matrix(&self.joints[parent as usize], None)?;
            relative_to(parent_world, world)
        };

        let (_, rotation, translation) = local.to_scale_rotation_translation();
        debug!("Bone '{}' parent {}", joint, parent);

        Ok(Bone {
            parent,
            name: short_name(joint).to_string(),
            pos: round_array(translation.to_array(), DECIMALS_POS),
            rotq: round_array(rotation.to_array(), DECIMALS_ROT),
        })
    }
}

/// Express `world` in the space of `parent_world`
pub fn relative_to(parent_world: DMat4, world: DMat4) -> DMat4 {
    parent_world.inverse() * world
}
