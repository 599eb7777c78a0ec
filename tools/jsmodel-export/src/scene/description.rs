//! In-memory scene loaded from a JSON scene description
//!
//! This is the collaborator the CLI and the tests use. Mesh positions are
//! stored in world space; transform nodes store local TRS plus optional
//! keyframes and are composed up the parent chain on demand.

use std::path::Path;

use glam::{DMat4, DQuat, DVec3};
use jsmodel_shared::FrameRate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::interpolate::{interpolate_quat, interpolate_vec3};
use super::{SceneSource, ShadingGroup, SkinBinding, SurfaceFlags};
use crate::error::{ExportError, Result, SourceError, SourceResult};

/// A complete scene: meshes, shading groups and transform nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub frame_rate: FrameRate,
    #[serde(default)]
    pub meshes: Vec<MeshNode>,
    #[serde(default)]
    pub shading_groups: Vec<ShadingGroup>,
    /// Joints and any other transform nodes in their hierarchy
    #[serde(default)]
    pub joints: Vec<JointNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshNode {
    pub name: String,
    /// World-space vertex positions
    pub positions: Vec<[f64; 3]>,
    #[serde(default)]
    pub faces: Vec<FaceData>,
    #[serde(default)]
    pub double_sided: bool,
    #[serde(default)]
    pub opposite: bool,
    #[serde(default)]
    pub skin: Option<SkinBinding>,
}

/// One polygon; per-corner arrays must match `vertices` in length
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceData {
    pub vertices: Vec<usize>,
    #[serde(default)]
    pub uvs: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    pub normals: Option<Vec<[f64; 3]>>,
    #[serde(default)]
    pub colors: Option<Vec<Option<[f64; 3]>>>,
    #[serde(default)]
    pub shading_group: Option<String>,
}

/// A transform node with its rest pose and animation keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointNode {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub translation: [f64; 3],
    /// Quaternion as `[x, y, z, w]`
    #[serde(default = "identity_rotation")]
    pub rotation: [f64; 4],
    #[serde(default = "unit_scale")]
    pub scale: [f64; 3],
    #[serde(default)]
    pub keys: Vec<JointKey>,
}

impl Default for JointNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent: None,
            translation: [0.0; 3],
            rotation: identity_rotation(),
            scale: unit_scale(),
            keys: Vec::new(),
        }
    }
}

fn identity_rotation() -> [f64; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn unit_scale() -> [f64; 3] {
    [1.0; 3]
}

/// A keyframe; channels left out hold the rest value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointKey {
    pub frame: f64,
    #[serde(default)]
    pub translation: Option<[f64; 3]>,
    #[serde(default)]
    pub rotation: Option<[f64; 4]>,
    #[serde(default)]
    pub scale: Option<[f64; 3]>,
}

impl SceneDescription {
    /// Load a scene description from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ExportError::Scene {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let scene = Self::from_json_str(&text).map_err(|e| ExportError::Scene {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        debug!(
            "Loaded scene {:?}: {} meshes, {} shading groups, {} transform nodes",
            path,
            scene.meshes.len(),
            scene.shading_groups.len(),
            scene.joints.len()
        );
        Ok(scene)
    }

    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    fn mesh(&self, name: &str) -> SourceResult<&MeshNode> {
        self.meshes
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| SourceError::MissingNode(name.to_string()))
    }

    fn face(&self, mesh: &str, face: usize) -> SourceResult<&FaceData> {
        let node = self.mesh(mesh)?;
        node.faces.get(face).ok_or_else(|| {
            SourceError::invalid(
                mesh,
                format!("face {} out of range ({} faces)", face, node.faces.len()),
            )
        })
    }

    fn joint(&self, name: &str) -> SourceResult<&JointNode> {
        self.joints
            .iter()
            .find(|j| j.name == name)
            .ok_or_else(|| SourceError::MissingNode(name.to_string()))
    }

    /// Local transform of a node, sampled at `frame` when given
    fn local_matrix(joint: &JointNode, frame: Option<f64>) -> DMat4 {
        let rest_t = DVec3::from_array(joint.translation);
        let rest_r = DQuat::from_array(joint.rotation).normalize();
        let rest_s = DVec3::from_array(joint.scale);

        let Some(frame) = frame else {
            return DMat4::from_scale_rotation_translation(rest_s, rest_r, rest_t);
        };

        let (t_times, t_values): (Vec<f64>, Vec<DVec3>) = joint
            .keys
            .iter()
            .filter_map(|k| k.translation.map(|t| (k.frame, DVec3::from_array(t))))
            .unzip();
        let (r_times, r_values): (Vec<f64>, Vec<DQuat>) = joint
            .keys
            .iter()
            .filter_map(|k| k.rotation.map(|r| (k.frame, DQuat::from_array(r).normalize())))
            .unzip();
        let (s_times, s_values): (Vec<f64>, Vec<DVec3>) = joint
            .keys
            .iter()
            .filter_map(|k| k.scale.map(|s| (k.frame, DVec3::from_array(s))))
            .unzip();

        DMat4::from_scale_rotation_translation(
            interpolate_vec3(&s_times, &s_values, frame, rest_s),
            interpolate_quat(&r_times, &r_values, frame, rest_r),
            interpolate_vec3(&t_times, &t_values, frame, rest_t),
        )
    }
}

impl SceneSource for SceneDescription {
    fn mesh_nodes(&self, selection: &[String]) -> Vec<String> {
        self.meshes
            .iter()
            .filter(|m| selection.is_empty() || selection.contains(&m.name))
            .map(|m| m.name.clone())
            .collect()
    }

    fn vertex_positions(&self, mesh: &str) -> SourceResult<Vec<[f64; 3]>> {
        Ok(self.mesh(mesh)?.positions.clone())
    }

    fn face_count(&self, mesh: &str) -> SourceResult<usize> {
        Ok(self.mesh(mesh)?.faces.len())
    }

    fn face_vertices(&self, mesh: &str, face: usize) -> SourceResult<Vec<usize>> {
        let vertex_count = self.mesh(mesh)?.positions.len();
        let data = self.face(mesh, face)?;
        if let Some(&bad) = data.vertices.iter().find(|&&v| v >= vertex_count) {
            return Err(SourceError::invalid(
                mesh,
                format!(
                    "face {} references vertex {} ({} vertices)",
                    face, bad, vertex_count
                ),
            ));
        }
        Ok(data.vertices.clone())
    }

    fn face_uvs(&self, mesh: &str, face: usize) -> SourceResult<Vec<[f64; 2]>> {
        let data = self.face(mesh, face)?;
        let uvs = data.uvs.as_ref().ok_or_else(|| SourceError::MissingAttribute {
            node: mesh.to_string(),
            attribute: "uvs",
        })?;
        check_corners(mesh, face, data, uvs.len())?;
        Ok(uvs.clone())
    }

    fn face_normals(&self, mesh: &str, face: usize) -> SourceResult<Vec<[f64; 3]>> {
        let data = self.face(mesh, face)?;
        let normals = data
            .normals
            .as_ref()
            .ok_or_else(|| SourceError::MissingAttribute {
                node: mesh.to_string(),
                attribute: "normals",
            })?;
        check_corners(mesh, face, data, normals.len())?;
        Ok(normals.clone())
    }

    fn has_vertex_colors(&self, mesh: &str) -> SourceResult<bool> {
        Ok(self.mesh(mesh)?.faces.iter().any(|f| {
            f.colors
                .as_ref()
                .is_some_and(|colors| colors.iter().any(Option::is_some))
        }))
    }

    fn face_colors(&self, mesh: &str, face: usize) -> SourceResult<Vec<Option<[f64; 3]>>> {
        let data = self.face(mesh, face)?;
        match &data.colors {
            Some(colors) => {
                check_corners(mesh, face, data, colors.len())?;
                Ok(colors.clone())
            }
            None => Ok(vec![None; data.vertices.len()]),
        }
    }

    fn face_shading_group(&self, mesh: &str, face: usize) -> SourceResult<Option<String>> {
        Ok(self.face(mesh, face)?.shading_group.clone())
    }

    fn shading_group(&self, name: &str) -> SourceResult<ShadingGroup> {
        self.shading_groups
            .iter()
            .find(|g| g.name == name)
            .cloned()
            .ok_or_else(|| SourceError::MissingNode(name.to_string()))
    }

    fn surface_flags(&self, mesh: &str) -> SourceResult<SurfaceFlags> {
        let node = self.mesh(mesh)?;
        Ok(SurfaceFlags {
            double_sided: node.double_sided,
            opposite: node.opposite,
        })
    }

    fn skin(&self, mesh: &str) -> SourceResult<Option<SkinBinding>> {
        Ok(self.mesh(mesh)?.skin.clone())
    }

    fn joint_ancestors(&self, joint: &str) -> SourceResult<Vec<String>> {
        let mut ancestors = Vec::new();
        let mut current = self.joint(joint)?;
        while let Some(parent) = &current.parent {
            if ancestors.len() >= self.joints.len() {
                return Err(SourceError::invalid(joint, "parent chain forms a cycle"));
            }
            current = self.joint(parent)?;
            ancestors.push(parent.clone());
        }
        Ok(ancestors)
    }

    fn joint_world_matrix(&self, joint: &str, frame: Option<f64>) -> SourceResult<DMat4> {
        let node = self.joint(joint)?;
        let mut world = Self::local_matrix(node, frame);
        for ancestor in self.joint_ancestors(joint)? {
            world = Self::local_matrix(self.joint(&ancestor)?, frame) * world;
        }
        Ok(world)
    }

    fn keyframe_times(&self, joints: &[String]) -> SourceResult<Vec<f64>> {
        let mut times = Vec::new();
        for name in joints {
            times.extend(self.joint(name)?.keys.iter().map(|k| k.frame));
        }
        times.sort_by(f64::total_cmp);
        times.dedup();
        Ok(times)
    }

    fn frame_rate(&self) -> SourceResult<FrameRate> {
        Ok(self.frame_rate)
    }
}

fn check_corners(mesh: &str, face: usize, data: &FaceData, len: usize) -> SourceResult<()> {
    if len != data.vertices.len() {
        return Err(SourceError::invalid(
            mesh,
            format!(
                "face {} has {} corners but {} per-corner values",
                face,
                data.vertices.len(),
                len
            ),
        ));
    }
    Ok(())
}
