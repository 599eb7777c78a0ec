//! Programmatic scene generation for integration tests.
//!
//! Builds small [`SceneDescription`]s in code:
//! - a unit quad, whole or split into two triangles
//! - a triangle fan with one pentagon mixed in
//! - a skinned strip on a 3-bone arm with a non-influence offset node

#![allow(dead_code)]

use std::f64::consts::FRAC_PI_2;
use std::path::{Path, PathBuf};

use glam::DQuat;
use jsmodel_export::FrameRate;
use jsmodel_export::scene::{
    FaceData, JointKey, JointNode, MeshNode, PhongParams, SceneDescription, ShadingGroup,
    ShadingModel, SkinBinding,
};

/// Shading group used by every generated mesh
pub const MATERIAL: &str = "lambert1SG";

/// Corners of the unit quad, counter-clockwise
pub const QUAD_POSITIONS: [[f64; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
];

const QUAD_UVS: [[f64; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

const UP: [f64; 3] = [0.0, 0.0, 1.0];

/// Influences of the skinned strip, in deformer order
pub const ARM_JOINTS: [&str; 3] = ["rig:shoulder", "rig:elbow", "rig:wrist"];

/// Per-vertex weights of the skinned strip
pub const ARM_WEIGHTS: [[f64; 3]; 3] = [[0.5, 0.3, 0.2], [0.0, 1.0, 0.0], [0.1, 0.2, 0.7]];

/// Last keyed frame of the arm animation
pub const ARM_END_FRAME: f64 = 12.0;

fn lambert() -> ShadingGroup {
    ShadingGroup {
        name: MATERIAL.to_string(),
        model: ShadingModel::PhongLike(PhongParams::default()),
    }
}

/// A face with planar UVs and normals taken from the quad corners
fn quad_face(vertices: &[usize]) -> FaceData {
    FaceData {
        vertices: vertices.to_vec(),
        uvs: Some(vertices.iter().map(|&v| QUAD_UVS[v]).collect()),
        normals: Some(vec![UP; vertices.len()]),
        colors: None,
        shading_group: Some(MATERIAL.to_string()),
    }
}

fn scene_with(meshes: Vec<MeshNode>) -> SceneDescription {
    SceneDescription {
        meshes,
        shading_groups: vec![lambert()],
        ..Default::default()
    }
}

/// A 1x1 quad as a single four-corner face
pub fn unit_quad() -> SceneDescription {
    scene_with(vec![MeshNode {
        name: "quad".to_string(),
        positions: QUAD_POSITIONS.to_vec(),
        faces: vec![quad_face(&[0, 1, 2, 3])],
        ..Default::default()
    }])
}

/// The unit quad split into triangles (0, 1, 2) and (0, 2, 3)
pub fn split_quad() -> SceneDescription {
    scene_with(vec![MeshNode {
        name: "split".to_string(),
        positions: QUAD_POSITIONS.to_vec(),
        faces: vec![quad_face(&[0, 1, 2]), quad_face(&[0, 2, 3])],
        ..Default::default()
    }])
}

/// `triangles` fan triangles around vertex 0 plus one pentagon
pub fn fan_with_pentagon(triangles: usize) -> SceneDescription {
    let ring = triangles + 1;
    let mut positions = vec![[0.0, 0.0, 0.0]];
    for i in 0..ring {
        let angle = i as f64 / ring as f64 * FRAC_PI_2;
        positions.push([angle.cos(), angle.sin(), 0.0]);
    }

    let mut faces: Vec<FaceData> = (1..=triangles)
        .map(|i| FaceData {
            vertices: vec![0, i, i + 1],
            normals: Some(vec![UP; 3]),
            shading_group: Some(MATERIAL.to_string()),
            ..Default::default()
        })
        .collect();
    faces.insert(
        triangles / 2,
        FaceData {
            vertices: vec![0, 1, 2, 3, 4],
            normals: Some(vec![UP; 5]),
            shading_group: Some(MATERIAL.to_string()),
            ..Default::default()
        },
    );

    scene_with(vec![MeshNode {
        name: "fan".to_string(),
        positions,
        faces,
        ..Default::default()
    }])
}

/// A three-vertex strip skinned to a shoulder/elbow/wrist chain
///
/// An unskinned `rig:offset` node sits between the shoulder and the elbow and
/// carries a quarter turn about Z. With `animated`, the elbow and wrist are
/// keyed from frame 0 to [`ARM_END_FRAME`].
pub fn skinned_arm(animated: bool) -> SceneDescription {
    let elbow_keys = if animated {
        vec![
            JointKey {
                frame: 0.0,
                rotation: Some(DQuat::IDENTITY.to_array()),
                ..Default::default()
            },
            JointKey {
                frame: ARM_END_FRAME,
                rotation: Some(DQuat::from_rotation_x(FRAC_PI_2).to_array()),
                ..Default::default()
            },
        ]
    } else {
        Vec::new()
    };
    let wrist_keys = if animated {
        vec![
            JointKey {
                frame: 0.0,
                translation: Some([0.0, 1.0, 0.0]),
                ..Default::default()
            },
            JointKey {
                frame: ARM_END_FRAME,
                translation: Some([0.0, 2.0, 0.0]),
                ..Default::default()
            },
        ]
    } else {
        Vec::new()
    };

    SceneDescription {
        frame_rate: FrameRate::Ntsc,
        meshes: vec![MeshNode {
            name: "|char|arm".to_string(),
            positions: vec![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 2.0, 0.0]],
            faces: vec![FaceData {
                vertices: vec![0, 1, 2],
                normals: Some(vec![[1.0, 0.0, 0.0]; 3]),
                shading_group: Some(MATERIAL.to_string()),
                ..Default::default()
            }],
            skin: Some(SkinBinding {
                influences: ARM_JOINTS.iter().map(|j| j.to_string()).collect(),
                weights: ARM_WEIGHTS.iter().map(|w| w.to_vec()).collect(),
            }),
            ..Default::default()
        }],
        shading_groups: vec![lambert()],
        joints: vec![
            JointNode {
                name: "rig:shoulder".to_string(),
                translation: [0.0, 0.5, 0.0],
                ..Default::default()
            },
            JointNode {
                name: "rig:offset".to_string(),
                parent: Some("rig:shoulder".to_string()),
                translation: [0.0, 1.0, 0.0],
                rotation: DQuat::from_rotation_z(FRAC_PI_2).to_array(),
                ..Default::default()
            },
            JointNode {
                name: "rig:elbow".to_string(),
                parent: Some("rig:offset".to_string()),
                translation: [1.0, 0.0, 0.0],
                keys: elbow_keys,
                ..Default::default()
            },
            JointNode {
                name: "rig:wrist".to_string(),
                parent: Some("rig:elbow".to_string()),
                translation: [0.0, 1.0, 0.0],
                rotation: DQuat::from_rotation_x(0.25).to_array(),
                keys: wrist_keys,
                ..Default::default()
            },
        ],
    }
}

/// Write a scene description as JSON and return its path
pub fn write_scene(dir: &Path, file_name: &str, scene: &SceneDescription) -> PathBuf {
    let path = dir.join(file_name);
    let text = serde_json::to_string_pretty(scene).expect("Failed to serialise scene");
    std::fs::write(&path, text).expect("Failed to write scene");
    path
}
