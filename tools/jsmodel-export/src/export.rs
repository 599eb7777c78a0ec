//! The export pipeline
//!
//! Meshes are processed one at a time, in selection order. All cross-mesh
//! state (vertex offset, attribute storage, materials, influences) lives in an
//! [`Accumulator`] that each mesh step takes by value and hands back, so a
//! failed mesh leaves nothing half-written behind.

use std::path::Path;

use jsmodel_shared::{DECIMALS_VERTICES, FORMAT_VERSION, GENERATED_BY, MAX_INFLUENCES, round_array};
use tracing::{debug, info};

use crate::animation::bake_animation;
use crate::attributes::AttributeStorage;
use crate::document::{Document, Metadata};
use crate::error::{ExportError, Result, SourceResult};
use crate::formats::{Style, encode_document};
use crate::material::{MaterialCollector, MeshSurface, TextureCopy};
use crate::mesh::FaceEncoder;
use crate::scene::{FsTextureResolver, SceneDescription, SceneSource, TextureResolver};
use crate::skeleton::{EMPTY_INFLUENCE, Influence, SkeletonReducer};

/// Options for one export call
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Model name: the `<name>.js` file and the `<name>/` texture folder
    pub name: String,
    /// Written to `metadata.generatedBy`
    pub generated_by: String,
    pub scale: f64,
    /// Write the document without any whitespace
    pub compact: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            name: "model".to_string(),
            generated_by: GENERATED_BY.to_string(),
            scale: 1.0,
            compact: false,
        }
    }
}

impl ExportOptions {
    pub fn style(&self) -> Style {
        if self.compact {
            Style::Compact
        } else {
            Style::Pretty
        }
    }
}

/// A finished export: the document plus the textures it references
#[derive(Debug, Clone, PartialEq)]
pub struct ExportResult {
    pub name: String,
    pub style: Style,
    pub document: Document,
    pub textures: Vec<TextureCopy>,
}

impl ExportResult {
    /// Document text in the requested style
    pub fn encode(&self) -> Result<String> {
        encode_document(&self.document, self.style)
    }
}

/// Cross-mesh export state
struct Accumulator {
    vertices: Vec<f64>,
    faces: Vec<u32>,
    face_count: usize,
    attributes: AttributeStorage,
    materials: MaterialCollector,
    skeleton: SkeletonReducer,
    /// One entry per exported vertex, padded for unskinned meshes
    skin: Vec<[Influence; MAX_INFLUENCES]>,
}

impl Accumulator {
    fn new(name: &str) -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            face_count: 0,
            attributes: AttributeStorage::default(),
            materials: MaterialCollector::new(name),
            skeleton: SkeletonReducer::new(),
            skin: Vec::new(),
        }
    }

    fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// Exports meshes from a [`SceneSource`] into a [`Document`]
pub struct Exporter<'a, S: SceneSource + ?Sized, R: TextureResolver + ?Sized> {
    source: &'a S,
    resolver: &'a R,
    options: ExportOptions,
}

impl<'a, S: SceneSource + ?Sized, R: TextureResolver + ?Sized> Exporter<'a, S, R> {
    pub fn new(source: &'a S, resolver: &'a R, options: ExportOptions) -> Self {
        Self {
            source,
            resolver,
            options,
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export the meshes in `selection`; an empty selection exports every mesh
    ///
    /// Either every mesh exports and a complete document is returned, or the
    /// first failure is.
    pub fn export(&self, selection: &[String]) -> Result<ExportResult> {
        let meshes = self.source.mesh_nodes(selection);
        if meshes.is_empty() {
            return Err(ExportError::NoMeshSelected(selection.to_vec()));
        }

        let total = meshes.len();
        let acc = meshes.iter().enumerate().try_fold(
            Accumulator::new(&self.options.name),
            |acc, (i, mesh)| {
                let acc = self
                    .export_mesh(acc, mesh)
                    .map_err(|source| ExportError::Mesh {
                        mesh: mesh.clone(),
                        source,
                    })?;
                info!(
                    "Exported mesh {}/{} '{}': {} vertices, {} faces so far",
                    i + 1,
                    total,
                    mesh,
                    acc.vertex_count(),
                    acc.face_count
                );
                Ok::<_, ExportError>(acc)
            },
        )?;

        self.finish(acc)
    }

    fn export_mesh(&self, mut acc: Accumulator, mesh: &str) -> SourceResult<Accumulator> {
        let positions = self.source.vertex_positions(mesh)?;
        let face_count = self.source.face_count(mesh)?;
        let surface = MeshSurface {
            flags: self.source.surface_flags(mesh)?,
            vertex_colors: self.source.has_vertex_colors(mesh)?,
        };

        // materials first, in face order
        let mut face_materials = Vec::with_capacity(face_count);
        for face in 0..face_count {
            let material = match self.source.face_shading_group(mesh, face)? {
                Some(group) => Some(acc.materials.collect(&group, self.source, self.resolver, &surface)?),
                None => None,
            };
            face_materials.push(material);
        }

        let vertex_offset = acc.vertex_count() as u32;
        for position in &positions {
            acc.vertices
                .extend_from_slice(&round_array(*position, DECIMALS_VERTICES));
        }

        let mut encoder = FaceEncoder::new(self.source, mesh, vertex_offset, surface.vertex_colors);
        let mut dropped = 0;
        for (face, material) in face_materials.into_iter().enumerate() {
            match encoder.encode(face, material, &mut acc.attributes)? {
                Some(record) => {
                    record.write_to(&mut acc.faces);
                    acc.face_count += 1;
                }
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!("'{}': {} faces dropped", mesh, dropped);
        }

        match self.source.skin(mesh)? {
            Some(skin) => {
                let influences = acc.skeleton.reduce(mesh, &skin, positions.len())?;
                acc.skin.extend(influences);
            }
            None => acc
                .skin
                .extend(std::iter::repeat_n([EMPTY_INFLUENCE; MAX_INFLUENCES], positions.len())),
        }

        Ok(acc)
    }

    fn finish(&self, acc: Accumulator) -> Result<ExportResult> {
        let bones = acc.skeleton.bake_bones(self.source)?;
        let animation = if bones.is_empty() {
            None
        } else {
            let parents: Vec<i32> = bones.iter().map(|b| b.parent).collect();
            bake_animation(self.source, acc.skeleton.joints(), &parents)?
        };

        let (skin_indices, skin_weights) = if bones.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            acc.skin.iter().flatten().copied().unzip()
        };

        let (materials, textures) = acc.materials.into_parts();
        let metadata = Metadata {
            format_version: FORMAT_VERSION,
            generated_by: self.options.generated_by.clone(),
            vertices: acc.vertices.len() / 3,
            faces: acc.face_count,
            normals: acc.attributes.normals.len(),
            colors: acc.attributes.colors.len(),
            uvs: acc.attributes.uvs.len(),
            materials: materials.len(),
            bones: (!bones.is_empty()).then_some(bones.len()),
        };

        let document = Document {
            metadata,
            scale: self.options.scale,
            materials,
            normals: acc.attributes.flat_normals(),
            colors: acc.attributes.colors.values().to_vec(),
            uvs: acc.attributes.flat_uvs(),
            vertices: acc.vertices,
            faces: acc.faces,
            bones,
            skin_indices,
            skin_weights,
            animation,
        };

        Ok(ExportResult {
            name: self.options.name.clone(),
            style: self.options.style(),
            document,
            textures,
        })
    }
}

/// Load a scene description and export it
///
/// Textures are resolved relative to the scene file's directory.
pub fn export_scene(path: &Path, selection: &[String], options: ExportOptions) -> Result<ExportResult> {
    let scene = SceneDescription::load(path)?;
    let base = path.parent().unwrap_or(Path::new("."));
    let resolver = FsTextureResolver::new(base);
    Exporter::new(&scene, &resolver, options).export(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{FaceData, MeshNode, ShadingGroup, ShadingModel, SkinBinding};

    struct NoTextures;

    impl TextureResolver for NoTextures {
        fn resolve(&self, _file: &str) -> Option<std::path::PathBuf> {
            None
        }
    }

    fn tri(name: &str, skin: Option<SkinBinding>) -> MeshNode {
        MeshNode {
            name: name.to_string(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            faces: vec![FaceData {
                vertices: vec![0, 1, 2],
                normals: Some(vec![[0.0, 0.0, 1.0]; 3]),
                shading_group: Some("sg".to_string()),
                ..Default::default()
            }],
            skin,
            ..Default::default()
        }
    }

    fn scene(meshes: Vec<MeshNode>) -> SceneDescription {
        SceneDescription {
            meshes,
            shading_groups: vec![ShadingGroup {
                name: "sg".to_string(),
                model: ShadingModel::Unknown,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_selection_is_an_error() {
        let scene = scene(vec![tri("a", None)]);
        let exporter = Exporter::new(&scene, &NoTextures, ExportOptions::default());
        let err = exporter.export(&["nothing".to_string()]).unwrap_err();
        assert!(matches!(err, ExportError::NoMeshSelected(_)));
    }

    #[test]
    fn test_two_meshes_offsets() {
        let scene = scene(vec![tri("a", None), tri("b", None)]);
        let exporter = Exporter::new(&scene, &NoTextures, ExportOptions::default());
        let document = exporter.export(&[]).unwrap().document;

        assert_eq!(document.metadata.vertices, 6);
        assert_eq!(document.metadata.faces, 2);
        assert_eq!(document.metadata.materials, 1);
        assert_eq!(document.metadata.normals, 6, "seam tables reset per mesh");
        assert_eq!(
            document.faces,
            vec![34, 0, 1, 2, 0, 0, 1, 2, 34, 3, 4, 5, 0, 3, 4, 5]
        );
        assert!(document.skin_indices.is_empty());
        assert!(document.colors.is_empty());
    }

    #[test]
    fn test_unskinned_mesh_padded_when_other_is_skinned() {
        let skin = SkinBinding {
            influences: vec!["j".to_string()],
            weights: vec![vec![1.0]; 3],
        };
        let mut scene = scene(vec![tri("plain", None), tri("skinned", Some(skin))]);
        scene.joints.push(crate::scene::JointNode {
            name: "j".to_string(),
            ..Default::default()
        });

        let exporter = Exporter::new(&scene, &NoTextures, ExportOptions::default());
        let document = exporter.export(&[]).unwrap().document;

        assert_eq!(document.skin_indices.len(), 2 * document.metadata.vertices);
        assert_eq!(document.skin_weights.len(), 2 * document.metadata.vertices);
        assert_eq!(&document.skin_indices[..6], &[-1; 6]);
        assert_eq!(&document.skin_indices[6..], &[0, -1, 0, -1, 0, -1]);
        assert_eq!(document.metadata.bones, Some(1));
        assert!(document.animation.is_none());
    }

    #[test]
    fn test_mesh_fault_names_mesh() {
        let mut broken = tri("broken", None);
        broken.faces[0].vertices = vec![0, 1, 7];
        let scene = scene(vec![tri("ok", None), broken]);

        let exporter = Exporter::new(&scene, &NoTextures, ExportOptions::default());
        let err = exporter.export(&[]).unwrap_err();
        assert!(matches!(err, ExportError::Mesh { ref mesh, .. } if mesh == "broken"));
    }

    #[test]
    fn test_options_reach_document() {
        let scene = scene(vec![tri("a", None)]);
        let options = ExportOptions {
            name: "thing".to_string(),
            generated_by: "tests".to_string(),
            scale: 0.5,
            compact: true,
        };
        let result = Exporter::new(&scene, &NoTextures, options).export(&[]).unwrap();

        assert_eq!(result.name, "thing");
        assert_eq!(result.style, Style::Compact);
        assert_eq!(result.document.scale, 0.5);
        assert_eq!(result.document.metadata.generated_by, "tests");
        assert!(!result.encode().unwrap().contains('\n'));
    }
}
