//! Material collection
//!
//! Shading groups are deduplicated by name across every mesh of an export.
//! The first mesh to reference a group decides its record; later meshes can
//! only promote the vertex-color flag.

use std::path::PathBuf;

use hashbrown::HashMap;
use jsmodel_shared::{DEBUG_COLOR, DECIMALS_COLORS, DECIMALS_MATERIAL, round_array, round_to};
use tracing::{debug, warn};

use crate::document::Material;
use crate::error::SourceResult;
use crate::scene::{
    PhongParams, Roughness, SceneSource, ShadingModel, SurfaceFlags, TextureInput, TextureResolver,
};

/// Texture repeat written for every resolved map
const MAP_REPEAT: [u32; 2] = [1, 1];

/// Lower bound for Blinn eccentricity before converting to an exponent
const MIN_ECCENTRICITY: f64 = 0.01;

/// A texture file to copy next to the written document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureCopy {
    /// Resolved absolute path
    pub source: PathBuf,
    /// Path relative to the document, `<name>/<file>`
    pub destination: String,
}

/// Per-mesh state that feeds into the materials it references
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshSurface {
    pub flags: SurfaceFlags,
    pub vertex_colors: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MapSlot {
    Diffuse,
    Specular,
    Bump,
    Normal,
}

impl MapSlot {
    fn assign(self, material: &mut Material, destination: String) {
        match self {
            MapSlot::Diffuse => {
                material.map_diffuse = Some(destination);
                material.map_diffuse_repeat = Some(MAP_REPEAT);
                material.color_diffuse = None;
            }
            MapSlot::Specular => {
                material.map_specular = Some(destination);
                material.map_specular_repeat = Some(MAP_REPEAT);
                material.color_specular = None;
            }
            MapSlot::Bump => {
                material.map_bump = Some(destination);
                material.map_bump_repeat = Some(MAP_REPEAT);
            }
            MapSlot::Normal => {
                material.map_normal = Some(destination);
                material.map_normal_repeat = Some(MAP_REPEAT);
            }
        }
    }
}

/// Specular exponent for a roughness parameter
pub fn specular_coef(roughness: Roughness) -> f64 {
    let coef = match roughness {
        Roughness::CosinePower(power) => power,
        Roughness::Eccentricity(e) => {
            let e = e.clamp(MIN_ECCENTRICITY, 1.0);
            2.0 / (e * e) - 2.0
        }
    };
    round_to(coef, DECIMALS_MATERIAL)
}

/// Opacity from per-channel transparency, 1 = opaque
pub fn opacity(transparency: [f64; 3]) -> f64 {
    1.0 - transparency.iter().sum::<f64>() / 3.0
}

/// Collects materials in first-seen order
#[derive(Debug)]
pub struct MaterialCollector {
    materials: Vec<Material>,
    index: HashMap<String, u32>,
    textures: Vec<TextureCopy>,
    export_name: String,
}

impl MaterialCollector {
    /// `export_name` names the texture destination folder
    pub fn new(export_name: impl Into<String>) -> Self {
        Self {
            materials: Vec::new(),
            index: HashMap::new(),
            textures: Vec::new(),
            export_name: export_name.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn textures(&self) -> &[TextureCopy] {
        &self.textures
    }

    pub fn into_parts(self) -> (Vec<Material>, Vec<TextureCopy>) {
        (self.materials, self.textures)
    }

    /// Material index for a shading group, collecting it on first sight
    pub fn collect<S, R>(
        &mut self,
        group: &str,
        source: &S,
        resolver: &R,
        surface: &MeshSurface,
    ) -> SourceResult<u32>
    where
        S: SceneSource + ?Sized,
        R: TextureResolver + ?Sized,
    {
        if let Some(&index) = self.index.get(group) {
            if surface.vertex_colors {
                self.materials[index as usize].vertex_colors = Some(true);
            }
            return Ok(index);
        }

        let shading = source.shading_group(group)?;
        let index = self.materials.len() as u32;

        let mut material = Material {
            dbg_color: DEBUG_COLOR,
            dbg_index: index,
            dbg_name: shading.name.clone(),
            shading: "Lambert".to_string(),
            ..Default::default()
        };

        match &shading.model {
            ShadingModel::PhongLike(params) => {
                material.shading = "Phong".to_string();
                self.apply_phong(&mut material, params, resolver);
            }
            ShadingModel::Basic(params) => {
                material.shading = "Basic".to_string();
                material.color_diffuse = Some(round_array(params.color, DECIMALS_COLORS));
            }
            ShadingModel::Unknown => {
                debug!("Shading group '{}' has an unsupported shader", group);
            }
        }

        if surface.flags.double_sided {
            material.double_sided = Some(true);
        } else if surface.flags.opposite {
            material.flip_sided = Some(true);
        }
        if surface.vertex_colors {
            material.vertex_colors = Some(true);
        }

        debug!(
            "Collected material {} '{}' ({})",
            index, material.dbg_name, material.shading
        );
        self.materials.push(material);
        self.index.insert(group.to_string(), index);
        Ok(index)
    }

    fn apply_phong<R: TextureResolver + ?Sized>(
        &mut self,
        material: &mut Material,
        params: &PhongParams,
        resolver: &R,
    ) {
        material.color_diffuse = Some(round_array(params.diffuse, DECIMALS_COLORS));
        material.color_ambient = Some(round_array(params.ambient, DECIMALS_COLORS));

        let opacity = opacity(params.transparency);
        if opacity < 1.0 {
            material.transparency = Some(round_to(opacity, DECIMALS_MATERIAL));
            material.transparent = Some(true);
        }

        if let Some(specular) = &params.specular {
            material.color_specular = Some(round_array(specular.color, DECIMALS_COLORS));
            material.specular_coef = Some(specular_coef(specular.roughness));
        }

        if let Some(input) = &params.diffuse_map {
            self.apply_map(material, MapSlot::Diffuse, input, resolver);
        }
        if let Some(input) = &params.bump_map {
            self.apply_map(material, MapSlot::Bump, input, resolver);
        }
        if let Some(input) = params.specular.as_ref().and_then(|s| s.map.as_ref()) {
            self.apply_map(material, MapSlot::Specular, input, resolver);
        }
    }

    fn apply_map<R: TextureResolver + ?Sized>(
        &mut self,
        material: &mut Material,
        slot: MapSlot,
        input: &TextureInput,
        resolver: &R,
    ) {
        let (slot, file) = match input {
            TextureInput::File(file) => (slot, file),
            TextureInput::Bump {
                interpretation,
                file,
            } => {
                let slot = if *interpretation != 0 {
                    MapSlot::Normal
                } else {
                    slot
                };
                (slot, file)
            }
            TextureInput::Procedural(node) => {
                warn!(
                    "Material '{}': '{}' needs texture baking, which is not supported; map omitted",
                    material.dbg_name, node
                );
                return;
            }
        };

        let Some(resolved) = resolver.resolve(file) else {
            warn!(
                "Material '{}': texture '{}' not found; map omitted",
                material.dbg_name, file
            );
            return;
        };
        let Some(file_name) = resolved.file_name().and_then(|n| n.to_str()) else {
            warn!(
                "Material '{}': texture path {:?} has no usable file name; map omitted",
                material.dbg_name, resolved
            );
            return;
        };

        let destination = match self.textures.iter().find(|t| t.source == resolved) {
            Some(copy) => copy.destination.clone(),
            None => {
                let destination = self.free_destination(file_name);
                if destination != format!("{}/{}", self.export_name, file_name) {
                    warn!(
                        "Material '{}': another texture is already named '{}', writing {:?} as '{}'",
                        material.dbg_name, file_name, resolved, destination
                    );
                }
                self.textures.push(TextureCopy {
                    source: resolved.clone(),
                    destination: destination.clone(),
                });
                destination
            }
        };
        slot.assign(material, destination);
    }

    /// `<name>/<file>`, or `<name>/<stem>_<n>.<ext>` when a different source
    /// already claimed that destination
    fn free_destination(&self, file_name: &str) -> String {
        let taken = |candidate: &str| self.textures.iter().any(|t| t.destination == candidate);

        let destination = format!("{}/{}", self.export_name, file_name);
        if !taken(destination.as_str()) {
            return destination;
        }

        let (stem, ext) = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (file_name, None),
        };
        (1u32..)
            .map(|n| match ext {
                Some(ext) => format!("{}/{}_{}.{}", self.export_name, stem, n, ext),
                None => format!("{}/{}_{}", self.export_name, stem, n),
            })
            .find(|candidate| !taken(candidate.as_str()))
            .unwrap_or(destination)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::scene::{BasicParams, SceneDescription, ShadingGroup, Specular};

    /// Resolves every file under a fixed fake directory except `missing*`
    struct FakeResolver;

    impl TextureResolver for FakeResolver {
        fn resolve(&self, file: &str) -> Option<PathBuf> {
            if file.starts_with("missing") {
                None
            } else {
                Some(Path::new("/textures").join(file))
            }
        }
    }

    fn scene(groups: Vec<ShadingGroup>) -> SceneDescription {
        SceneDescription {
            shading_groups: groups,
            ..Default::default()
        }
    }

    fn phong(name: &str, params: PhongParams) -> ShadingGroup {
        ShadingGroup {
            name: name.to_string(),
            model: ShadingModel::PhongLike(params),
        }
    }

    #[test]
    fn test_specular_coef() {
        assert_eq!(specular_coef(Roughness::CosinePower(20.0)), 20.0);
        assert_eq!(specular_coef(Roughness::Eccentricity(0.5)), 6.0);
        assert_eq!(specular_coef(Roughness::Eccentricity(1.0)), 0.0);
        // clamped to 0.01 -> 2 / 0.0001 - 2
        assert_eq!(specular_coef(Roughness::Eccentricity(0.0)), 19998.0);
        // 2 / 0.09 - 2, kept to three decimals
        assert_eq!(specular_coef(Roughness::Eccentricity(0.3)), 20.222);
    }

    #[test]
    fn test_opacity() {
        assert_eq!(opacity([0.0, 0.0, 0.0]), 1.0);
        assert_eq!(opacity([0.5, 0.5, 0.5]), 0.5);
    }

    #[test]
    fn test_first_seen_order_and_dedup() {
        let scene = scene(vec![
            phong("a", PhongParams::default()),
            phong("b", PhongParams::default()),
        ]);
        let mut collector = MaterialCollector::new("model");
        let surface = MeshSurface::default();

        assert_eq!(collector.collect("b", &scene, &FakeResolver, &surface), Ok(0));
        assert_eq!(collector.collect("a", &scene, &FakeResolver, &surface), Ok(1));
        assert_eq!(collector.collect("b", &scene, &FakeResolver, &surface), Ok(0));
        assert_eq!(collector.len(), 2);
        assert_eq!(collector.materials()[0].dbg_name, "b");
        assert_eq!(collector.materials()[1].dbg_index, 1);
    }

    #[test]
    fn test_first_mesh_decides_flags() {
        let scene = scene(vec![phong("shared", PhongParams::default())]);
        let mut collector = MaterialCollector::new("model");

        let first = MeshSurface {
            flags: SurfaceFlags {
                double_sided: true,
                opposite: false,
            },
            vertex_colors: false,
        };
        let second = MeshSurface {
            flags: SurfaceFlags {
                double_sided: false,
                opposite: true,
            },
            vertex_colors: true,
        };

        collector.collect("shared", &scene, &FakeResolver, &first).unwrap();
        collector.collect("shared", &scene, &FakeResolver, &second).unwrap();

        let material = &collector.materials()[0];
        assert_eq!(material.double_sided, Some(true));
        assert_eq!(material.flip_sided, None, "later mesh must not overwrite");
        assert_eq!(material.vertex_colors, Some(true), "vertex colors may be promoted");
    }

    #[test]
    fn test_phong_fields() {
        let scene = scene(vec![phong(
            "shiny",
            PhongParams {
                diffuse: [0.8, 0.2, 0.1],
                ambient: [0.0, 0.0, 0.0],
                transparency: [0.25, 0.25, 0.25],
                specular: Some(Specular {
                    color: [1.0, 1.0, 1.0],
                    roughness: Roughness::CosinePower(30.0),
                    map: None,
                }),
                diffuse_map: None,
                bump_map: None,
            },
        )]);
        let mut collector = MaterialCollector::new("model");
        collector
            .collect("shiny", &scene, &FakeResolver, &MeshSurface::default())
            .unwrap();

        let material = &collector.materials()[0];
        assert_eq!(material.shading, "Phong");
        assert_eq!(material.dbg_color, 0xFFFFFF);
        assert_eq!(material.color_diffuse, Some([0.8, 0.2, 0.1]));
        assert_eq!(material.color_specular, Some([1.0, 1.0, 1.0]));
        assert_eq!(material.specular_coef, Some(30.0));
        assert_eq!(material.transparency, Some(0.75));
        assert_eq!(material.transparent, Some(true));
    }

    #[test]
    fn test_opaque_has_no_transparency() {
        let scene = scene(vec![phong("matte", PhongParams::default())]);
        let mut collector = MaterialCollector::new("model");
        collector
            .collect("matte", &scene, &FakeResolver, &MeshSurface::default())
            .unwrap();

        let material = &collector.materials()[0];
        assert_eq!(material.transparency, None);
        assert_eq!(material.transparent, None);
        assert_eq!(material.specular_coef, None);
    }

    #[test]
    fn test_basic_and_unknown_shading() {
        let scene = scene(vec![
            ShadingGroup {
                name: "flat".to_string(),
                model: ShadingModel::Basic(BasicParams {
                    color: [0.0, 1.0, 0.0],
                }),
            },
            ShadingGroup {
                name: "toon".to_string(),
                model: ShadingModel::Unknown,
            },
        ]);
        let mut collector = MaterialCollector::new("model");
        let surface = MeshSurface::default();
        collector.collect("flat", &scene, &FakeResolver, &surface).unwrap();
        collector.collect("toon", &scene, &FakeResolver, &surface).unwrap();

        assert_eq!(collector.materials()[0].shading, "Basic");
        assert_eq!(collector.materials()[0].color_diffuse, Some([0.0, 1.0, 0.0]));
        assert_eq!(collector.materials()[1].shading, "Lambert");
        assert_eq!(collector.materials()[1].color_diffuse, None);
    }

    #[test]
    fn test_texture_maps() {
        let scene = scene(vec![phong(
            "textured",
            PhongParams {
                specular: Some(Specular {
                    color: [1.0, 1.0, 1.0],
                    roughness: Roughness::Eccentricity(0.5),
                    map: Some(TextureInput::File("missing_spec.png".to_string())),
                }),
                diffuse_map: Some(TextureInput::File("wood.png".to_string())),
                bump_map: Some(TextureInput::Bump {
                    interpretation: 1,
                    file: "wood_n.png".to_string(),
                }),
                ..Default::default()
            },
        )]);
        let mut collector = MaterialCollector::new("crate");
        collector
            .collect("textured", &scene, &FakeResolver, &MeshSurface::default())
            .unwrap();

        let material = &collector.materials()[0];
        assert_eq!(material.map_diffuse.as_deref(), Some("crate/wood.png"));
        assert_eq!(material.map_diffuse_repeat, Some([1, 1]));
        assert_eq!(material.color_diffuse, None, "diffuse map replaces the color");
        assert_eq!(material.map_normal.as_deref(), Some("crate/wood_n.png"));
        assert_eq!(material.map_bump, None);
        assert_eq!(material.map_specular, None, "unresolved map is omitted");
        assert_eq!(material.color_specular, Some([1.0, 1.0, 1.0]));

        let textures = collector.textures();
        assert_eq!(textures.len(), 2);
        assert_eq!(textures[0].source, PathBuf::from("/textures/wood.png"));
        assert_eq!(textures[0].destination, "crate/wood.png");
    }

    #[test]
    fn test_same_file_name_gets_unique_destination() {
        let diffuse = |file: &str| PhongParams {
            diffuse_map: Some(TextureInput::File(file.to_string())),
            ..Default::default()
        };
        let scene = scene(vec![
            phong("oak", diffuse("a/wood.png")),
            phong("pine", diffuse("b/wood.png")),
            phong("oak2", diffuse("a/wood.png")),
        ]);
        let mut collector = MaterialCollector::new("m");
        for group in ["oak", "pine", "oak2"] {
            collector
                .collect(group, &scene, &FakeResolver, &MeshSurface::default())
                .unwrap();
        }

        let maps: Vec<_> = collector
            .materials()
            .iter()
            .map(|m| m.map_diffuse.as_deref())
            .collect();
        assert_eq!(maps, vec![Some("m/wood.png"), Some("m/wood_1.png"), Some("m/wood.png")]);

        let textures = collector.textures();
        assert_eq!(textures.len(), 2, "same source is copied once");
        assert_eq!(textures[0].source, PathBuf::from("/textures/a/wood.png"));
        assert_eq!(textures[1].source, PathBuf::from("/textures/b/wood.png"));
        assert_eq!(textures[1].destination, "m/wood_1.png");
    }

    #[test]
    fn test_procedural_map_omitted() {
        let scene = scene(vec![phong(
            "noisy",
            PhongParams {
                diffuse_map: Some(TextureInput::Procedural("noise1".to_string())),
                ..Default::default()
            },
        )]);
        let mut collector = MaterialCollector::new("model");
        collector
            .collect("noisy", &scene, &FakeResolver, &MeshSurface::default())
            .unwrap();

        let material = &collector.materials()[0];
        assert_eq!(material.map_diffuse, None);
        assert_eq!(material.color_diffuse, Some([0.5, 0.5, 0.5]));
        assert!(collector.textures().is_empty());
    }

    #[test]
    fn test_missing_group_is_an_error() {
        let scene = scene(Vec::new());
        let mut collector = MaterialCollector::new("model");
        assert!(
            collector
                .collect("ghost", &scene, &FakeResolver, &MeshSurface::default())
                .is_err()
        );
    }
}
