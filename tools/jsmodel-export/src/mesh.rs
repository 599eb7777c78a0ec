//! Face record encoding
//!
//! Each retained polygon becomes a bitmask followed by global vertex indices,
//! an optional material index and per-corner shared indices into the UV,
//! normal and color tables. See [`jsmodel_shared::format`] for the layout.

use jsmodel_shared::{
    DEFAULT_COLOR_INDEX, FACE_COLOR, FACE_MATERIAL, FACE_NORMAL, FACE_QUAD, FACE_UV, FACE_VERTEX_COLOR,
    FACE_VERTEX_NORMAL, FACE_VERTEX_UV, MAX_FACE_CORNERS, face_corners,
};
use tracing::debug;

use crate::attributes::{AttributeStorage, MeshSeams};
use crate::error::{SourceError, SourceResult};
use crate::scene::SceneSource;

/// One encoded polygon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceRecord {
    /// Global vertex indices, 3 or 4
    pub vertices: Vec<u32>,
    pub material: Option<u32>,
    pub uvs: Option<Vec<u32>>,
    pub normals: Option<Vec<u32>>,
    pub colors: Option<Vec<u32>>,
}

impl FaceRecord {
    /// Bitmask describing which fields follow
    pub fn mask(&self) -> u8 {
        let mut mask = 0;
        if self.vertices.len() == 4 {
            mask |= FACE_QUAD;
        }
        if self.material.is_some() {
            mask |= FACE_MATERIAL;
        }
        if self.uvs.is_some() {
            mask |= FACE_VERTEX_UV;
        }
        if self.normals.is_some() {
            mask |= FACE_VERTEX_NORMAL;
        }
        if self.colors.is_some() {
            mask |= FACE_VERTEX_COLOR;
        }
        mask
    }

    /// Append the mask and fields in record order
    pub fn write_to(&self, out: &mut Vec<u32>) {
        out.push(u32::from(self.mask()));
        out.extend_from_slice(&self.vertices);
        out.extend(self.material);
        for indices in [&self.uvs, &self.normals, &self.colors].into_iter().flatten() {
            out.extend_from_slice(indices);
        }
    }

    /// Decode a flat `faces` sequence
    ///
    /// Face-level (non per-corner) UV, normal and color indices are skipped.
    /// Returns `None` if the sequence ends inside a record.
    pub fn parse_all(data: &[u32]) -> Option<Vec<FaceRecord>> {
        let mut records = Vec::new();
        let mut pos = 0;

        while pos < data.len() {
            let mask = u8::try_from(data[pos]).ok()?;
            pos += 1;
            let corners = face_corners(mask);

            let mut take = |count: usize| -> Option<Vec<u32>> {
                let fields = data.get(pos..pos + count)?.to_vec();
                pos += count;
                Some(fields)
            };

            let vertices = take(corners)?;
            let material = if mask & FACE_MATERIAL != 0 {
                Some(take(1)?[0])
            } else {
                None
            };

            let mut per_corner = |face_bit: u8, corner_bit: u8| -> Option<Option<Vec<u32>>> {
                if mask & face_bit != 0 {
                    take(1)?;
                }
                if mask & corner_bit != 0 {
                    Some(Some(take(corners)?))
                } else {
                    Some(None)
                }
            };

            let uvs = per_corner(FACE_UV, FACE_VERTEX_UV)?;
            let normals = per_corner(FACE_NORMAL, FACE_VERTEX_NORMAL)?;
            let colors = per_corner(FACE_COLOR, FACE_VERTEX_COLOR)?;

            records.push(FaceRecord {
                vertices,
                material,
                uvs,
                normals,
                colors,
            });
        }

        Some(records)
    }
}

/// Encodes the faces of one mesh
///
/// Holds the mesh's seam tables, so a new encoder is created per mesh while
/// the [`AttributeStorage`] it appends to lives for the whole export.
pub struct FaceEncoder<'a, S: SceneSource + ?Sized> {
    source: &'a S,
    mesh: &'a str,
    vertex_offset: u32,
    has_colors: bool,
    seams: MeshSeams,
}

impl<'a, S: SceneSource + ?Sized> FaceEncoder<'a, S> {
    pub fn new(source: &'a S, mesh: &'a str, vertex_offset: u32, has_colors: bool) -> Self {
        Self {
            source,
            mesh,
            vertex_offset,
            has_colors,
            seams: MeshSeams::default(),
        }
    }

    /// Encode one face, or `None` if it is dropped
    ///
    /// Faces with more than four corners are dropped. Missing UVs, normals or
    /// colors on a face only leave those fields out (colors fall back to the
    /// sentinel entry); any other query fault is returned.
    pub fn encode(
        &mut self,
        face: usize,
        material: Option<u32>,
        storage: &mut AttributeStorage,
    ) -> SourceResult<Option<FaceRecord>> {
        let local = self.source.face_vertices(self.mesh, face)?;
        if local.len() > MAX_FACE_CORNERS {
            debug!(
                "Dropping face {} of '{}': {} corners",
                face,
                self.mesh,
                local.len()
            );
            return Ok(None);
        }
        if local.len() < 3 {
            debug!("Dropping degenerate face {} of '{}'", face, self.mesh);
            return Ok(None);
        }

        let vertices = local
            .iter()
            .map(|&v| self.vertex_offset + v as u32)
            .collect();

        let uvs = self.tolerate(face, self.source.face_uvs(self.mesh, face))?.map(|uvs| {
            local
                .iter()
                .zip(uvs)
                .map(|(&v, uv)| self.seams.uvs.resolve(&mut storage.uvs, v, uv))
                .collect()
        });

        let normals = self
            .tolerate(face, self.source.face_normals(self.mesh, face))?
            .map(|normals| {
                local
                    .iter()
                    .zip(normals)
                    .map(|(&v, n)| self.seams.normals.resolve(&mut storage.normals, v, n))
                    .collect()
            });

        let colors = if self.has_colors {
            storage.ensure_color_sentinel();
            let authored = self
                .tolerate(face, self.source.face_colors(self.mesh, face))?
                .unwrap_or_else(|| vec![None; local.len()]);
            Some(
                local
                    .iter()
                    .zip(authored)
                    .map(|(&v, color)| match color {
                        Some(rgb) => self.seams.colors.resolve(&mut storage.colors, v, rgb),
                        None => DEFAULT_COLOR_INDEX,
                    })
                    .collect(),
            )
        } else {
            None
        };

        Ok(Some(FaceRecord {
            vertices,
            material,
            uvs,
            normals,
            colors,
        }))
    }

    /// Turn a missing per-face attribute into `None`
    fn tolerate<T>(&self, face: usize, result: SourceResult<T>) -> SourceResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(SourceError::MissingAttribute { attribute, .. }) => {
                debug!("Face {} of '{}' has no {}", face, self.mesh, attribute);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
