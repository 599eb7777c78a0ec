//! Shared attribute tables for UVs, normals and colors
//!
//! Storage is global across the whole export and only ever appended to.
//! Identity is per mesh: each mesh gets a fresh [`SeamTable`] per attribute
//! kind, mapping a mesh-local vertex to the shared indices already emitted at
//! that vertex. Corners at the same vertex with equal rounded values reuse an
//! index; differing values (seams, hard edges) get a new one.

use hashbrown::HashMap;
use jsmodel_shared::{DECIMALS_NORMALS, DECIMALS_UVS, DEFAULT_COLOR, pack_color_rgb8, round_array};

/// An attribute kind with its quantisation rule
pub trait AttributeKind {
    /// Value as sampled from the scene
    type Raw: Copy;
    /// Value as stored in the document, compared exactly
    type Value: Clone + PartialEq;

    fn quantize(raw: Self::Raw) -> Self::Value;
}

/// Texture coordinates, 3 decimals
#[derive(Debug)]
pub enum Uv {}

/// Corner normals, 3 decimals
#[derive(Debug)]
pub enum Normal {}

/// Corner colors, 3 decimals then packed to `0xRRGGBB`
#[derive(Debug)]
pub enum Color {}

impl AttributeKind for Uv {
    type Raw = [f64; 2];
    type Value = [f64; 2];

    fn quantize(raw: [f64; 2]) -> [f64; 2] {
        round_array(raw, DECIMALS_UVS)
    }
}

impl AttributeKind for Normal {
    type Raw = [f64; 3];
    type Value = [f64; 3];

    fn quantize(raw: [f64; 3]) -> [f64; 3] {
        round_array(raw, DECIMALS_NORMALS)
    }
}

impl AttributeKind for Color {
    type Raw = [f64; 3];
    type Value = u32;

    fn quantize(raw: [f64; 3]) -> u32 {
        pack_color_rgb8(raw)
    }
}

/// Append-only global storage for one attribute kind
#[derive(Debug)]
pub struct SharedAttributes<K: AttributeKind> {
    values: Vec<K::Value>,
}

impl<K: AttributeKind> Default for SharedAttributes<K> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl<K: AttributeKind> SharedAttributes<K> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[K::Value] {
        &self.values
    }

    /// Append a value at the next global index
    fn push(&mut self, value: K::Value) -> u32 {
        let index = self.values.len() as u32;
        self.values.push(value);
        index
    }
}

/// Per-mesh map from vertex to the (shared index, value) pairs emitted there
#[derive(Debug)]
pub struct SeamTable<K: AttributeKind> {
    entries: HashMap<usize, Vec<(u32, K::Value)>>,
}

impl<K: AttributeKind> Default for SeamTable<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: AttributeKind> SeamTable<K> {
    /// Shared index for `raw` at mesh-local `vertex`
    ///
    /// The value is quantised before lookup; the first matching entry wins,
    /// otherwise a new entry is appended to `storage`.
    pub fn resolve(&mut self, storage: &mut SharedAttributes<K>, vertex: usize, raw: K::Raw) -> u32 {
        let value = K::quantize(raw);
        let seen = self.entries.entry(vertex).or_default();

        if let Some((index, _)) = seen.iter().find(|(_, v)| *v == value) {
            return *index;
        }

        let index = storage.push(value.clone());
        seen.push((index, value));
        index
    }
}

/// Global storage for every attribute kind
#[derive(Debug, Default)]
pub struct AttributeStorage {
    pub uvs: SharedAttributes<Uv>,
    pub normals: SharedAttributes<Normal>,
    pub colors: SharedAttributes<Color>,
}

impl AttributeStorage {
    /// Reserve color index 0 for corners without an authored color
    pub fn ensure_color_sentinel(&mut self) {
        if self.colors.is_empty() {
            self.colors.push(DEFAULT_COLOR);
        }
    }

    /// Flat `[u, v, u, v, ...]` sequence
    pub fn flat_uvs(&self) -> Vec<f64> {
        self.uvs.values().iter().flatten().copied().collect()
    }

    /// Flat `[x, y, z, ...]` sequence
    pub fn flat_normals(&self) -> Vec<f64> {
        self.normals.values().iter().flatten().copied().collect()
    }
}

/// Fresh per-mesh seam tables
#[derive(Debug, Default)]
pub struct MeshSeams {
    pub uvs: SeamTable<Uv>,
    pub normals: SeamTable<Normal>,
    pub colors: SeamTable<Color>,
}
