//! glTF 2.0 metadata reader for `.gltf` (JSON) and `.glb` (binary container).
//!
//! Only the JSON document is read: node hierarchy, meshes, materials and
//! accessor bounds. Vertex buffers are never touched.

use std::collections::BTreeMap;

use glam::Vec3;
use hopscene_common::{Aabb, Surface};
use serde::Deserialize;

use crate::AssetError;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_HEADER_LEN: usize = 12;
const GLB_CHUNK_HEADER_LEN: usize = 8;
const CHUNK_TYPE_JSON: u32 = 0x4E4F_534A;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfScene {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mesh: Option<usize>,
    #[serde(default)]
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfPrimitive {
    #[serde(default)]
    pub attributes: BTreeMap<String, usize>,
    #[serde(default)]
    pub indices: Option<usize>,
    #[serde(default)]
    pub material: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfMesh {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primitives: Vec<GltfPrimitive>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
    #[serde(default)]
    pub base_color_factor: Option<[f32; 4]>,
    #[serde(default)]
    pub metallic_factor: Option<f32>,
    #[serde(default)]
    pub roughness_factor: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfMaterial {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfAccessor {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub min: Option<Vec<f32>>,
    #[serde(default)]
    pub max: Option<Vec<f32>>,
}

/// The parts of a glTF JSON document the viewer needs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfDocument {
    #[serde(default)]
    pub scene: Option<usize>,
    #[serde(default)]
    pub scenes: Vec<GltfScene>,
    #[serde(default)]
    pub nodes: Vec<GltfNode>,
    #[serde(default)]
    pub meshes: Vec<GltfMesh>,
    #[serde(default)]
    pub materials: Vec<GltfMaterial>,
    #[serde(default)]
    pub accessors: Vec<GltfAccessor>,
}

impl GltfDocument {
    /// Parse either a GLB container or a plain JSON document.
    pub fn parse(bytes: &[u8]) -> Result<Self, AssetError> {
        let json = if bytes.starts_with(GLB_MAGIC) {
            glb_json_chunk(bytes)?
        } else {
            bytes
        };
        serde_json::from_slice(json).map_err(|e| AssetError::GltfParse(e.to_string()))
    }

    /// Display name for a mesh, falling back to its index.
    pub fn mesh_name(&self, mesh: usize) -> String {
        self.meshes
            .get(mesh)
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| format!("mesh_{mesh}"))
    }

    /// Union of the `POSITION` accessor bounds across the mesh's primitives.
    pub fn mesh_bounds(&self, mesh: usize) -> Option<Aabb> {
        self.meshes
            .get(mesh)?
            .primitives
            .iter()
            .filter_map(|p| p.attributes.get("POSITION"))
            .filter_map(|&a| self.accessor_bounds(a))
            .reduce(|a, b| a.union(&b))
    }

    /// Vertex and index totals for a mesh. Totals saturate at `u32::MAX`.
    pub fn mesh_counts(&self, mesh: usize) -> (u32, u32) {
        let Some(m) = self.meshes.get(mesh) else {
            return (0, 0);
        };
        let count = |idx: Option<usize>| {
            idx.and_then(|i| self.accessors.get(i))
                .map_or(0, |a| a.count)
        };
        m.primitives.iter().fold((0, 0), |(v, i), p| {
            (
                v.saturating_add(count(p.attributes.get("POSITION").copied())),
                i.saturating_add(count(p.indices)),
            )
        })
    }

    /// Material of the first primitive that has one.
    pub fn mesh_material(&self, mesh: usize) -> Option<usize> {
        self.meshes
            .get(mesh)?
            .primitives
            .iter()
            .find_map(|p| p.material)
    }

    pub fn material_name(&self, material: usize) -> String {
        self.materials
            .get(material)
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| format!("material_{material}"))
    }

    /// Surface parameters with glTF defaults for anything unspecified.
    pub fn material_surface(&self, material: usize) -> Surface {
        let pbr = self
            .materials
            .get(material)
            .and_then(|m| m.pbr_metallic_roughness.clone())
            .unwrap_or_default();
        Surface {
            base_color: pbr.base_color_factor.unwrap_or([1.0, 1.0, 1.0, 1.0]),
            metalness: pbr.metallic_factor.unwrap_or(1.0),
            roughness: pbr.roughness_factor.unwrap_or(1.0),
        }
    }

    /// The character mesh: first child of the first root node of the default
    /// scene. Falls back to the first node carrying a mesh, then mesh 0.
    pub fn character_mesh(&self) -> Option<usize> {
        let scene = self.scenes.get(self.scene.unwrap_or(0));
        let nested = scene
            .and_then(|s| s.nodes.first())
            .and_then(|&root| self.nodes.get(root))
            .and_then(|root| root.children.first())
            .and_then(|&child| self.nodes.get(child))
            .and_then(|child| child.mesh);

        nested
            .or_else(|| self.nodes.iter().find_map(|n| n.mesh))
            .or_else(|| (!self.meshes.is_empty()).then_some(0))
            .filter(|&m| m < self.meshes.len())
    }

    /// Bounds enclosing every mesh in the document.
    pub fn document_bounds(&self) -> Option<Aabb> {
        (0..self.meshes.len())
            .filter_map(|m| self.mesh_bounds(m))
            .reduce(|a, b| a.union(&b))
    }

    fn accessor_bounds(&self, accessor: usize) -> Option<Aabb> {
        let a = self.accessors.get(accessor)?;
        let (min, max) = (a.min.as_ref()?, a.max.as_ref()?);
        if min.len() < 3 || max.len() < 3 {
            return None;
        }
        Some(Aabb::new(
            Vec3::new(min[0], min[1], min[2]),
            Vec3::new(max[0], max[1], max[2]),
        ))
    }
}

/// Slice out the JSON chunk of a GLB container.
fn glb_json_chunk(bytes: &[u8]) -> Result<&[u8], AssetError> {
    let word = |offset: usize| -> Result<u32, AssetError> {
        bytes
            .get(offset..offset + 4)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or_else(|| AssetError::GltfParse("truncated GLB header".into()))
    };

    let version = word(4)?;
    if version != 2 {
        return Err(AssetError::UnsupportedGlbVersion(version));
    }
    let declared_len = word(8)? as usize;
    if declared_len > bytes.len() {
        return Err(AssetError::GltfParse(format!(
            "GLB declares {declared_len} bytes but only {} are present",
            bytes.len()
        )));
    }

    let chunk_len = word(GLB_HEADER_LEN)? as usize;
    let chunk_type = word(GLB_HEADER_LEN + 4)?;
    if chunk_type != CHUNK_TYPE_JSON {
        return Err(AssetError::GltfParse(format!(
            "first GLB chunk has type {chunk_type:#x}, expected JSON"
        )));
    }
    let start = GLB_HEADER_LEN + GLB_CHUNK_HEADER_LEN;
    bytes
        .get(start..start + chunk_len)
        .ok_or_else(|| AssetError::GltfParse("truncated GLB JSON chunk".into()))
}
