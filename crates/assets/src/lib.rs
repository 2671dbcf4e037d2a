//! Asset loading for the viewer: glTF/GLB metadata import, a content-addressed
//! registry, and a background loader that hands results to the frame loop.
//!
//! Models are drawn as proxies sized from their mesh bounds, so only the
//! glTF JSON document is ever read.

mod gltf;
mod loader;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hopscene_common::{Aabb, Surface};
use hopscene_kernel::{ModelPlacement, SceneModel};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use gltf::GltfDocument;
pub use loader::{AssetLoader, LoadEvent};

/// Content-addressed asset ID computed from the asset data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

/// Mesh metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub vertex_count: u32,
    pub index_count: u32,
    pub bounds: Aabb,
}

/// Material metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub surface: Surface,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            surface: Surface::default(),
        }
    }
}

/// An asset entry in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Asset {
    Mesh(Mesh),
    Material(Material),
}

/// Which scene slot an imported model is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelRole {
    /// Static structure: every mesh in the file, drawn as one proxy.
    Structure,
    /// Animated character: a single mesh picked from the node hierarchy.
    Character,
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF parse error: {0}")]
    GltfParse(String),
    #[error("unsupported GLB container version {0}")]
    UnsupportedGlbVersion(u32),
    #[error("no usable mesh in {0}")]
    NoMesh(PathBuf),
}

/// A model read from disk, ready to be registered and placed.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedModel {
    pub role: ModelRole,
    pub source: PathBuf,
    pub mesh: Mesh,
    pub material: Option<Material>,
}

impl ImportedModel {
    /// Build the scene model for this import. A surface given in the
    /// placement wins over the material found in the file.
    pub fn place(&self, placement: &ModelPlacement) -> SceneModel {
        let surface = placement
            .surface
            .or_else(|| self.material.as_ref().map(|m| m.surface))
            .unwrap_or_default();
        SceneModel {
            name: self.mesh.name.clone(),
            transform: placement.transform(),
            bounds: self.mesh.bounds,
            surface,
        }
    }
}

/// Read a `.gltf` or `.glb` file and extract the model for `role`.
pub fn import_model(path: impl AsRef<Path>, role: ModelRole) -> Result<ImportedModel, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let doc = GltfDocument::parse(&bytes)?;

    let (mesh, material) = match role {
        ModelRole::Character => {
            let index = doc
                .character_mesh()
                .ok_or_else(|| AssetError::NoMesh(path.to_path_buf()))?;
            let (vertex_count, index_count) = doc.mesh_counts(index);
            let mesh = Mesh {
                name: doc.mesh_name(index),
                vertex_count,
                index_count,
                bounds: doc.mesh_bounds(index).unwrap_or_default(),
            };
            (mesh, doc.mesh_material(index))
        }
        ModelRole::Structure => {
            if doc.meshes.is_empty() {
                return Err(AssetError::NoMesh(path.to_path_buf()));
            }
            let (vertex_count, index_count) = (0..doc.meshes.len())
                .map(|m| doc.mesh_counts(m))
                .fold((0u32, 0u32), |(v, i), (mv, mi)| {
                    (v.saturating_add(mv), i.saturating_add(mi))
                });
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "structure".into());
            let mesh = Mesh {
                name,
                vertex_count,
                index_count,
                bounds: doc.document_bounds().unwrap_or_default(),
            };
            let material = (0..doc.meshes.len()).find_map(|m| doc.mesh_material(m));
            (mesh, material)
        }
    };

    let material = material.map(|m| Material {
        name: doc.material_name(m),
        surface: doc.material_surface(m),
    });

    tracing::debug!(
        path = %path.display(),
        ?role,
        mesh = %mesh.name,
        vertices = mesh.vertex_count,
        "model imported"
    );

    Ok(ImportedModel {
        role,
        source: path.to_path_buf(),
        mesh,
        material,
    })
}

/// Content-addressed asset registry.
///
/// Identical mesh or material metadata always maps to the same [`AssetId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetStore {
    assets: BTreeMap<AssetId, Asset>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh and return its asset ID.
    pub fn register_mesh(&mut self, mesh: Mesh) -> AssetId {
        let id = mesh_hash(&mesh);
        self.assets.insert(id, Asset::Mesh(mesh));
        id
    }

    /// Register a material and return its asset ID.
    pub fn register_material(&mut self, material: Material) -> AssetId {
        let id = material_hash(&material);
        self.assets.insert(id, Asset::Material(material));
        id
    }

    /// Register both halves of an imported model.
    pub fn register_model(&mut self, model: &ImportedModel) -> (AssetId, Option<AssetId>) {
        let mesh = self.register_mesh(model.mesh.clone());
        let material = model
            .material
            .clone()
            .map(|m| self.register_material(m));
        (mesh, material)
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    pub fn get_mesh(&self, id: AssetId) -> Option<&Mesh> {
        match self.assets.get(&id) {
            Some(Asset::Mesh(m)) => Some(m),
            _ => None,
        }
    }

    pub fn get_material(&self, id: AssetId) -> Option<&Material> {
        match self.assets.get(&id) {
            Some(Asset::Material(m)) => Some(m),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &Asset)> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

fn digest_id(hasher: Sha256) -> AssetId {
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    AssetId(u64::from_le_bytes(bytes))
}

fn mesh_hash(mesh: &Mesh) -> AssetId {
    let mut hasher = Sha256::new();
    hasher.update(b"mesh");
    hasher.update(mesh.name.as_bytes());
    hasher.update(mesh.vertex_count.to_le_bytes());
    hasher.update(mesh.index_count.to_le_bytes());
    for v in mesh.bounds.min.to_array().iter().chain(&mesh.bounds.max.to_array()) {
        hasher.update(v.to_le_bytes());
    }
    digest_id(hasher)
}

fn material_hash(material: &Material) -> AssetId {
    let mut hasher = Sha256::new();
    hasher.update(b"material");
    hasher.update(material.name.as_bytes());
    let s = &material.surface;
    for c in s.base_color.iter().chain([&s.metalness, &s.roughness]) {
        hasher.update(c.to_le_bytes());
    }
    digest_id(hasher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gltf::tests::{NESTED_GLTF, glb_from_json};
    use glam::Vec3;
    use std::io::Write;

    fn write_temp(suffix: &str, bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        tmp.write_all(bytes).unwrap();
        tmp
    }

    fn cube_mesh() -> Mesh {
        Mesh {
            name: "cube".into(),
            vertex_count: 24,
            index_count: 36,
            bounds: Aabb::default(),
        }
    }

    #[test]
    fn register_mesh() {
        let mut store = AssetStore::new();
        let id = store.register_mesh(cube_mesh());
        assert!(store.get_mesh(id).is_some());
        assert!(store.get_material(id).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn content_addressed_dedup() {
        let mut store = AssetStore::new();
        let id1 = store.register_mesh(cube_mesh());
        let id2 = store.register_mesh(cube_mesh());
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn mesh_and_material_ids_differ() {
        let mut store = AssetStore::new();
        let mesh = store.register_mesh(cube_mesh());
        let mat = store.register_material(Material::default());
        assert_ne!(mesh, mat);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn import_character_from_glb() {
        let tmp = write_temp(".glb", &glb_from_json(NESTED_GLTF));
        let model = import_model(tmp.path(), ModelRole::Character).unwrap();
        assert_eq!(model.mesh.name, "frog");
        assert_eq!(model.mesh.bounds.max, Vec3::new(50.0, 40.0, 20.0));
        assert_eq!(model.material.as_ref().unwrap().name, "skin");
    }

    #[test]
    fn import_structure_unions_meshes() {
        let tmp = write_temp(".gltf", NESTED_GLTF.as_bytes());
        let model = import_model(tmp.path(), ModelRole::Structure).unwrap();
        assert_eq!(model.mesh.bounds.min, Vec3::new(-50.0, -1.0, -20.0));
        assert_eq!(model.mesh.vertex_count, 308);
    }

    #[test]
    fn structure_counts_saturate_across_meshes() {
        let json = r#"{
            "meshes": [
                { "primitives": [{ "attributes": { "POSITION": 0 } }] },
                { "primitives": [{ "attributes": { "POSITION": 0 } }] }
            ],
            "accessors": [{ "count": 4000000000 }]
        }"#;
        let tmp = write_temp(".gltf", json.as_bytes());
        let model = import_model(tmp.path(), ModelRole::Structure).unwrap();
        assert_eq!(model.mesh.vertex_count, u32::MAX);
        assert_eq!(model.mesh.index_count, 0);
    }

    #[test]
    fn import_without_meshes_fails() {
        let tmp = write_temp(".gltf", br#"{ "asset": { "version": "2.0" } }"#);
        assert!(matches!(
            import_model(tmp.path(), ModelRole::Character),
            Err(AssetError::NoMesh(_))
        ));
    }

    #[test]
    fn import_missing_file_is_io_error() {
        assert!(matches!(
            import_model("/no/such/model.glb", ModelRole::Structure),
            Err(AssetError::Io(_))
        ));
    }

    #[test]
    fn placement_surface_overrides_file_material() {
        let tmp = write_temp(".gltf", NESTED_GLTF.as_bytes());
        let model = import_model(tmp.path(), ModelRole::Character).unwrap();

        let green = Surface::from_hex(0x1daa21, 0.9, 0.1);
        let placement = ModelPlacement {
            position: Vec3::new(1.0, 0.3, 0.2),
            scale: 0.005,
            surface: Some(green),
            ..ModelPlacement::default()
        };
        let placed = model.place(&placement);
        assert_eq!(placed.surface, green);
        assert_eq!(placed.transform.position, Vec3::new(1.0, 0.3, 0.2));

        let plain = model.place(&ModelPlacement::default());
        assert_eq!(plain.surface.roughness, 0.7);
    }

    #[test]
    fn register_model_stores_both_parts() {
        let tmp = write_temp(".gltf", NESTED_GLTF.as_bytes());
        let model = import_model(tmp.path(), ModelRole::Character).unwrap();
        let mut store = AssetStore::new();
        let (mesh, material) = store.register_model(&model);
        assert!(store.get_mesh(mesh).is_some());
        assert!(store.get_material(material.unwrap()).is_some());
    }
}
