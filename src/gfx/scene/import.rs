//! Mesh file import.
//!
//! Wavefront OBJ files are read through `tobj`, triangulated and re-indexed
//! so positions and normals share one index. Every model in the file turns
//! into one [`MeshData`].

use std::path::Path;

use super::object::MeshData;

/// Extensions the open dialog offers. Only `obj` can actually be read.
pub const DIALOG_EXTENSIONS: &[&str] = &["obj", "fbx", "gltf", "dae"];

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("unsupported mesh format `{extension}` for {path}")]
    UnsupportedFormat { path: String, extension: String },
    #[error("failed to read mesh at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse OBJ at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: tobj::LoadError,
    },
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Reads every model of a mesh file.
///
/// A file without models is not an error and yields an empty list.
pub fn import_mesh_file(path: &Path) -> Result<Vec<MeshData>, ImportError> {
    let display = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if extension != "obj" {
        return Err(ImportError::UnsupportedFormat {
            path: display,
            extension,
        });
    }

    std::fs::metadata(path).map_err(|source| ImportError::Read {
        path: display.clone(),
        source,
    })?;

    let (models, materials) =
        tobj::load_obj(path, &load_options()).map_err(|source| ImportError::Parse {
            path: display.clone(),
            source,
        })?;

    // Materials are not used, a missing MTL is only worth a note
    if let Err(err) = materials {
        log::debug!("No materials for {}: {}", display, err);
    }

    let meshes = meshes_from_models(&models);
    if meshes.is_empty() {
        log::warn!("{} contains no meshes", display);
    } else {
        log::info!("Imported {} mesh(es) from {}", meshes.len(), display);
    }
    Ok(meshes)
}

fn meshes_from_models(models: &[tobj::Model]) -> Vec<MeshData> {
    models
        .iter()
        .map(|model| {
            let mesh = &model.mesh;
            MeshData::new(
                model.name.clone(),
                &mesh.positions,
                &mesh.normals,
                &mesh.indices,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "meshpick_import_{}_{}",
            std::process::id(),
            name
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    const TWO_MODELS: &str = "\
o first
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
o second
v 0 0 1
v 1 0 1
v 0 1 1
vn 0 0 1
f 5//1 6//1 7//1
";

    #[test]
    fn test_each_model_becomes_a_mesh() {
        let path = write_temp("two.obj", TWO_MODELS);
        let meshes = import_mesh_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].name, "first");
        // The quad is triangulated
        assert_eq!(meshes[0].triangle_count(), 2);
        assert_eq!(meshes[0].normals.len(), meshes[0].positions.len());
        assert_eq!(meshes[1].triangle_count(), 1);
        assert_eq!(meshes[1].normals[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_uppercase_extension_is_accepted() {
        let path = write_temp("upper.OBJ", TWO_MODELS);
        let result = import_mesh_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_ok());
    }

    #[test]
    fn test_other_formats_are_rejected() {
        for name in ["scene.fbx", "scene.gltf", "scene.dae", "noextension"] {
            let err = import_mesh_file(Path::new(name)).unwrap_err();
            assert!(matches!(err, ImportError::UnsupportedFormat { .. }));
        }
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let err = import_mesh_file(Path::new("/no/such/dir/mesh.obj")).unwrap_err();
        assert!(matches!(err, ImportError::Read { .. }));
        assert!(err.to_string().contains("/no/such/dir/mesh.obj"));
    }

    #[test]
    fn test_file_without_geometry_is_empty() {
        let path = write_temp("empty.obj", "# nothing here\n");
        let meshes = import_mesh_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(meshes.is_empty());
    }
}
