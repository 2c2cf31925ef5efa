//! Wavefront OBJ export of a single object with its transform baked in.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use cgmath::{InnerSpace, Vector3};

use super::object::SceneObject;
use crate::gfx::picking::intersection::transform_point;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no object is selected")]
    NothingSelected,
    #[error("failed to write OBJ to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Writes `object` to `path`, replacing any existing file.
pub fn export_object(object: &SceneObject, path: &Path) -> Result<(), ExportError> {
    let to_error = |source| ExportError::Write {
        path: path.display().to_string(),
        source,
    };

    let file = File::create(path).map_err(to_error)?;
    let mut writer = BufWriter::new(file);
    write_obj(object, &mut writer).map_err(to_error)?;
    writer.flush().map_err(to_error)?;

    log::info!("Exported '{}' to {}", object.name, path.display());
    Ok(())
}

/// Serializes world-space positions and normals plus `f v//vn` faces.
pub fn write_obj<W: Write>(object: &SceneObject, writer: &mut W) -> std::io::Result<()> {
    let model = object.model_matrix();
    let normal_matrix = object.transform.normal_matrix();
    let mesh = &object.mesh;

    writeln!(writer, "# meshpick export")?;
    writeln!(writer, "o {}", object.name)?;

    for position in &mesh.positions {
        let p = transform_point(&model, Vector3::from(*position));
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }

    for normal in &mesh.normals {
        let n = normal_matrix * Vector3::from(*normal);
        let n = if n.magnitude2() > 0.0 { n.normalize() } else { n };
        writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
    }

    for triangle in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0] + 1, triangle[1] + 1, triangle[2] + 1];
        writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }

    Ok(())
}
