//! OBJ file loader for 3D models
//!
//! Reads positions, texture coordinates and faces. Faces with more than three
//! corners are fan-triangulated, the V coordinate is flipped for Vulkan's
//! top-left texture origin, and identical corners are merged.

use ocean_engine::render::{Mesh, MeshBuilder, Vertex};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// OBJ loading errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A number or index failed to parse
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// The file parsed but describes no usable geometry
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Parse OBJ source text into a deduplicated mesh
pub fn parse_obj(name: &str, source: &str) -> Result<Mesh, ObjError> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut builder = MeshBuilder::new(name);

    for (number, line) in source.lines().enumerate() {
        let line_number = number + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let [x, y, z] = parse_floats::<3>(&mut parts, line_number, "vertex position")?;
                positions.push([x, y, z]);
            }
            Some("vt") => {
                let [u, v] = parse_floats::<2>(&mut parts, line_number, "texture coordinate")?;
                tex_coords.push([u, 1.0 - v]);
            }
            Some("f") => {
                let corners = parts
                    .map(|corner| resolve_corner(corner, &positions, &tex_coords, line_number))
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.len() < 3 {
                    return Err(ObjError::Parse {
                        line: line_number,
                        message: format!("face has {} corners, need at least 3", corners.len()),
                    });
                }
                for i in 1..corners.len() - 1 {
                    builder.push(corners[0]);
                    builder.push(corners[i]);
                    builder.push(corners[i + 1]);
                }
            }
            _ => {}
        }
    }

    let mesh = builder.build();
    if mesh.is_empty() {
        return Err(ObjError::InvalidFormat(format!("'{name}' contains no faces")));
    }
    Ok(mesh)
}

/// Load one OBJ file; the mesh is named after the file stem
pub fn load_obj(path: impl AsRef<Path>) -> Result<Mesh, ObjError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map_or_else(|| path.display().to_string(), |stem| stem.to_string_lossy().into_owned());
    parse_obj(&name, &source)
}

/// Every `.obj` file in `dir`, sorted by path
pub fn find_obj_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ObjError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_obj = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("obj"));
        if path.is_file() && is_obj {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn parse_floats<'a, const N: usize>(
    parts: &mut impl Iterator<Item = &'a str>,
    line: usize,
    what: &str,
) -> Result<[f32; N], ObjError> {
    let mut values = [0.0; N];
    for value in &mut values {
        let token = parts.next().ok_or_else(|| ObjError::Parse {
            line,
            message: format!("{what} needs {N} components"),
        })?;
        *value = token.parse().map_err(|_| ObjError::Parse {
            line,
            message: format!("invalid {what} component '{token}'"),
        })?;
    }
    Ok(values)
}

/// Resolve a 1-based (or negative, relative) OBJ index into a 0-based one
fn resolve_index(token: &str, len: usize, line: usize) -> Result<usize, ObjError> {
    let raw: i64 = token.parse().map_err(|_| ObjError::Parse {
        line,
        message: format!("invalid index '{token}'"),
    })?;
    let resolved = match raw {
        0 => None,
        positive if positive > 0 => usize::try_from(positive - 1).ok(),
        negative => usize::try_from(negative.unsigned_abs()).ok().and_then(|back| len.checked_sub(back)),
    };

    resolved.filter(|&index| index < len).ok_or_else(|| ObjError::Parse {
        line,
        message: format!("index {raw} out of range (have {len})"),
    })
}

fn resolve_corner(
    corner: &str,
    positions: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    line: usize,
) -> Result<Vertex, ObjError> {
    let mut fields = corner.split('/');
    let position_token = fields.next().unwrap_or_default();
    let position = positions[resolve_index(position_token, positions.len(), line)?];

    let tex_coord = match fields.next() {
        Some(token) if !token.is_empty() => tex_coords[resolve_index(token, tex_coords.len(), line)?],
        _ => [0.0, 0.0],
    };

    Ok(Vertex::new(position, tex_coord))
}
