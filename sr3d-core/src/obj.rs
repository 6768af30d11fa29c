/// Reader for the vertex/face subset of the Wavefront OBJ text format
///
/// Only `v x y z` and `f i1 i2 i3` records are understood. Everything else
/// is skipped. Reading is best effort: the first bad record stops the read
/// and the triangles collected so far are kept.
use nom::{
    bytes::complete::tag,
    character::complete::{space1, u32 as index},
    combinator::{all_consuming, rest},
    number::complete::float,
    sequence::{preceded, tuple},
    IResult,
};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::geometry::{Mesh, Triangle};
use crate::math::Vector3D;

/// Errors produced while reading geometry text
#[derive(Debug, Error)]
pub enum ObjError {
    #[error("line {line}: malformed vertex record")]
    MalformedVertex { line: usize },
    #[error("line {line}: malformed face record")]
    MalformedFace { line: usize },
    #[error("line {line}: face index {index} out of range (1..={count})")]
    IndexOutOfRange { line: usize, index: u32, count: usize },
    #[error("failed to read geometry file: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a read: whatever was parsed, plus the error that stopped it.
#[derive(Debug)]
pub struct ObjParse {
    pub mesh: Mesh,
    pub error: Option<ObjError>,
}

impl ObjParse {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

enum Record {
    Vertex(Vector3D),
    Face([u32; 3]),
    Other,
}

/// Parse geometry text into a mesh positioned at the origin.
pub fn parse_obj(input: &str) -> ObjParse {
    let mut vertices: Vec<Vector3D> = Vec::new();
    let mut mesh = Mesh::new();

    for (i, line) in input.lines().enumerate() {
        let line_no = i + 1;
        let record = match parse_record(line, line_no) {
            Ok(record) => record,
            Err(error) => return ObjParse { mesh, error: Some(error) },
        };

        match record {
            Record::Vertex(v) => vertices.push(v),
            Record::Face(indices) => {
                let mut corners = [Vector3D::ZERO; 3];
                for (corner, &idx) in corners.iter_mut().zip(indices.iter()) {
                    match resolve(idx, &vertices) {
                        Some(v) => *corner = v,
                        None => {
                            let error = ObjError::IndexOutOfRange {
                                line: line_no,
                                index: idx,
                                count: vertices.len(),
                            };
                            return ObjParse { mesh, error: Some(error) };
                        }
                    }
                }
                let [a, b, c] = corners;
                mesh.add_triangle(Triangle::new(a, b, c));
            }
            Record::Other => {}
        }
    }

    ObjParse { mesh, error: None }
}

/// Read and parse a geometry file. An unreadable file yields an empty mesh
/// together with the I/O error.
pub fn read_obj(path: impl AsRef<Path>) -> ObjParse {
    match fs::read_to_string(path.as_ref()) {
        Ok(text) => parse_obj(&text),
        Err(e) => ObjParse {
            mesh: Mesh::new(),
            error: Some(e.into()),
        },
    }
}

impl Mesh {
    /// Best-effort parse; failures are logged and the partial mesh returned.
    pub fn from_obj_str(input: &str) -> Mesh {
        report(parse_obj(input), "<memory>")
    }

    /// Best-effort load from disk; failures are logged and the partial mesh
    /// returned. A missing file yields an empty mesh.
    pub fn load(path: impl AsRef<Path>) -> Mesh {
        let path = path.as_ref();
        report(read_obj(path), &path.display().to_string())
    }
}

fn report(parse: ObjParse, source: &str) -> Mesh {
    match &parse.error {
        Some(e) => log::warn!(
            "{}: stopped after {} triangles: {}",
            source,
            parse.mesh.len(),
            e
        ),
        None => log::info!("{}: loaded {} triangles", source, parse.mesh.len()),
    }
    parse.mesh
}

fn resolve(index: u32, vertices: &[Vector3D]) -> Option<Vector3D> {
    let slot = (index as usize).checked_sub(1)?;
    vertices.get(slot).copied()
}

fn parse_record(line: &str, line_no: usize) -> Result<Record, ObjError> {
    if line.starts_with("v ") {
        vertex_record(line)
            .map(|(_, v)| Record::Vertex(v))
            .map_err(|_| ObjError::MalformedVertex { line: line_no })
    } else if line.starts_with("f ") {
        face_record(line)
            .map(|(_, f)| Record::Face(f))
            .map_err(|_| ObjError::MalformedFace { line: line_no })
    } else {
        Ok(Record::Other)
    }
}

fn vertex_record(input: &str) -> IResult<&str, Vector3D> {
    let (input, (x, y, z)) = preceded(
        tag("v"),
        tuple((
            preceded(space1, float),
            preceded(space1, float),
            preceded(space1, float),
        )),
    )(input)?;
    let (input, _) = all_consuming(trailing)(input)?;
    Ok((input, Vector3D::new(x, y, z)))
}

fn face_record(input: &str) -> IResult<&str, [u32; 3]> {
    let (input, (a, b, c)) = preceded(
        tag("f"),
        tuple((
            preceded(space1, index),
            preceded(space1, index),
            preceded(space1, index),
        )),
    )(input)?;
    // Extra corners of a polygon face are ignored.
    let (input, _) = all_consuming(trailing)(input)?;
    Ok((input, [a, b, c]))
}

/// After the last field: either end of line, or whitespace and anything.
fn trailing(input: &str) -> IResult<&str, &str> {
    if input.trim().is_empty() {
        return Ok(("", ""));
    }
    preceded(space1, rest)(input)
}
