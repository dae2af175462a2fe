//! STL triangle soup, ASCII and binary.
//!
//! Binary layout: 80-byte header, little-endian `u32` facet count, then per
//! facet a normal and three corners (12 × `f32`) plus a `u16` attribute.
//! Imported facets never share vertices; a facet's stored normal is used when
//! it is usable, otherwise the winding normal is computed.

use std::io::{self, Write};

use glam::Vec3;

use super::facet_normal;
use crate::error::ImportError;
use crate::mesh::MeshData;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Parse ASCII or binary STL.
pub fn parse(bytes: &[u8]) -> Result<MeshData, ImportError> {
    if looks_ascii(bytes) {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| ImportError::corrupt("ASCII STL is not valid UTF-8"))?;
        parse_ascii(text)
    } else {
        parse_binary(bytes)
    }
}

/// Binary files may also start with "solid", so require ASCII facet syntax too
fn looks_ascii(bytes: &[u8]) -> bool {
    let trimmed = bytes.trim_ascii_start();
    trimmed.starts_with(b"solid")
        && std::str::from_utf8(trimmed)
            .is_ok_and(|text| text.contains("facet") || text.contains("endsolid"))
}

fn parse_binary(bytes: &[u8]) -> Result<MeshData, ImportError> {
    if bytes.len() < HEADER_LEN + 4 {
        return Err(ImportError::corrupt(format!(
            "binary STL needs at least {} bytes, found {}",
            HEADER_LEN + 4,
            bytes.len()
        )));
    }
    let count = read_u32(bytes, HEADER_LEN) as usize;
    let expected = HEADER_LEN + 4 + count * FACET_LEN;
    if bytes.len() < expected {
        return Err(ImportError::corrupt(format!(
            "binary STL declares {count} facets but is truncated at {} bytes",
            bytes.len()
        )));
    }
    if count == 0 {
        return Err(ImportError::EmptyMesh);
    }

    let mut soup = Soup::with_capacity(count);
    for facet in 0..count {
        let base = HEADER_LEN + 4 + facet * FACET_LEN;
        let normal = read_vec3(bytes, base);
        let corners = [
            read_vec3(bytes, base + 12),
            read_vec3(bytes, base + 24),
            read_vec3(bytes, base + 36),
        ];
        soup.push(normal, corners)?;
    }
    Ok(soup.finish())
}

fn parse_ascii(text: &str) -> Result<MeshData, ImportError> {
    let mut soup = Soup::with_capacity(0);
    let mut normal = Vec3::ZERO;
    let mut corners: Vec<Vec3> = Vec::with_capacity(3);

    for (line_no, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("facet") => {
                // "facet normal nx ny nz"
                tokens.next();
                normal = parse_vec3(&mut tokens, line_no)?;
                corners.clear();
            }
            Some("vertex") => corners.push(parse_vec3(&mut tokens, line_no)?),
            Some("endfacet") => {
                let [a, b, c] = corners.as_slice() else {
                    return Err(ImportError::corrupt(format!(
                        "line {}: facet has {} vertices",
                        line_no + 1,
                        corners.len()
                    )));
                };
                soup.push(normal, [*a, *b, *c])?;
                corners.clear();
            }
            _ => {}
        }
    }

    if soup.is_empty() {
        return Err(ImportError::EmptyMesh);
    }
    Ok(soup.finish())
}

/// Accumulates unshared facets.
struct Soup {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl Soup {
    fn with_capacity(facets: usize) -> Self {
        Self {
            positions: Vec::with_capacity(facets * 3),
            normals: Vec::with_capacity(facets * 3),
        }
    }

    fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn push(&mut self, stored_normal: Vec3, corners: [Vec3; 3]) -> Result<(), ImportError> {
        if corners.iter().any(|c| !c.is_finite()) {
            return Err(ImportError::corrupt(format!(
                "facet {} has a non-finite vertex",
                self.positions.len() / 3
            )));
        }
        let normal = if stored_normal.is_finite() {
            stored_normal.try_normalize()
        } else {
            None
        }
        .unwrap_or_else(|| facet_normal(corners[0], corners[1], corners[2]));

        self.positions.extend(corners);
        self.normals.extend([normal; 3]);
        Ok(())
    }

    fn finish(self) -> MeshData {
        let indices = (0..self.positions.len() as u32).collect();
        MeshData {
            positions: self.positions,
            normals: Some(self.normals),
            indices,
            groups: Vec::new(),
        }
    }
}

fn parse_vec3<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
) -> Result<Vec3, ImportError> {
    let mut component = || -> Result<f32, ImportError> {
        tokens
            .next()
            .and_then(|token| token.parse::<f32>().ok())
            .ok_or_else(|| {
                ImportError::corrupt(format!("line {}: expected 3 numbers", line_no + 1))
            })
    };
    Ok(Vec3::new(component()?, component()?, component()?))
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    f32::from_bits(read_u32(bytes, offset))
}

fn read_vec3(bytes: &[u8], offset: usize) -> Vec3 {
    Vec3::new(
        read_f32(bytes, offset),
        read_f32(bytes, offset + 4),
        read_f32(bytes, offset + 8),
    )
}

/// Write a binary STL.
pub fn write_binary<W: Write>(
    name: &str,
    positions: &[Vec3],
    indices: &[u32],
    writer: &mut W,
) -> io::Result<()> {
    let mut header = [0u8; HEADER_LEN];
    let title = format!("Binary STL from Occlusal: {name}");
    let len = title.len().min(HEADER_LEN);
    header[..len].copy_from_slice(&title.as_bytes()[..len]);
    writer.write_all(&header)?;

    writer.write_all(&((indices.len() / 3) as u32).to_le_bytes())?;

    for tri in indices.chunks_exact(3) {
        let [v0, v1, v2] = [0, 1, 2].map(|k| positions[tri[k] as usize]);
        for value in facet_normal(v0, v1, v2)
            .to_array()
            .into_iter()
            .chain(v0.to_array())
            .chain(v1.to_array())
            .chain(v2.to_array())
        {
            writer.write_all(&value.to_le_bytes())?;
        }
        // Attribute byte count (unused)
        writer.write_all(&0u16.to_le_bytes())?;
    }

    Ok(())
}

/// Write an ASCII STL.
pub fn write_ascii<W: Write>(
    name: &str,
    positions: &[Vec3],
    indices: &[u32],
    writer: &mut W,
) -> io::Result<()> {
    let name = name.replace(char::is_whitespace, "_");
    writeln!(writer, "solid {name}")?;
    for tri in indices.chunks_exact(3) {
        let [v0, v1, v2] = [0, 1, 2].map(|k| positions[tri[k] as usize]);
        let n = facet_normal(v0, v1, v2);
        writeln!(writer, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for v in [v0, v1, v2] {
            writeln!(writer, "      vertex {:e} {:e} {:e}", v.x, v.y, v.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {name}")?;
    Ok(())
}
