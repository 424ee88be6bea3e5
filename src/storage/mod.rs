//! Whole-drawing persistence.
//!
//! File layout: the 4-byte magic `NXDW`, a little-endian `u16` format version, then a
//! fixed-width little-endian bincode body holding, in order, the line block, the oval
//! block, the rectangle block and the freehand block. Each block is the geometry table,
//! the parallel color table and the entry count. Only committed entries are written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bincode::Options;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::drawing::{
    FreehandDab, ShapeEntry, ShapeKind, StoreCategory, StoreError, StoreSnapshot,
    MAX_FREEHAND_THICKNESS,
};
use crate::geometry::{CanvasPoint, Color};

pub const DRAWING_FILE_EXTENSION: &str = "nxd";
pub const FORMAT_VERSION: u16 = 1;

const MAGIC: [u8; 4] = *b"NXDW";
const HEADER_LEN: usize = MAGIC.len() + std::mem::size_of::<u16>();
const PENDING_SUFFIX: &str = ".pending";
const MAX_BODY_BYTES: u64 = 1 << 30;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("drawing data is truncated")]
    Truncated,
    #[error("not a drawing file")]
    BadMagic,
    #[error("unsupported drawing format version {0}")]
    UnsupportedVersion(u16),
    #[error("malformed drawing data: {0}")]
    Malformed(#[source] bincode::Error),
    #[error(
        "{category} block is inconsistent: {geometry} geometry rows, {colors} colors, count {count}"
    )]
    InconsistentCategory {
        category: StoreCategory,
        geometry: usize,
        colors: usize,
        count: u32,
    },
    #[error("freehand dab {index} has size {size} outside 0..={max}", max = MAX_FREEHAND_THICKNESS)]
    DabSizeOutOfRange { index: usize, size: i32 },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to decode {path}: {source}")]
    Decode { path: PathBuf, source: DecodeError },
    #[error("failed to encode drawing: {0}")]
    Encode(#[source] bincode::Error),
    #[error("drawing in {path} does not fit the canvas limits: {source}")]
    Restore { path: PathBuf, source: StoreError },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

pub trait DrawingStorage {
    fn save_drawing(&self, path: &Path, snapshot: &StoreSnapshot) -> StorageResult<()>;
    fn load_drawing(&self, path: &Path) -> StorageResult<StoreSnapshot>;
}

/// Stores drawings as plain files, replacing the destination only after a complete write.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDrawingStorage;

impl FileDrawingStorage {
    pub const fn new() -> Self {
        Self
    }
}

impl DrawingStorage for FileDrawingStorage {
    fn save_drawing(&self, path: &Path, snapshot: &StoreSnapshot) -> StorageResult<()> {
        let bytes = encode_drawing(snapshot).map_err(StorageError::Encode)?;
        let io_error = |source: io::Error| StorageError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let pending = pending_path(path);
        tracing::trace!(path = %pending.display(), bytes = bytes.len(), "write drawing");
        fs::write(&pending, &bytes).map_err(io_error)?;
        if let Err(err) = fs::rename(&pending, path) {
            let _ = fs::remove_file(&pending);
            return Err(io_error(err));
        }
        Ok(())
    }

    fn load_drawing(&self, path: &Path) -> StorageResult<StoreSnapshot> {
        let bytes = fs::read(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        decode_drawing(&bytes).map_err(|source| StorageError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn pending_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(PENDING_SUFFIX);
    path.with_file_name(name)
}

#[derive(Debug, Serialize, Deserialize)]
struct DrawingBody {
    line_geometry: Vec<[i32; 4]>,
    line_colors: Vec<Color>,
    line_count: u32,
    oval_geometry: Vec<[i32; 4]>,
    oval_colors: Vec<Color>,
    oval_count: u32,
    rectangle_geometry: Vec<[i32; 4]>,
    rectangle_colors: Vec<Color>,
    rectangle_count: u32,
    freehand_geometry: Vec<[i32; 3]>,
    freehand_colors: Vec<Color>,
    freehand_count: u32,
}

fn body_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_BODY_BYTES)
        .reject_trailing_bytes()
}

pub fn encode_drawing(snapshot: &StoreSnapshot) -> Result<Vec<u8>, bincode::Error> {
    let (line_geometry, line_colors, line_count) = split_shapes(&snapshot.lines);
    let (oval_geometry, oval_colors, oval_count) = split_shapes(&snapshot.ovals);
    let (rectangle_geometry, rectangle_colors, rectangle_count) =
        split_shapes(&snapshot.rectangles);
    let freehand_geometry = snapshot
        .freehand
        .iter()
        .map(|dab| {
            [
                dab.position.x,
                dab.position.y,
                i32::try_from(dab.size).unwrap_or(i32::MAX),
            ]
        })
        .collect();
    let freehand_colors = snapshot.freehand.iter().map(|dab| dab.color).collect();

    let body = DrawingBody {
        line_geometry,
        line_colors,
        line_count,
        oval_geometry,
        oval_colors,
        oval_count,
        rectangle_geometry,
        rectangle_colors,
        rectangle_count,
        freehand_geometry,
        freehand_colors,
        freehand_count: count_u32(snapshot.freehand.len()),
    };

    let mut bytes = Vec::with_capacity(HEADER_LEN);
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    body_options().serialize_into(&mut bytes, &body)?;
    Ok(bytes)
}

pub fn decode_drawing(bytes: &[u8]) -> Result<StoreSnapshot, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(if MAGIC.starts_with(bytes) {
            DecodeError::Truncated
        } else {
            DecodeError::BadMagic
        });
    }
    let (header, body) = bytes.split_at(HEADER_LEN);
    if header[..MAGIC.len()] != MAGIC {
        return Err(DecodeError::BadMagic);
    }
    let version = u16::from_le_bytes([header[MAGIC.len()], header[MAGIC.len() + 1]]);
    if version != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }

    let body: DrawingBody = body_options()
        .deserialize(body)
        .map_err(classify_bincode_error)?;

    Ok(StoreSnapshot {
        lines: join_shapes(
            ShapeKind::Line,
            body.line_geometry,
            body.line_colors,
            body.line_count,
        )?,
        ovals: join_shapes(
            ShapeKind::Oval,
            body.oval_geometry,
            body.oval_colors,
            body.oval_count,
        )?,
        rectangles: join_shapes(
            ShapeKind::Rectangle,
            body.rectangle_geometry,
            body.rectangle_colors,
            body.rectangle_count,
        )?,
        freehand: join_dabs(
            body.freehand_geometry,
            body.freehand_colors,
            body.freehand_count,
        )?,
    })
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn split_shapes(entries: &[ShapeEntry]) -> (Vec<[i32; 4]>, Vec<Color>, u32) {
    let geometry = entries
        .iter()
        .map(|entry| [entry.start.x, entry.start.y, entry.end.x, entry.end.y])
        .collect();
    let colors = entries.iter().map(|entry| entry.color).collect();
    (geometry, colors, count_u32(entries.len()))
}

fn check_block(
    category: StoreCategory,
    geometry: usize,
    colors: usize,
    count: u32,
) -> Result<(), DecodeError> {
    let count_matches = usize::try_from(count).is_ok_and(|count| count == geometry);
    if geometry != colors || !count_matches {
        return Err(DecodeError::InconsistentCategory {
            category,
            geometry,
            colors,
            count,
        });
    }
    Ok(())
}

fn join_shapes(
    kind: ShapeKind,
    geometry: Vec<[i32; 4]>,
    colors: Vec<Color>,
    count: u32,
) -> Result<Vec<ShapeEntry>, DecodeError> {
    check_block(StoreCategory::Shape(kind), geometry.len(), colors.len(), count)?;
    Ok(geometry
        .into_iter()
        .zip(colors)
        .map(|([x1, y1, x2, y2], color)| {
            ShapeEntry::new(CanvasPoint::new(x1, y1), CanvasPoint::new(x2, y2), color)
        })
        .collect())
}

fn join_dabs(
    geometry: Vec<[i32; 3]>,
    colors: Vec<Color>,
    count: u32,
) -> Result<Vec<FreehandDab>, DecodeError> {
    check_block(StoreCategory::Freehand, geometry.len(), colors.len(), count)?;
    geometry
        .into_iter()
        .zip(colors)
        .enumerate()
        .map(|(index, ([x, y, size], color))| {
            let size = u8::try_from(size)
                .ok()
                .filter(|size| *size <= MAX_FREEHAND_THICKNESS)
                .ok_or(DecodeError::DabSizeOutOfRange { index, size })?;
            Ok(FreehandDab::new(CanvasPoint::new(x, y), u32::from(size), color))
        })
        .collect()
}

fn classify_bincode_error(err: bincode::Error) -> DecodeError {
    match err.as_ref() {
        bincode::ErrorKind::Io(io_err) if io_err.kind() == io::ErrorKind::UnexpectedEof => {
            DecodeError::Truncated
        }
        _ => DecodeError::Malformed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::new(255, 0, 0);
    const GREEN: Color = Color::new(0, 200, 0);

    fn sample_snapshot() -> StoreSnapshot {
        StoreSnapshot {
            lines: vec![ShapeEntry::new(
                CanvasPoint::new(10, 10),
                CanvasPoint::new(30, 30),
                RED,
            )],
            ovals: vec![ShapeEntry::new(
                CanvasPoint::new(-4, 8),
                CanvasPoint::new(16, 2),
                GREEN,
            )],
            rectangles: Vec::new(),
            freehand: vec![
                FreehandDab::new(CanvasPoint::new(1, 2), 0, RED),
                FreehandDab::new(CanvasPoint::new(3, 4), 20, GREEN),
            ],
        }
    }

    #[test]
    fn encoded_drawing_starts_with_magic_and_version() {
        let bytes = encode_drawing(&StoreSnapshot::default()).unwrap();
        assert_eq!(&bytes[..4], b"NXDW");
        assert_eq!(&bytes[4..6], &[1, 0]);
    }

    #[test]
    fn encode_then_decode_preserves_every_entry() {
        let snapshot = sample_snapshot();
        let bytes = encode_drawing(&snapshot).unwrap();
        assert_eq!(decode_drawing(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn decode_rejects_truncated_input() {
        let bytes = encode_drawing(&sample_snapshot()).unwrap();
        for cut in [0, 3, HEADER_LEN, bytes.len() - 1] {
            let err = decode_drawing(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, DecodeError::Truncated),
                "cut at {cut} gave {err:?}"
            );
        }
    }

    #[test]
    fn decode_rejects_foreign_and_future_files() {
        assert!(matches!(
            decode_drawing(b"\xac\xed\x00\x05ur\x00"),
            Err(DecodeError::BadMagic)
        ));

        let mut bytes = encode_drawing(&StoreSnapshot::default()).unwrap();
        bytes[4] = 2;
        assert!(matches!(
            decode_drawing(&bytes),
            Err(DecodeError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn decode_rejects_trailing_garbage() {
        let mut bytes = encode_drawing(&sample_snapshot()).unwrap();
        bytes.push(0);
        assert!(matches!(
            decode_drawing(&bytes),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn decode_rejects_count_that_disagrees_with_tables() {
        let body = DrawingBody {
            line_geometry: vec![[0, 0, 1, 1]],
            line_colors: vec![RED],
            line_count: 2,
            oval_geometry: Vec::new(),
            oval_colors: Vec::new(),
            oval_count: 0,
            rectangle_geometry: Vec::new(),
            rectangle_colors: Vec::new(),
            rectangle_count: 0,
            freehand_geometry: Vec::new(),
            freehand_colors: Vec::new(),
            freehand_count: 0,
        };
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        body_options().serialize_into(&mut bytes, &body).unwrap();

        let err = decode_drawing(&bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InconsistentCategory {
                category: StoreCategory::Shape(ShapeKind::Line),
                geometry: 1,
                colors: 1,
                count: 2,
            }
        ));
    }

    #[test]
    fn decode_rejects_dab_sizes_outside_thickness_range() {
        let encode_dab = |size: i32| {
            let body = DrawingBody {
                line_geometry: Vec::new(),
                line_colors: Vec::new(),
                line_count: 0,
                oval_geometry: Vec::new(),
                oval_colors: Vec::new(),
                oval_count: 0,
                rectangle_geometry: Vec::new(),
                rectangle_colors: Vec::new(),
                rectangle_count: 0,
                freehand_geometry: vec![[5, 5, size]],
                freehand_colors: vec![RED],
                freehand_count: 1,
            };
            let mut bytes = MAGIC.to_vec();
            bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
            body_options().serialize_into(&mut bytes, &body).unwrap();
            bytes
        };

        for size in [-1, 21, i32::MAX] {
            let err = decode_drawing(&encode_dab(size)).unwrap_err();
            assert!(
                matches!(
                    err,
                    DecodeError::DabSizeOutOfRange { index: 0, size: got } if got == size
                ),
                "size {size} should be rejected, got {err:?}"
            );
        }

        let snapshot = decode_drawing(&encode_dab(20)).expect("largest brush should decode");
        assert_eq!(snapshot.freehand[0].size, 20);
    }

    #[test]
    fn file_storage_round_trips_and_leaves_no_pending_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sketch.nxd");
        let storage = FileDrawingStorage::new();

        storage.save_drawing(&path, &sample_snapshot()).unwrap();

        assert_eq!(storage.load_drawing(&path).unwrap(), sample_snapshot());
        assert!(!pending_path(&path).exists());
    }

    #[test]
    fn load_of_missing_file_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.nxd");

        let err = FileDrawingStorage::new().load_drawing(&path).unwrap_err();
        assert!(matches!(err, StorageError::Io { path: ref p, .. } if p == &path));
    }

    #[test]
    fn pending_path_appends_suffix_to_file_name() {
        assert_eq!(
            pending_path(Path::new("/tmp/a/sketch.nxd")),
            PathBuf::from("/tmp/a/sketch.nxd.pending")
        );
    }
}
