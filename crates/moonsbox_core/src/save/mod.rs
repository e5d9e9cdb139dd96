//! # Save Format
//!
//! Binary snapshot of a grid. Material ids are process-local, so saves
//! carry a material table and cells refer to it by index; on load every
//! table entry is resolved by name against the live registry.
//!
//! ## Layout (little endian)
//!
//! ```text
//! header:
//!   [8 bytes: magic "MOONSBOX"]
//!   [2 bytes: format major] [2 bytes: format minor]
//!   [1 byte:  flags (bit 0: body is LZ4 compressed, size prepended)]
//!   [4 bytes: CRC32 of the stored body]
//! body:
//!   [4 bytes: material count M]
//!   M x { [2: name length] [n: UTF-8 name] [1: major] [1: minor] }
//!   [4 bytes: width] [4 bytes: height]
//!   width x height cells, column-first:
//!     [4: temp] [4: heat capacity] [4: thermal conductivity]
//!     [4: r g b a] [4: flags] [4: material table index]
//!     [2: aux length] [n: aux bytes from the material's hook]
//! ```
//!
//! ## Guarantees
//!
//! 1. **All or nothing**: `load` returns a fresh grid or an error, never a
//!    half-built world
//! 2. **Validated in order**: magic, version, checksum, material table,
//!    dimensions, cells, trailing bytes
//! 3. **Opaque aux**: payload bytes are produced and consumed only by the
//!    owning material
//! 4. **Bounded allocation**: a compressed body may declare at most 255
//!    bytes of output per stored byte (the LZ4 block format cannot expand
//!    further), and a declared grid must fit the body at the minimum cell
//!    size before any cell storage is allocated

mod codec;

use std::collections::HashMap;

use lz4_flex::block::{compress_prepend_size, decompress};

use crate::cell::{MaterialData, MaterialFlags, MaterialId, Rgba};
use crate::error::{CoreError, CoreResult};
use crate::geometry::GridSize;
use crate::grid::Grid;
use crate::plugin::{MaterialEntry, MaterialRegistry};

use codec::{SaveReader, SaveWriter};

/// Magic bytes identifying a save file.
pub const SAVE_MAGIC: &[u8; 8] = b"MOONSBOX";

/// Format version written by `dump`, as `(major, minor)`.
pub const SAVE_VERSION: (u16, u16) = (1, 1);

/// Header flag: body is LZ4 compressed.
const FLAG_LZ4: u8 = 1;

/// Header size in bytes.
const HEADER_LEN: usize = 8 + 2 + 2 + 1 + 4;

/// Smallest possible encoded cell (empty aux).
const MIN_CELL_LEN: usize = 4 * 3 + 4 + 4 + 4 + 2;

/// Most output bytes one LZ4 block byte can decode to.
const LZ4_MAX_RATIO: usize = 255;

/// Options for [`dump`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DumpOptions {
    /// LZ4-compress the body.
    pub compress: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self { compress: true }
    }
}

/// Serializes `grid` into a self-describing blob.
///
/// # Errors
///
/// - [`CoreError::UnknownMaterial`] if a cell references an unregistered
///   material.
/// - [`CoreError::Format`] if a material name or an aux payload does not
///   fit its 16-bit length field.
pub fn dump(grid: &Grid, registry: &MaterialRegistry, options: DumpOptions) -> CoreResult<Vec<u8>> {
    let mut table: Vec<&MaterialEntry> = Vec::new();
    let mut index_of: HashMap<MaterialId, u32> = HashMap::new();
    for cell in grid.cells() {
        if !index_of.contains_key(&cell.material) {
            index_of.insert(cell.material, table.len() as u32);
            table.push(registry.entry(cell.material)?);
        }
    }

    let mut body = SaveWriter::with_capacity(16 + grid.cells().len() * MIN_CELL_LEN);
    body.write_u32(table.len() as u32);
    for entry in &table {
        let name = entry.name().as_bytes();
        body.write_u16(length_field(name.len(), || format!("material name '{}'", entry.name()))?);
        body.write_bytes(name);
        body.write_u8(entry.version().major);
        body.write_u8(entry.version().minor);
    }

    body.write_i32(grid.width());
    body.write_i32(grid.height());
    for cell in grid.cells() {
        let entry = table[index_of[&cell.material] as usize];
        body.write_f32(cell.temp);
        body.write_f32(cell.heat_capacity);
        body.write_f32(cell.thermal_conductivity);
        body.write_bytes(bytemuck::bytes_of(&cell.color));
        body.write_u32(cell.flags.0);
        body.write_u32(index_of[&cell.material]);

        let material = entry.material();
        let size = material.aux_size(cell, registry);
        body.write_u16(length_field(size, || format!("aux payload of '{}'", entry.name()))?);
        material.serialize_aux(cell, registry, body.reserve_slice(size));
    }

    let body = body.into_inner();
    let (flags, stored) = if options.compress {
        (FLAG_LZ4, compress_prepend_size(&body))
    } else {
        (0, body)
    };

    let mut out = SaveWriter::with_capacity(HEADER_LEN + stored.len());
    out.write_bytes(SAVE_MAGIC);
    out.write_u16(SAVE_VERSION.0);
    out.write_u16(SAVE_VERSION.1);
    out.write_u8(flags);
    out.write_u32(crc32fast::hash(&stored));
    out.write_bytes(&stored);
    let out = out.into_inner();

    tracing::info!(
        width = grid.width(),
        height = grid.height(),
        materials = table.len(),
        bytes = out.len(),
        compressed = options.compress,
        "world saved"
    );
    Ok(out)
}

/// Rebuilds a grid from a blob produced by [`dump`].
///
/// The result is a fresh grid; nothing else is touched, so callers swap it
/// in only on success.
///
/// # Errors
///
/// - [`CoreError::Format`] for a bad magic or a malformed header.
/// - [`CoreError::VersionMismatch`] for an unsupported format version or a
///   material whose major version differs from the registered one.
/// - [`CoreError::Corrupt`] for checksum, compression, dimension or length
///   inconsistencies.
/// - [`CoreError::UnknownMaterial`] for materials missing from the
///   registry.
/// - [`CoreError::Aux`] if a material rejects its payload.
pub fn load(bytes: &[u8], registry: &MaterialRegistry) -> CoreResult<Grid> {
    match decode(bytes, registry) {
        Ok(grid) => {
            tracing::info!(
                width = grid.width(),
                height = grid.height(),
                bytes = bytes.len(),
                "world loaded"
            );
            Ok(grid)
        }
        Err(err) => {
            tracing::warn!(error = %err, bytes = bytes.len(), "save rejected");
            Err(err)
        }
    }
}

fn decode(bytes: &[u8], registry: &MaterialRegistry) -> CoreResult<Grid> {
    let mut header = SaveReader::new(bytes);

    match header.read_bytes(SAVE_MAGIC.len()) {
        Some(magic) if magic == SAVE_MAGIC => {}
        _ => return Err(format_error("not a MOONSBOX save (bad magic)")),
    }

    let (major, minor) = header
        .read_u16()
        .zip(header.read_u16())
        .ok_or_else(|| format_error("truncated header"))?;
    if major != SAVE_VERSION.0 || minor > SAVE_VERSION.1 {
        return Err(CoreError::VersionMismatch {
            subject: "save format".into(),
            found: format!("{major}.{minor}"),
            supported: format!("{}.0..={}.{}", SAVE_VERSION.0, SAVE_VERSION.0, SAVE_VERSION.1),
        });
    }

    let flags = header.read_u8().ok_or_else(|| format_error("truncated header"))?;
    if flags & !FLAG_LZ4 != 0 {
        return Err(format_error(format!("unknown header flags {flags:#04x}")));
    }
    let checksum = header.read_u32().ok_or_else(|| format_error("truncated header"))?;

    let stored = header.read_bytes(header.remaining()).unwrap_or_default();
    if crc32fast::hash(stored) != checksum {
        return Err(CoreError::corrupt("checksum mismatch"));
    }

    if flags & FLAG_LZ4 != 0 {
        let body = decompress_body(stored)?;
        decode_body(&body, registry)
    } else {
        decode_body(stored, registry)
    }
}

/// Inflates a size-prepended LZ4 block, refusing sizes the block could
/// not possibly produce.
fn decompress_body(stored: &[u8]) -> CoreResult<Vec<u8>> {
    let mut reader = SaveReader::new(stored);
    let declared = reader
        .read_u32()
        .ok_or_else(|| CoreError::corrupt("compressed body is missing its size"))? as usize;
    let block = reader.read_bytes(reader.remaining()).unwrap_or_default();
    let limit = block.len().saturating_mul(LZ4_MAX_RATIO);
    if declared > limit {
        return Err(CoreError::corrupt(format!(
            "compressed body claims {declared} bytes, {} stored bytes allow at most {limit}",
            block.len()
        )));
    }

    let body = decompress(block, declared)
        .map_err(|e| CoreError::corrupt(format!("decompression failed: {e}")))?;
    if body.len() != declared {
        return Err(CoreError::corrupt(format!(
            "compressed body inflated to {} bytes, header says {declared}",
            body.len()
        )));
    }
    Ok(body)
}

fn decode_body(body: &[u8], registry: &MaterialRegistry) -> CoreResult<Grid> {
    let mut reader = SaveReader::new(body);

    let count = reader.read_u32().ok_or_else(truncated)? as usize;
    // name length + major + minor per entry
    if count.saturating_mul(4) > reader.remaining() {
        return Err(CoreError::corrupt(format!("material table of {count} entries overruns the body")));
    }
    let mut table: Vec<&MaterialEntry> = Vec::with_capacity(count);
    for _ in 0..count {
        let len = reader.read_u16().ok_or_else(truncated)? as usize;
        let name = std::str::from_utf8(reader.read_bytes(len).ok_or_else(truncated)?)
            .map_err(|_| CoreError::corrupt("material name is not UTF-8"))?;
        let (major, minor) = reader.read_u8().zip(reader.read_u8()).ok_or_else(truncated)?;

        let id = registry.id_of(name).ok_or_else(|| CoreError::unknown_name(name))?;
        let entry = registry.entry(id)?;
        if entry.version().major != major {
            return Err(CoreError::VersionMismatch {
                subject: format!("material '{name}'"),
                found: format!("{major}.{minor}"),
                supported: format!("{}.x", entry.version().major),
            });
        }
        table.push(entry);
    }

    let width = reader.read_i32().ok_or_else(truncated)?;
    let height = reader.read_i32().ok_or_else(truncated)?;
    if width < 0 || height < 0 || (width == 0) != (height == 0) {
        return Err(CoreError::corrupt(format!("invalid dimensions {width}x{height}")));
    }
    let size = GridSize::new(width, height);
    // both factors are below 2^31, so the product fits a u64
    let area = u64::from(width.unsigned_abs()) * u64::from(height.unsigned_abs());
    let fits = (reader.remaining() / MIN_CELL_LEN) as u64;
    if area > fits {
        return Err(CoreError::corrupt(format!(
            "{width}x{height} cells need at least {MIN_CELL_LEN} bytes each, {} left",
            reader.remaining()
        )));
    }

    let mut cells = Vec::with_capacity(size.area());
    for _ in 0..size.area() {
        let temp = reader.read_f32().ok_or_else(truncated)?;
        let heat_capacity = reader.read_f32().ok_or_else(truncated)?;
        let thermal_conductivity = reader.read_f32().ok_or_else(truncated)?;
        let color = reader.read_bytes(4).ok_or_else(truncated)?;
        let flags = MaterialFlags(reader.read_u32().ok_or_else(truncated)?);
        let index = reader.read_u32().ok_or_else(truncated)?;
        let entry = *table.get(index as usize).ok_or_else(|| CoreError::UnknownMaterial {
            material: format!("table index {index}"),
        })?;
        let aux_len = reader.read_u16().ok_or_else(truncated)? as usize;
        let aux_bytes = reader.read_bytes(aux_len).ok_or_else(truncated)?;
        let aux = entry
            .material()
            .deserialize_aux(aux_bytes, registry)
            .map_err(|source| CoreError::Aux {
                material: entry.name().to_owned(),
                source,
            })?;

        cells.push(MaterialData {
            temp,
            heat_capacity,
            thermal_conductivity,
            color: Rgba::new(color[0], color[1], color[2], color[3]),
            flags,
            material: entry.id(),
            aux,
        });
    }

    if reader.remaining() != 0 {
        return Err(CoreError::corrupt(format!("{} trailing bytes", reader.remaining())));
    }
    Grid::from_cells(size, cells)
}

fn length_field(len: usize, what: impl FnOnce() -> String) -> CoreResult<u16> {
    u16::try_from(len).map_err(|_| CoreError::Format {
        reason: format!("{} is {len} bytes, limit is {}", what(), u16::MAX),
    })
}

fn format_error(reason: impl Into<String>) -> CoreError {
    CoreError::Format {
        reason: reason.into(),
    }
}

fn truncated() -> CoreError {
    CoreError::corrupt("unexpected end of data")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::AuxBlock;
    use crate::error::AuxError;
    use crate::geometry::Point;
    use crate::plugin::{Material, Registrar, Version};
    use crate::SimRng;
    use rand::SeedableRng;

    struct Plain(MaterialFlags);

    impl Material for Plain {
        fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
            MaterialData::new(id, self.0, Rgba::rgb(10, 20, 30), 300.0, 0.3, 1.0)
        }
    }

    /// Stores a u16 counter in the first two aux bytes.
    struct Counted;

    impl Material for Counted {
        fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
            MaterialData::new(id, MaterialFlags::BULK, Rgba::rgb(1, 2, 3), 250.0, 0.5, 0.1)
        }

        fn aux_size(&self, _cell: &MaterialData, _registry: &MaterialRegistry) -> usize {
            2
        }

        fn serialize_aux(&self, cell: &MaterialData, _registry: &MaterialRegistry, out: &mut [u8]) {
            out.copy_from_slice(&cell.aux.0[..2]);
        }

        fn deserialize_aux(&self, bytes: &[u8], _registry: &MaterialRegistry) -> Result<AuxBlock, AuxError> {
            if bytes.len() != 2 {
                return Err(AuxError::bad_length(2, bytes.len()));
            }
            AuxBlock::from_bytes(bytes).ok_or_else(|| AuxError::bad_length(2, bytes.len()))
        }
    }

    fn registry(counted_major: u8) -> MaterialRegistry {
        let mut registry = MaterialRegistry::new();
        let mut registrar = Registrar::new(&mut registry, "test");
        registrar
            .register_material("Space", Version::new(1, 0), Box::new(Plain(MaterialFlags::SPACE)))
            .unwrap();
        registrar
            .register_material("Counted", Version::new(counted_major, 0), Box::new(Counted))
            .unwrap();
        registrar.commit();
        registry
    }

    fn world(registry: &MaterialRegistry) -> Grid {
        let mut rng = SimRng::seed_from_u64(3);
        let space = registry.id_of("Space").unwrap();
        let counted = registry.id_of("Counted").unwrap();
        let mut grid = registry.new_grid(GridSize::new(5, 4), space, &mut rng).unwrap();
        for (i, x) in (0..5).enumerate() {
            let mut cell = registry.create(counted, &mut rng).unwrap();
            cell.aux.0[0] = i as u8;
            cell.aux.0[1] = 0xA0;
            cell.temp = 200.0 + x as f32;
            grid.set(Point::new(x, 1), cell);
        }
        grid
    }

    #[test]
    fn test_roundtrip_preserves_everything() {
        let registry = registry(1);
        let grid = world(&registry);
        for compress in [true, false] {
            let bytes = dump(&grid, &registry, DumpOptions { compress }).unwrap();
            let loaded = load(&bytes, &registry).unwrap();
            assert_eq!(loaded, grid);
        }
    }

    #[test]
    fn test_header_layout() {
        let registry = registry(1);
        let grid = world(&registry);
        let bytes = dump(&grid, &registry, DumpOptions { compress: false }).unwrap();
        assert_eq!(&bytes[..8], b"MOONSBOX");
        assert_eq!(&bytes[8..12], &[1, 0, 1, 0]);
        assert_eq!(bytes[12], 0);
        let crc = u32::from_le_bytes([bytes[13], bytes[14], bytes[15], bytes[16]]);
        assert_eq!(crc, crc32fast::hash(&bytes[HEADER_LEN..]));
        // table order is first appearance: (0, 0) is Space, (0, 1) is Counted
        assert_eq!(&bytes[17..21], &2u32.to_le_bytes());
        assert_eq!(&bytes[21..23], &5u16.to_le_bytes());
        assert_eq!(&bytes[23..28], b"Space");
    }

    #[test]
    fn test_bad_magic_is_format_error() {
        let registry = registry(1);
        let mut bytes = dump(&world(&registry), &registry, DumpOptions::default()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(load(&bytes, &registry), Err(CoreError::Format { .. })));
        assert!(matches!(load(b"MOON", &registry), Err(CoreError::Format { .. })));
        assert!(matches!(load(&[], &registry), Err(CoreError::Format { .. })));
    }

    #[test]
    fn test_future_version_rejected() {
        let registry = registry(1);
        let mut bytes = dump(&world(&registry), &registry, DumpOptions::default()).unwrap();
        bytes[10] = 2; // minor 1.2
        assert!(matches!(load(&bytes, &registry), Err(CoreError::VersionMismatch { .. })));
        bytes[10] = 0;
        bytes[8] = 2; // major 2
        assert!(matches!(load(&bytes, &registry), Err(CoreError::VersionMismatch { .. })));
    }

    #[test]
    fn test_older_minor_accepted() {
        let registry = registry(1);
        let grid = world(&registry);
        let mut bytes = dump(&grid, &registry, DumpOptions::default()).unwrap();
        bytes[10] = 0;
        assert_eq!(load(&bytes, &registry).unwrap(), grid);
    }

    #[test]
    fn test_flipped_body_bit_fails_checksum() {
        let registry = registry(1);
        let mut bytes = dump(&world(&registry), &registry, DumpOptions { compress: false }).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(load(&bytes, &registry), Err(CoreError::Corrupt { .. })));
    }

    #[test]
    fn test_unregistered_material_rejected() {
        let full = registry(1);
        let bytes = dump(&world(&full), &full, DumpOptions::default()).unwrap();

        let mut partial = MaterialRegistry::new();
        let mut registrar = Registrar::new(&mut partial, "test");
        registrar
            .register_material("Space", Version::new(1, 0), Box::new(Plain(MaterialFlags::SPACE)))
            .unwrap();
        registrar.commit();

        assert_eq!(load(&bytes, &partial), Err(CoreError::unknown_name("Counted")));
    }

    #[test]
    fn test_material_major_mismatch() {
        let old = registry(1);
        let bytes = dump(&world(&old), &old, DumpOptions::default()).unwrap();
        let new = registry(2);
        assert!(matches!(load(&bytes, &new), Err(CoreError::VersionMismatch { .. })));
    }

    #[test]
    fn test_dump_rejects_unknown_ids() {
        let registry = registry(1);
        let mut grid = world(&registry);
        grid.get_mut(Point::new(2, 2)).unwrap().material = MaterialId(77);
        assert_eq!(
            dump(&grid, &registry, DumpOptions::default()).unwrap_err(),
            CoreError::unknown_id(77)
        );
    }

    /// Re-frames a hand-built body with a valid header.
    fn frame(body: &[u8]) -> Vec<u8> {
        let mut out = SaveWriter::default();
        out.write_bytes(SAVE_MAGIC);
        out.write_u16(1);
        out.write_u16(1);
        out.write_u8(0);
        out.write_u32(crc32fast::hash(body));
        out.write_bytes(body);
        out.into_inner()
    }

    #[test]
    fn test_inconsistent_dimensions_are_corrupt() {
        let registry = registry(1);
        let mut body = SaveWriter::default();
        body.write_u32(0);
        body.write_i32(1000);
        body.write_i32(1000);
        assert!(matches!(load(&frame(&body.into_inner()), &registry), Err(CoreError::Corrupt { .. })));

        let mut body = SaveWriter::default();
        body.write_u32(0);
        body.write_i32(-1);
        body.write_i32(3);
        assert!(matches!(load(&frame(&body.into_inner()), &registry), Err(CoreError::Corrupt { .. })));
    }

    fn declared_grid(width: i32, height: i32, cell_bytes: usize) -> Vec<u8> {
        let mut body = SaveWriter::default();
        body.write_u32(0);
        body.write_i32(width);
        body.write_i32(height);
        body.write_bytes(&vec![0; cell_bytes]);
        frame(&body.into_inner())
    }

    #[test]
    fn test_huge_dimensions_are_corrupt() {
        let registry = registry(1);
        for (w, h, cell_bytes) in [
            (i32::MAX, i32::MAX, 0),
            (i32::MAX, 1, MIN_CELL_LEN * 3),
            (1, i32::MAX, MIN_CELL_LEN),
            (65_536, 65_536, 64),
        ] {
            let result = load(&declared_grid(w, h, cell_bytes), &registry);
            assert!(matches!(result, Err(CoreError::Corrupt { .. })), "{w}x{h}: {result:?}");
        }
    }

    #[test]
    fn test_half_empty_dimensions_are_corrupt() {
        let registry = registry(1);
        for (w, h) in [(0, 5), (5, 0), (0, i32::MAX)] {
            let result = load(&declared_grid(w, h, 0), &registry);
            assert!(matches!(result, Err(CoreError::Corrupt { .. })), "{w}x{h}: {result:?}");
        }
        assert_eq!(load(&declared_grid(0, 0, 0), &registry).unwrap(), Grid::default());
    }

    /// Frames `stored` as a compressed body.
    fn frame_compressed(stored: &[u8]) -> Vec<u8> {
        let mut bytes = frame(stored);
        bytes[12] = FLAG_LZ4;
        bytes
    }

    #[test]
    fn test_inflated_size_prefix_is_corrupt() {
        let registry = registry(1);
        let bytes = dump(&world(&registry), &registry, DumpOptions::default()).unwrap();
        let mut stored = bytes[HEADER_LEN..].to_vec();

        stored[..4].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = load(&frame_compressed(&stored), &registry).unwrap_err();
        assert!(matches!(err, CoreError::Corrupt { ref reason } if reason.contains("allow at most")), "{err:?}");

        // within the ratio bound but larger than the real body
        let block_len = (stored.len() - 4) as u32;
        stored[..4].copy_from_slice(&(block_len * 200).to_le_bytes());
        assert!(matches!(load(&frame_compressed(&stored), &registry), Err(CoreError::Corrupt { .. })));

        assert!(matches!(load(&frame_compressed(&[1, 0]), &registry), Err(CoreError::Corrupt { .. })));
    }

    #[test]
    fn test_trailing_bytes_are_corrupt() {
        let registry = registry(1);
        let grid = world(&registry);
        let bytes = dump(&grid, &registry, DumpOptions { compress: false }).unwrap();
        let mut body = bytes[HEADER_LEN..].to_vec();
        body.push(0);
        assert!(matches!(load(&frame(&body), &registry), Err(CoreError::Corrupt { .. })));
    }

    #[test]
    fn test_bad_aux_reported_by_material() {
        let registry = registry(1);
        let counted = registry.id_of("Counted").unwrap();
        let mut rng = SimRng::seed_from_u64(0);
        let grid = registry.new_grid(GridSize::new(1, 1), counted, &mut rng).unwrap();
        let bytes = dump(&grid, &registry, DumpOptions { compress: false }).unwrap();

        // shrink the aux length field from 2 to 1 and drop one payload byte
        let mut body = bytes[HEADER_LEN..].to_vec();
        let len_at = body.len() - 4;
        body[len_at] = 1;
        body.pop();
        let err = load(&frame(&body), &registry).unwrap_err();
        assert_eq!(
            err,
            CoreError::Aux {
                material: "Counted".into(),
                source: AuxError::bad_length(2, 1),
            }
        );
    }

    #[test]
    fn test_empty_grid_roundtrip() {
        let registry = registry(1);
        let grid = Grid::default();
        let bytes = dump(&grid, &registry, DumpOptions::default()).unwrap();
        assert_eq!(load(&bytes, &registry).unwrap(), grid);
    }
}
