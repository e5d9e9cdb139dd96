//! # Cell Records
//!
//! One `MaterialData` per grid cell. The record is plain old data: copying a
//! cell copies its auxiliary payload with it, and overwriting a cell destroys
//! the old payload. Nothing in a cell points anywhere, so saves, swaps and
//! resizes can never leave a dangling reference behind.
//!
//! ## Layout
//!
//! ```text
//! [f32 temp][f32 heat_capacity][f32 thermal_conductivity]
//! [u8 r, g, b, a][u32 flags][u32 material][16 bytes aux]
//! ```

use std::ops::{BitAnd, BitOr, BitOrAssign};

use bytemuck::{Pod, Zeroable};

/// Size of the inline auxiliary payload in bytes.
pub const AUX_CAPACITY: usize = 16;

/// Identifier of a registered material.
///
/// Ids are assigned by the registry in registration order and are only
/// meaningful inside one process. Saves store material names instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct MaterialId(pub u32);

impl MaterialId {
    /// The reserved "no material" id. Never assigned by a registry.
    pub const NULL: Self = Self(0);

    /// Returns true for the reserved null id.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Physical category bitset of a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct MaterialFlags(pub u32);

impl MaterialFlags {
    /// No category.
    pub const NULL: Self = Self(0);
    /// Immovable solid.
    pub const SOLID: Self = Self(1);
    /// Granular bulk (sand, powders).
    pub const BULK: Self = Self(1 << 1);
    /// Liquid.
    pub const LIQUID: Self = Self(1 << 2);
    /// Gas.
    pub const GAS: Self = Self(1 << 3);
    /// Empty space.
    pub const SPACE: Self = Self(1 << 4);
    /// Light solids that float on liquids.
    pub const FLOAT: Self = Self(1 << 5);

    /// Cells other matter can pass through.
    pub const SPARSENESS: Self = Self(Self::GAS.0 | Self::SPACE.0);
    /// Cells a falling powder can sink through.
    pub const FLOWABLE: Self = Self(Self::SPARSENESS.0 | Self::LIQUID.0);
    /// Cells that participate in movement utilities.
    pub const MOVABLE: Self = Self(Self::BULK.0 | Self::LIQUID.0 | Self::GAS.0 | Self::FLOAT.0);

    /// Returns true if every bit of `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if any bit of `other` is set.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MaterialFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MaterialFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for MaterialFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha (0 = transparent).
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Creates a color from channels.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }

    /// Color from `0xRRGGBBAA`.
    #[inline]
    #[must_use]
    pub const fn from_hex(rgba: u32) -> Self {
        let [r, g, b, a] = rgba.to_be_bytes();
        Self { r, g, b, a }
    }

    /// Blends `fg` over `bg`; `alpha` is clamped to `[0, 1]`.
    ///
    /// All four channels are interpolated, alpha included.
    #[must_use]
    pub fn blend(bg: Self, fg: Self, alpha: f32) -> Self {
        let alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
        let mix = |b: u8, f: u8| (f32::from(f) * alpha + f32::from(b) * (1.0 - alpha)) as u8;
        Self {
            r: mix(bg.r, fg.r),
            g: mix(bg.g, fg.g),
            b: mix(bg.b, fg.b),
            a: mix(bg.a, fg.a),
        }
    }
}

/// Inline, material-defined auxiliary payload.
///
/// The host never interprets these bytes. Materials store a small `Pod`
/// struct here with [`AuxBlock::pack`] and read it back with
/// [`AuxBlock::unpack`]; persisting it is the job of the owning material's
/// serialization hooks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct AuxBlock(pub [u8; AUX_CAPACITY]);

impl AuxBlock {
    /// The all-zero payload.
    pub const EMPTY: Self = Self([0; AUX_CAPACITY]);

    /// Packs a `Pod` value into a block. Returns `None` if it does not fit.
    #[must_use]
    pub fn pack<T: Pod>(value: &T) -> Option<Self> {
        let bytes = bytemuck::bytes_of(value);
        if bytes.len() > AUX_CAPACITY {
            return None;
        }
        let mut block = Self::EMPTY;
        block.0[..bytes.len()].copy_from_slice(bytes);
        Some(block)
    }

    /// Reads a `Pod` value back out of the block.
    #[must_use]
    pub fn unpack<T: Pod>(&self) -> Option<T> {
        let size = std::mem::size_of::<T>();
        if size > AUX_CAPACITY {
            return None;
        }
        bytemuck::try_pod_read_unaligned(&self.0[..size]).ok()
    }

    /// Builds a block from raw bytes. Returns `None` if `bytes` is too long.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > AUX_CAPACITY {
            return None;
        }
        let mut block = Self::EMPTY;
        block.0[..bytes.len()].copy_from_slice(bytes);
        Some(block)
    }
}

/// Per-cell material record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MaterialData {
    /// Temperature in kelvin.
    pub temp: f32,
    /// How readily the cell takes on its neighbours' temperature.
    pub heat_capacity: f32,
    /// How readily the cell passes its temperature on.
    pub thermal_conductivity: f32,
    /// Display color.
    pub color: Rgba,
    /// Physical category.
    pub flags: MaterialFlags,
    /// Owning material.
    pub material: MaterialId,
    /// Material-defined payload.
    pub aux: AuxBlock,
}

impl MaterialData {
    /// Creates a record for `material` with the given physical properties.
    #[must_use]
    pub const fn new(
        material: MaterialId,
        flags: MaterialFlags,
        color: Rgba,
        temp: f32,
        heat_capacity: f32,
        thermal_conductivity: f32,
    ) -> Self {
        Self {
            temp,
            heat_capacity,
            thermal_conductivity,
            color,
            flags,
            material,
            aux: AuxBlock::EMPTY,
        }
    }

    /// Returns the same record with `aux` attached.
    #[must_use]
    pub const fn with_aux(mut self, aux: AuxBlock) -> Self {
        self.aux = aux;
        self
    }

    /// Returns true if the cell participates in movement utilities.
    #[inline]
    #[must_use]
    pub const fn is_movable(&self) -> bool {
        self.flags.intersects(MaterialFlags::MOVABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_groupings() {
        assert!(MaterialFlags::SPARSENESS.contains(MaterialFlags::GAS));
        assert!(MaterialFlags::SPARSENESS.contains(MaterialFlags::SPACE));
        assert!(!MaterialFlags::SPARSENESS.intersects(MaterialFlags::LIQUID));
        assert!(MaterialFlags::MOVABLE.contains(MaterialFlags::FLOAT));
        assert!(!MaterialFlags::MOVABLE.intersects(MaterialFlags::SOLID | MaterialFlags::SPACE));
        assert_eq!(
            MaterialFlags::FLOWABLE,
            MaterialFlags::GAS | MaterialFlags::SPACE | MaterialFlags::LIQUID
        );
    }

    #[test]
    fn test_record_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<MaterialData>(), 24 + AUX_CAPACITY);
    }

    #[test]
    fn test_aux_pack_unpack() {
        #[derive(Clone, Copy, Pod, Zeroable, PartialEq, Debug)]
        #[repr(C)]
        struct Ttl {
            ticks: i16,
            flag: u8,
            _pad: u8,
        }

        let value = Ttl { ticks: -42, flag: 1, _pad: 0 };
        let block = AuxBlock::pack(&value).unwrap();
        assert_eq!(block.unpack::<Ttl>(), Some(value));
        assert!(AuxBlock::pack(&[0u64; 3]).is_none());
        assert!(block.unpack::<[u8; 17]>().is_none());
    }

    #[test]
    fn test_blend_endpoints() {
        let bg = Rgba::new(0, 0, 0, 0);
        let fg = Rgba::new(200, 100, 50, 255);
        assert_eq!(Rgba::blend(bg, fg, 0.0), bg);
        assert_eq!(Rgba::blend(bg, fg, 1.0), fg);
        assert_eq!(Rgba::blend(bg, fg, 7.0), fg);
        assert_eq!(Rgba::blend(bg, fg, 0.5), Rgba::new(100, 50, 25, 127));
    }

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgba::from_hex(0x1122_3344), Rgba::new(0x11, 0x22, 0x33, 0x44));
    }
}
