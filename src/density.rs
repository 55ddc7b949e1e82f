/// Maps a tile side length and a level of detail to the number of mesh vertices along that side.
///
/// Implementations must return at least one vertex and be monotonically non-increasing in `lod`.
pub trait VertexDensity {
    fn vertices_per_dimension(&self, size: u32, lod: u32) -> u32;
}

/// Skips samples in steps of `2 * lod` (or 1 at full detail).
#[derive(Clone, Copy, Debug, Default)]
pub struct LodStepDensity;

impl LodStepDensity {
    #[inline]
    pub fn step(lod: u32) -> u32 {
        if lod == 0 {
            1
        } else {
            lod.saturating_mul(2)
        }
    }
}

impl VertexDensity for LodStepDensity {
    fn vertices_per_dimension(&self, size: u32, lod: u32) -> u32 {
        size.saturating_sub(1).div_ceil(Self::step(lod)) + 1
    }
}
