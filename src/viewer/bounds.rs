use glam::Vec3;

/// Largest model dimension after normalization, in scene units
pub const TARGET_SIZE: f32 = 3.5;

/// Scale kept for a model whose box has no usable extent
pub const FALLBACK_SCALE: f32 = 1.0;

/// Axis-aligned bounding box of a loaded model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounds of a set of vertex positions. No positions gives a box at the origin.
    pub fn from_positions(positions: impl IntoIterator<Item = Vec3>) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut count = 0usize;

        for pos in positions {
            min = min.min(pos);
            max = max.max(pos);
            count += 1;
        }

        if count == 0 {
            return Self::new(Vec3::ZERO, Vec3::ZERO);
        }
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Uniform scale plus translation that centers a model on the origin and
/// fits its largest dimension to `TARGET_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub scale: f32,
    pub offset: Vec3,
}

impl Normalization {
    /// A zero, negative or non-finite largest dimension keeps
    /// `FALLBACK_SCALE` and only recenters. The viewer document applies the
    /// same rule in the page.
    pub fn fit(bounds: &Aabb, target: f32) -> Self {
        let max_dim = bounds.size().max_element();
        let scale = if max_dim.is_finite() && max_dim > 0.0 {
            target / max_dim
        } else {
            FALLBACK_SCALE
        };
        let center = bounds.center();
        let offset = if center.is_finite() {
            -center * scale
        } else {
            Vec3::ZERO
        };
        Self { scale, offset }
    }

    /// Where a model-space point ends up in the scene
    pub fn apply(&self, point: Vec3) -> Vec3 {
        point * self.scale + self.offset
    }
}
