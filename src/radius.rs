//! Mapping from a normalized UI intensity to a blur radius in pixels.

/// Largest radius handed out by default. Convolution cost grows linearly with
/// the radius, so this bounds the work done on a full-size photograph.
pub const DEFAULT_MAX_RADIUS: u32 = 50;

/// Radius reached at full intensity unless configured otherwise.
pub const DEFAULT_SCALE: f32 = 25.0;

/// Converts slider positions in `[0, 1]` into pixel radii.
///
/// There is no canonical scale; callers tune `scale` to taste. `density`
/// converts a density-independent radius into physical pixels, so the same
/// slider position looks alike on screens of different pixel density.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusMap {
    pub scale: f32,
    pub density: f32,
    pub max_radius: u32,
}

impl Default for RadiusMap {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            density: 1.0,
            max_radius: DEFAULT_MAX_RADIUS,
        }
    }
}

impl RadiusMap {
    #[must_use]
    pub fn with_scale(self, scale: f32) -> Self {
        Self { scale, ..self }
    }

    #[must_use]
    pub fn with_density(self, density: f32) -> Self {
        Self { density, ..self }
    }

    #[must_use]
    pub fn with_max_radius(self, max_radius: u32) -> Self {
        Self { max_radius, ..self }
    }

    /// `round(intensity * scale * density)`, clamped to `max_radius`.
    ///
    /// Intensities outside `[0, 1]` are clamped first; NaN counts as zero.
    pub fn radius(&self, intensity: f32) -> u32 {
        let intensity = if intensity.is_nan() {
            0.0
        } else {
            intensity.clamp(0.0, 1.0)
        };
        let wanted = (intensity * self.scale * self.density).round();
        if wanted.is_nan() || wanted <= 0.0 {
            return 0;
        }
        if wanted > self.max_radius as f32 {
            log::warn!(
                "blur radius {wanted} clamped to {} (intensity {intensity})",
                self.max_radius
            );
            return self.max_radius;
        }
        wanted as u32
    }
}

/// Maps `intensity` with the given `scale`, clamped to
/// [`DEFAULT_MAX_RADIUS`].
pub fn map_intensity_to_radius(intensity: f32, scale: f32) -> u32 {
    RadiusMap::default().with_scale(scale).radius(intensity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(map_intensity_to_radius(0.0, 25.0), 0);
        assert_eq!(map_intensity_to_radius(0.5, 25.0), 13);
        assert_eq!(map_intensity_to_radius(0.1, 25.0), 3);
        assert_eq!(map_intensity_to_radius(1.0, 25.0), 25);
        assert_eq!(map_intensity_to_radius(0.3, 10.0), 3);
    }

    #[test]
    fn clamps_to_max() {
        assert_eq!(map_intensity_to_radius(1.0, 500.0), DEFAULT_MAX_RADIUS);
        let map = RadiusMap::default().with_scale(32.0).with_max_radius(20);
        assert_eq!(map.radius(0.5), 16);
        assert_eq!(map.radius(1.0), 20);
    }

    #[test]
    fn sanitizes_intensity() {
        let map = RadiusMap::default();
        assert_eq!(map.radius(-3.0), 0);
        assert_eq!(map.radius(7.0), 25);
        assert_eq!(map.radius(f32::NAN), 0);
        assert_eq!(map.radius(f32::INFINITY), 25);
        assert_eq!(map.with_scale(-10.0).radius(1.0), 0);
        assert_eq!(map.with_scale(f32::NAN).radius(1.0), 0);
    }

    #[test]
    fn applies_density() {
        let map = RadiusMap::default().with_scale(15.0).with_density(2.0);
        assert_eq!(map.radius(1.0), 30);
        assert_eq!(map.radius(0.1), 3);
    }
}
