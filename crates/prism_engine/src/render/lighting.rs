//! Light sources and the per-frame light registry
//!
//! Lights are plain values collected into a fixed-capacity registry each
//! frame. Material application uploads the full capacity every time: real
//! lights first, then inert defaults padding the remaining slots, so shaders
//! can loop over a constant count without branching on the registered
//! number.

use crate::foundation::math::Vec3;

/// Maximum number of lights a shader pipeline receives
pub const MAX_LIGHTS: usize = 16;

/// A single light source
///
/// `is_positional` distinguishes point/spot lights from directional ones.
/// A zero-brightness light contributes nothing regardless of its other
/// fields, which is what makes the padding entries inert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// World-space position (ignored for directional lights)
    pub position: Vec3,
    /// Direction the light points (ignored for point lights)
    pub direction: Vec3,
    /// RGB color, each channel in [0, 1]
    pub color: Vec3,
    /// Overall intensity multiplier
    pub brightness: f32,
    /// Distance attenuation factor (0 disables attenuation)
    pub attenuation: f32,
    /// Inner cone aperture in degrees for spot lights
    pub inner_aperture_degrees: f32,
    /// Outer cone aperture in degrees for spot lights
    pub outer_aperture_degrees: f32,
    /// Fraction of brightness contributed as ambient light
    pub ambient_fraction: f32,
    /// True for point and spot lights, false for directional lights
    pub is_positional: bool,
}

impl Light {
    /// Directional light shining along `direction`
    pub fn directional(direction: Vec3, color: Vec3, brightness: f32) -> Self {
        Self {
            direction,
            color,
            brightness,
            is_positional: false,
            ..Self::default()
        }
    }

    /// Point light at `position`
    pub fn point(position: Vec3, color: Vec3, brightness: f32) -> Self {
        Self {
            position,
            color,
            brightness,
            is_positional: true,
            ..Self::default()
        }
    }

    /// Builder method to set distance attenuation
    pub fn with_attenuation(mut self, attenuation: f32) -> Self {
        self.attenuation = attenuation;
        self
    }

    /// Builder method to set spot cone apertures in degrees
    pub fn with_apertures_degrees(mut self, inner: f32, outer: f32) -> Self {
        self.inner_aperture_degrees = inner;
        self.outer_aperture_degrees = outer;
        self
    }

    /// Builder method to set the ambient contribution fraction
    pub fn with_ambient_fraction(mut self, fraction: f32) -> Self {
        self.ambient_fraction = fraction;
        self
    }
}

impl Default for Light {
    /// Inert light: zero brightness, so it contributes nothing when padded
    /// into unused shader slots
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            direction: Vec3::new(0.0, 0.0, -1.0),
            color: Vec3::zeros(),
            brightness: 0.0,
            attenuation: 0.0,
            inner_aperture_degrees: 0.0,
            outer_aperture_degrees: 0.0,
            ambient_fraction: 0.0,
            is_positional: false,
        }
    }
}

/// Fixed-capacity collection of the lights active this frame
#[derive(Debug, Clone, Default)]
pub struct LightRegistry {
    lights: Vec<Light>,
}

impl LightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a light for this frame
    ///
    /// Lights beyond [`MAX_LIGHTS`] are dropped with a warning rather than
    /// displacing earlier registrations.
    pub fn add(&mut self, light: Light) {
        if self.lights.len() >= MAX_LIGHTS {
            log::warn!("Light registry full ({MAX_LIGHTS} lights); dropping extra light");
            return;
        }
        self.lights.push(light);
    }

    /// Lights registered so far this frame
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Number of registered lights
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// True when no lights are registered
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Drop all registered lights
    ///
    /// Called after each material light upload so lights never leak across
    /// frames.
    pub fn clear(&mut self) {
        self.lights.clear();
    }

    /// Registered lights padded with inert defaults up to [`MAX_LIGHTS`]
    pub fn padded(&self) -> [Light; MAX_LIGHTS] {
        let mut slots = [Light::default(); MAX_LIGHTS];
        for (slot, light) in slots.iter_mut().zip(self.lights.iter()) {
            *slot = *light;
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_light_is_inert() {
        let light = Light::default();
        assert_eq!(light.brightness, 0.0);
        assert_eq!(light.color, Vec3::zeros());
    }

    #[test]
    fn test_padded_fills_remaining_slots_with_inert_lights() {
        let mut registry = LightRegistry::new();
        registry.add(Light::point(Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 2.0));
        registry.add(Light::directional(Vec3::new(0.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 0.0), 1.0));
        registry.add(Light::point(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0), 0.5));

        let padded = registry.padded();
        assert_eq!(padded.len(), MAX_LIGHTS);
        assert_eq!(padded[0].brightness, 2.0);
        assert_eq!(padded[1].brightness, 1.0);
        assert_eq!(padded[2].brightness, 0.5);
        for light in &padded[3..] {
            assert_eq!(*light, Light::default());
        }
    }

    #[test]
    fn test_registry_drops_lights_beyond_capacity() {
        let mut registry = LightRegistry::new();
        for i in 0..MAX_LIGHTS + 4 {
            registry.add(Light::point(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), i as f32 + 1.0));
        }
        assert_eq!(registry.len(), MAX_LIGHTS);
        // The first registration is still in slot 0
        assert_eq!(registry.lights()[0].brightness, 1.0);
    }

    #[test]
    fn test_clear_empties_the_registry() {
        let mut registry = LightRegistry::new();
        registry.add(Light::default());
        registry.clear();
        assert!(registry.is_empty());
    }
}
