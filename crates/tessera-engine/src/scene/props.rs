use bitflags::bitflags;
use glam::{Mat4, Vec2, Vec3, Vec4};

use super::Outline;

bitflags! {
    /// Which parts of the property transform are active.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct MatrixFlags: u32 {
        const TRANSLATION = 1 << 0;
        const ROTATION    = 1 << 1;
        const ROTATION_3D = 1 << 2;
        const SCALE       = 1 << 3;
    }
}

/// Visual properties of a scene node.
///
/// Bounds are expressed in the parent's coordinate space; the node's own
/// content spans `(0, 0)` to `(width, height)`. Rotations are in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeProperties {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,

    pub translation_x: f32,
    pub translation_y: f32,
    /// Elevation. Non-zero values take the node out of in-order drawing.
    pub translation_z: f32,
    pub rotation: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Explicit pivot; `None` pivots around the center of the bounds.
    pub pivot: Option<Vec2>,

    pub alpha: f32,
    pub has_overlapping_rendering: bool,
    /// Content is rendered through a dedicated layer by the caller.
    pub caching: bool,
    pub clip_to_bounds: bool,
    pub clip_to_outline: bool,
    pub outline: Outline,
    pub casts_shadow: bool,
    /// Draw at the nearest projection-receiving ancestor instead of in place.
    pub project_backwards: bool,

    pub static_matrix: Option<Mat4>,
    pub animation_matrix: Option<Mat4>,
}

impl Default for NodeProperties {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
            translation_x: 0.0,
            translation_y: 0.0,
            translation_z: 0.0,
            rotation: 0.0,
            rotation_x: 0.0,
            rotation_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            pivot: None,
            alpha: 1.0,
            has_overlapping_rendering: true,
            caching: false,
            clip_to_bounds: true,
            clip_to_outline: false,
            outline: Outline::Empty,
            casts_shadow: false,
            project_backwards: false,
            static_matrix: None,
            animation_matrix: None,
        }
    }
}

impl NodeProperties {
    /// Properties for a node occupying `(left, top, right, bottom)`.
    pub fn with_bounds(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom, ..Self::default() }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn pivot(&self) -> Vec2 {
        self.pivot
            .unwrap_or_else(|| Vec2::new(self.width() / 2.0, self.height() / 2.0))
    }

    pub fn matrix_flags(&self) -> MatrixFlags {
        let mut flags = MatrixFlags::empty();
        if self.translation_x != 0.0 || self.translation_y != 0.0 || self.translation_z != 0.0 {
            flags |= MatrixFlags::TRANSLATION;
        }
        if self.rotation != 0.0 {
            flags |= MatrixFlags::ROTATION;
        }
        if self.rotation_x != 0.0 || self.rotation_y != 0.0 {
            flags |= MatrixFlags::ROTATION_3D;
        }
        if self.scale_x != 1.0 || self.scale_y != 1.0 {
            flags |= MatrixFlags::SCALE;
        }
        flags
    }

    /// Translation/rotation/scale about the pivot.
    ///
    /// With `true_3d` the result keeps real Z (translation and the X/Y
    /// rotations); otherwise it is flattened onto the XY plane.
    pub fn transform_matrix(&self, true_3d: bool) -> Mat4 {
        let pivot = self.pivot();
        let full = Mat4::from_translation(Vec3::new(
            pivot.x + self.translation_x,
            pivot.y + self.translation_y,
            self.translation_z,
        )) * Mat4::from_rotation_x(self.rotation_x.to_radians())
            * Mat4::from_rotation_y(self.rotation_y.to_radians())
            * Mat4::from_rotation_z(self.rotation.to_radians())
            * Mat4::from_scale(Vec3::new(self.scale_x, self.scale_y, 1.0))
            * Mat4::from_translation(Vec3::new(-pivot.x, -pivot.y, 0.0));

        if true_3d { full } else { flatten(full) }
    }

    /// Post-multiplies this node's property transforms onto `matrix`.
    pub fn apply_view_property_transforms(&self, matrix: &mut Mat4, true_3d: bool) {
        if self.left != 0.0 || self.top != 0.0 {
            *matrix *= Mat4::from_translation(Vec3::new(self.left, self.top, 0.0));
        }
        if let Some(stat) = self.static_matrix {
            *matrix *= stat;
        } else if let Some(anim) = self.animation_matrix {
            *matrix *= anim;
        }

        let flags = self.matrix_flags();
        if flags.is_empty() {
            return;
        }
        if flags == MatrixFlags::TRANSLATION {
            let z = if true_3d { self.translation_z } else { 0.0 };
            *matrix *= Mat4::from_translation(Vec3::new(self.translation_x, self.translation_y, z));
        } else {
            *matrix *= self.transform_matrix(true_3d);
        }
    }
}

/// Drops the Z row and column so the matrix maps the XY plane onto itself.
fn flatten(m: Mat4) -> Mat4 {
    let strip = |c: Vec4| Vec4::new(c.x, c.y, 0.0, c.w);
    Mat4::from_cols(strip(m.x_axis), strip(m.y_axis), Vec4::Z, strip(m.w_axis))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn translation_only_is_classified() {
        let props = NodeProperties { translation_x: 4.0, ..NodeProperties::default() };
        assert_eq!(props.matrix_flags(), MatrixFlags::TRANSLATION);
        assert!(NodeProperties::default().matrix_flags().is_empty());
    }

    #[test]
    fn translation_z_only_applies_in_true_3d() {
        let props = NodeProperties {
            translation_x: 1.0,
            translation_z: 8.0,
            ..NodeProperties::default()
        };
        let mut flat = Mat4::IDENTITY;
        props.apply_view_property_transforms(&mut flat, false);
        let mut real = Mat4::IDENTITY;
        props.apply_view_property_transforms(&mut real, true);

        assert!(approx(flat.transform_point3(Vec3::ZERO), Vec3::new(1.0, 0.0, 0.0)));
        assert!(approx(real.transform_point3(Vec3::ZERO), Vec3::new(1.0, 0.0, 8.0)));
    }

    #[test]
    fn left_top_then_static_matrix() {
        let props = NodeProperties {
            left: 10.0,
            top: 20.0,
            static_matrix: Some(Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0))),
            animation_matrix: Some(Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0))),
            ..NodeProperties::default()
        };
        let mut m = Mat4::IDENTITY;
        props.apply_view_property_transforms(&mut m, false);
        // Static wins over animation.
        assert!(approx(m.transform_point3(Vec3::new(1.0, 1.0, 0.0)), Vec3::new(12.0, 22.0, 0.0)));
    }

    #[test]
    fn rotation_pivots_around_center() {
        let props = NodeProperties {
            right: 10.0,
            bottom: 10.0,
            rotation: 90.0,
            ..NodeProperties::default()
        };
        let m = props.transform_matrix(false);
        // The center is a fixed point.
        assert!(approx(m.transform_point3(Vec3::new(5.0, 5.0, 0.0)), Vec3::new(5.0, 5.0, 0.0)));
        assert!(approx(m.transform_point3(Vec3::new(10.0, 5.0, 0.0)), Vec3::new(5.0, 10.0, 0.0)));
    }

    #[test]
    fn flattened_matrix_has_no_depth() {
        let props = NodeProperties {
            rotation_x: 30.0,
            translation_z: 5.0,
            ..NodeProperties::default()
        };
        let p = props.transform_matrix(false).transform_point3(Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(p.z, 0.0);
    }
}
