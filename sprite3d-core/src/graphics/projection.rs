use glam::{Affine2, Mat4, Vec2};

/// Depth scale of the intermediate projection. An empirical value that keeps
/// typical sprite depths inside the clip volume.
pub const DEPTH_SCALE: f32 = 2.0 / 1700.0;

/// Identity, except that clip w picks up the input z. This is an
/// approximation of a perspective divide, not a real frustum.
pub const PSEUDO_PERSPECTIVE: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 1.0,
    0.0, 0.0, 0.0, 1.0,
]);


/// Builds the 3D projection used by sprite shaders from a 2D one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionComposer {
    perspective: Mat4,
}
impl Default for ProjectionComposer {
    fn default() -> Self {
        Self {
            perspective: PSEUDO_PERSPECTIVE,
        }
    }
}
impl ProjectionComposer {
    /// Uses a different fixed perspective matrix.
    pub fn with_perspective(perspective: Mat4) -> Self {
        Self { perspective }
    }

    /// Lifts the scale and translation of `projection` into a 4x4 matrix
    /// and applies the fixed perspective on top of it.
    pub fn compose(&self, projection: &Affine2) -> Mat4 {
        let mut cols = Mat4::IDENTITY.to_cols_array();
        cols[0] = projection.matrix2.x_axis.x;
        cols[5] = projection.matrix2.y_axis.y;
        cols[10] = DEPTH_SCALE;
        cols[12] = projection.translation.x;
        cols[13] = projection.translation.y;

        self.perspective * Mat4::from_cols_array(&cols)
    }
}

/// The 2D projection of a `width` x `height` pixel target with the origin in
/// the top-left corner and y pointing down.
pub fn screen_projection(width: f32, height: f32) -> Affine2 {
    Affine2::from_scale_angle_translation(
        Vec2::new(2.0 / width, -2.0 / height),
        0.0,
        Vec2::new(-1.0, 1.0),
    )
}


#[cfg(test)]
mod tests {
    use glam::{Vec3, Vec4};

    use super::*;

    #[test]
    fn composes_scale_translation_and_depth() {
        let projection = Affine2::from_scale_angle_translation(Vec2::new(0.5, -0.25), 0.0, Vec2::new(-1.0, 1.0));
        let combined = ProjectionComposer::default().compose(&projection);
        let expected = Mat4::from_cols_array(&[
            0.5, 0.0, 0.0, 0.0,
            0.0, -0.25, 0.0, 0.0,
            0.0, 0.0, DEPTH_SCALE, DEPTH_SCALE,
            -1.0, 1.0, 0.0, 1.0,
        ]);
        assert!(combined.abs_diff_eq(expected, 1e-6), "{combined}");
    }

    #[test]
    fn depth_feeds_w() {
        let combined = ProjectionComposer::default().compose(&Affine2::IDENTITY);
        let clip = combined * Vec4::new(10.0, 20.0, 850.0, 1.0);
        assert!((clip.w - 2.0).abs() < 1e-5);
        assert!((clip.z - 1.0).abs() < 1e-5);
        assert_eq!(clip.truncate().truncate(), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn flat_sprites_map_like_the_2d_projection() {
        let projection = screen_projection(800.0, 600.0);
        let combined = ProjectionComposer::default().compose(&projection);
        for point in [Vec2::ZERO, Vec2::new(800.0, 600.0), Vec2::new(400.0, 300.0)] {
            let expected = projection.transform_point2(point);
            let clip = combined.project_point3(Vec3::new(point.x, point.y, 0.0));
            assert!(clip.truncate().abs_diff_eq(expected, 1e-5), "{point}: {clip} vs {expected}");
        }
    }

    #[test]
    fn screen_projection_corners() {
        let projection = screen_projection(640.0, 480.0);
        assert!(projection.transform_point2(Vec2::ZERO).abs_diff_eq(Vec2::new(-1.0, 1.0), 1e-6));
        assert!(projection
            .transform_point2(Vec2::new(640.0, 480.0))
            .abs_diff_eq(Vec2::new(1.0, -1.0), 1e-6));
    }

    #[test]
    fn custom_perspective_is_left_operand() {
        let perspective = Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0));
        let composer = ProjectionComposer::with_perspective(perspective);
        let combined = composer.compose(&Affine2::from_translation(Vec2::new(3.0, 4.0)));
        assert_eq!(combined.w_axis, Vec4::new(6.0, 8.0, 0.0, 1.0));
    }
}
