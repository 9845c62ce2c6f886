//! Crop geometry validation
//!
//! Rejects detections whose crop quadrilateral reaches into a padded border
//! of the frame; crops that close to the edge are likely truncated. With no
//! padding configured the check always passes. Relative padding wins over
//! absolute when both are configured.

use tracing::debug;

use crate::models::{Notification, StreamConfiguration};

/// Check that the crop quadrilateral lies inside the padded frame.
///
/// Missing crop coordinates or frame dimensions never reject: upstream
/// versions that omit geometry data still enroll on attributes alone.
pub fn validate(notification: &Notification, mapping: &StreamConfiguration) -> bool {
    if mapping.frame_padding_absolute.is_none() && mapping.frame_padding_relative.is_none() {
        return true;
    }

    let (Some(crop), Some(frame)) = (
        notification.crop_coordinates.as_ref(),
        notification.frame_information.as_ref(),
    ) else {
        return true;
    };

    debug!(
        frame_width = frame.width,
        frame_height = frame.height,
        left_top = ?(crop.crop_left_top_x, crop.crop_left_top_y),
        right_bottom = ?(crop.crop_right_bottom_x, crop.crop_right_bottom_y),
        padding_absolute = ?mapping.frame_padding_absolute,
        padding_relative = ?mapping.frame_padding_relative,
        "Crop geometry"
    );

    is_quad_within_padded_frame(
        frame.width,
        frame.height,
        crop.crop_left_top_x,
        crop.crop_left_top_y,
        crop.crop_right_top_x,
        crop.crop_right_top_y,
        crop.crop_left_bottom_x,
        crop.crop_left_bottom_y,
        crop.crop_right_bottom_x,
        crop.crop_right_bottom_y,
        mapping
            .frame_padding_relative
            .or(mapping.frame_padding_absolute)
            .unwrap_or(0.0),
        mapping.frame_padding_relative.is_some(),
    )
}

/// All four corners must lie within the frame inset by the padding.
/// Relative padding scales with each frame dimension.
#[allow(clippy::too_many_arguments)]
pub fn is_quad_within_padded_frame(
    frame_width: u32,
    frame_height: u32,
    top_left_x: f64,
    top_left_y: f64,
    top_right_x: f64,
    top_right_y: f64,
    bottom_left_x: f64,
    bottom_left_y: f64,
    bottom_right_x: f64,
    bottom_right_y: f64,
    padding: f64,
    is_relative_padding: bool,
) -> bool {
    let frame_width = f64::from(frame_width);
    let frame_height = f64::from(frame_height);

    let padding_x = if is_relative_padding {
        frame_width * padding
    } else {
        padding
    };
    let padding_y = if is_relative_padding {
        frame_height * padding
    } else {
        padding
    };

    let padded_left = padding_x;
    let padded_top = padding_y;
    let padded_right = frame_width - padding_x;
    let padded_bottom = frame_height - padding_y;

    top_left_x >= padded_left
        && top_left_y >= padded_top
        && top_right_x <= padded_right
        && top_right_y >= padded_top
        && bottom_left_x >= padded_left
        && bottom_left_y <= padded_bottom
        && bottom_right_x <= padded_right
        && bottom_right_y <= padded_bottom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CropCoordinates, FrameInformation};

    fn crop(left: f64, top: f64, right: f64, bottom: f64) -> CropCoordinates {
        CropCoordinates {
            crop_left_top_x: left,
            crop_left_top_y: top,
            crop_right_top_x: right,
            crop_right_top_y: top,
            crop_left_bottom_x: left,
            crop_left_bottom_y: bottom,
            crop_right_bottom_x: right,
            crop_right_bottom_y: bottom,
        }
    }

    fn notification_with_crop(c: CropCoordinates) -> Notification {
        let mut n = Notification::new("s", "t");
        n.crop_coordinates = Some(c);
        n.frame_information = Some(FrameInformation {
            width: 1920,
            height: 1080,
        });
        n
    }

    #[test]
    fn test_no_padding_always_passes() {
        let n = notification_with_crop(crop(-10.0, -10.0, 5000.0, 5000.0));
        assert!(validate(&n, &StreamConfiguration::default()));
    }

    #[test]
    fn test_absolute_padding() {
        let mapping = StreamConfiguration {
            frame_padding_absolute: Some(50.0),
            ..StreamConfiguration::default()
        };

        let inside = notification_with_crop(crop(100.0, 100.0, 400.0, 400.0));
        assert!(validate(&inside, &mapping));

        // Left edge reaches into the 50px border
        let clipped = notification_with_crop(crop(20.0, 100.0, 400.0, 400.0));
        assert!(!validate(&clipped, &mapping));

        // Bottom edge past 1080 - 50
        let truncated = notification_with_crop(crop(100.0, 100.0, 400.0, 1050.0));
        assert!(!validate(&truncated, &mapping));
    }

    #[test]
    fn test_relative_padding_scales_with_frame() {
        let mapping = StreamConfiguration {
            frame_padding_relative: Some(0.1),
            ..StreamConfiguration::default()
        };

        // Horizontal border is 192px, vertical 108px
        let inside = notification_with_crop(crop(200.0, 120.0, 1700.0, 950.0));
        assert!(validate(&inside, &mapping));

        let clipped = notification_with_crop(crop(150.0, 120.0, 1700.0, 950.0));
        assert!(!validate(&clipped, &mapping));
    }

    #[test]
    fn test_relative_wins_over_absolute() {
        let mapping = StreamConfiguration {
            frame_padding_absolute: Some(500.0),
            frame_padding_relative: Some(0.01),
            ..StreamConfiguration::default()
        };

        // Passes the 1% border, would fail the 500px one
        let n = notification_with_crop(crop(100.0, 100.0, 400.0, 400.0));
        assert!(validate(&n, &mapping));
    }

    #[test]
    fn test_corner_exactly_on_padded_edge_passes() {
        let mapping = StreamConfiguration {
            frame_padding_absolute: Some(50.0),
            ..StreamConfiguration::default()
        };
        let n = notification_with_crop(crop(50.0, 50.0, 1870.0, 1030.0));
        assert!(validate(&n, &mapping));
    }

    #[test]
    fn test_missing_geometry_data_passes() {
        let mapping = StreamConfiguration {
            frame_padding_absolute: Some(50.0),
            ..StreamConfiguration::default()
        };
        let n = Notification::new("s", "t");
        assert!(validate(&n, &mapping));
    }
}
