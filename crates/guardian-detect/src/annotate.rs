//! Bounding-box rendering for the response's result image.

use guardian_core::models::Detection;
use image::{DynamicImage, ImageFormat, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::error::DetectError;

const BOX_COLOR: Rgb<u8> = Rgb([255, 56, 56]);
const BOX_THICKNESS: i64 = 2;

/// Draw every detection onto a copy of the source image and encode it as
/// PNG. Failures here degrade the response (no result image); they never
/// fail the request.
pub(crate) fn render(image: &DynamicImage, detections: &[Detection]) -> Result<Vec<u8>, DetectError> {
    let mut canvas = image.to_rgb8();

    for det in detections {
        let [x1, y1, x2, y2] = det.bbox;
        for inset in 0..BOX_THICKNESS {
            let width = x2 - x1 - 2 * inset;
            let height = y2 - y1 - 2 * inset;
            if width < 1 || height < 1 {
                break;
            }
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at((x1 + inset) as i32, (y1 + inset) as i32)
                    .of_size(width as u32, height as u32),
                BOX_COLOR,
            );
        }
    }

    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| DetectError::Annotation(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::new(width, height))
    }

    #[test]
    fn test_render_produces_png() {
        let detections = vec![Detection {
            label: "person".into(),
            confidence: 0.9,
            bbox: [2, 2, 20, 18],
        }];
        let png = render(&blank_image(32, 32), &detections).expect("render");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_render_marks_box_pixels() {
        let detections = vec![Detection {
            label: "person".into(),
            confidence: 0.9,
            bbox: [4, 4, 12, 12],
        }];
        let png = render(&blank_image(16, 16), &detections).expect("render");
        let rendered = image::load_from_memory(&png).expect("decode").to_rgb8();
        assert_eq!(rendered.get_pixel(4, 4), &BOX_COLOR);
        // Interior stays untouched.
        assert_eq!(rendered.get_pixel(8, 8), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_render_skips_degenerate_boxes() {
        let detections = vec![Detection {
            label: "person".into(),
            confidence: 0.9,
            bbox: [5, 5, 5, 5],
        }];
        let png = render(&blank_image(16, 16), &detections).expect("render");
        let rendered = image::load_from_memory(&png).expect("decode").to_rgb8();
        assert!(rendered.pixels().all(|p| p == &Rgb([0, 0, 0])));
    }

    #[test]
    fn test_render_empty_detections_is_clean_copy() {
        let png = render(&blank_image(8, 8), &[]).expect("render");
        let rendered = image::load_from_memory(&png).expect("decode").to_rgb8();
        assert_eq!(rendered.dimensions(), (8, 8));
    }
}
