use std::io::Cursor;

use anyhow::Context;
use image::{ImageFormat, Rgb, RgbImage};

use crate::vision::engine::Face;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LANDMARK_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const BOX_THICKNESS: i64 = 2;
const LANDMARK_RADIUS: i64 = 2;

/// Decode an uploaded image, draw detection overlays, re-encode as JPEG.
pub fn render_jpeg(image_bytes: &[u8], faces: &[Face]) -> anyhow::Result<Vec<u8>> {
    let mut img = image::load_from_memory(image_bytes)
        .context("decode image")?
        .to_rgb8();
    draw_overlays(&mut img, faces);
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .context("encode jpeg")?;
    Ok(out.into_inner())
}

/// Green box around each face, blue disc on each landmark. Relative bbox
/// coordinates scale against the full image; landmark coordinates scale
/// against their face box. Geometry outside the frame is clipped.
pub fn draw_overlays(img: &mut RgbImage, faces: &[Face]) {
    let (iw, ih) = img.dimensions();
    for face in faces {
        let x = (face.bbox.x * iw as f32) as i64;
        let y = (face.bbox.y * ih as f32) as i64;
        let w = (face.bbox.width * iw as f32) as i64;
        let h = (face.bbox.height * ih as f32) as i64;
        draw_rect(img, x, y, w, h);
        for lm in &face.landmarks {
            let cx = x + (lm.x * w as f32) as i64;
            let cy = y + (lm.y * h as f32) as i64;
            draw_disc(img, cx, cy, LANDMARK_RADIUS, LANDMARK_COLOR);
        }
    }
}

fn put_pixel_clipped(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn draw_rect(img: &mut RgbImage, x: i64, y: i64, w: i64, h: i64) {
    for t in 0..BOX_THICKNESS {
        for px in x..x + w {
            put_pixel_clipped(img, px, y + t, BOX_COLOR);
            put_pixel_clipped(img, px, y + h - 1 - t, BOX_COLOR);
        }
        for py in y..y + h {
            put_pixel_clipped(img, x + t, py, BOX_COLOR);
            put_pixel_clipped(img, x + w - 1 - t, py, BOX_COLOR);
        }
    }
}

fn draw_disc(img: &mut RgbImage, cx: i64, cy: i64, r: i64, color: Rgb<u8>) {
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                put_pixel_clipped(img, cx + dx, cy + dy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::engine::{BoundingBox, Landmark};

    fn face(x: f32, y: f32, w: f32, h: f32, landmarks: Vec<Landmark>) -> Face {
        Face {
            bbox: BoundingBox {
                x,
                y,
                width: w,
                height: h,
            },
            landmarks,
        }
    }

    #[test]
    fn draws_box_edges_and_leaves_interior_untouched() {
        let mut img = RgbImage::new(100, 100);
        draw_overlays(&mut img, &[face(0.1, 0.1, 0.5, 0.5, vec![])]);

        // bbox pixels: x 10..60, y 10..60
        assert_eq!(*img.get_pixel(10, 10), BOX_COLOR);
        assert_eq!(*img.get_pixel(30, 11), BOX_COLOR); // second row of thickness
        assert_eq!(*img.get_pixel(59, 30), BOX_COLOR); // right edge
        assert_eq!(*img.get_pixel(30, 59), BOX_COLOR); // bottom edge
        assert_eq!(*img.get_pixel(30, 30), Rgb([0, 0, 0])); // interior
        assert_eq!(*img.get_pixel(5, 5), Rgb([0, 0, 0])); // outside
    }

    #[test]
    fn draws_landmark_disc_relative_to_face_box() {
        let mut img = RgbImage::new(100, 100);
        let lm = Landmark { x: 0.5, y: 0.5 };
        draw_overlays(&mut img, &[face(0.1, 0.1, 0.5, 0.5, vec![lm])]);

        // landmark center: 10 + 0.5 * 50 = 35 on both axes
        assert_eq!(*img.get_pixel(35, 35), LANDMARK_COLOR);
        assert_eq!(*img.get_pixel(37, 35), LANDMARK_COLOR); // radius 2
        assert_eq!(*img.get_pixel(40, 35), Rgb([0, 0, 0]));
    }

    #[test]
    fn clips_geometry_outside_the_frame() {
        let mut img = RgbImage::new(32, 32);
        // Box hangs off the bottom-right corner; must not panic.
        draw_overlays(
            &mut img,
            &[face(0.9, 0.9, 0.5, 0.5, vec![Landmark { x: 1.0, y: 1.0 }])],
        );
        // And one hanging off the top-left.
        draw_overlays(&mut img, &[face(-0.2, -0.2, 0.3, 0.3, vec![])]);
    }

    #[test]
    fn render_jpeg_roundtrip() {
        let img = RgbImage::from_pixel(64, 64, Rgb([120, 120, 120]));
        let mut png = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();

        let out = render_jpeg(png.get_ref(), &[face(0.25, 0.25, 0.5, 0.5, vec![])]).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 64);

        // JPEG is lossy; the box edge should still read as clearly green.
        let rgb = decoded.to_rgb8();
        let px = rgb.get_pixel(20, 16);
        let (r, g, b) = (px[0] as i32, px[1] as i32, px[2] as i32);
        assert!(g > r + 50 && g > b + 50);
    }

    #[test]
    fn render_jpeg_rejects_garbage_bytes() {
        assert!(render_jpeg(b"definitely not an image", &[]).is_err());
    }
}
