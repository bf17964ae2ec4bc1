//! Frame preprocessing: rotation correction and centered square crop.
//!
//! Classifiers consume a fixed-size square input, so each accepted frame is
//! first rotated upright (per the camera's reported correction) and then
//! cropped to the target dimension around the image center.
//!
//! The transform is deterministic and never reads outside the source buffer.
//! A source smaller than the target on either axis is letterboxed: the
//! rotated image is centered inside the target and the border is left black.
//! There is no upscaling. Centering offsets round toward the top-left.

use anyhow::{anyhow, Result};

use crate::frame::{CameraFrame, Rotation};

/// Contract crop dimension fed to the classifier.
pub const DEFAULT_CROP_SIZE: u32 = 321;

/// A fixed-size, rotation-corrected square RGB24 image.
///
/// Owned by the pipeline invocation that created it and discarded after the
/// classify call returns. The buffer is always `size * size * 3` bytes.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pixels: Vec<u8>,
    size: u32,
}

impl PreparedImage {
    /// Build a prepared image from an existing square RGB24 buffer.
    pub fn from_rgb(pixels: Vec<u8>, size: u32) -> Result<Self> {
        let expected = (size as usize)
            .checked_mul(size as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("prepared image dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "prepared image length mismatch: expected {} RGB bytes for {}x{}, got {}",
                expected,
                size,
                size,
                pixels.len()
            ));
        }
        Ok(Self { pixels, size })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

/// Derive the classifier input from a raw frame.
///
/// Steps: validate the buffer against the declared dimensions, apply the
/// clockwise rotation correction, crop to `target` around the center. A
/// length/dimension mismatch is a malformed frame and fails without touching
/// the pixels.
pub fn prepare_frame(frame: &CameraFrame, target: u32) -> Result<PreparedImage> {
    if target == 0 {
        return Err(anyhow!("crop target must be > 0"));
    }

    let expected = (frame.width as usize)
        .checked_mul(frame.height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
    let pixels = frame.pixels();
    if pixels.len() != expected {
        return Err(anyhow!(
            "malformed frame: expected {} RGB bytes for {}x{}, got {}",
            expected,
            frame.width,
            frame.height,
            pixels.len()
        ));
    }

    let cropped = match frame.rotation {
        Rotation::Deg0 => center_crop_rgb(pixels, frame.width, frame.height, target),
        rotation => {
            let (rotated, w, h) = rotate_rgb(pixels, frame.width, frame.height, rotation);
            center_crop_rgb(&rotated, w, h, target)
        }
    };

    Ok(PreparedImage {
        pixels: cropped,
        size: target,
    })
}

/// Rotate an RGB24 buffer clockwise. Quarter turns swap the output axes.
fn rotate_rgb(pixels: &[u8], width: u32, height: u32, rotation: Rotation) -> (Vec<u8>, u32, u32) {
    let w = width as usize;
    let h = height as usize;
    let (out_w, out_h) = if rotation.swaps_axes() { (h, w) } else { (w, h) };

    let mut out = vec![0u8; pixels.len()];
    for dy in 0..out_h {
        for dx in 0..out_w {
            // Gather: map each destination pixel back to its source.
            let (sx, sy) = match rotation {
                Rotation::Deg0 => (dx, dy),
                Rotation::Deg90 => (dy, h - 1 - dx),
                Rotation::Deg180 => (w - 1 - dx, h - 1 - dy),
                Rotation::Deg270 => (w - 1 - dy, dx),
            };
            let src = (sy * w + sx) * 3;
            let dst = (dy * out_w + dx) * 3;
            out[dst..dst + 3].copy_from_slice(&pixels[src..src + 3]);
        }
    }
    (out, out_w as u32, out_h as u32)
}

/// Centered crop into a black `target`x`target` canvas.
///
/// Axes larger than the target are cropped around their middle; axes smaller
/// than the target are centered and padded. The copy window is clamped to
/// both buffers, so the function cannot index out of bounds.
fn center_crop_rgb(pixels: &[u8], width: u32, height: u32, target: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let t = target as usize;
    let mut out = vec![0u8; t * t * 3];

    let copy_w = w.min(t);
    let copy_h = h.min(t);
    let src_x0 = (w - copy_w) / 2;
    let src_y0 = (h - copy_h) / 2;
    let dst_x0 = (t - copy_w) / 2;
    let dst_y0 = (t - copy_h) / 2;

    for row in 0..copy_h {
        let src_start = ((src_y0 + row) * w + src_x0) * 3;
        let dst_start = ((dst_y0 + row) * t + dst_x0) * 3;
        out[dst_start..dst_start + copy_w * 3]
            .copy_from_slice(&pixels[src_start..src_start + copy_w * 3]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Expand per-pixel gray values into an RGB24 buffer.
    fn gray_rgb(values: &[u8]) -> Vec<u8> {
        values.iter().flat_map(|v| [*v, *v, *v]).collect()
    }

    /// Collapse an RGB24 buffer of gray pixels back to per-pixel values.
    fn gray_values(rgb: &[u8]) -> Vec<u8> {
        rgb.chunks_exact(3).map(|px| px[0]).collect()
    }

    #[test]
    fn crop_takes_the_centered_window() {
        // 4x4 source, pixel value = row * 4 + col.
        let src = gray_rgb(&(0..16).collect::<Vec<u8>>());
        let out = center_crop_rgb(&src, 4, 4, 2);
        assert_eq!(gray_values(&out), vec![5, 6, 9, 10]);
    }

    #[test]
    fn crop_to_single_center_pixel() {
        let src = gray_rgb(&(0..9).collect::<Vec<u8>>());
        let out = center_crop_rgb(&src, 3, 3, 1);
        assert_eq!(gray_values(&out), vec![4]);
    }

    #[test]
    fn small_source_is_letterboxed_in_black() {
        let src = vec![7u8, 8, 9];
        let out = center_crop_rgb(&src, 1, 1, 3);
        assert_eq!(out.len(), 3 * 3 * 3);
        assert_eq!(&out[12..15], &[7, 8, 9]);
        let black: usize = out
            .iter()
            .enumerate()
            .filter(|(i, _)| !(12..15).contains(i))
            .map(|(_, v)| *v as usize)
            .sum();
        assert_eq!(black, 0);
    }

    #[test]
    fn wide_short_source_crops_x_and_pads_y() {
        // 5x2 source, value = row * 5 + col; target 3.
        let src = gray_rgb(&(0..10).collect::<Vec<u8>>());
        let out = center_crop_rgb(&src, 5, 2, 3);
        // x window starts at column 1; rows land at the top (offset rounds down).
        assert_eq!(gray_values(&out), vec![1, 2, 3, 6, 7, 8, 0, 0, 0]);
    }

    #[test]
    fn rotate_90_clockwise() {
        // 2x3 source:
        //   1 2
        //   3 4
        //   5 6
        let src = gray_rgb(&[1, 2, 3, 4, 5, 6]);
        let (out, w, h) = rotate_rgb(&src, 2, 3, Rotation::Deg90);
        assert_eq!((w, h), (3, 2));
        // Left column becomes the top row:
        //   5 3 1
        //   6 4 2
        assert_eq!(gray_values(&out), vec![5, 3, 1, 6, 4, 2]);
    }

    #[test]
    fn rotate_180() {
        let src = gray_rgb(&[1, 2, 3, 4]);
        let (out, w, h) = rotate_rgb(&src, 2, 2, Rotation::Deg180);
        assert_eq!((w, h), (2, 2));
        assert_eq!(gray_values(&out), vec![4, 3, 2, 1]);
    }

    #[test]
    fn rotate_270_clockwise() {
        let src = gray_rgb(&[1, 2, 3, 4, 5, 6]);
        let (out, w, h) = rotate_rgb(&src, 2, 3, Rotation::Deg270);
        assert_eq!((w, h), (3, 2));
        //   2 4 6
        //   1 3 5
        assert_eq!(gray_values(&out), vec![2, 4, 6, 1, 3, 5]);
    }

    #[test]
    fn prepare_is_identity_when_shapes_match() -> Result<()> {
        let values: Vec<u8> = (0..9).collect();
        let frame = CameraFrame::new(gray_rgb(&values), 3, 3, Rotation::Deg0);
        let prepared = prepare_frame(&frame, 3)?;
        assert_eq!(prepared.size(), 3);
        assert_eq!(gray_values(prepared.pixels()), values);
        Ok(())
    }

    #[test]
    fn prepare_rotates_then_crops() -> Result<()> {
        // 2x3 source rotated 90 becomes 3x2; target 4 letterboxes it.
        let frame = CameraFrame::new(gray_rgb(&[1, 2, 3, 4, 5, 6]), 2, 3, Rotation::Deg90);
        let prepared = prepare_frame(&frame, 4)?;
        assert_eq!(prepared.pixels().len(), 4 * 4 * 3);
        let vals = gray_values(prepared.pixels());
        // Rotated rows [5,3,1] and [6,4,2] land at rows 1 and 2, column 0.
        assert_eq!(&vals[4..7], &[5, 3, 1]);
        assert_eq!(&vals[8..11], &[6, 4, 2]);
        Ok(())
    }

    #[test]
    fn output_is_target_sized_even_for_tiny_sources() -> Result<()> {
        let frame = CameraFrame::new(vec![9, 9, 9], 1, 1, Rotation::Deg180);
        let prepared = prepare_frame(&frame, 321)?;
        assert_eq!(prepared.size(), 321);
        assert_eq!(prepared.pixels().len(), 321 * 321 * 3);
        Ok(())
    }

    #[test]
    fn malformed_buffer_is_rejected() {
        let frame = CameraFrame::new(vec![0u8; 10], 2, 2, Rotation::Deg0);
        let err = prepare_frame(&frame, 2).unwrap_err();
        assert!(err.to_string().contains("malformed frame"));
    }

    #[test]
    fn zero_target_is_rejected() {
        let frame = CameraFrame::new(vec![0u8; 12], 2, 2, Rotation::Deg0);
        assert!(prepare_frame(&frame, 0).is_err());
    }

    #[test]
    fn prepared_image_from_rgb_validates_length() {
        assert!(PreparedImage::from_rgb(vec![0u8; 12], 2).is_ok());
        assert!(PreparedImage::from_rgb(vec![0u8; 11], 2).is_err());
    }
}
