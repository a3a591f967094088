//! Pixel frame preprocessing.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A raw RGB observation: interleaved channel bytes, row major.
#[derive(Clone, Debug)]
pub struct PixelFrame {
    data: Vec<u8>,
    height: usize,
    width: usize,
}

impl PixelFrame {
    /// Wraps raw RGB bytes of a `height x width` image.
    ///
    /// # Panics
    ///
    /// Panics if the byte length is not `height * width * 3`.
    pub fn new(data: Vec<u8>, height: usize, width: usize) -> Self {
        assert_eq!(data.len(), height * width * 3);
        Self {
            data,
            height,
            width,
        }
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The raw bytes, interleaved RGB, row major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Errors of frame preprocessing.
#[derive(Error, Debug)]
pub enum FrameError {
    /// The observation is smaller than the crop in one of its spatial
    /// dimensions.
    #[error("frame of {height}x{width} pixels is smaller than the {crop}x{crop} crop")]
    FrameTooSmall {
        /// Height of the offending frame.
        height: usize,
        /// Width of the offending frame.
        width: usize,
        /// Requested crop size.
        crop: usize,
    },
}

/// Turns raw pixel frames into the flat feature vectors the Q-network
/// consumes.
///
/// The filter takes the top-left `width x width` crop of the frame, keeps
/// all three channels, flattens the crop row major and scales the byte
/// values to `[0, 1]`. The output length is fixed at `width * width * 3`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PixelFrameFilter {
    width: usize,
}

impl PixelFrameFilter {
    /// Constructs a filter cropping to `width x width` pixels.
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    /// Length of the filtered feature vector, `width * width * 3`.
    pub fn frame_dim(&self) -> usize {
        self.width * self.width * 3
    }

    /// Filters one frame.
    ///
    /// # Errors
    ///
    /// Fails with [`FrameError::FrameTooSmall`] if the frame is smaller than
    /// the crop in either spatial dimension.
    pub fn filter(&self, frame: &PixelFrame) -> Result<Vec<f32>, FrameError> {
        if frame.height() < self.width || frame.width() < self.width {
            return Err(FrameError::FrameTooSmall {
                height: frame.height(),
                width: frame.width(),
                crop: self.width,
            });
        }

        let mut out = Vec::with_capacity(self.frame_dim());
        for y in 0..self.width {
            let row = &frame.data()[y * frame.width() * 3..][..self.width * 3];
            out.extend(row.iter().map(|v| *v as f32 / 255.0));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crops_top_left_and_scales() {
        // A 3x4 image whose byte value encodes (row, column, channel).
        let mut data = Vec::new();
        for y in 0..3u8 {
            for x in 0..4u8 {
                for c in 0..3u8 {
                    data.push(y * 100 + x * 10 + c);
                }
            }
        }
        let frame = PixelFrame::new(data, 3, 4);

        let filter = PixelFrameFilter::new(2);
        let out = filter.filter(&frame).unwrap();

        assert_eq!(out.len(), 2 * 2 * 3);
        let expected: Vec<f32> = [
            0u8, 1, 2, // (0, 0)
            10, 11, 12, // (0, 1)
            100, 101, 102, // (1, 0)
            110, 111, 112, // (1, 1)
        ]
        .iter()
        .map(|v| *v as f32 / 255.0)
        .collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn values_are_scaled_to_unit_interval() {
        let frame = PixelFrame::new(vec![255; 2 * 2 * 3], 2, 2);
        let out = PixelFrameFilter::new(2).filter(&frame).unwrap();
        assert!(out.iter().all(|v| *v == 1.0));
    }

    #[test]
    fn undersized_frame_is_rejected() {
        let frame = PixelFrame::new(vec![0; 2 * 5 * 3], 2, 5);
        let err = PixelFrameFilter::new(3).filter(&frame).unwrap_err();
        let FrameError::FrameTooSmall {
            height,
            width,
            crop,
        } = err;
        assert_eq!((height, width, crop), (2, 5, 3));
    }
}
