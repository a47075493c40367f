//! Video frame types and still-image snapshots

use crate::CaptureError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::RgbImage;
use std::io::Cursor;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Solid-color frame, used by synthetic sources
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], sequence: u32) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Self::new(data, width, height, 0, sequence)
    }

    /// Encode the frame as a JPEG still image
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, CaptureError> {
        let img = RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| {
                CaptureError::Snapshot("frame buffer does not match dimensions".into())
            })?;

        let mut out = Vec::new();
        {
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut out), quality);
            encoder
                .encode_image(&img)
                .map_err(|e| CaptureError::Snapshot(e.to_string()))?;
        }
        Ok(out)
    }

    /// JPEG snapshot encoded as base64, the shape the backend accepts
    pub fn snapshot_base64(&self, quality: u8) -> Result<String, CaptureError> {
        Ok(STANDARD.encode(self.to_jpeg(quality)?))
    }
}
