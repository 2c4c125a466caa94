use ndarray::ArrayView3;

use crate::shared::image_orientation::ImageOrientation;

/// A single still image or camera frame: contiguous RGB bytes in row-major
/// order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// A solid-color RGB frame.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], index: usize) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgb);
        }
        Self::new(data, width, height, 3, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Returns the frame turned upright according to `orientation`.
    ///
    /// `Up` is a plain copy. Rotating variants swap width and height.
    pub fn oriented(&self, orientation: ImageOrientation) -> Frame {
        if orientation == ImageOrientation::Up {
            return self.clone();
        }

        let w = self.width as usize;
        let h = self.height as usize;
        let c = self.channels as usize;
        let (out_w, out_h) = orientation.oriented_size(self.width, self.height);

        let mut data = Vec::with_capacity(self.data.len());
        for y in 0..out_h as usize {
            for x in 0..out_w as usize {
                let (sx, sy) = orientation.source_pixel(x, y, w, h);
                let start = (sy * w + sx) * c;
                data.extend_from_slice(&self.data[start..start + c]);
            }
        }

        Frame::new(data, out_w, out_h, self.channels, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
