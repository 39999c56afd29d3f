use ndarray::{ArrayView3, ArrayViewMut3};

/// A single video frame: contiguous 3-channel bytes in row-major order.
///
/// Channel order is a boundary concern: capture adapters yield BGR,
/// detection and recognition consume RGB. The conversion happens via
/// [`Frame::swapped_channels`] at those boundaries; in between, pixel
/// data is treated as opaque.
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
            "frame byte length does not match dimensions"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
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

    /// Half-resolution copy via 2x2 box subsampling.
    ///
    /// The detector runs on this smaller frame; slot rects therefore
    /// live in half-resolution coordinates.
    pub fn half_scale(&self) -> Frame {
        let w = (self.width / 2).max(1) as usize;
        let h = (self.height / 2).max(1) as usize;
        let c = self.channels as usize;
        let src_w = self.width as usize;

        let mut out = vec![0u8; w * h * c];
        for y in 0..h {
            for x in 0..w {
                for ch in 0..c {
                    let mut sum = 0u32;
                    for dy in 0..2 {
                        for dx in 0..2 {
                            let sy = (y * 2 + dy).min(self.height as usize - 1);
                            let sx = (x * 2 + dx).min(src_w - 1);
                            sum += self.data[(sy * src_w + sx) * c + ch] as u32;
                        }
                    }
                    out[(y * w + x) * c + ch] = (sum / 4) as u8;
                }
            }
        }
        Frame::new(out, w as u32, h as u32, self.channels, self.index)
    }

    /// Copy with channels 0 and 2 exchanged (BGR <-> RGB).
    pub fn swapped_channels(&self) -> Frame {
        let mut data = self.data.clone();
        if self.channels == 3 {
            for px in data.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
        }
        Frame::new(data, self.width, self.height, self.channels, self.index)
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("buffer length was checked at construction")
    }

    /// Mutable counterpart of [`Frame::as_ndarray`], for consumers that
    /// edit pixels through shaped indexing rather than raw byte offsets.
    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("buffer length was checked at construction")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
