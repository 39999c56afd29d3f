use std::path::Path;

use crate::pipeline::frame_source::FrameSource;
use crate::shared::frame::Frame;

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Each decoded frame is converted to BGR24 and handed out one at a
/// time through [`FrameSource::next_frame`]. BGR matches what camera
/// capture layers conventionally deliver; the engine swaps channels at
/// its own boundaries.
pub struct FfmpegFrameSource {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    width: u32,
    height: u32,
    fps: f64,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

// Safety: FfmpegFrameSource is only used from a single thread at a
// time. The raw pointers inside ffmpeg types are not shared across
// threads.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    pub fn open(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let video_stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::BGR24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            ictx,
            decoder,
            scaler,
            video_stream_index,
            width,
            height,
            fps,
            frame_index: 0,
            flushing: false,
            done: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut bgr_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut bgr_frame)?;

        let pixels = strip_row_padding(&bgr_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }

    /// Pushes demuxed packets into the decoder until one is accepted.
    /// On container EOF, switches the decoder into flush mode instead.
    fn feed_decoder(&mut self) {
        loop {
            match self.ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.video_stream_index {
                        continue;
                    }
                    // A rejected packet (corrupt data) is skipped, not fatal
                    if self.decoder.send_packet(&packet).is_ok() {
                        return;
                    }
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                    return;
                }
            }
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        loop {
            if self.done {
                return Ok(None);
            }

            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }

            // Decoder is starved. If we already flushed, the stream is
            // exhausted for good; otherwise feed it more packets and retry.
            if self.flushing {
                self.done = true;
                return Ok(None);
            }
            self.feed_decoder();
        }
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row
/// (stride > width*3); this strips them to a tightly-packed layout.
fn strip_row_padding(
    bgr_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = bgr_frame.stride(0);
    let row_bytes = width as usize * 3;

    bgr_frame
        .data(0)
        .chunks(stride)
        .take(height as usize)
        .flat_map(|row| row[..row_bytes].iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const TEST_FPS: i32 = 25;

    /// Builds one RGB24 source frame filled with a solid color.
    fn solid_rgb_frame(width: u32, height: u32, rgb: [u8; 3]) -> ffmpeg_next::util::frame::video::Video {
        let mut frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
        );
        let stride = frame.stride(0);
        let row_bytes = width as usize * 3;
        for row in frame.data_mut(0).chunks_mut(stride).take(height as usize) {
            for px in row[..row_bytes].chunks_mut(3) {
                px.copy_from_slice(&rgb);
            }
        }
        frame
    }

    /// Writes out every packet the encoder currently has ready.
    fn drain_encoder(
        encoder: &mut ffmpeg_next::encoder::Video,
        octx: &mut ffmpeg_next::format::context::Output,
    ) {
        let ost_time_base = octx.stream(0).unwrap().time_base();
        let mut packet = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(0);
            packet.rescale_ts(ffmpeg_next::Rational(1, TEST_FPS), ost_time_base);
            packet.write_interleaved(octx).unwrap();
        }
    }

    /// Encodes a short MPEG4 clip of solid-color frames.
    fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32, rgb: [u8; 3]) {
        ffmpeg_next::init().unwrap();

        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, TEST_FPS));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(TEST_FPS, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .unwrap();

        let rgb_frame = solid_rgb_frame(width, height, rgb);
        for i in 0..num_frames {
            let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
            scaler.run(&rgb_frame, &mut yuv_frame).unwrap();
            yuv_frame.set_pts(Some(i as i64));

            encoder.send_frame(&yuv_frame).unwrap();
            drain_encoder(&mut encoder, &mut octx);
        }

        encoder.send_eof().unwrap();
        drain_encoder(&mut encoder, &mut octx);
        octx.write_trailer().unwrap();
    }

    fn test_video_path(dir: &Path) -> PathBuf {
        dir.join("test.mp4")
    }

    #[test]
    fn test_open_reports_dimensions_and_fps() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video_path(dir.path());
        create_test_video(&path, 5, 160, 120, [128, 128, 128]);

        let source = FfmpegFrameSource::open(&path).unwrap();
        assert_eq!(source.width(), 160);
        assert_eq!(source.height(), 120);
        assert!(source.fps() > 0.0);
    }

    #[test]
    fn test_open_nonexistent_fails() {
        assert!(FfmpegFrameSource::open(Path::new("/nonexistent/test.mp4")).is_err());
    }

    #[test]
    fn test_next_frame_yields_all_then_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video_path(dir.path());
        create_test_video(&path, 5, 160, 120, [128, 128, 128]);

        let mut source = FfmpegFrameSource::open(&path).unwrap();
        let mut count = 0;
        while let Some(frame) = source.next_frame().unwrap() {
            assert_eq!(frame.index(), count);
            assert_eq!(frame.channels(), 3);
            assert_eq!(frame.data().len(), 160 * 120 * 3);
            count += 1;
        }
        assert_eq!(count, 5);

        // Exhausted source keeps returning None
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_frames_are_bgr_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video_path(dir.path());
        // Solid red in RGB: in BGR output, channel 2 carries the red
        create_test_video(&path, 2, 160, 120, [200, 0, 0]);

        let mut source = FfmpegFrameSource::open(&path).unwrap();
        let frame = source.next_frame().unwrap().unwrap();

        // Sample the center pixel, away from any codec edge artifacts
        let offset = (60 * 160 + 80) * 3;
        let b = frame.data()[offset];
        let r = frame.data()[offset + 2];
        assert!(
            r > b + 50,
            "expected red-dominant BGR pixel, got b={b} r={r}"
        );
    }
}
