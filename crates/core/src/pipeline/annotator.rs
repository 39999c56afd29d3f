//! On-frame overlay: per-slot boxes and status labels.
//!
//! Rendering is deliberately primitive (filled-pixel borders, a built-in
//! 5x7 bitmap font) so the core stays free of windowing dependencies.
//! The annotated frame is what the engine publishes; consumers display
//! or encode it as they see fit.

use crate::shared::constants::DETECT_SCALE;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::tracking::slot::{SlotState, TrackSlot};

type Color = [u8; 3];

const GREEN: Color = [0, 255, 0];
const YELLOW: Color = [255, 255, 0];
const DIM_RED: Color = [140, 0, 0];

/// Text scale factor applied to the 5x7 glyphs.
const TEXT_SCALE: usize = 2;

pub struct Annotator {
    /// Slot rects live in detection resolution; multiply back up.
    rect_scale: i32,
}

impl Annotator {
    pub fn new(rect_scale: i32) -> Self {
        Self { rect_scale }
    }

    /// Draw all non-idle slots onto `frame` (RGB, capture resolution).
    pub fn annotate(&self, frame: &mut Frame, slots: &[TrackSlot]) {
        for slot in slots {
            if !slot.active || slot.state == SlotState::Idle {
                continue;
            }
            let Some(rect) = slot.rect else {
                continue;
            };
            let rect = rect.scaled(self.rect_scale);

            let (color, thickness) = match slot.state {
                SlotState::Confirmed => (GREEN, 2),
                SlotState::Searching => (YELLOW, 2),
                SlotState::Lost => (DIM_RED, 1),
                SlotState::Idle => unreachable!(),
            };

            draw_border(frame, &rect, color, thickness);

            let label = if slot.state == SlotState::Lost {
                format!("S{} LOST...", slot.id)
            } else {
                format!(
                    "S{} {} {:.1}",
                    slot.id,
                    slot.name.as_deref().unwrap_or("UNKNOWN"),
                    slot.confidence()
                )
            };
            let text_y = rect.top - (7 * TEXT_SCALE as i32) - 4;
            draw_text(frame, rect.left, text_y.max(0), &label, color);
        }
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(DETECT_SCALE)
    }
}

fn put_pixel(frame: &mut Frame, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 || x >= frame.width() as i32 || y >= frame.height() as i32 {
        return;
    }
    let c = frame.channels() as usize;
    let offset = (y as usize * frame.width() as usize + x as usize) * c;
    let data = frame.data_mut();
    data[offset] = color[0];
    data[offset + 1] = color[1];
    data[offset + 2] = color[2];
}

fn draw_border(frame: &mut Frame, rect: &Rect, color: Color, thickness: i32) {
    for t in 0..thickness {
        for x in rect.left..=rect.right {
            put_pixel(frame, x, rect.top + t, color);
            put_pixel(frame, x, rect.bottom - t, color);
        }
        for y in rect.top..=rect.bottom {
            put_pixel(frame, rect.left + t, y, color);
            put_pixel(frame, rect.right - t, y, color);
        }
    }
}

fn draw_text(frame: &mut Frame, x: i32, y: i32, text: &str, color: Color) {
    let mut cursor = x;
    for ch in text.chars() {
        if let Some(rows) = glyph(ch) {
            for (gy, row) in rows.iter().enumerate() {
                for gx in 0..5 {
                    if row & (0b10000 >> gx) != 0 {
                        for sy in 0..TEXT_SCALE {
                            for sx in 0..TEXT_SCALE {
                                put_pixel(
                                    frame,
                                    cursor + (gx * TEXT_SCALE + sx) as i32,
                                    y + (gy * TEXT_SCALE + sy) as i32,
                                    color,
                                );
                            }
                        }
                    }
                }
            }
        }
        cursor += (6 * TEXT_SCALE) as i32;
    }
}

/// 5x7 glyph rows, MSB-left in the low 5 bits. Covers what labels can
/// contain: uppercase letters, digits, dot, dash, space.
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        _ => return None,
    };
    Some(rows)
}
