use byteorder::{BigEndian, ByteOrder, LittleEndian};
use enum_dispatch::enum_dispatch;
use once_cell::sync::Lazy;
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use std::collections::TryReserveError;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub enum PixelFormat {
    Xrgb8888,
    Rgb565,
}

impl PixelFormat {
    /// Maps the raw discriminant negotiated over the core's environment
    /// callback. 0 (0RGB1555) and everything else is rejected.
    pub fn from_raw(raw: u32) -> Result<PixelFormat, FrameError> {
        match raw {
            1 => Ok(PixelFormat::Xrgb8888),
            2 => Ok(PixelFormat::Rgb565),
            _ => {
                warn!("unsupported pixel format {}", raw);
                Err(FrameError::UnsupportedFormat(raw))
            }
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Xrgb8888 => 4,
            PixelFormat::Rgb565 => 2,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub fn native() -> Endianness {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("frame buffer data was null")]
    NullFrameData,
    #[error("unsupported pixel format {0}")]
    UnsupportedFormat(u32),
    #[error("pitch of {pitch} bytes can't hold {width} pixels of {bytes_per_pixel} bytes")]
    PitchTooSmall {
        pitch: usize,
        width: u32,
        bytes_per_pixel: usize,
    },
    #[error("frame buffer holds {actual} bytes but the geometry needs {expected}")]
    FrameTooSmall { expected: usize, actual: usize },
    #[error("failed to allocate output buffer")]
    Allocation(#[from] TryReserveError),
}

/// A tightly packed frame, 4 bytes per pixel in `[R, G, B, A]` order
/// regardless of the source encoding or host byte order.
#[derive(Clone, Deserialize, Serialize)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

impl RgbaFrame {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }
}

pub struct FrameConverter {
    endianness: Endianness,
}

impl Default for FrameConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameConverter {
    pub fn new() -> FrameConverter {
        FrameConverter {
            endianness: Endianness::native(),
        }
    }

    pub fn with_endianness(endianness: Endianness) -> FrameConverter {
        FrameConverter { endianness }
    }

    /// Repacks one core frame into an owned [`RgbaFrame`].
    ///
    /// `frame_data` is row-major with rows `pitch` bytes apart; padding
    /// bytes past `width` pixels are skipped. `None` (a duped frame) is a
    /// reported failure with nothing allocated.
    pub fn convert(
        &self,
        frame_data: Option<&[u8]>,
        width: u32,
        height: u32,
        pitch: usize,
        format: PixelFormat,
    ) -> Result<RgbaFrame, FrameError> {
        let data = frame_data.ok_or(FrameError::NullFrameData)?;

        let width_px = width as usize;
        let height_px = height as usize;
        let bytes_per_pixel = format.bytes_per_pixel();

        if pitch < width_px * bytes_per_pixel {
            return Err(FrameError::PitchTooSmall {
                pitch,
                width,
                bytes_per_pixel,
            });
        }

        // The last row only has to reach its final pixel, not the full pitch.
        let expected = if height_px == 0 {
            0
        } else {
            (height_px - 1) * pitch + width_px * bytes_per_pixel
        };
        if data.len() < expected {
            return Err(FrameError::FrameTooSmall {
                expected,
                actual: data.len(),
            });
        }

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(width_px * height_px * 4)?;
        pixels.resize(width_px * height_px * 4, 0);

        let decoder = PixelDecoderEnum::for_format(format, self.endianness);
        for y in 0..height_px {
            let row_offset = y * pitch;
            for x in 0..width_px {
                let pixel_offset = row_offset + x * bytes_per_pixel;
                let rgba_offset = y * width_px * 4 + x * 4;
                let rgba = decoder.decode(&data[pixel_offset..pixel_offset + bytes_per_pixel]);
                pixels[rgba_offset..rgba_offset + 4].copy_from_slice(&rgba);
            }
        }

        Ok(RgbaFrame {
            width,
            height,
            data: pixels,
        })
    }
}

#[enum_dispatch]
trait PixelDecoder {
    fn decode(&self, source: &[u8]) -> [u8; 4];
}

#[enum_dispatch(PixelDecoder)]
enum PixelDecoderEnum {
    Xrgb8888(Xrgb8888Decoder),
    Rgb565(Rgb565Decoder),
}

impl PixelDecoderEnum {
    fn for_format(format: PixelFormat, endianness: Endianness) -> PixelDecoderEnum {
        match format {
            PixelFormat::Xrgb8888 => Xrgb8888Decoder { endianness }.into(),
            PixelFormat::Rgb565 => Rgb565Decoder { endianness }.into(),
        }
    }
}

struct Xrgb8888Decoder {
    endianness: Endianness,
}

impl PixelDecoder for Xrgb8888Decoder {
    fn decode(&self, source: &[u8]) -> [u8; 4] {
        // The pixel is a native-endian 0xAARRGGBB word. The top byte is
        // carried through as alpha.
        let word = match self.endianness {
            Endianness::Little => LittleEndian::read_u32(source),
            Endianness::Big => BigEndian::read_u32(source),
        };
        [
            (word >> 16) as u8,
            (word >> 8) as u8,
            word as u8,
            (word >> 24) as u8,
        ]
    }
}

struct Rgb565Decoder {
    endianness: Endianness,
}

impl PixelDecoder for Rgb565Decoder {
    fn decode(&self, source: &[u8]) -> [u8; 4] {
        let word = match self.endianness {
            Endianness::Little => LittleEndian::read_u16(source),
            Endianness::Big => BigEndian::read_u16(source),
        };
        [
            EXPAND_5BIT[((word >> 11) & 0x1F) as usize],
            EXPAND_6BIT[((word >> 5) & 0x3F) as usize],
            EXPAND_5BIT[(word & 0x1F) as usize],
            0xFF,
        ]
    }
}

static EXPAND_5BIT: Lazy<[u8; 32]> = Lazy::new(|| {
    let mut table = [0; 32];
    for (component, entry) in table.iter_mut().enumerate() {
        *entry = (component * 255 / 31) as u8;
    }
    table
});

static EXPAND_6BIT: Lazy<[u8; 64]> = Lazy::new(|| {
    let mut table = [0; 64];
    for (component, entry) in table.iter_mut().enumerate() {
        *entry = (component * 255 / 63) as u8;
    }
    table
});

#[test]
fn test_rgb565_expansion() {
    let tests = [
        // (word, expected RGBA)
        (0xFFFFu16, [255, 255, 255, 255]),
        (0x0000, [0, 0, 0, 255]),
        // r=16, g=32, b=1 expanded with integer division
        (0x8401, [131, 129, 8, 255]),
    ];

    let converter = FrameConverter::with_endianness(Endianness::Little);
    for (word, expected) in tests.iter() {
        let data = word.to_le_bytes();
        let frame = converter
            .convert(Some(&data), 1, 1, 2, PixelFormat::Rgb565)
            .unwrap();
        assert_eq!(frame.pixel(0, 0), *expected);
    }
}

#[test]
fn test_xrgb8888_little_endian() {
    let converter = FrameConverter::with_endianness(Endianness::Little);
    let data = [0x11, 0x22, 0x33, 0xFF];
    let frame = converter
        .convert(Some(&data), 1, 1, 4, PixelFormat::Xrgb8888)
        .unwrap();
    assert_eq!(frame.pixel(0, 0), [0x33, 0x22, 0x11, 0xFF]);
}

#[test]
fn test_xrgb8888_big_endian() {
    let converter = FrameConverter::with_endianness(Endianness::Big);
    let data = [0xFF, 0x33, 0x22, 0x11];
    let frame = converter
        .convert(Some(&data), 1, 1, 4, PixelFormat::Xrgb8888)
        .unwrap();
    assert_eq!(frame.pixel(0, 0), [0x33, 0x22, 0x11, 0xFF]);
}

#[test]
fn test_pitch_padding_is_skipped() {
    let converter = FrameConverter::with_endianness(Endianness::Little);

    // 2x2 RGB565 with 2 bytes of garbage padding per row.
    let padded = [
        0xFF, 0xFF, 0x01, 0x84, 0xAA, 0xBB, // row 0 + padding
        0x00, 0x00, 0xFF, 0xFF, 0xCC, 0xDD, // row 1 + padding
    ];
    let tight = [
        0xFF, 0xFF, 0x01, 0x84, // row 0
        0x00, 0x00, 0xFF, 0xFF, // row 1
    ];

    let from_padded = converter
        .convert(Some(&padded), 2, 2, 6, PixelFormat::Rgb565)
        .unwrap();
    let from_tight = converter
        .convert(Some(&tight), 2, 2, 4, PixelFormat::Rgb565)
        .unwrap();

    assert_eq!(from_padded.data.len(), 2 * 2 * 4);
    assert_eq!(from_padded.data, from_tight.data);
}

#[test]
fn test_null_frame_data() {
    let converter = FrameConverter::new();
    assert!(matches!(
        converter.convert(None, 1, 1, 4, PixelFormat::Xrgb8888),
        Err(FrameError::NullFrameData)
    ));
}

#[test]
fn test_raw_format_values() {
    assert_eq!(PixelFormat::from_raw(1).unwrap(), PixelFormat::Xrgb8888);
    assert_eq!(PixelFormat::from_raw(2).unwrap(), PixelFormat::Rgb565);

    for raw in [0, 3, u32::MAX] {
        assert!(matches!(
            PixelFormat::from_raw(raw),
            Err(FrameError::UnsupportedFormat(r)) if r == raw
        ));
    }
}

#[test]
fn test_bounds_are_validated() {
    let converter = FrameConverter::new();
    let data = [0u8; 7];

    // Pitch can't hold a full row of pixels.
    assert!(matches!(
        converter.convert(Some(&data), 2, 1, 2, PixelFormat::Rgb565),
        Err(FrameError::PitchTooSmall { .. })
    ));

    // 2x2 at pitch 4 needs 8 bytes, only 7 provided.
    assert!(matches!(
        converter.convert(Some(&data), 2, 2, 4, PixelFormat::Rgb565),
        Err(FrameError::FrameTooSmall {
            expected: 8,
            actual: 7,
        })
    ));
}

#[test]
fn test_empty_geometry() {
    let converter = FrameConverter::new();
    let frame = converter
        .convert(Some(&[]), 0, 0, 0, PixelFormat::Rgb565)
        .unwrap();
    assert!(frame.data.is_empty());
}
