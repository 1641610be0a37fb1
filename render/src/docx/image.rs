//! Picture format sniffing and sizing.

/// 914400 EMU per inch at 96 pixels per inch.
pub const EMU_PER_PIXEL: i64 = 9525;
pub const EMU_PER_TWIP: i64 = 635;
/// Used when the pixel size cannot be read: one inch square.
pub const DEFAULT_EXTENT_EMU: i64 = 914400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    pub fn detect(data: &[u8]) -> Option<ImageFormat> {
        if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if data.starts_with(b"GIF8") {
            Some(ImageFormat::Gif)
        } else if data.starts_with(b"BM") {
            Some(ImageFormat::Bmp)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
        }
    }
}

/// Width and height in pixels, read from the image header.
pub fn pixel_size(data: &[u8], format: ImageFormat) -> Option<(u32, u32)> {
    match format {
        ImageFormat::Png => Some((be_u32(data, 16)?, be_u32(data, 20)?)),
        ImageFormat::Gif => Some((le_u16(data, 6)?.into(), le_u16(data, 8)?.into())),
        ImageFormat::Bmp => {
            let width = le_i32(data, 18)?.unsigned_abs();
            let height = le_i32(data, 22)?.unsigned_abs();
            Some((width, height))
        }
        ImageFormat::Jpeg => jpeg_size(data),
    }
}

/// Drawing extent in EMU, scaled down to fit `max_width_emu` when it is non-zero.
pub fn extent_emu(pixels: Option<(u32, u32)>, max_width_emu: i64) -> (i64, i64) {
    let (width, height) = match pixels {
        Some((w, h)) if w > 0 && h > 0 => (
            i64::from(w) * EMU_PER_PIXEL,
            i64::from(h) * EMU_PER_PIXEL,
        ),
        _ => (DEFAULT_EXTENT_EMU, DEFAULT_EXTENT_EMU),
    };
    if max_width_emu > 0 && width > max_width_emu {
        (max_width_emu, height * max_width_emu / width)
    } else {
        (width, height)
    }
}

fn jpeg_size(data: &[u8]) -> Option<(u32, u32)> {
    let mut i = 2;
    while i + 3 < data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        match marker {
            // fill byte
            0xFF => i += 1,
            0x01 | 0xD0..=0xD7 => i += 2,
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let height = be_u16(data, i + 5)?;
                let width = be_u16(data, i + 7)?;
                return Some((width.into(), height.into()));
            }
            _ => i += 2 + usize::from(be_u16(data, i + 2)?),
        }
    }
    None
}

fn be_u16(data: &[u8], at: usize) -> Option<u16> {
    let bytes = data.get(at..at + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn le_u16(data: &[u8], at: usize) -> Option<u16> {
    let bytes = data.get(at..at + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn le_i32(data: &[u8], at: usize) -> Option<i32> {
    let bytes = data.get(at..at + 4)?;
    Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut data = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data
    }

    #[test]
    fn detects_formats() {
        assert_eq!(ImageFormat::detect(&png(1, 1)), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::detect(b"GIF89a...."), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::detect(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::detect(b"not an image"), None);
    }

    #[test]
    fn reads_pixel_sizes() {
        assert_eq!(pixel_size(&png(640, 480), ImageFormat::Png), Some((640, 480)));

        let gif = b"GIF89a\x20\x00\x10\x00".to_vec();
        assert_eq!(pixel_size(&gif, ImageFormat::Gif), Some((32, 16)));

        // SOI, APP0 with a 2-byte body, SOF0
        let jpeg = [
            0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, 0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00,
            0x78, 0x00, 0xA0,
        ];
        assert_eq!(pixel_size(&jpeg, ImageFormat::Jpeg), Some((160, 120)));

        assert_eq!(pixel_size(b"\x89PNG", ImageFormat::Png), None);
    }

    #[test]
    fn extents_fit_the_text_width() {
        assert_eq!(extent_emu(Some((96, 48)), 0), (914400, 457200));
        assert_eq!(extent_emu(Some((200, 100)), 952500), (952500, 476250));
        assert_eq!(extent_emu(None, 0), (DEFAULT_EXTENT_EMU, DEFAULT_EXTENT_EMU));
    }
}
