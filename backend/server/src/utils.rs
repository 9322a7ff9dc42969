use base64::{Engine, engine::general_purpose::STANDARD};
use catalog::models::SPIDER_UUID_PREFIX;
use image::ImageFormat;
use uuid::Uuid;

use crate::error::AppError;

pub const PNG_MIME: &str = "image/png";
pub const JPEG_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            PNG_MIME => Some(ImageKind::Png),
            JPEG_MIME => Some(ImageKind::Jpeg),
            _ => None,
        }
    }

    /// Looks at the content, never at the file name.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes) {
            Ok(ImageFormat::Png) => Some(ImageKind::Png),
            Ok(ImageFormat::Jpeg) => Some(ImageKind::Jpeg),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ImageKind::Png => PNG_MIME,
            ImageKind::Jpeg => JPEG_MIME,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
        }
    }

    fn format(&self) -> ImageFormat {
        match self {
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Jpeg => ImageFormat::Jpeg,
        }
    }
}

#[derive(Debug)]
pub struct DecodedImage {
    pub kind: ImageKind,
    pub bytes: Vec<u8>,
}

/// Parses `data:<mime>;base64,<payload>` and checks the payload really is that image type.
pub fn decode_data_url(data_url: &str) -> Result<DecodedImage, AppError> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or(AppError::InvalidImageType)?;

    let mime = header.strip_prefix("data:").unwrap_or(header);
    let mime = mime.strip_suffix(";base64").unwrap_or(mime);
    let kind = ImageKind::from_mime(mime).ok_or(AppError::InvalidImageType)?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| AppError::RequestDataFail)?;

    image::load_from_memory_with_format(&bytes, kind.format())
        .map_err(|_| AppError::InvalidImageType)?;

    Ok(DecodedImage { kind, bytes })
}

/// Unknown content is still encoded, just without a media type prefix.
pub fn encode_data_url(bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(bytes);

    match ImageKind::sniff(bytes) {
        Some(kind) => format!("data:{};base64,{encoded}", kind.mime()),
        None => encoded,
    }
}

pub fn new_spider_uuid() -> String {
    format!("{SPIDER_UUID_PREFIX}{}", Uuid::new_v4().simple())
}

pub fn image_file_name(spider_uuid: &str, kind: ImageKind) -> String {
    format!(
        "{spider_uuid}_{}.{}",
        Uuid::new_v4().simple(),
        kind.extension()
    )
}

#[cfg(test)]
pub(crate) mod test_images {
    use std::io::Cursor;

    use base64::{Engine, engine::general_purpose::STANDARD};
    use image::{DynamicImage, ImageFormat, RgbImage};

    pub fn encoded(format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(2, 2))
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();

        bytes
    }

    pub fn png() -> Vec<u8> {
        encoded(ImageFormat::Png)
    }

    pub fn jpeg() -> Vec<u8> {
        encoded(ImageFormat::Jpeg)
    }

    pub fn data_url(mime: &str, bytes: &[u8]) -> String {
        format!("data:{mime};base64,{}", STANDARD.encode(bytes))
    }
}
