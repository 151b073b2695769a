//! 画像ソースの解決
//!
//! アップロードされたファイル、またはカメラで撮影したフレームを
//! 1つの正規化表現（プレビュー用 data URI + 送信用バイト列）にする。
//! 同時に保持できる画像は1枚だけで、新しい画像の選択で前の画像は破棄される。

use crate::error::{CropCareError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use std::borrow::Cow;
use std::io::Cursor;
use std::path::PathBuf;
use tracing::{debug, info};

/// 送信可能なエンコーディング
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    Png,
    Jpeg,
}

impl ImageEncoding {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageEncoding::Png => "image/png",
            ImageEncoding::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageEncoding::Png => "png",
            ImageEncoding::Jpeg => "jpg",
        }
    }

    fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(ImageEncoding::Png),
            ImageFormat::Jpeg => Some(ImageEncoding::Jpeg),
            _ => None,
        }
    }
}

/// エンコード済み画像（ファイル選択またはカメラ撮影で生成）
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub encoding: ImageEncoding,
    pub width: u32,
    pub height: u32,
}

impl CapturedImage {
    /// RGBAフレームをPNGにエンコードする（解像度はそのまま）
    pub fn from_frame(frame: &image::RgbaImage) -> Result<Self> {
        let mut bytes = Vec::new();
        frame
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| CropCareError::UnreadableFile(format!("フレームのエンコードに失敗: {}", e)))?;
        Ok(Self {
            bytes,
            encoding: ImageEncoding::Png,
            width: frame.width(),
            height: frame.height(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 画像の入力元
#[derive(Debug, Clone)]
pub enum ImageSource {
    File(PathBuf),
    Captured(CapturedImage),
}

/// 正規化済み画像
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub file_name: String,
    pub image: CapturedImage,
    /// プレビュー・引き継ぎ用
    pub data_uri: String,
}

impl ResolvedImage {
    pub fn bytes(&self) -> &[u8] {
        &self.image.bytes
    }

    pub fn encoding(&self) -> ImageEncoding {
        self.image.encoding
    }

    /// 送信用のPNGバイト列（PNGならそのまま借用）
    pub fn to_png(&self) -> Result<Cow<'_, [u8]>> {
        if self.image.encoding == ImageEncoding::Png {
            return Ok(Cow::Borrowed(&self.image.bytes));
        }
        let decoded = image::load_from_memory(&self.image.bytes)
            .map_err(|e| CropCareError::UnreadableFile(format!("{}: {}", self.file_name, e)))?;
        let png = CapturedImage::from_frame(&decoded.to_rgba8())?;
        debug!(file_name = %self.file_name, bytes = png.bytes.len(), "送信用にPNGへ変換");
        Ok(Cow::Owned(png.bytes))
    }
}

/// 入力元を正規化する
///
/// PNG/JPEGはそのまま、それ以外のデコード可能な形式はPNGに変換する
pub fn resolve(source: ImageSource) -> Result<ResolvedImage> {
    let (file_name, image) = match source {
        ImageSource::File(path) => {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload".to_string());
            let bytes = std::fs::read(&path)
                .map_err(|e| CropCareError::UnreadableFile(format!("{}: {}", path.display(), e)))?;
            (file_name, decode_upload(bytes, &path.display().to_string())?)
        }
        ImageSource::Captured(image) => {
            if image.is_empty() {
                return Err(CropCareError::EmptyImage);
            }
            (format!("capture.{}", image.encoding.extension()), image)
        }
    };

    let data_uri = to_data_uri(&image);
    debug!(
        file_name = %file_name,
        bytes = image.bytes.len(),
        width = image.width,
        height = image.height,
        "画像を解決"
    );

    Ok(ResolvedImage {
        file_name,
        image,
        data_uri,
    })
}

fn decode_upload(bytes: Vec<u8>, origin: &str) -> Result<CapturedImage> {
    if bytes.is_empty() {
        return Err(CropCareError::UnreadableFile(format!("{}: 空のファイル", origin)));
    }

    let format = image::guess_format(&bytes)
        .map_err(|e| CropCareError::UnreadableFile(format!("{}: {}", origin, e)))?;
    let decoded = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| CropCareError::UnreadableFile(format!("{}: {}", origin, e)))?;

    match ImageEncoding::from_format(format) {
        Some(encoding) => Ok(CapturedImage {
            width: decoded.width(),
            height: decoded.height(),
            bytes,
            encoding,
        }),
        None => {
            info!("{:?} をPNGに変換します: {}", format, origin);
            CapturedImage::from_frame(&decoded.to_rgba8())
        }
    }
}

/// "data:image/png;base64,..." 形式
pub fn to_data_uri(image: &CapturedImage) -> String {
    format!("data:{};base64,{}", image.encoding.mime_type(), STANDARD.encode(&image.bytes))
}

/// 現在の画像（最大1枚）
#[derive(Debug, Default)]
pub struct ImageSlot {
    current: Option<ResolvedImage>,
}

impl ImageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新しい画像を選択する
    ///
    /// 解決に失敗した場合は現在の画像をそのまま残す
    pub fn select(&mut self, source: ImageSource) -> Result<&ResolvedImage> {
        let resolved = resolve(source)?;
        if let Some(previous) = &self.current {
            debug!("前の画像を破棄: {}", previous.file_name);
        }
        Ok(self.current.insert(resolved))
    }

    pub fn current(&self) -> Option<&ResolvedImage> {
        self.current.as_ref()
    }

    /// 画像を取り消す
    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_frame(width: u32, height: u32) -> CapturedImage {
        let frame = RgbaImage::from_pixel(width, height, Rgba([73, 109, 137, 255]));
        CapturedImage::from_frame(&frame).expect("エンコード失敗")
    }

    #[test]
    fn test_frame_keeps_native_resolution() {
        let image = png_frame(64, 48);
        assert_eq!(image.encoding, ImageEncoding::Png);
        assert_eq!((image.width, image.height), (64, 48));
        assert!(image.bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_resolve_captured_builds_data_uri() {
        let resolved = resolve(ImageSource::Captured(png_frame(4, 4))).unwrap();
        assert!(resolved.data_uri.starts_with("data:image/png;base64,"));
        assert_eq!(resolved.file_name, "capture.png");
    }

    #[test]
    fn test_png_upload_is_borrowed() {
        let resolved = resolve(ImageSource::Captured(png_frame(4, 4))).unwrap();
        let png = resolved.to_png().unwrap();
        assert!(matches!(png, Cow::Borrowed(_)));
        assert_eq!(png.as_ref(), resolved.bytes());
    }

    #[test]
    fn test_jpeg_upload_is_sent_as_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.jpg");
        // JPEGエンコーダはアルファを扱えないのでRGBで書く
        image::RgbImage::from_pixel(6, 4, image::Rgb([90, 140, 60]))
            .save_with_format(&path, ImageFormat::Jpeg)
            .unwrap();

        let resolved = resolve(ImageSource::File(path)).unwrap();
        assert_eq!(resolved.encoding(), ImageEncoding::Jpeg);

        let png = resolved.to_png().unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (6, 4));
    }

    #[test]
    fn test_resolve_empty_capture_fails() {
        let empty = CapturedImage {
            bytes: vec![],
            encoding: ImageEncoding::Png,
            width: 0,
            height: 0,
        };
        assert!(matches!(resolve(ImageSource::Captured(empty)), Err(CropCareError::EmptyImage)));
    }

    #[test]
    fn test_slot_replaces_previous_image() {
        let mut slot = ImageSlot::new();
        slot.select(ImageSource::Captured(png_frame(2, 2))).unwrap();
        slot.select(ImageSource::Captured(png_frame(8, 8))).unwrap();
        assert_eq!(slot.current().map(|r| r.image.width), Some(8));
    }

    #[test]
    fn test_slot_failure_keeps_current_image() {
        let mut slot = ImageSlot::new();
        slot.select(ImageSource::Captured(png_frame(3, 3))).unwrap();

        let result = slot.select(ImageSource::File(PathBuf::from("/nonexistent/leaf.png")));
        assert!(matches!(result, Err(CropCareError::UnreadableFile(_))));
        assert_eq!(slot.current().map(|r| r.image.width), Some(3));
    }

    #[test]
    fn test_slot_clear() {
        let mut slot = ImageSlot::new();
        slot.select(ImageSource::Captured(png_frame(1, 1))).unwrap();
        slot.clear();
        assert!(slot.is_empty());
    }
}
