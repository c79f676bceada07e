//! メディア前処理
//!
//! 任意の入力ファイルを送信可能なBase64ペイロードに変換する。
//! - 画像: 1024x1024に収まるよう縮小し、JPEG(品質85)で再エンコード
//! - 画像以外（動画）: 元のバイト列をそのままエンコード
//! - デコード/エンコード失敗時: 元のバイト列と元のMIMEタイプで送信

use crate::config::Config;
use crate::error::{DeepScanError, Result};
use crate::scanner::MediaFile;
use base64::{engine::general_purpose, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::sync::Arc;

pub const MAX_DIMENSION: u32 = 1024;
pub const JPEG_QUALITY: u8 = 85;
pub const NORMALIZED_MIME_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessOptions {
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

impl PreprocessOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_dimension: config.max_image_dimension.max(1),
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
        }
    }
}

/// 前処理済みのペイロード
#[derive(Debug, Clone)]
pub struct PreparedMedia {
    /// Base64（data URLのプレフィックスなし）
    pub payload: String,
    pub mime_type: String,
    /// 再エンコードした場合の出力サイズ
    pub dimensions: Option<(u32, u32)>,
}

impl PreparedMedia {
    pub fn was_reencoded(&self) -> bool {
        self.dimensions.is_some()
    }
}

/// アスペクト比を保ったまま max x max に収まるサイズを計算
///
/// 拡大はしない。幅が高さ以上なら幅を、そうでなければ高さを上限に合わせる。
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width >= height {
        if width <= max {
            return (width, height);
        }
        let scaled = (height as f64 * max as f64 / width as f64).round() as u32;
        (max, scaled.max(1))
    } else {
        if height <= max {
            return (width, height);
        }
        let scaled = (width as f64 * max as f64 / height as f64).round() as u32;
        (scaled.max(1), max)
    }
}

/// 画像をデコードし、縮小してJPEGで再エンコード
pub fn reencode_image(bytes: &[u8], options: PreprocessOptions) -> Result<(Vec<u8>, (u32, u32))> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| DeepScanError::Preprocess(format!("画像デコード失敗: {}", e)))?;

    let (width, height) = img.dimensions();
    let (new_width, new_height) = fit_within(width, height, options.max_dimension);

    let img = if (new_width, new_height) == (width, height) {
        img
    } else {
        img.resize_exact(new_width, new_height, FilterType::Triangle)
    };

    // JPEGはアルファを持てない
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut output = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut output, options.jpeg_quality))
        .map_err(|e| DeepScanError::Preprocess(format!("JPEGエンコード失敗: {}", e)))?;

    Ok((output, (new_width, new_height)))
}

/// バイト列を送信用ペイロードに変換（同期）
///
/// 失敗しても元のバイト列にフォールバックするため、常に結果を返す。
pub fn prepare_bytes(bytes: &[u8], mime_type: &str, options: PreprocessOptions) -> PreparedMedia {
    if !mime_type.starts_with("image/") {
        return raw_payload(bytes, mime_type);
    }

    match reencode_image(bytes, options) {
        Ok((encoded, dimensions)) => PreparedMedia {
            payload: general_purpose::STANDARD.encode(encoded),
            mime_type: NORMALIZED_MIME_TYPE.to_string(),
            dimensions: Some(dimensions),
        },
        Err(e) => {
            log::warn!("前処理に失敗したため元データを送信します ({}): {}", mime_type, e);
            raw_payload(bytes, mime_type)
        }
    }
}

fn raw_payload(bytes: &[u8], mime_type: &str) -> PreparedMedia {
    PreparedMedia {
        payload: general_purpose::STANDARD.encode(bytes),
        mime_type: mime_type.to_string(),
        dimensions: None,
    }
}

/// ファイルを読み込み、ブロッキングプール上で前処理する
///
/// 読み込みに失敗した場合のみエラーを返す。
pub async fn prepare(file: &MediaFile, options: PreprocessOptions) -> Result<PreparedMedia> {
    let bytes = file.read_bytes().await?;
    let mime_type = file.mime_type.clone();

    let task_bytes = Arc::clone(&bytes);
    let task_mime = mime_type.clone();
    let joined =
        tokio::task::spawn_blocking(move || prepare_bytes(&task_bytes, &task_mime, options)).await;

    match joined {
        Ok(prepared) => Ok(prepared),
        Err(e) => {
            log::warn!("前処理タスクが異常終了しました ({}): {}", file.file_name, e);
            Ok(raw_payload(&bytes, &mime_type))
        }
    }
}
