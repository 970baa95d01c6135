//! 入力画像の前処理
//!
//! 任意解像度の画像を 320x320 に引き伸ばし、ImageNetの平均と標準偏差で正規化して
//! (C, H, W) 順に平坦化します。アスペクト比は保持しません（学習時の前処理と同じ）。

use image::imageops::FilterType;
use image::RgbImage;

use crate::error::ClassifierError;
use crate::types::{NormalizedTensor, RawImage, IMAGE_SIZE, NUM_CHANNELS};

/// チャネルごとの平均（R, G, B）
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// チャネルごとの標準偏差（R, G, B）
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// エンコード済み画像をモデル入力テンソルに変換
pub fn preprocess(raw: &RawImage) -> Result<NormalizedTensor, ClassifierError> {
    let decoded = image::load_from_memory(raw.bytes())
        .map_err(|e| ClassifierError::Decode(e.to_string()))?;

    tracing::debug!(
        width = decoded.width(),
        height = decoded.height(),
        "decoded input image"
    );

    let size = IMAGE_SIZE as u32;
    // アルファチャネルはここで落とす（RGB各チャネルは独立にリサンプルされる）
    let rgb = decoded.to_rgb8();
    let resized = image::imageops::resize(&rgb, size, size, FilterType::Triangle);

    normalize_planar(&resized)
}

/// 320x320 のRGB画像を正規化して (C, H, W) 順に並べる
pub fn normalize_planar(img: &RgbImage) -> Result<NormalizedTensor, ClassifierError> {
    let (width, height) = img.dimensions();
    if width != IMAGE_SIZE as u32 || height != IMAGE_SIZE as u32 {
        return Err(ClassifierError::Decode(format!(
            "画像サイズが不正です: {}x{} (期待: {}x{})",
            width, height, IMAGE_SIZE, IMAGE_SIZE
        )));
    }

    let mut data = Vec::with_capacity(NUM_CHANNELS * IMAGE_SIZE * IMAGE_SIZE);

    for channel in 0..NUM_CHANNELS {
        for y in 0..height {
            for x in 0..width {
                let pixel = img.get_pixel(x, y);
                let value = pixel[channel] as f32 / 255.0;
                data.push((value - MEAN[channel]) / STD[channel]);
            }
        }
    }

    NormalizedTensor::from_planar(data)
        .ok_or_else(|| ClassifierError::Decode("tensor length mismatch".to_string()))
}
