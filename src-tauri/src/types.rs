use serde::{Deserialize, Serialize};

use crate::advisory::Advisory;

/// モデル入力の一辺（ピクセル）
pub const IMAGE_SIZE: usize = 320;

/// 入力チャネル数（RGB）
pub const NUM_CHANNELS: usize = 3;

/// 入力テンソルの論理形状 [batch, channel, height, width]
pub const INPUT_SHAPE: [usize; 4] = [1, NUM_CHANNELS, IMAGE_SIZE, IMAGE_SIZE];

/// クラス名の一覧。インデックス i がロジット i に対応する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}

/// カメラ・ギャラリーから渡されるエンコード済み画像
#[derive(Debug, Clone)]
pub struct RawImage(pub Vec<u8>);

impl RawImage {
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for RawImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// 正規化済み入力テンソル（CHW順、平坦化）
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor {
    data: Vec<f32>,
}

impl NormalizedTensor {
    /// 要素数が [1, 3, 320, 320] と一致しない場合は None
    pub fn from_planar(data: Vec<f32>) -> Option<Self> {
        (data.len() == Self::len_expected()).then_some(Self { data })
    }

    pub const fn len_expected() -> usize {
        NUM_CHANNELS * IMAGE_SIZE * IMAGE_SIZE
    }

    pub fn shape(&self) -> [usize; 4] {
        INPUT_SHAPE
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// (c, y, x) の値
    pub fn at(&self, channel: usize, y: usize, x: usize) -> f32 {
        self.data[channel * IMAGE_SIZE * IMAGE_SIZE + y * IMAGE_SIZE + x]
    }
}

/// エンジンが返すクラススコア
pub type LogitVector = Vec<f32>;

/// 最上位クラスと確信度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
    pub class_index: usize,
}

/// 1回の判定結果（表示用）
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationOutcome {
    pub prediction: Prediction,
    pub probabilities: Vec<f32>,
    pub advisory: &'static Advisory,
}
