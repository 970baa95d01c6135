//! 分類ネットワークの定義
//!
//! バンドルに保存された重みを復元するための構造です。学習はこのクレートでは行いません。

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// モデル設定
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// 分類クラス数
    pub num_classes: usize,
    /// 最終畳み込み層のチャネル数
    #[config(default = 64)]
    pub feature_channels: usize,
}

impl ModelConfig {
    /// モデルを初期化
    pub fn init<B: Backend>(&self, device: &B::Device) -> SkinClassifier<B> {
        let c1 = self.feature_channels / 4;
        let c2 = self.feature_channels / 2;
        let c3 = self.feature_channels;

        SkinClassifier {
            // 3x3, stride 2, padding 1 で解像度を半分ずつにする（320 -> 160 -> 80 -> 40）
            conv1: Conv2dConfig::new([3, c1], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            conv2: Conv2dConfig::new([c1, c2], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            conv3: Conv2dConfig::new([c2, c3], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc1: LinearConfig::new(c3, c3 / 2).init(device),
            fc2: LinearConfig::new(c3 / 2, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

/// 皮膚画像分類用CNN
///
/// # アーキテクチャ
/// - {Conv 3x3 (stride 2) + ReLU} x 3層
/// - Global Average Pooling
/// - FC: c -> c/2 + ReLU
/// - FC: c/2 -> num_classes
#[derive(Module, Debug)]
pub struct SkinClassifier<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    pool: AdaptiveAvgPool2d,
    fc1: Linear<B>,
    fc2: Linear<B>,
    activation: Relu,
}

impl<B: Backend> SkinClassifier<B> {
    /// 順伝播
    ///
    /// # 引数
    /// - `images`: バッチ画像 [batch_size, 3, 320, 320]
    ///
    /// # 戻り値
    /// - クラスごとのロジット [batch_size, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch_size, _, _, _] = images.dims();

        let x = self.activation.forward(self.conv1.forward(images));
        let x = self.activation.forward(self.conv2.forward(x));
        let x = self.activation.forward(self.conv3.forward(x));

        // [batch, c, 1, 1] -> [batch, c]
        let x = self.pool.forward(x);
        let [_, c, _, _] = x.dims();
        let x = x.reshape([batch_size, c]);

        let x = self.activation.forward(self.fc1.forward(x));
        self.fc2.forward(x)
    }
}
