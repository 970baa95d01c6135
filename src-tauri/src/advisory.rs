//! 判定結果に応じたアドバイス文の定義
//!
//! (ラベル区分, 確信度帯) をキーにした固定テーブルから文面を選びます。
//!
//! ## 確信度帯
//! - Strong: p >= 0.85
//! - Moderate: 0.60 <= p < 0.85
//! - Weak: p < 0.60
//!
//! "other" は確信度に関係なく撮り直しを促す文面を返します。

use serde::Serialize;

/// Strong 帯の下限（含む）
pub const STRONG_THRESHOLD: f32 = 0.85;

/// Moderate 帯の下限（含む）
pub const MODERATE_THRESHOLD: f32 = 0.60;

/// ラベルの区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryCategory {
    /// 判定不能（写真が不適切）
    Other,
    /// NF（神経線維腫症）を示唆
    Nf,
    /// NF 以外の皮膚所見
    NonNf,
}

impl AdvisoryCategory {
    /// ラベル文字列から区分を決める（前後空白除去・大文字小文字無視）
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "other" => AdvisoryCategory::Other,
            "nf" => AdvisoryCategory::Nf,
            _ => AdvisoryCategory::NonNf,
        }
    }
}

/// 確信度帯
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    Strong,
    Moderate,
    Weak,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= STRONG_THRESHOLD {
            ConfidenceBand::Strong
        } else if confidence >= MODERATE_THRESHOLD {
            ConfidenceBand::Moderate
        } else {
            ConfidenceBand::Weak
        }
    }
}

/// アドバイス文（解釈 + 推奨事項リスト）
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub category: AdvisoryCategory,
    /// "other" の場合は None
    pub band: Option<ConfidenceBand>,
    pub title: &'static str,
    pub interpretation: &'static str,
    pub recommendations: &'static [&'static str],
}

static CATALOG: [Advisory; 7] = [
    Advisory {
        category: AdvisoryCategory::Other,
        band: None,
        title: "判定できませんでした",
        interpretation: "写真から皮膚の所見を読み取れませんでした。",
        recommendations: &[
            "明るい場所で、ピントを合わせて撮り直してください。",
            "病変部が画面の中央に大きく写るようにしてください。",
            "影や反射が入らない角度で撮影してください。",
        ],
    },
    Advisory {
        category: AdvisoryCategory::Nf,
        band: Some(ConfidenceBand::Strong),
        title: "NFの特徴が強く認められます",
        interpretation: "カフェオレ斑や神経線維腫など、NFに典型的な所見と強く一致しています。",
        recommendations: &[
            "早めに皮膚科または遺伝専門外来を受診してください。",
            "斑の数や大きさ、家族歴を医師に伝えてください。",
            "この結果は診断ではありません。確定には専門医の診察が必要です。",
        ],
    },
    Advisory {
        category: AdvisoryCategory::Nf,
        band: Some(ConfidenceBand::Moderate),
        title: "NFの可能性があります",
        interpretation: "NFに見られる所見といくつかの点で一致しています。",
        recommendations: &[
            "皮膚科での診察を検討してください。",
            "同じ部位の変化を定期的に撮影して記録してください。",
            "この結果は診断ではありません。",
        ],
    },
    Advisory {
        category: AdvisoryCategory::Nf,
        band: Some(ConfidenceBand::Weak),
        title: "判定の確信度が低い結果です",
        interpretation: "NFに近い所見が見られますが、確信度は低く結論は出せません。",
        recommendations: &[
            "別の角度や明るさで撮り直して再判定してください。",
            "気になる症状があれば皮膚科に相談してください。",
        ],
    },
    Advisory {
        category: AdvisoryCategory::NonNf,
        band: Some(ConfidenceBand::Strong),
        title: "良性の皮膚所見と考えられます",
        interpretation: "NFに典型的な所見は見られず、一般的な良性の病変と強く一致しています。",
        recommendations: &[
            "大きさや色の変化がないか経過を観察してください。",
            "急に大きくなる、出血するなどの変化があれば受診してください。",
        ],
    },
    Advisory {
        category: AdvisoryCategory::NonNf,
        band: Some(ConfidenceBand::Moderate),
        title: "良性の所見の可能性が高いです",
        interpretation: "良性の病変と一致する点が多いものの、確信度は中程度です。",
        recommendations: &[
            "数週間おきに撮影して変化を比べてください。",
            "不安がある場合は皮膚科に相談してください。",
        ],
    },
    Advisory {
        category: AdvisoryCategory::NonNf,
        band: Some(ConfidenceBand::Weak),
        title: "判定の確信度が低い結果です",
        interpretation: "良性の病変に近い所見ですが、確信度は低く結論は出せません。",
        recommendations: &[
            "別の角度や明るさで撮り直して再判定してください。",
            "気になる症状があれば皮膚科に相談してください。",
        ],
    },
];

/// (ラベル, 確信度) からアドバイス文を選ぶ
pub fn advisory_for(label: &str, confidence: f32) -> &'static Advisory {
    lookup(
        AdvisoryCategory::from_label(label),
        ConfidenceBand::from_confidence(confidence),
    )
}

fn lookup(category: AdvisoryCategory, band: ConfidenceBand) -> &'static Advisory {
    use AdvisoryCategory::{Nf, NonNf, Other};
    use ConfidenceBand::{Moderate, Strong, Weak};

    let index = match (category, band) {
        (Other, _) => 0,
        (Nf, Strong) => 1,
        (Nf, Moderate) => 2,
        (Nf, Weak) => 3,
        (NonNf, Strong) => 4,
        (NonNf, Moderate) => 5,
        (NonNf, Weak) => 6,
    };
    &CATALOG[index]
}
