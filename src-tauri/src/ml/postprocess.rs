//! ロジットからの予測（softmax + argmax）

use crate::error::ClassifierError;
use crate::types::{LabelSet, Prediction};

/// 数値安定版softmax（最大値を引いてからexp）
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max_val = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max_val).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// 最大値のインデックス。同値の場合は先頭を返す
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, best_val)) if v <= best_val => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// ロジット列を確率分布に変換し、最上位クラスを選ぶ
///
/// ロジットがラベル数より多い場合は先頭 `labels.len()` 個だけを使う。
/// 戻り値の確率分布は実際に使ったロジットに対応する。
pub fn classify(
    logits: &[f32],
    labels: &LabelSet,
) -> Result<(Prediction, Vec<f32>), ClassifierError> {
    if logits.len() != labels.len() {
        tracing::warn!(
            logits = logits.len(),
            labels = labels.len(),
            "logit count does not match label count; using the first {}",
            logits.len().min(labels.len())
        );
    }

    let used = &logits[..logits.len().min(labels.len())];
    if used.is_empty() {
        return Err(ClassifierError::OutputShape("no logits to classify".to_string()));
    }
    if let Some(pos) = used.iter().position(|v| !v.is_finite()) {
        return Err(ClassifierError::OutputShape(format!(
            "non-finite logit at index {}",
            pos
        )));
    }

    let probabilities = softmax(used);
    let class_index = argmax(&probabilities)
        .ok_or_else(|| ClassifierError::OutputShape("empty probability vector".to_string()))?;
    let label = labels
        .get(class_index)
        .ok_or_else(|| {
            ClassifierError::OutputShape(format!("クラスインデックス {} は範囲外です", class_index))
        })?
        .to_string();

    let prediction = Prediction {
        label,
        confidence: probabilities[class_index],
        class_index,
    };
    Ok((prediction, probabilities))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> LabelSet {
        LabelSet::new(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, -3.0, 0.25, 7.5]);
        let sum: f32 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_softmax_large_logits_do_not_overflow() {
        let p = softmax(&[1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_shift_invariance() {
        let l = labels(&["a", "b", "c"]);
        let (a, pa) = classify(&[1.0, 2.0, 3.0], &l).unwrap();
        let (b, pb) = classify(&[101.0, 102.0, 103.0], &l).unwrap();
        assert_eq!(a.label, b.label);
        assert_eq!(a.class_index, 2);
        assert!((a.confidence - b.confidence).abs() < 1e-5);
        for (x, y) in pa.iter().zip(&pb) {
            assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn test_tie_resolves_to_lowest_index() {
        let l = labels(&["same", "same", "same"]);
        let (pred, probs) = classify(&[0.0, 0.0, 0.0], &l).unwrap();
        assert_eq!(pred.class_index, 0);
        for p in probs {
            assert!((p - 1.0 / 3.0).abs() < 1e-6);
        }
        assert!((pred.confidence - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_argmax_first_occurrence() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_reference_distribution() {
        let l = labels(&["NF", "nonNF", "other"]);
        let (pred, probs) = classify(&[2.0, 0.5, 0.1], &l).unwrap();
        assert_eq!(pred.label, "NF");
        assert!((probs[0] - 0.7285).abs() < 1e-3);
        assert!((probs[1] - 0.1625).abs() < 1e-3);
        assert!((probs[2] - 0.1090).abs() < 1e-3);
    }

    #[test]
    fn test_extra_logits_are_truncated() {
        let l = labels(&["a", "b", "c"]);
        // 末尾の大きな値は無視される
        let (pred, probs) = classify(&[0.0, 1.0, 0.5, 50.0, 60.0], &l).unwrap();
        assert_eq!(probs.len(), 3);
        assert_eq!(pred.label, "b");
        let expected = softmax(&[0.0, 1.0, 0.5]);
        assert!((pred.confidence - expected[1]).abs() < 1e-6);
    }

    #[test]
    fn test_fewer_logits_than_labels() {
        let l = labels(&["a", "b", "c"]);
        let (pred, probs) = classify(&[0.0, 2.0], &l).unwrap();
        assert_eq!(probs.len(), 2);
        assert_eq!(pred.label, "b");
    }

    #[test]
    fn test_empty_and_non_finite_rejected() {
        let l = labels(&["a", "b"]);
        assert!(matches!(classify(&[], &l), Err(ClassifierError::OutputShape(_))));
        assert!(matches!(
            classify(&[f32::NAN, 1.0], &l),
            Err(ClassifierError::OutputShape(_))
        ));
        assert!(matches!(
            classify(&[f32::INFINITY, 1.0], &l),
            Err(ClassifierError::OutputShape(_))
        ));
    }
}
