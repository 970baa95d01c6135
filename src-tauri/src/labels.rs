//! 同梱ラベルファイルの読み込み

use std::fs;
use std::path::Path;

use crate::error::ClassifierError;
use crate::types::LabelSet;

/// ラベルファイル（1行1ラベル）を読み込む
pub fn load_labels(path: &Path) -> Result<LabelSet, ClassifierError> {
    let content =
        fs::read_to_string(path).map_err(|e| ClassifierError::resource_missing(path, e))?;

    let labels = parse_labels(&content);
    if labels.is_empty() {
        return Err(ClassifierError::resource_missing(path, "label file is empty"));
    }

    tracing::info!(path = %path.display(), count = labels.len(), "labels loaded");
    Ok(labels)
}

/// テキストからラベル一覧を作る
///
/// 前後の空白・改行を除去し、空行は読み飛ばす。重複はそのまま残す。
pub fn parse_labels(content: &str) -> LabelSet {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let labels = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    LabelSet::new(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_trims_and_skips_trailing_blank_lines() {
        let labels = parse_labels("NF\r\nnonNF  \nother\n\n\n");
        assert_eq!(labels.as_slice(), &["NF", "nonNF", "other"]);
    }

    #[test]
    fn test_parse_keeps_duplicates() {
        let labels = parse_labels("a\na\nb\n");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(0), Some("a"));
        assert_eq!(labels.get(1), Some("a"));
    }

    #[test]
    fn test_parse_strips_bom() {
        let labels = parse_labels("\u{feff}NF\nother");
        assert_eq!(labels.get(0), Some("NF"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_labels(Path::new("/nonexistent/labels.txt")).unwrap_err();
        assert!(matches!(err, ClassifierError::ResourceMissing { .. }));
    }

    #[test]
    fn test_load_empty_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        fs::write(&path, "\n\n").unwrap();
        assert!(matches!(
            load_labels(&path),
            Err(ClassifierError::ResourceMissing { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "NF").unwrap();
        writeln!(file, "nonNF").unwrap();
        writeln!(file, "other").unwrap();
        drop(file);

        let labels = load_labels(&path).unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(2), Some("other"));
    }
}
