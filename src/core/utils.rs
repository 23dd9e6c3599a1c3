use std::collections::HashSet;

use wana_kana::IsJapaneseChar;

/// Splits text into its distinct kanji, in order of first appearance.
pub fn extract_kanji(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.chars()
        .filter(|c| c.is_kanji())
        .filter(|c| seen.insert(*c))
        .map(|c| c.to_string())
        .collect()
}

/// Order-preserving dedup.
pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_kanji() {
        assert_eq!(extract_kanji("日本語を勉強する"), vec!["日", "本", "語", "勉", "強"]);
        assert_eq!(extract_kanji("人の人"), vec!["人"]);
        assert!(extract_kanji("ひらがな only").is_empty());
    }

    #[test]
    fn test_dedup_preserving_order() {
        let items = ["語", "日", "語", "本", "日"].map(String::from);
        assert_eq!(dedup_preserving_order(items), vec!["語", "日", "本"]);
    }
}
