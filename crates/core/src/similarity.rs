use std::collections::HashSet;

/// Text similarity used for near-duplicate detection.
///
/// Implementations return a score in `[0, 1]`, where 1 means the texts are
/// considered the same question.
pub trait SimilarityMeasure: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

impl<F> SimilarityMeasure for F
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    fn similarity(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }
}

/// Single CJK characters too common to carry meaning on their own.
const CJK_STOPWORDS: &[char] = &[
    '的', '是', '在', '有', '和', '了', '与', '个', '对', '为', '这', '那', '吗', '呢',
];

/// Jaccard index over keyword sets.
///
/// Keywords are CJK character 1-, 2- and 3-grams (single stopword characters
/// excluded) plus lowercased alphanumeric words. Either side producing no
/// keywords scores 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordJaccard;

impl KeywordJaccard {
    #[must_use]
    pub fn keywords(text: &str) -> HashSet<String> {
        let lower = text.to_lowercase();
        let mut keywords = HashSet::new();

        let cjk: Vec<char> = lower.chars().filter(|c| is_cjk(*c)).collect();
        for c in &cjk {
            if !CJK_STOPWORDS.contains(c) {
                keywords.insert(c.to_string());
            }
        }
        for n in 2..=3 {
            for window in cjk.windows(n) {
                keywords.insert(window.iter().collect());
            }
        }

        for word in lower
            .split(|c: char| !c.is_alphanumeric() || is_cjk(c))
            .filter(|w| !w.is_empty())
        {
            keywords.insert(word.to_string());
        }

        keywords
    }
}

impl SimilarityMeasure for KeywordJaccard {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let left = Self::keywords(a);
        let right = Self::keywords(b);
        if left.is_empty() || right.is_empty() {
            return 0.0;
        }

        let shared = left.intersection(&right).count();
        let union = left.union(&right).count();

        #[allow(clippy::cast_precision_loss)]
        let score = shared as f64 / union as f64;
        score
    }
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_scores_one() {
        let m = KeywordJaccard;
        assert!((m.similarity("GIL 是什么?", "GIL 是什么?") - 1.0).abs() < f64::EPSILON);
        assert!((m.similarity("What is the GIL?", "what is the gil") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrelated_text_scores_low() {
        let m = KeywordJaccard;
        assert!(m.similarity("什么是全局解释器锁", "数据库索引如何工作") < 0.1);
        assert!(m.similarity("What is the GIL?", "How do B-trees split?") < 0.2);
    }

    #[test]
    fn empty_side_scores_zero() {
        let m = KeywordJaccard;
        assert_eq!(m.similarity("", "anything"), 0.0);
        assert_eq!(m.similarity("?!", "?!"), 0.0);
    }

    #[test]
    fn cjk_ngrams_are_extracted() {
        let k = KeywordJaccard::keywords("的锁");
        assert!(k.contains("锁"));
        assert!(!k.contains("的"));
        assert!(k.contains("的锁"));
    }

    #[test]
    fn mixed_text_splits_latin_words_from_cjk() {
        let k = KeywordJaccard::keywords("Python的GIL");
        assert!(k.contains("python"));
        assert!(k.contains("gil"));
    }

    #[test]
    fn closures_are_measures() {
        let always = |_: &str, _: &str| 0.75;
        assert!((always.similarity("a", "b") - 0.75).abs() < f64::EPSILON);
    }
}
