//! Rule-based text classifier.
//!
//! # Responsibility
//! - Map raw text to exactly one `Category`.
//! - Partition batches into kept and trash groups.
//!
//! # Invariants
//! - `classify` is total: it never fails and never panics.
//! - Rule precedence is formula, then trash, then normal.
//! - Batch partitioning preserves input order inside each group.

use crate::model::entry::Category;
use once_cell::sync::Lazy;
use regex::Regex;

static FORMULA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[A-Za-z0-9+\-*/=()\s]+\z").expect("valid formula regex"));
static BLANK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A\s*\z").expect("valid blank regex"));
static SYMBOLS_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[^A-Za-z0-9]+\z").expect("valid symbol regex"));
static DIGITS_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[0-9\s]+\z").expect("valid digits regex"));

/// One classified input item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedText {
    pub content: String,
    pub category: Category,
}

/// Grouped result of [`classify_batch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchClassification {
    /// `formula` and `normal` items, in input order.
    pub kept: Vec<ClassifiedText>,
    /// `trash` items, in input order.
    pub trash: Vec<ClassifiedText>,
}

impl BatchClassification {
    pub fn len(&self) -> usize {
        self.kept.len() + self.trash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty() && self.trash.is_empty()
    }
}

/// Classifies one text.
///
/// Rules:
/// - `formula`: only ASCII letters, digits, `+ - * / = ( )` and whitespace,
///   with at least one non-whitespace character.
/// - `trash`: blank, no ASCII letter or digit at all, or only digits and
///   whitespace. Text written only in other scripts counts as symbols.
/// - `normal`: everything else.
///
/// Digit-only text such as `"123"` satisfies the formula rule first and is
/// therefore a formula.
pub fn classify(text: &str) -> Category {
    if is_formula(text) {
        Category::Formula
    } else if is_trash(text) {
        Category::Trash
    } else {
        Category::Normal
    }
}

/// Classifies every text and groups the results.
pub fn classify_batch<I, S>(texts: I) -> BatchClassification
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut batch = BatchClassification::default();
    for text in texts {
        let content = text.into();
        let category = classify(&content);
        let item = ClassifiedText { content, category };
        if category.is_kept() {
            batch.kept.push(item);
        } else {
            batch.trash.push(item);
        }
    }
    batch
}

fn is_formula(text: &str) -> bool {
    FORMULA_RE.is_match(text) && !BLANK_RE.is_match(text)
}

fn is_trash(text: &str) -> bool {
    BLANK_RE.is_match(text) || SYMBOLS_ONLY_RE.is_match(text) || DIGITS_ONLY_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::{classify, classify_batch, Category};

    #[test]
    fn formulas_are_detected_as_full_match() {
        assert_eq!(classify("x+y=2"), Category::Formula);
        assert_eq!(classify("(a + b) * c / 4 - d"), Category::Formula);
        assert_eq!(classify("E = m * c * c"), Category::Formula);
        assert_eq!(classify("hello world"), Category::Formula);
        assert_eq!(classify("x+y=2!"), Category::Normal);
    }

    #[test]
    fn digits_only_prefers_formula_over_trash() {
        assert_eq!(classify("123"), Category::Formula);
        assert_eq!(classify(" 4 5 6 "), Category::Formula);
    }

    #[test]
    fn blank_and_symbol_only_text_is_trash() {
        assert_eq!(classify(""), Category::Trash);
        assert_eq!(classify("   "), Category::Trash);
        assert_eq!(classify("\t\n"), Category::Trash);
        assert_eq!(classify("!!!"), Category::Trash);
        assert_eq!(classify("@#$ %^&"), Category::Trash);
        assert_eq!(classify("。，！"), Category::Trash);
        assert_eq!(classify("数据处理"), Category::Trash);
        assert_eq!(classify("١٢٣"), Category::Trash);
    }

    #[test]
    fn mixed_text_is_normal() {
        assert_eq!(classify("hello, world!"), Category::Normal);
        assert_eq!(classify("price: 3€"), Category::Normal);
        assert_eq!(classify("数据处理 v2"), Category::Normal);
    }

    #[test]
    fn batch_partitions_and_preserves_order() {
        let batch = classify_batch(["a+b", "!!", "note: x", "", "42"]);
        let kept: Vec<_> = batch.kept.iter().map(|item| item.content.as_str()).collect();
        let trash: Vec<_> = batch.trash.iter().map(|item| item.content.as_str()).collect();
        assert_eq!(kept, vec!["a+b", "note: x", "42"]);
        assert_eq!(trash, vec!["!!", ""]);
        assert_eq!(batch.kept[1].category, Category::Normal);
        assert_eq!(batch.len(), 5);
    }
}
