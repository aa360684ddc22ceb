use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 选项字母
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnswerLetter {
    A,
    B,
    C,
}

impl AnswerLetter {
    /// 按选项顺序排列
    pub const ALL: [AnswerLetter; 3] = [AnswerLetter::A, AnswerLetter::B, AnswerLetter::C];

    /// 解析字母（忽略大小写，允许 "A)"、"B." 之类的尾随符号）
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.trim().chars();
        let letter = match chars.next()?.to_ascii_uppercase() {
            'A' => AnswerLetter::A,
            'B' => AnswerLetter::B,
            'C' => AnswerLetter::C,
            _ => return None,
        };
        // "Because" 之类的单词不算字母
        match chars.next() {
            Some(c) if c.is_alphanumeric() => None,
            _ => Some(letter),
        }
    }

    /// 选项下标
    pub fn index(self) -> usize {
        match self {
            AnswerLetter::A => 0,
            AnswerLetter::B => 1,
            AnswerLetter::C => 2,
        }
    }
}

impl std::fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnswerLetter::A => "A",
            AnswerLetter::B => "B",
            AnswerLetter::C => "C",
        };
        write!(f, "{}", s)
    }
}

/// 一道三选一的测验题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub question_text: String,
    pub options: [String; 3],
    pub correct_letter: AnswerLetter,
}

impl QuizQuestion {
    /// 指定字母对应的选项文本
    pub fn option(&self, letter: AnswerLetter) -> &str {
        &self.options[letter.index()]
    }
}

/// 一次作答
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizAttempt {
    /// 题目下标 → 所选字母
    pub selections: BTreeMap<usize, AnswerLetter>,
    pub graded: bool,
}

impl QuizAttempt {
    pub fn clear(&mut self) {
        self.selections.clear();
        self.graded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_letter() {
        assert_eq!(AnswerLetter::parse("A"), Some(AnswerLetter::A));
        assert_eq!(AnswerLetter::parse(" b "), Some(AnswerLetter::B));
        assert_eq!(AnswerLetter::parse("C)"), Some(AnswerLetter::C));
        assert_eq!(AnswerLetter::parse("Because"), None);
        assert_eq!(AnswerLetter::parse("D"), None);
        assert_eq!(AnswerLetter::parse(""), None);
    }
}
