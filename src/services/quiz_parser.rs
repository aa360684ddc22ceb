//! 测验解析服务 - 业务能力层
//!
//! 把 AI 生成的半结构化测验文本转换成题目列表。
//!
//! 文本格式：
//! ```text
//! Q1: What keeps the danfo moving?
//! A) Petrol
//! B) Prayer
//! C) Traffic
//! Answer: A
//! ```
//! 格式不对的题块直接跳过，不影响其余题块。

use crate::models::{AnswerLetter, QuizQuestion};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// 题块起始标记
const BLOCK_MARKER: char = 'Q';
const ANSWER_PREFIX: &str = "Answer:";

static QUESTION_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+:\s*").expect("question number pattern"));

/// 题块被跳过的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRejection {
    /// 有效行少于 4 行
    TooFewLines(usize),
    /// 缺少 `Answer:` 行
    MissingAnswer,
    /// 答案不是 A/B/C
    InvalidAnswer(String),
    /// 选项位置上出现了 `Answer:` 行
    MissingOption,
}

/// 解析整段测验文本
///
/// # 返回
/// 按题块顺序返回题目；全部题块都有问题时返回空列表
pub fn parse_quiz(raw: &str) -> Vec<QuizQuestion> {
    let mut questions = Vec::new();

    // 第一个标记之前的内容丢弃
    for (block_index, block) in raw.split(BLOCK_MARKER).skip(1).enumerate() {
        match parse_block(block) {
            Ok(question) => questions.push(question),
            Err(reason) => {
                warn!("跳过第 {} 个题块: {:?}", block_index + 1, reason);
            }
        }
    }

    debug!("测验解析完成，共 {} 道题", questions.len());
    questions
}

/// 解析单个题块
pub fn parse_block(block: &str) -> Result<QuizQuestion, BlockRejection> {
    let lines: Vec<&str> = block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() < 4 {
        return Err(BlockRejection::TooFewLines(lines.len()));
    }

    let answer_line = lines
        .iter()
        .find(|line| line.starts_with(ANSWER_PREFIX))
        .ok_or(BlockRejection::MissingAnswer)?;

    let answer_text = answer_line[ANSWER_PREFIX.len()..].trim();
    let correct_letter = AnswerLetter::parse(answer_text)
        .ok_or_else(|| BlockRejection::InvalidAnswer(answer_text.to_string()))?;

    let options = [lines[1], lines[2], lines[3]];
    if options.iter().any(|opt| opt.starts_with(ANSWER_PREFIX)) {
        return Err(BlockRejection::MissingOption);
    }

    Ok(QuizQuestion {
        question_text: QUESTION_NUMBER_RE.replace(lines[0], "").to_string(),
        options: options.map(str::to_string),
        correct_letter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_QUESTIONS: &str = "Here is your quiz!\n\
        Q1: What is kinetic energy?\n\
        A) Energy of motion\n\
        B) Energy of position\n\
        C) Energy of heat\n\
        Answer: A\n\
        \n\
        Q2: Which force pulls a mango to the ground?\n\
        A) Friction\n\
        B) Gravity\n\
        C) Magnetism\n\
        Answer: B\n";

    #[test]
    fn test_two_well_formed_questions() {
        let questions = parse_quiz(TWO_QUESTIONS);
        assert_eq!(questions.len(), 2);

        assert_eq!(questions[0].question_text, "What is kinetic energy?");
        assert_eq!(questions[0].options[0], "A) Energy of motion");
        assert_eq!(questions[0].correct_letter, AnswerLetter::A);

        assert_eq!(questions[1].question_text, "Which force pulls a mango to the ground?");
        assert_eq!(questions[1].option(AnswerLetter::B), "B) Gravity");
        assert_eq!(questions[1].correct_letter, AnswerLetter::B);
    }

    #[test]
    fn test_block_missing_answer_is_skipped() {
        let raw = "Q1: What is mass?\nA) Weight\nB) Amount of matter\nC) Speed\n\n\
                   Q2: What is speed?\nA) Distance over time\nB) Force\nC) Mass\nAnswer: A";
        let questions = parse_quiz(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question_text, "What is speed?");
    }

    #[test]
    fn test_short_block_does_not_abort() {
        let raw = "Q1: Lonely question\nQ2: Real one?\nA) x\nB) y\nC) z\nAnswer: c";
        let questions = parse_quiz(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_letter, AnswerLetter::C);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(parse_block("1: Only\nA) a"), Err(BlockRejection::TooFewLines(2)));
        assert_eq!(
            parse_block("1: q\nA) a\nB) b\nC) c\nAnswer: D"),
            Err(BlockRejection::InvalidAnswer("D".to_string()))
        );
        assert_eq!(
            parse_block("1: q\nA) a\nB) b\nAnswer: B"),
            Err(BlockRejection::MissingOption)
        );
    }

    #[test]
    fn test_no_marker_yields_nothing() {
        assert!(parse_quiz("").is_empty());
        assert!(parse_quiz("no questions here").is_empty());
    }
}
