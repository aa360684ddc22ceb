//! 测验评分引擎
//!
//! 状态：未作答 → 已作答 → 已提交；`reset()` 随时回到未作答

use crate::models::{AnswerLetter, QuizAttempt, QuizQuestion};
use thiserror::Error;
use tracing::debug;

/// 每答对一题获得的积分
pub const POINTS_PER_CORRECT: u64 = 10;

/// 作答状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingState {
    Unanswered,
    Answered,
    Submitted,
}

/// 作答错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradingError {
    #[error("已提交，不能再修改答案")]
    AlreadyGraded,
    #[error("第 {index} 题不存在（共 {total} 题）")]
    NoSuchQuestion { index: usize, total: usize },
}

/// 评分结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOutcome {
    pub score: usize,
    /// 分母取实际解析出的题目数
    pub total: usize,
    pub points_awarded: u64,
}

impl QuizOutcome {
    /// 是否应把积分写入档案
    pub fn should_award(&self, authenticated: bool) -> bool {
        self.score > 0 && authenticated
    }

    /// 结果评语
    pub fn verdict(&self) -> &'static str {
        if self.score >= 3 {
            "🎉 Fantastic work!"
        } else {
            "💪 Good effort!"
        }
    }
}

/// 评分引擎，持有题目与本次作答
#[derive(Debug, Clone, Default)]
pub struct QuizGradingEngine {
    questions: Vec<QuizQuestion>,
    attempt: QuizAttempt,
}

impl QuizGradingEngine {
    /// 用新解析出的题目创建引擎，作答清空
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            attempt: QuizAttempt::default(),
        }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn attempt(&self) -> &QuizAttempt {
        &self.attempt
    }

    pub fn state(&self) -> GradingState {
        if self.attempt.graded {
            GradingState::Submitted
        } else if self.attempt.selections.is_empty() {
            GradingState::Unanswered
        } else {
            GradingState::Answered
        }
    }

    /// 选择答案，覆盖该题之前的选择
    pub fn select(&mut self, question_index: usize, letter: AnswerLetter) -> Result<(), GradingError> {
        if self.attempt.graded {
            return Err(GradingError::AlreadyGraded);
        }
        if question_index >= self.questions.len() {
            return Err(GradingError::NoSuchQuestion {
                index: question_index,
                total: self.questions.len(),
            });
        }
        self.attempt.selections.insert(question_index, letter);
        Ok(())
    }

    /// 提交并评分；重复提交返回相同结果
    pub fn submit(&mut self) -> QuizOutcome {
        self.attempt.graded = true;
        let outcome = self.outcome();
        debug!("测验评分: {}/{}", outcome.score, outcome.total);
        outcome
    }

    /// 当前作答的评分（不改变状态）
    pub fn outcome(&self) -> QuizOutcome {
        let score = self
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| self.attempt.selections.get(i) == Some(&q.correct_letter))
            .count();
        QuizOutcome {
            score,
            total: self.questions.len(),
            points_awarded: score as u64 * POINTS_PER_CORRECT,
        }
    }

    /// 清空作答，回到未作答状态
    pub fn reset(&mut self) {
        self.attempt.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: AnswerLetter) -> QuizQuestion {
        QuizQuestion {
            question_text: "q".to_string(),
            options: ["A) a".to_string(), "B) b".to_string(), "C) c".to_string()],
            correct_letter: correct,
        }
    }

    fn five_questions() -> QuizGradingEngine {
        use AnswerLetter::*;
        QuizGradingEngine::new(vec![
            question(A),
            question(B),
            question(C),
            question(A),
            question(B),
        ])
    }

    #[test]
    fn test_three_of_five() {
        use AnswerLetter::*;
        let mut engine = five_questions();
        engine.select(0, A).unwrap();
        engine.select(1, B).unwrap();
        engine.select(2, C).unwrap();
        engine.select(3, C).unwrap();
        // 第 5 题未作答

        let outcome = engine.submit();
        assert_eq!(outcome.score, 3);
        assert_eq!(outcome.total, 5);
        assert_eq!(outcome.points_awarded, 30);
        assert_eq!(engine.state(), GradingState::Submitted);
        assert!(outcome.should_award(true));
        assert!(!outcome.should_award(false));
    }

    #[test]
    fn test_selection_overwrites() {
        let mut engine = five_questions();
        assert_eq!(engine.state(), GradingState::Unanswered);
        engine.select(0, AnswerLetter::B).unwrap();
        assert_eq!(engine.state(), GradingState::Answered);
        engine.select(0, AnswerLetter::A).unwrap();
        assert_eq!(engine.attempt().selections.len(), 1);
        assert_eq!(engine.submit().score, 1);
    }

    #[test]
    fn test_locked_after_submit_until_reset() {
        let mut engine = five_questions();
        engine.select(0, AnswerLetter::A).unwrap();
        engine.submit();
        assert_eq!(engine.select(1, AnswerLetter::B), Err(GradingError::AlreadyGraded));

        engine.reset();
        assert_eq!(engine.state(), GradingState::Unanswered);
        assert!(engine.select(1, AnswerLetter::B).is_ok());
    }

    #[test]
    fn test_out_of_range_and_zero_score() {
        let mut engine = five_questions();
        assert_eq!(
            engine.select(9, AnswerLetter::A),
            Err(GradingError::NoSuchQuestion { index: 9, total: 5 })
        );
        let outcome = engine.submit();
        assert_eq!(outcome.score, 0);
        assert!(!outcome.should_award(true));
        assert_eq!(outcome.verdict(), "💪 Good effort!");
    }
}
