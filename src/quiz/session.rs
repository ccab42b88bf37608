use crate::quiz::Question;

/// Where a [`QuizSession`] currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The session was started without any questions.
    NotEnoughCards,
    AwaitingSelection,
    /// The current answer was submitted and its correctness is shown.
    Revealed,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: String,
    pub was_correct: bool,
}

/// Progress through a fixed list of questions.
///
/// Every mutating method silently ignores calls that are not legal in the
/// current [`Phase`] and reports whether the call took effect.
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    questions: Vec<Question>,
    current_index: usize,
    selected_answer: Option<usize>,
    revealed: bool,
    completed: bool,
    score: usize,
    answer_log: Vec<AnswerRecord>,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            ..Default::default()
        }
    }

    pub fn phase(&self) -> Phase {
        if self.questions.is_empty() {
            Phase::NotEnoughCards
        } else if self.completed {
            Phase::Completed
        } else if self.revealed {
            Phase::Revealed
        } else {
            Phase::AwaitingSelection
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The question being answered, or `None` once the quiz is over.
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase() {
            Phase::AwaitingSelection | Phase::Revealed => self.questions.get(self.current_index),
            Phase::NotEnoughCards | Phase::Completed => None,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// One-based number of the current question and the total count.
    pub fn progress(&self) -> (usize, usize) {
        (self.current_index + 1, self.questions.len())
    }

    pub fn selected_answer(&self) -> Option<usize> {
        self.selected_answer
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn answer_log(&self) -> &[AnswerRecord] {
        &self.answer_log
    }

    /// The answer shown while the current question is revealed.
    pub fn last_answer(&self) -> Option<&AnswerRecord> {
        match self.phase() {
            Phase::Revealed => self.answer_log.last(),
            _ => None,
        }
    }

    pub fn select_answer(&mut self, index: usize) -> bool {
        if self.phase() != Phase::AwaitingSelection {
            log::debug!("Ignoring selection {} outside of answer selection", index);
            return false;
        }
        let in_range = self
            .current_question()
            .map_or(false, |question| index < question.options.len());
        if !in_range {
            log::debug!("Ignoring out of range selection {}", index);
            return false;
        }
        self.selected_answer = Some(index);
        true
    }

    pub fn submit_answer(&mut self) -> Option<AnswerRecord> {
        if self.phase() != Phase::AwaitingSelection {
            log::debug!("Ignoring submission outside of answer selection");
            return None;
        }
        let selected = self.selected_answer?;
        let question = self.questions.get(self.current_index)?;

        let record = AnswerRecord {
            question_id: question.id.clone(),
            was_correct: question.is_correct(selected),
        };
        if record.was_correct {
            self.score += 1;
        }
        self.revealed = true;
        self.answer_log.push(record.clone());
        Some(record)
    }

    pub fn advance(&mut self) -> bool {
        if self.phase() != Phase::Revealed {
            log::debug!("Ignoring advance before the answer is revealed");
            return false;
        }
        if self.current_index + 1 >= self.questions.len() {
            self.completed = true;
        } else {
            self.current_index += 1;
            self.selected_answer = None;
            self.revealed = false;
        }
        true
    }

    /// Advances only if the answer to `question_index` is still the one
    /// being revealed. Used by delayed callers that may have been overtaken
    /// by a restart or a manual advance.
    pub fn advance_from(&mut self, question_index: usize) -> bool {
        if self.phase() != Phase::Revealed || self.current_index != question_index {
            log::debug!("Ignoring stale advance from question {}", question_index);
            return false;
        }
        self.advance()
    }

    /// Replays the same questions from the beginning.
    pub fn restart(&mut self) {
        self.current_index = 0;
        self.selected_answer = None;
        self.revealed = false;
        self.completed = false;
        self.score = 0;
        self.answer_log.clear();
    }

    pub fn summary(&self) -> Option<Summary> {
        if self.phase() != Phase::Completed {
            return None;
        }
        Some(Summary::new(self.score, self.questions.len(), self.answer_log.clone()))
    }
}

/// Final result of a completed quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub score: usize,
    pub total: usize,
    pub percentage: u32,
    pub answers: Vec<AnswerRecord>,
}

impl Summary {
    fn new(score: usize, total: usize, answers: Vec<AnswerRecord>) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            (score as f64 * 100.0 / total as f64).round() as u32
        };
        Self {
            score,
            total,
            percentage,
            answers,
        }
    }

    pub fn verdict(&self) -> &'static str {
        match self.percentage {
            80.. => "Excellent work!",
            60..=79 => "Good job!",
            _ => "Keep practicing!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(amount: usize) -> Vec<Question> {
        (0..amount)
            .map(|i| {
                Question::new(
                    i.to_string(),
                    format!("term {i}"),
                    vec!["right".to_string(), "wrong".to_string(), "also wrong".to_string()],
                    0,
                )
            })
            .collect()
    }

    fn answer(session: &mut QuizSession, index: usize) {
        assert!(session.select_answer(index));
        assert!(session.submit_answer().is_some());
        assert!(session.advance());
    }

    #[test]
    fn empty_session_has_not_enough_cards() {
        let mut session = QuizSession::new(Vec::new());
        assert_eq!(session.phase(), Phase::NotEnoughCards);
        assert!(session.current_question().is_none());
        assert!(!session.select_answer(0));
        assert!(session.submit_answer().is_none());
        assert!(!session.advance());
        assert!(session.summary().is_none());
    }

    #[test]
    fn all_correct_answers_score_full_marks() {
        let mut session = QuizSession::new(questions(4));
        for _ in 0..4 {
            answer(&mut session, 0);
        }

        assert_eq!(session.phase(), Phase::Completed);
        let summary = session.summary().unwrap();
        assert_eq!(summary.score, 4);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.percentage, 100);
        assert_eq!(summary.verdict(), "Excellent work!");
        assert!(summary.answers.iter().all(|a| a.was_correct));
    }

    #[test]
    fn submit_reveals_and_logs_the_answer() {
        let mut session = QuizSession::new(questions(2));
        session.select_answer(1);

        let record = session.submit_answer().unwrap();
        assert_eq!(record, AnswerRecord { question_id: "0".to_string(), was_correct: false });
        assert_eq!(session.phase(), Phase::Revealed);
        assert_eq!(session.score(), 0);
        assert_eq!(session.last_answer(), Some(&record));
        assert_eq!(session.answer_log().len(), 1);
    }

    #[test]
    fn submit_without_selection_is_ignored() {
        let mut session = QuizSession::new(questions(2));
        assert!(session.submit_answer().is_none());
        assert_eq!(session.phase(), Phase::AwaitingSelection);
        assert!(session.answer_log().is_empty());
    }

    #[test]
    fn selection_is_frozen_while_revealed() {
        let mut session = QuizSession::new(questions(2));
        session.select_answer(2);
        session.submit_answer();

        assert!(!session.select_answer(0));
        assert_eq!(session.selected_answer(), Some(2));
        assert!(session.submit_answer().is_none());
        assert_eq!(session.answer_log().len(), 1);
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let mut session = QuizSession::new(questions(1));
        assert!(!session.select_answer(3));
        assert_eq!(session.selected_answer(), None);
    }

    #[test]
    fn reselecting_before_submit_keeps_the_last_choice() {
        let mut session = QuizSession::new(questions(1));
        session.select_answer(1);
        session.select_answer(0);
        assert!(session.submit_answer().unwrap().was_correct);
    }

    #[test]
    fn advance_requires_a_revealed_answer() {
        let mut session = QuizSession::new(questions(2));
        assert!(!session.advance());
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn advance_clears_selection_and_moves_on() {
        let mut session = QuizSession::new(questions(3));
        answer(&mut session, 0);

        assert_eq!(session.phase(), Phase::AwaitingSelection);
        assert_eq!(session.progress(), (2, 3));
        assert_eq!(session.selected_answer(), None);
        assert_eq!(session.current_question().unwrap().id, "1");
    }

    #[test]
    fn completed_session_ignores_further_actions() {
        let mut session = QuizSession::new(questions(1));
        answer(&mut session, 0);

        assert_eq!(session.phase(), Phase::Completed);
        assert!(!session.advance());
        assert!(!session.select_answer(0));
        assert_eq!(session.answer_log().len(), 1);
    }

    #[test]
    fn advance_from_the_revealed_question() {
        let mut session = QuizSession::new(questions(2));
        session.select_answer(0);
        session.submit_answer();

        assert!(session.advance_from(0));
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.phase(), Phase::AwaitingSelection);
    }

    #[test]
    fn advance_from_completes_on_the_last_question() {
        let mut session = QuizSession::new(questions(1));
        session.select_answer(0);
        session.submit_answer();

        assert!(session.advance_from(0));
        assert_eq!(session.phase(), Phase::Completed);
    }

    #[test]
    fn advance_from_is_ignored_after_restart() {
        let mut session = QuizSession::new(questions(2));
        session.select_answer(0);
        session.submit_answer();
        session.restart();

        assert!(!session.advance_from(0));
        assert_eq!(session.phase(), Phase::AwaitingSelection);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn advance_from_a_stale_question_is_ignored() {
        let mut session = QuizSession::new(questions(3));
        answer(&mut session, 0);
        session.select_answer(1);
        session.submit_answer();

        // Revealed on question 1, the delayed call still refers to question 0
        assert!(!session.advance_from(0));
        assert_eq!(session.phase(), Phase::Revealed);
        assert_eq!(session.current_index(), 1);

        assert!(session.advance_from(1));
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn advance_from_before_submit_is_ignored() {
        let mut session = QuizSession::new(questions(2));
        session.select_answer(0);
        assert!(!session.advance_from(0));
        assert_eq!(session.selected_answer(), Some(0));
    }

    #[test]
    fn restart_replays_the_same_questions() {
        let mut session = QuizSession::new(questions(3));
        answer(&mut session, 0);
        answer(&mut session, 1);
        session.select_answer(0);
        session.submit_answer();

        let before = session.questions().to_vec();
        session.restart();

        assert_eq!(session.phase(), Phase::AwaitingSelection);
        assert_eq!(session.score(), 0);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.selected_answer(), None);
        assert!(session.answer_log().is_empty());
        assert_eq!(session.questions(), before.as_slice());
    }

    #[test]
    fn restart_after_completion() {
        let mut session = QuizSession::new(questions(1));
        answer(&mut session, 0);
        session.restart();
        assert_eq!(session.phase(), Phase::AwaitingSelection);
        assert!(session.summary().is_none());
    }

    #[test]
    fn percentage_is_rounded() {
        let mut session = QuizSession::new(questions(3));
        answer(&mut session, 0);
        answer(&mut session, 0);
        answer(&mut session, 1);

        let summary = session.summary().unwrap();
        assert_eq!(summary.percentage, 67);
        assert_eq!(summary.verdict(), "Good job!");
    }

    #[test]
    fn low_scores_keep_practicing() {
        let mut session = QuizSession::new(questions(2));
        answer(&mut session, 0);
        answer(&mut session, 2);

        let summary = session.summary().unwrap();
        assert_eq!(summary.percentage, 50);
        assert_eq!(summary.verdict(), "Keep practicing!");
    }
}
