pub mod generator;
pub mod reveal;
pub mod session;

pub use generator::generate;
pub use reveal::RevealTimer;
pub use session::{AnswerRecord, Phase, QuizSession, Summary};

/// A multiple-choice question derived from a single flashcard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Question {
    /// Id of the flashcard the question was built from.
    pub id: String,
    /// The flashcard's term.
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
}

impl Question {
    pub fn new(id: String, prompt: String, options: Vec<String>, correct_answer_index: usize) -> Self {
        Self {
            id,
            prompt,
            options,
            correct_answer_index,
        }
    }

    pub fn correct_answer(&self) -> &str {
        &self.options[self.correct_answer_index]
    }

    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_answer_index
    }
}
