use crate::collection::Flashcard;

/// Flip-card practice over a snapshot of a collection.
#[derive(Debug, Clone, Default)]
pub struct PracticeDeck {
    cards: Vec<Flashcard>,
    current: usize,
    flipped: bool,
}

impl PracticeDeck {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self {
            cards,
            current: 0,
            flipped: false,
        }
    }

    pub fn current(&self) -> Option<&Flashcard> {
        self.cards.get(self.current)
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn flip(&mut self) {
        if !self.cards.is_empty() {
            self.flipped = !self.flipped;
        }
    }

    pub fn next(&mut self) {
        if self.cards.is_empty() {
            return;
        }
        self.current = (self.current + 1) % self.cards.len();
        self.flipped = false;
    }

    pub fn previous(&mut self) {
        if self.cards.is_empty() {
            return;
        }
        self.current = (self.current + self.cards.len() - 1) % self.cards.len();
        self.flipped = false;
    }

    /// One-based position of the current card and the deck size.
    pub fn position(&self) -> (usize, usize) {
        (self.current + 1, self.cards.len())
    }
}
