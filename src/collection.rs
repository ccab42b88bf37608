#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    pub id: String,
    pub term: String,
    pub definition: String,
}

impl Flashcard {
    pub fn new(id: impl Into<String>, term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            term: term.into(),
            definition: definition.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Private,
    Public,
    Shared,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error("the {field} of a flashcard cannot be empty")]
    EmptyField { field: &'static str },
    #[error("no flashcard with id {id}")]
    CardNotFound { id: String },
}

/// A named group of flashcards owned by a single user.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub owner: String,
    pub shared_with: Vec<String>,
    flashcards: Vec<Flashcard>,
}

impl Collection {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// The "French Basics" collection every new chat starts with.
    pub fn demo() -> Self {
        Self {
            id: "french-basics".to_string(),
            name: "French Basics".to_string(),
            description: "Essential French phrases for beginners".to_string(),
            tags: vec![
                "French".to_string(),
                "Beginner".to_string(),
                "Greetings".to_string(),
            ],
            visibility: Visibility::Public,
            owner: "You".to_string(),
            shared_with: Vec::new(),
            flashcards: vec![
                Flashcard::new("1", "Hello", "Bonjour"),
                Flashcard::new("2", "Thank you", "Merci"),
                Flashcard::new("3", "Good morning", "Bonjour"),
                Flashcard::new("4", "Goodbye", "Au revoir"),
            ],
        }
    }

    pub fn flashcards(&self) -> &[Flashcard] {
        &self.flashcards
    }

    pub fn card(&self, id: &str) -> Option<&Flashcard> {
        self.flashcards.iter().find(|card| card.id == id)
    }

    pub fn len(&self) -> usize {
        self.flashcards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flashcards.is_empty()
    }

    pub fn add_card(&mut self, term: &str, definition: &str) -> Result<Flashcard, CollectionError> {
        let (term, definition) = validate_fields(term, definition)?;
        let card = Flashcard::new(self.next_id(), term, definition);
        self.flashcards.push(card.clone());
        Ok(card)
    }

    pub fn edit_card(&mut self, id: &str, term: &str, definition: &str) -> Result<(), CollectionError> {
        let (term, definition) = validate_fields(term, definition)?;
        let card = self
            .flashcards
            .iter_mut()
            .find(|card| card.id == id)
            .ok_or_else(|| CollectionError::CardNotFound { id: id.to_string() })?;
        card.term = term;
        card.definition = definition;
        Ok(())
    }

    pub fn delete_card(&mut self, id: &str) -> Result<Flashcard, CollectionError> {
        let position = self
            .flashcards
            .iter()
            .position(|card| card.id == id)
            .ok_or_else(|| CollectionError::CardNotFound { id: id.to_string() })?;
        Ok(self.flashcards.remove(position))
    }

    // Ids that aren't numbers never collide with generated ones, so they're skipped
    fn next_id(&self) -> String {
        let max = self
            .flashcards
            .iter()
            .filter_map(|card| card.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }
}

fn validate_fields(term: &str, definition: &str) -> Result<(String, String), CollectionError> {
    let term = term.trim();
    let definition = definition.trim();
    if term.is_empty() {
        return Err(CollectionError::EmptyField { field: "term" });
    }
    if definition.is_empty() {
        return Err(CollectionError::EmptyField { field: "definition" });
    }
    Ok((term.to_string(), definition.to_string()))
}
