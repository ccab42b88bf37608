use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::collection::Flashcard;
use crate::quiz::Question;

pub const DEFAULT_QUESTION_COUNT: usize = 5;
pub const MAX_DISTRACTORS: usize = 3;

/// Builds up to `count` multiple-choice questions out of `flashcards`.
///
/// Cards are drawn without replacement in a uniformly random order. Each
/// question offers the card's definition together with up to
/// [`MAX_DISTRACTORS`] distinct definitions taken from the other cards.
/// Distractors equal to the correct definition are skipped unless no other
/// definition exists, so options only repeat when cards share a definition
/// and a question built from two or more cards always has at least two
/// options. An empty input (or `count == 0`) yields no questions.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, flashcards: &[Flashcard], count: usize) -> Vec<Question> {
    let mut picked = (0..flashcards.len()).collect::<Vec<_>>();
    picked.shuffle(rng);
    picked.truncate(count);

    picked
        .into_iter()
        .map(|idx| generate_question(rng, flashcards, idx))
        .collect()
}

fn generate_question<R: Rng + ?Sized>(rng: &mut R, flashcards: &[Flashcard], idx: usize) -> Question {
    let card = &flashcards[idx];

    let mut seen = HashSet::new();
    let mut distractors = flashcards
        .iter()
        .enumerate()
        .filter(|(other, _)| *other != idx)
        .map(|(_, other)| other.definition.as_str())
        .filter(|definition| *definition != card.definition && seen.insert(*definition))
        .collect::<Vec<_>>();
    distractors.shuffle(rng);
    distractors.truncate(MAX_DISTRACTORS);

    // Every other card shares the answer: repeat it rather than ask a
    // question with a single option
    if distractors.is_empty() {
        let others = flashcards
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != idx)
            .map(|(_, other)| other.definition.as_str())
            .collect::<Vec<_>>();
        distractors.extend(others.choose(rng));
    }

    // Inserting at a uniform position into an already shuffled list is the
    // last Fisher-Yates step, so the resulting order is uniform as well
    let correct_answer_index = rng.gen_range(0..=distractors.len());
    let mut options = distractors
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    options.insert(correct_answer_index, card.definition.clone());

    Question::new(card.id.clone(), card.term.clone(), options, correct_answer_index)
}
