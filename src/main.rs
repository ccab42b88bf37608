use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use dotenv::dotenv;
use flashcard_quiz_bot::{
    collection::Collection,
    config::Config,
    practice::PracticeDeck,
    quiz::{self, AnswerRecord, Phase, Question, QuizSession, RevealTimer},
};
use teloxide::{
    dispatching::dialogue::{ErasedStorage, InMemStorage, Storage},
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type DialogueStorage = Arc<ErasedStorage<State>>;
type RevealTimers = Arc<Mutex<HashMap<ChatId, RevealTimer>>>;

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    Menu {
        collection: Collection,
    },
    ReceiveNewCard {
        collection: Collection,
    },
    ReceiveEditCard {
        collection: Collection,
    },
    ReceiveDeleteCard {
        collection: Collection,
    },
    Practice {
        collection: Collection,
        deck: PracticeDeck,
    },
    Quiz {
        collection: Collection,
        session: QuizSession,
    },
}

#[tokio::main]
async fn main() {
    // A missing .env just means everything comes from the process environment
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting flashcard quiz bot...");

    let config = Arc::new(Config::from_env().expect("Invalid quiz configuration"));
    log::info!(
        "Quizzes ask up to {} questions, answers stay revealed for {:?}",
        config.question_count,
        config.reveal_delay
    );

    let bot = Bot::from_env();

    // Nothing outlives the process: collections and quizzes are per-chat memory only
    let storage: DialogueStorage = InMemStorage::<State>::new().erase();
    let timers: RevealTimers = Arc::default();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::Menu { collection }].endpoint(menu))
            .branch(dptree::case![State::ReceiveNewCard { collection }].endpoint(receive_new_card))
            .branch(dptree::case![State::ReceiveEditCard { collection }].endpoint(receive_edit_card))
            .branch(
                dptree::case![State::ReceiveDeleteCard { collection }].endpoint(receive_delete_card),
            )
            .branch(dptree::case![State::Practice { collection, deck }].endpoint(practice))
            .branch(dptree::case![State::Quiz { collection, session }].endpoint(take_quiz)),
    )
    .dependencies(dptree::deps![storage, config, timers])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const QUIZ: &str = "Quiz";
const PRACTICE: &str = "Practice";
const CARDS: &str = "Cards";
const ADD_CARD: &str = "Add card";
const EDIT_CARD: &str = "Edit card";
const DELETE_CARD: &str = "Delete card";

const CANCEL: &str = "Cancel";
const FLIP: &str = "Flip";
const NEXT: &str = "Next";
const PREVIOUS: &str = "Previous";
const SUBMIT: &str = "Submit answer";
const TRY_AGAIN: &str = "Try again";
const NEW_QUIZ: &str = "New quiz";
const BACK_TO_MENU: &str = "Back to menu";

const NOT_ENOUGH_CARDS: &str = "Not enough flashcards to start the quiz.";

fn menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(QUIZ), KeyboardButton::new(PRACTICE)],
        vec![KeyboardButton::new(CARDS), KeyboardButton::new(ADD_CARD)],
        vec![KeyboardButton::new(EDIT_CARD), KeyboardButton::new(DELETE_CARD)],
    ])
}

fn cancel_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(CANCEL)]])
}

async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    let collection = Collection::demo();
    bot.send_message(
        msg.chat.id,
        "Hi! I help you learn with flashcards. Here is a collection to get you started.",
    )
    .await?;
    show_menu(&bot, msg.chat.id, &collection).await?;

    dialogue.update(State::Menu { collection }).await?;
    Ok(())
}

async fn show_menu(bot: &Bot, chat_id: ChatId, collection: &Collection) -> HandlerResult {
    let text = format!(
        "{}\n{}\nTags: {}\nOwner: {} ({:?})\n{} flashcards\n\nWhat would you like to do?",
        collection.name,
        collection.description,
        collection.tags.join(", "),
        collection.owner,
        collection.visibility,
        collection.len()
    );
    bot.send_message(chat_id, text)
        .reply_markup(menu_keyboard())
        .await?;
    Ok(())
}

async fn menu(
    bot: Bot,
    dialogue: QuizDialogue,
    collection: Collection,
    config: Arc<Config>,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(QUIZ) => start_quiz(&bot, &dialogue, collection, &config).await,
        Some(PRACTICE) => {
            let deck = PracticeDeck::new(collection.flashcards().to_vec());
            if deck.current().is_none() {
                bot.send_message(msg.chat.id, "There are no flashcards to practice yet.")
                    .await?;
                return Ok(());
            }
            send_practice_card(&bot, msg.chat.id, &deck).await?;
            dialogue.update(State::Practice { collection, deck }).await?;
            Ok(())
        }
        Some(CARDS) => {
            let text = if collection.is_empty() {
                "This collection has no flashcards yet.".to_string()
            } else {
                collection
                    .flashcards()
                    .iter()
                    .map(|card| format!("#{} {} - {}", card.id, card.term, card.definition))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            bot.send_message(msg.chat.id, text).await?;
            Ok(())
        }
        Some(ADD_CARD) => {
            bot.send_message(msg.chat.id, "Send the new card as: term - definition")
                .reply_markup(cancel_keyboard())
                .await?;
            dialogue.update(State::ReceiveNewCard { collection }).await?;
            Ok(())
        }
        Some(EDIT_CARD) => {
            bot.send_message(msg.chat.id, "Send the changes as: id: term - definition")
                .reply_markup(cancel_keyboard())
                .await?;
            dialogue.update(State::ReceiveEditCard { collection }).await?;
            Ok(())
        }
        Some(DELETE_CARD) => {
            bot.send_message(msg.chat.id, "Send the id of the card to delete")
                .reply_markup(cancel_keyboard())
                .await?;
            dialogue.update(State::ReceiveDeleteCard { collection }).await?;
            Ok(())
        }
        _ => {
            bot.send_message(msg.chat.id, "Please choose one of the options")
                .reply_markup(menu_keyboard())
                .await?;
            Ok(())
        }
    }
}

/// Splits `term - definition`.
fn parse_card(text: &str) -> Option<(&str, &str)> {
    text.split_once(" - ")
}

/// Splits `id: term - definition`.
fn parse_card_edit(text: &str) -> Option<(&str, &str, &str)> {
    let (id, card) = text.split_once(':')?;
    let (term, definition) = parse_card(card)?;
    Some((id.trim(), term, definition))
}

async fn back_to_menu(bot: &Bot, dialogue: &QuizDialogue, collection: Collection) -> HandlerResult {
    show_menu(bot, dialogue.chat_id(), &collection).await?;
    dialogue.update(State::Menu { collection }).await?;
    Ok(())
}

async fn receive_new_card(
    bot: Bot,
    dialogue: QuizDialogue,
    mut collection: Collection,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please send the card as text").await?;
        return Ok(());
    };
    if text == CANCEL {
        return back_to_menu(&bot, &dialogue, collection).await;
    }
    let Some((term, definition)) = parse_card(text) else {
        bot.send_message(msg.chat.id, "Use the format: term - definition").await?;
        return Ok(());
    };

    match collection.add_card(term, definition) {
        Ok(card) => {
            log::info!("Chat {} added card #{}", msg.chat.id.0, card.id);
            let reply = format!("Added #{} {} - {}", card.id, card.term, card.definition);
            bot.send_message(msg.chat.id, reply).await?;
            back_to_menu(&bot, &dialogue, collection).await
        }
        Err(err) => {
            bot.send_message(msg.chat.id, err.to_string()).await?;
            Ok(())
        }
    }
}

async fn receive_edit_card(
    bot: Bot,
    dialogue: QuizDialogue,
    mut collection: Collection,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please send the changes as text").await?;
        return Ok(());
    };
    if text == CANCEL {
        return back_to_menu(&bot, &dialogue, collection).await;
    }
    let Some((id, term, definition)) = parse_card_edit(text) else {
        bot.send_message(msg.chat.id, "Use the format: id: term - definition")
            .await?;
        return Ok(());
    };

    match collection.edit_card(id, term, definition) {
        Ok(()) => {
            bot.send_message(msg.chat.id, format!("Updated card #{}", id)).await?;
            back_to_menu(&bot, &dialogue, collection).await
        }
        Err(err) => {
            bot.send_message(msg.chat.id, err.to_string()).await?;
            Ok(())
        }
    }
}

async fn receive_delete_card(
    bot: Bot,
    dialogue: QuizDialogue,
    mut collection: Collection,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please send the id as text").await?;
        return Ok(());
    };
    if text == CANCEL {
        return back_to_menu(&bot, &dialogue, collection).await;
    }

    match collection.delete_card(text.trim()) {
        Ok(card) => {
            bot.send_message(msg.chat.id, format!("Deleted \"{}\"", card.term))
                .await?;
            back_to_menu(&bot, &dialogue, collection).await
        }
        Err(err) => {
            bot.send_message(msg.chat.id, err.to_string()).await?;
            Ok(())
        }
    }
}

async fn send_practice_card(bot: &Bot, chat_id: ChatId, deck: &PracticeDeck) -> HandlerResult {
    let Some(card) = deck.current() else {
        return Ok(());
    };
    let (position, total) = deck.position();
    let side = if deck.is_flipped() {
        format!("{}\n\n{}", card.term, card.definition)
    } else {
        card.term.clone()
    };

    let keyboard = KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(PREVIOUS),
            KeyboardButton::new(FLIP),
            KeyboardButton::new(NEXT),
        ],
        vec![KeyboardButton::new(BACK_TO_MENU)],
    ]);
    bot.send_message(chat_id, format!("Card {} of {}\n\n{}", position, total, side))
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

async fn practice(
    bot: Bot,
    dialogue: QuizDialogue,
    (collection, mut deck): (Collection, PracticeDeck),
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(FLIP) => deck.flip(),
        Some(NEXT) => deck.next(),
        Some(PREVIOUS) => deck.previous(),
        Some(BACK_TO_MENU) => return back_to_menu(&bot, &dialogue, collection).await,
        _ => {
            bot.send_message(msg.chat.id, "Please choose one of the options")
                .await?;
            return Ok(());
        }
    }

    send_practice_card(&bot, msg.chat.id, &deck).await?;
    dialogue.update(State::Practice { collection, deck }).await?;
    Ok(())
}

async fn start_quiz(
    bot: &Bot,
    dialogue: &QuizDialogue,
    collection: Collection,
    config: &Config,
) -> HandlerResult {
    let questions = quiz::generate(
        &mut rand::thread_rng(),
        collection.flashcards(),
        config.question_count,
    );
    let session = QuizSession::new(questions);

    if session.phase() == Phase::NotEnoughCards {
        bot.send_message(dialogue.chat_id(), NOT_ENOUGH_CARDS)
            .reply_markup(menu_keyboard())
            .await?;
        dialogue.update(State::Menu { collection }).await?;
        return Ok(());
    }

    log::info!(
        "Starting a {}-question quiz in chat {}",
        session.questions().len(),
        dialogue.chat_id().0
    );
    send_quiz_view(bot, dialogue.chat_id(), &session).await?;
    dialogue.update(State::Quiz { collection, session }).await?;
    Ok(())
}

async fn take_quiz(
    bot: Bot,
    dialogue: QuizDialogue,
    (collection, mut session): (Collection, QuizSession),
    config: Arc<Config>,
    timers: RevealTimers,
    msg: Message,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let Some(text) = msg.text() else {
        return Ok(());
    };

    // Answer buttons take precedence over control words
    if session.phase() == Phase::AwaitingSelection {
        let index = session
            .current_question()
            .and_then(|question| selected_option(question, text));
        if let Some(index) = index {
            if session.select_answer(index) {
                bot.send_message(chat_id, format!("Selected {}. Press \"{}\" when ready.", text, SUBMIT))
                    .await?;
                dialogue.update(State::Quiz { collection, session }).await?;
            }
            return Ok(());
        }
    }

    match text {
        BACK_TO_MENU => {
            cancel_reveal(&timers, chat_id);
            return back_to_menu(&bot, &dialogue, collection).await;
        }
        TRY_AGAIN => {
            cancel_reveal(&timers, chat_id);
            session.restart();
            send_quiz_view(&bot, chat_id, &session).await?;
            dialogue.update(State::Quiz { collection, session }).await?;
            return Ok(());
        }
        NEW_QUIZ if session.phase() == Phase::Completed => {
            cancel_reveal(&timers, chat_id);
            return start_quiz(&bot, &dialogue, collection, &config).await;
        }
        _ => {}
    }

    match session.phase() {
        Phase::AwaitingSelection if text == SUBMIT => {
            let Some(record) = session.submit_answer() else {
                bot.send_message(chat_id, "Pick an answer first").await?;
                return Ok(());
            };
            if let Some(question) = session.current_question() {
                send_feedback(&bot, chat_id, question, &record).await?;
            }
            let question_index = session.current_index();
            dialogue.update(State::Quiz { collection, session }).await?;
            schedule_advance(&bot, &dialogue, &timers, &config, question_index);
        }
        Phase::AwaitingSelection => {
            bot.send_message(chat_id, "Please choose one of the answers")
                .await?;
        }
        Phase::Revealed => {
            log::debug!("Ignoring \"{}\" while the answer is revealed", text);
        }
        Phase::Completed => {
            bot.send_message(chat_id, "The quiz is over, choose what to do next")
                .await?;
        }
        Phase::NotEnoughCards => {
            bot.send_message(chat_id, NOT_ENOUGH_CARDS).await?;
            return back_to_menu(&bot, &dialogue, collection).await;
        }
    }
    Ok(())
}

fn schedule_advance(
    bot: &Bot,
    dialogue: &QuizDialogue,
    timers: &RevealTimers,
    config: &Config,
    question_index: usize,
) {
    let chat_id = dialogue.chat_id();
    let bot = bot.clone();
    let dialogue = dialogue.clone();
    let timer = RevealTimer::start(config.reveal_delay, async move {
        if let Err(err) = advance_after_reveal(bot, dialogue, question_index).await {
            log::error!("Failed to advance the quiz in chat {}: {}", chat_id.0, err);
        }
    });

    match timers.lock() {
        // A replaced timer is dropped here, which cancels it
        Ok(mut timers) => {
            timers.insert(chat_id, timer);
        }
        Err(_) => log::error!("Reveal timer registry is poisoned"),
    }
}

fn cancel_reveal(timers: &RevealTimers, chat_id: ChatId) {
    let timer = match timers.lock() {
        Ok(mut timers) => timers.remove(&chat_id),
        Err(_) => None,
    };
    if let Some(timer) = timer {
        timer.cancel();
    }
}

async fn advance_after_reveal(bot: Bot, dialogue: QuizDialogue, question_index: usize) -> HandlerResult {
    let Some(State::Quiz { collection, mut session }) = dialogue.get().await? else {
        return Ok(());
    };
    if !session.advance_from(question_index) {
        return Ok(());
    }
    send_quiz_view(&bot, dialogue.chat_id(), &session).await?;
    dialogue.update(State::Quiz { collection, session }).await?;
    Ok(())
}

/// Button text for an answer, numbered so it can't be mistaken for a control.
fn option_label(index: usize, option: &str) -> String {
    format!("{}. {}", index + 1, option)
}

fn selected_option(question: &Question, text: &str) -> Option<usize> {
    question
        .options
        .iter()
        .enumerate()
        .position(|(index, option)| option_label(index, option) == text)
}

async fn send_feedback(bot: &Bot, chat_id: ChatId, question: &Question, record: &AnswerRecord) -> HandlerResult {
    let text = if record.was_correct {
        "Correct! Well done! ✓".to_string()
    } else {
        format!(
            "Incorrect. Keep practicing! \"{}\" is \"{}\".",
            question.prompt,
            question.correct_answer()
        )
    };
    bot.send_message(chat_id, text).await?;
    Ok(())
}

async fn send_quiz_view(bot: &Bot, chat_id: ChatId, session: &QuizSession) -> HandlerResult {
    if let Some(summary) = session.summary() {
        log::info!(
            "Quiz finished in chat {} with {}/{}",
            chat_id.0,
            summary.score,
            summary.total
        );
        let answers = summary
            .answers
            .iter()
            .enumerate()
            .map(|(i, answer)| {
                let mark = if answer.was_correct { "✅" } else { "❌" };
                format!("Question {}: {}", i + 1, mark)
            })
            .collect::<Vec<_>>()
            .join("\n");
        let text = format!(
            "Quiz complete! 🎉\nYou scored {} out of {}\n\n{}%\n{}\n\nYour answers:\n{}",
            summary.score,
            summary.total,
            summary.percentage,
            summary.verdict(),
            answers
        );
        let keyboard = KeyboardMarkup::new(vec![
            vec![KeyboardButton::new(TRY_AGAIN), KeyboardButton::new(NEW_QUIZ)],
            vec![KeyboardButton::new(BACK_TO_MENU)],
        ]);
        bot.send_message(chat_id, text).reply_markup(keyboard).await?;
        return Ok(());
    }

    let Some(question) = session.current_question() else {
        return Ok(());
    };
    let (number, total) = session.progress();
    let text = format!(
        "Question {} of {}  |  Score: {}\n\n{}",
        number,
        total,
        session.score(),
        question.prompt
    );

    let mut rows = question
        .options
        .iter()
        .enumerate()
        .map(|(index, option)| vec![KeyboardButton::new(option_label(index, option))])
        .collect::<Vec<_>>();
    rows.push(vec![KeyboardButton::new(SUBMIT)]);
    rows.push(vec![KeyboardButton::new(TRY_AGAIN), KeyboardButton::new(BACK_TO_MENU)]);

    bot.send_message(chat_id, text)
        .reply_markup(KeyboardMarkup::new(rows))
        .await?;
    Ok(())
}
