use teloxide::types::ChatId;
use tracing::instrument;

use crate::{
    gateway::Gateway,
    keyboard::options_keyboard,
    question::{LoadQuestions, Question},
    session::{AnswerOutcome, SessionRegistry, Verdict},
};

pub(crate) const GREETING: &str = "Hi! ✋\nSend /quiz ⬇️ to start the quiz!";
pub(crate) const UNAVAILABLE: &str = "The quiz is unavailable right now. Please try again later.";
pub(crate) const CORRECT: &str = "Correct! 🎉 🎉 🎉";
pub(crate) const GAME_OVER: &str = "The quiz is over.\nSend /quiz to start again 😃🎮.";

pub(crate) fn incorrect(correct_answer: &str) -> String {
    format!("Incorrect! 🙁\nThe correct answer is: {correct_answer}")
}

pub(crate) fn summary(score: u32, total: usize) -> String {
    format!("The quiz is over! 🙃\nYou answered {score} out of {total} questions correctly.")
}

pub(crate) fn question_text(index: usize, question: &Question) -> String {
    format!("Question #{}\n{}", index + 1, question.text())
}

/// Sends and forgets. Transport errors are logged, never retried.
async fn deliver<G: Gateway>(gateway: &G, chat_id: ChatId, text: &str) {
    if let Err(e) = gateway.send_message(chat_id, text, None).await {
        tracing::error!("Failed to send message to {}: {}", chat_id, e);
    }
}

async fn ask_question<G: Gateway>(gateway: &G, chat_id: ChatId, index: usize, question: &Question) {
    tracing::info!("{}: asking question #{}: {}", chat_id, index + 1, question);
    let keyboard = options_keyboard(question.options());
    if let Err(e) = gateway
        .send_message(chat_id, &question_text(index, question), Some(keyboard))
        .await
    {
        tracing::error!("Failed to send question to {}: {}", chat_id, e);
    }
}

#[instrument(level = "info", skip(gateway))]
pub async fn greet<G: Gateway>(gateway: &G, chat_id: ChatId) {
    deliver(gateway, chat_id, GREETING).await;
}

/// Loads the question set and opens a session, replacing any unfinished one.
#[instrument(level = "info", skip(gateway, store, registry))]
pub async fn start_quiz<G: Gateway, S: LoadQuestions>(
    gateway: &G,
    store: &S,
    registry: &mut SessionRegistry,
    chat_id: ChatId,
) {
    let questions = match store.load_questions() {
        Ok(questions) => questions,
        Err(e) => {
            tracing::error!("{} cannot start a quiz: {}", chat_id, e);
            deliver(gateway, chat_id, UNAVAILABLE).await;
            return;
        }
    };

    tracing::info!("{} starts a quiz of {} questions", chat_id, questions.len());
    match registry.start(chat_id, questions.into()) {
        Some(first) => {
            let first = first.clone();
            ask_question(gateway, chat_id, 0, &first).await;
        }
        None => deliver(gateway, chat_id, UNAVAILABLE).await,
    }
}

/// Handles a button press: acknowledge first, then score the answer.
#[instrument(level = "info", skip(gateway, registry))]
pub async fn take_answer<G: Gateway>(
    gateway: &G,
    registry: &mut SessionRegistry,
    chat_id: ChatId,
    callback_id: &str,
    answer: Option<&str>,
) {
    if let Err(e) = gateway.acknowledge_callback(callback_id).await {
        tracing::error!("Failed to acknowledge callback {}: {}", callback_id, e);
    }

    let Some(answer) = answer else {
        tracing::debug!("{}: callback {} carries no data", chat_id, callback_id);
        return;
    };

    match registry.answer(chat_id, answer) {
        AnswerOutcome::NoSession => {
            tracing::info!("{} answered '{}' without a running quiz", chat_id, answer);
            deliver(gateway, chat_id, GAME_OVER).await;
        }
        AnswerOutcome::Next {
            verdict,
            index,
            question,
        } => {
            send_verdict(gateway, chat_id, answer, &verdict).await;
            ask_question(gateway, chat_id, index, &question).await;
        }
        AnswerOutcome::Finished {
            verdict,
            score,
            total,
        } => {
            send_verdict(gateway, chat_id, answer, &verdict).await;
            tracing::info!("{} completed the quiz with result {}/{}", chat_id, score, total);
            deliver(gateway, chat_id, &summary(score, total)).await;
        }
    }
}

async fn send_verdict<G: Gateway>(gateway: &G, chat_id: ChatId, answer: &str, verdict: &Verdict) {
    match verdict {
        Verdict::Correct => {
            tracing::info!("{} answers '{}'. Correctness: true", chat_id, answer);
            deliver(gateway, chat_id, CORRECT).await;
        }
        Verdict::Incorrect { correct_answer } => {
            tracing::info!("{} answers '{}'. Correctness: false", chat_id, answer);
            deliver(gateway, chat_id, &incorrect(correct_answer)).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{error::LoadError, gateway::testing::RecordingGateway};

    const CHAT: ChatId = ChatId(100);

    /// Serves a fixed question list, or fails like a missing file.
    pub(crate) struct FixedStore {
        pub questions: Option<Vec<Question>>,
        pub loads: Cell<usize>,
    }

    impl FixedStore {
        pub(crate) fn new(questions: Vec<Question>) -> Self {
            Self {
                questions: Some(questions),
                loads: Cell::new(0),
            }
        }

        pub(crate) fn missing() -> Self {
            Self {
                questions: None,
                loads: Cell::new(0),
            }
        }
    }

    impl LoadQuestions for FixedStore {
        fn load_questions(&self) -> Result<Vec<Question>, LoadError> {
            self.loads.set(self.loads.get() + 1);
            self.questions.clone().ok_or_else(|| LoadError::Read {
                path: "questions.json".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    pub(crate) fn three_questions() -> Vec<Question> {
        vec![
            Question::new("2 + 2?", ["3", "4"], "4"),
            Question::new("Sky colour?", ["Blue", "Green"], "Blue"),
            Question::new("Rust mascot?", ["Ferris", "Gopher"], "Ferris"),
        ]
    }

    #[tokio::test]
    async fn start_sends_first_question_with_keyboard() {
        let gateway = RecordingGateway::default();
        let store = FixedStore::new(three_questions());
        let mut registry = SessionRegistry::new();

        start_quiz(&gateway, &store, &mut registry, CHAT).await;

        let sent = gateway.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, CHAT);
        assert_eq!(sent[0].text, "Question #1\n2 + 2?");
        assert_eq!(sent[0].buttons, Some(vec!["3".to_string(), "4".to_string()]));
        assert_eq!(registry.get(CHAT).unwrap().current_index(), 0);
    }

    #[tokio::test]
    async fn unavailable_questions_create_no_session() {
        let gateway = RecordingGateway::default();
        let store = FixedStore::missing();
        let mut registry = SessionRegistry::new();

        start_quiz(&gateway, &store, &mut registry, CHAT).await;

        assert_eq!(gateway.texts(), vec![UNAVAILABLE.to_string()]);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn empty_question_set_is_unavailable() {
        let gateway = RecordingGateway::default();
        let store = FixedStore::new(Vec::new());
        let mut registry = SessionRegistry::new();

        start_quiz(&gateway, &store, &mut registry, CHAT).await;

        assert_eq!(gateway.texts(), vec![UNAVAILABLE.to_string()]);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn full_round_scores_two_of_three() {
        let gateway = RecordingGateway::default();
        let store = FixedStore::new(three_questions());
        let mut registry = SessionRegistry::new();

        start_quiz(&gateway, &store, &mut registry, CHAT).await;
        take_answer(&gateway, &mut registry, CHAT, "cb1", Some("4")).await;
        take_answer(&gateway, &mut registry, CHAT, "cb2", Some("Green")).await;
        assert!(registry.contains(CHAT));
        take_answer(&gateway, &mut registry, CHAT, "cb3", Some("Ferris")).await;

        assert!(!registry.contains(CHAT));
        assert_eq!(
            gateway.texts(),
            vec![
                "Question #1\n2 + 2?".to_string(),
                CORRECT.to_string(),
                "Question #2\nSky colour?".to_string(),
                incorrect("Blue"),
                "Question #3\nRust mascot?".to_string(),
                CORRECT.to_string(),
                summary(2, 3),
            ]
        );
        let summaries = gateway
            .texts()
            .into_iter()
            .filter(|text| text.starts_with("The quiz is over! "))
            .count();
        assert_eq!(summaries, 1);
        assert_eq!(*gateway.acks.lock().unwrap(), vec!["cb1", "cb2", "cb3"]);
    }

    #[tokio::test]
    async fn answer_without_session_prompts_restart() {
        let gateway = RecordingGateway::default();
        let mut registry = SessionRegistry::new();

        take_answer(&gateway, &mut registry, CHAT, "cb", Some("4")).await;

        assert_eq!(gateway.texts(), vec![GAME_OVER.to_string()]);
        assert_eq!(*gateway.acks.lock().unwrap(), vec!["cb"]);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn failed_acknowledgement_still_scores() {
        let gateway = RecordingGateway {
            fail_acks: true,
            ..RecordingGateway::default()
        };
        let store = FixedStore::new(three_questions());
        let mut registry = SessionRegistry::new();

        start_quiz(&gateway, &store, &mut registry, CHAT).await;
        take_answer(&gateway, &mut registry, CHAT, "cb", Some("4")).await;

        assert_eq!(registry.get(CHAT).unwrap().score(), 1);
        assert_eq!(registry.get(CHAT).unwrap().current_index(), 1);
    }

    #[tokio::test]
    async fn failed_sends_do_not_stop_the_quiz() {
        let gateway = RecordingGateway {
            fail_sends: true,
            ..RecordingGateway::default()
        };
        let store = FixedStore::new(three_questions());
        let mut registry = SessionRegistry::new();

        start_quiz(&gateway, &store, &mut registry, CHAT).await;
        take_answer(&gateway, &mut registry, CHAT, "cb", Some("3")).await;

        assert_eq!(registry.get(CHAT).unwrap().current_index(), 1);
        assert_eq!(registry.get(CHAT).unwrap().score(), 0);
    }

    #[tokio::test]
    async fn callback_without_data_is_only_acknowledged() {
        let gateway = RecordingGateway::default();
        let store = FixedStore::new(three_questions());
        let mut registry = SessionRegistry::new();

        start_quiz(&gateway, &store, &mut registry, CHAT).await;
        take_answer(&gateway, &mut registry, CHAT, "cb", None).await;

        assert_eq!(gateway.sent().len(), 1);
        assert_eq!(*gateway.acks.lock().unwrap(), vec!["cb"]);
        assert_eq!(registry.get(CHAT).unwrap().current_index(), 0);
    }

    #[tokio::test]
    async fn quiz_reloads_questions_each_start() {
        let gateway = RecordingGateway::default();
        let store = FixedStore::new(three_questions());
        let mut registry = SessionRegistry::new();

        start_quiz(&gateway, &store, &mut registry, CHAT).await;
        start_quiz(&gateway, &store, &mut registry, ChatId(7)).await;

        assert_eq!(store.loads.get(), 2);
        assert_eq!(registry.len(), 2);
    }
}
