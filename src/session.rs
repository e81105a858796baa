use std::{collections::HashMap, sync::Arc};

use teloxide::types::ChatId;

use crate::question::Question;

/// Progress of one user through the question set.
#[derive(Debug, Clone)]
pub struct Session {
    score: u32,
    current_index: usize,
    questions: Arc<[Question]>,
}

impl Session {
    fn new(questions: Arc<[Question]>) -> Self {
        Self {
            score: 0,
            current_index: 0,
            questions,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// The question awaiting an answer. `None` once every question is answered.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect { correct_answer: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// No quiz in progress for this chat. Nothing was changed.
    NoSession,
    /// The answer was scored and another question is due.
    Next {
        verdict: Verdict,
        index: usize,
        question: Question,
    },
    /// The last question was answered; the session is gone.
    Finished {
        verdict: Verdict,
        score: u32,
        total: usize,
    },
}

/// In-memory sessions keyed by chat. A chat has an entry exactly while it has
/// an unfinished quiz.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ChatId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chat_id: ChatId) -> Option<&Session> {
        self.sessions.get(&chat_id)
    }

    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.sessions.contains_key(&chat_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Starts a fresh quiz, discarding any unfinished one for the same chat.
    /// Returns the first question, or `None` for an empty set, in which case
    /// the registry is left untouched.
    pub fn start(&mut self, chat_id: ChatId, questions: Arc<[Question]>) -> Option<&Question> {
        if questions.is_empty() {
            return None;
        }

        self.sessions.insert(chat_id, Session::new(questions));
        self.sessions
            .get(&chat_id)
            .and_then(Session::current_question)
    }

    /// Scores `answer` against the current question and moves on.
    pub fn answer(&mut self, chat_id: ChatId, answer: &str) -> AnswerOutcome {
        let Some(session) = self.sessions.get_mut(&chat_id) else {
            return AnswerOutcome::NoSession;
        };
        let Some(question) = session.current_question() else {
            // Exhausted sessions are removed on their last answer.
            self.sessions.remove(&chat_id);
            return AnswerOutcome::NoSession;
        };

        let verdict = if question.is_correct(answer) {
            Verdict::Correct
        } else {
            Verdict::Incorrect {
                correct_answer: question.correct_answer().to_owned(),
            }
        };
        if verdict == Verdict::Correct {
            session.score += 1;
        }
        session.current_index += 1;

        match session.current_question() {
            Some(next) => AnswerOutcome::Next {
                verdict,
                index: session.current_index,
                question: next.clone(),
            },
            None => {
                let score = session.score;
                let total = session.total();
                self.sessions.remove(&chat_id);
                AnswerOutcome::Finished {
                    verdict,
                    score,
                    total,
                }
            }
        }
    }
}
