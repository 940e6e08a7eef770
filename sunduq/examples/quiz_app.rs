//! Wiring of a small flashcard quiz with Sunduq.
//!
//! Run with `RUST_LOG=sunduq_container=debug` to watch the container work.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use sunduq::prelude::*;
use tracing::info;

// === Define your traits and types ===

trait Storage: Send + Sync {
    fn save(&self, key: &str, value: String);
    fn load(&self, key: &str) -> Option<String>;
}

/// In-memory stand-in for browser local storage.
#[derive(Default)]
struct Notebook {
    entries: Mutex<HashMap<String, String>>,
}

impl Storage for Notebook {
    fn save(&self, key: &str, value: String) {
        self.entries.lock().insert(key.to_string(), value);
    }

    fn load(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

struct QuizConfig {
    deck: &'static str,
    shuffle: bool,
}

struct Question {
    prompt: &'static str,
    answer: &'static str,
}

struct QuestionLoader {
    questions: Vec<Question>,
}

impl QuestionLoader {
    fn load(config: &QuizConfig) -> Result<Self> {
        let questions = match config.deck {
            "rust-basics" => vec![
                Question { prompt: "Keyword for an immutable binding?", answer: "let" },
                Question { prompt: "Smart pointer for shared ownership across threads?", answer: "Arc" },
            ],
            "practice" => vec![Question { prompt: "1 + 1?", answer: "2" }],
            other => {
                return Err(SunduqError::construction(
                    "questionLoader",
                    format!("unknown deck {other:?}"),
                ));
            }
        };
        Ok(Self { questions })
    }
}

struct AnswerValidator;

impl AnswerValidator {
    fn check(&self, question: &Question, given: &str) -> bool {
        question.answer.eq_ignore_ascii_case(given.trim())
    }
}

struct ProgressTracker {
    storage: Arc<dyn Storage>,
    scores: Mutex<HashMap<&'static str, bool>>,
}

impl ProgressTracker {
    fn record(&self, prompt: &'static str, correct: bool) {
        self.scores.lock().insert(prompt, correct);
    }
}

impl Dispose for ProgressTracker {
    fn dispose(&self) -> std::result::Result<(), BoxError> {
        let scores = self.scores.lock();
        let correct = scores.values().filter(|correct| **correct).count();
        self.storage.save("progress", format!("{correct}/{}", scores.len()));
        Ok(())
    }
}

struct QuizSession {
    loader: Arc<QuestionLoader>,
    validator: Arc<AnswerValidator>,
    progress: Arc<ProgressTracker>,
}

impl QuizSession {
    fn answer(&self, index: usize, given: &str) -> bool {
        let Some(question) = self.loader.questions.get(index) else {
            return false;
        };
        let correct = self.validator.check(question, given);
        self.progress.record(question.prompt, correct);
        correct
    }
}

struct QuizProvider;

impl Provider for QuizProvider {
    fn register(&self, container: &Container) -> Result<()> {
        // QuestionLoader: singleton (depends on QuizConfig)
        container.register_singleton("questionLoader", |c| {
            let config = c.resolve_as::<QuizConfig>("config")?;
            QuestionLoader::load(&config)
        })?;
        // AnswerValidator: singleton, stateless
        container.register_singleton("answerValidator", |_| Ok(AnswerValidator))?;
        // ProgressTracker: singleton with teardown (depends on Storage)
        container.register(
            "progressTracker",
            Factory::disposable(|c| {
                let storage = c.resolve_as::<Arc<dyn Storage>>("storage")?;
                Ok(ProgressTracker {
                    storage: (*storage).clone(),
                    scores: Default::default(),
                })
            }),
            Lifetime::Singleton,
        )?;
        // QuizSession: transient (new each time)
        container.register_transient("quizSession", |c| {
            Ok(QuizSession {
                loader: c.resolve_as("questionLoader")?,
                validator: c.resolve_as("answerValidator")?,
                progress: c.resolve_as("progressTracker")?,
            })
        })?;
        Ok(())
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sunduq_container=debug,quiz_app=info".into()),
        )
        .init();

    let storage: Arc<dyn Storage> = Arc::new(Notebook::default());

    // Build the container
    let container = Container::new();
    container.register_instance("config", QuizConfig { deck: "rust-basics", shuffle: false })?;
    container.register_instance("storage", Arc::clone(&storage))?;
    container.add_provider(&QuizProvider)?;

    info!(?container, "Container ready");

    let config = container.resolve_as::<QuizConfig>("config")?;
    info!(deck = config.deck, shuffle = config.shuffle, "Quiz config");

    let session = container.resolve_as::<QuizSession>("quizSession")?;
    info!(correct = session.answer(0, "let"), "Answered question 1");
    info!(correct = session.answer(1, "Rc"), "Answered question 2");

    // === Practice mode: a child container with a different deck ===
    {
        let practice = container.create_child();
        practice.register_with_override(
            "config",
            Factory::new(|_| Ok(QuizConfig { deck: "practice", shuffle: true })),
            Lifetime::Singleton,
            true,
        )?;
        // questionLoader was already built in the parent, so the child
        // inherits it; override it too to pick up the new deck
        practice.register_with_override(
            "questionLoader",
            Factory::new(|c| QuestionLoader::load(&*c.resolve_as::<QuizConfig>("config")?)),
            Lifetime::Singleton,
            true,
        )?;

        let practice_session = practice.resolve_as::<QuizSession>("quizSession")?;
        info!(
            questions = practice_session.loader.questions.len(),
            correct = practice_session.answer(0, "2"),
            "Practice round"
        );
    }

    // === Typo'd identifiers get suggestions ===
    if let Err(err) = container.resolve("questionLoadr") {
        info!("{err}");
    }

    // === Shutdown ===
    let report = container.dispose();
    info!(
        disposed = report.disposed.len(),
        failed = report.failures.len(),
        saved = ?storage.load("progress"),
        "Shut down"
    );
    Ok(())
}
