//! # Story Playback
//!
//! Narrates a broadcast story one sentence at a time. Playback is an
//! explicit cancellable task: a generation counter is checked before every
//! step, `stop` bumps it, and a new playback implicitly cancels the
//! previous one. No continuation can outlive a stop — leaked timers after
//! a stop are the exact defect this structure exists to prevent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;

use campfire_shared::constants::story::LINE_DELAY_MS;

/// Sink for narrated lines; the UI/audio side implements this
pub trait Narrator: Send + Sync {
    /// Present one sentence
    fn narrate(&self, line: &str);

    /// Playback reached the end without being cancelled
    fn finished(&self) {}
}

/// Split story text into narrated sentences: maximal runs ending in
/// `.`, `!` or `?`. Text without any terminator narrates as a single line.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut terminated = false;

    for ch in text.chars() {
        let is_terminator = matches!(ch, '.' | '!' | '?');
        if !is_terminator && terminated {
            push_sentence(&mut sentences, &mut current);
            terminated = false;
        }
        current.push(ch);
        if is_terminator {
            terminated = true;
        }
    }
    if terminated {
        push_sentence(&mut sentences, &mut current);
    }

    if sentences.is_empty() {
        let whole = text.trim();
        if !whole.is_empty() {
            sentences.push(whole.to_string());
        }
    }
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// Drives sentence-by-sentence narration on the tokio runtime
pub struct StoryPlayer {
    generation: Arc<AtomicU64>,
    line_delay: Duration,
}

impl Default for StoryPlayer {
    fn default() -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            line_delay: Duration::from_millis(LINE_DELAY_MS),
        }
    }
}

impl StoryPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mostly for tests: shrink the pause between sentences
    pub fn with_line_delay(line_delay: Duration) -> Self {
        Self { generation: Arc::new(AtomicU64::new(0)), line_delay }
    }

    /// Start narrating `text`, cancelling any playback already running.
    /// Must be called within a tokio runtime.
    pub fn play(&self, text: &str, narrator: Arc<dyn Narrator>) -> JoinHandle<()> {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let lines = split_sentences(text);
        let delay = self.line_delay;

        tokio::spawn(async move {
            for (index, line) in lines.iter().enumerate() {
                if generation.load(Ordering::SeqCst) != token {
                    debug!("story playback superseded, halting");
                    return;
                }
                narrator.narrate(line);
                if index + 1 < lines.len() {
                    tokio::time::sleep(delay).await;
                }
            }
            if generation.load(Ordering::SeqCst) == token {
                narrator.finished();
            }
        })
    }

    /// Halt any in-flight narration before its next step
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNarrator {
        lines: Mutex<Vec<String>>,
        finished: Mutex<bool>,
    }

    impl Narrator for RecordingNarrator {
        fn narrate(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
        fn finished(&self) {
            *self.finished.lock().unwrap() = true;
        }
    }

    #[test]
    fn sentences_split_on_terminators() {
        assert_eq!(
            split_sentences("The fire glowed. Stars wheeled above! Who spoke?"),
            vec!["The fire glowed.", "Stars wheeled above!", "Who spoke?"]
        );
    }

    #[test]
    fn ellipses_stay_within_one_sentence() {
        assert_eq!(
            split_sentences("The night went on... and on. Quietly."),
            vec!["The night went on... and on.", "Quietly."]
        );
    }

    #[test]
    fn unterminated_text_is_one_line() {
        assert_eq!(split_sentences("no punctuation here"), vec!["no punctuation here"]);
        assert!(split_sentences("   ").is_empty());
    }

    #[tokio::test]
    async fn playback_narrates_every_line_then_finishes() {
        let player = StoryPlayer::with_line_delay(Duration::from_millis(1));
        let narrator = Arc::new(RecordingNarrator::default());

        let handle = player.play("One. Two. Three.", narrator.clone());
        handle.await.unwrap();

        assert_eq!(narrator.lines.lock().unwrap().len(), 3);
        assert!(*narrator.finished.lock().unwrap());
    }

    #[tokio::test]
    async fn stop_halts_pending_lines() {
        let player = StoryPlayer::with_line_delay(Duration::from_millis(50));
        let narrator = Arc::new(RecordingNarrator::default());

        let handle = player.play("One. Two. Three.", narrator.clone());
        // Let the first line land, then stop before the second.
        tokio::time::sleep(Duration::from_millis(10)).await;
        player.stop();
        handle.await.unwrap();

        let narrated = narrator.lines.lock().unwrap().len();
        assert!(narrated < 3, "stop must halt remaining lines, saw {narrated}");
        assert!(!*narrator.finished.lock().unwrap());
    }

    #[tokio::test]
    async fn new_playback_supersedes_the_old_one() {
        let player = StoryPlayer::with_line_delay(Duration::from_millis(50));
        let first = Arc::new(RecordingNarrator::default());
        let second = Arc::new(RecordingNarrator::default());

        let first_handle = player.play("Old one. Old two. Old three.", first.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second_handle = player.play("New.", second.clone());

        first_handle.await.unwrap();
        second_handle.await.unwrap();

        assert!(first.lines.lock().unwrap().len() < 3);
        assert_eq!(second.lines.lock().unwrap().as_slice(), ["New."]);
        assert!(*second.finished.lock().unwrap());
    }
}
