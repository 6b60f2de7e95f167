//! Decides whether a free-text message earns a voice reply, and which one.

use anyhow::Result;
use std::path::PathBuf;
use tracing::{error, warn};

use crate::platform::IncomingMessage;
use crate::voices::{self, Listing, VoiceLibrary};

/// User-visible notices sent instead of a voice
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The designated file for an exact trigger is absent
    VoiceNotFound(String),
    DirectoryMissing,
    NoVoiceFiles,
    /// A chosen file disappeared before it could be uploaded
    FileNotFound,
    GeneralError,
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Notice::VoiceNotFound(name) => {
                format!("⚠️ '{}' not found in voices directory.", name)
            }
            Notice::DirectoryMissing => "⚠️ Voices directory not found.".to_string(),
            Notice::NoVoiceFiles => "⚠️ No voice files found in voices directory.".to_string(),
            Notice::FileNotFound => "⚠️ Voice file not found.".to_string(),
            Notice::GeneralError => {
                "❌ Something went wrong while processing your request.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// Exact trigger: send the designated file
    Specific(PathBuf),
    /// Mention or reply-to-bot: send a random file
    Random(PathBuf),
    Ignore,
    Notice(Notice),
}

/// What actually goes out once an outcome has been checked against the disk
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Voice(PathBuf),
    Notice(Notice),
    Nothing,
}

/// Turn a decided outcome into a delivery. A chosen file that has vanished
/// since the listing becomes `FileNotFound`; a failed decision becomes the
/// generic error.
pub async fn delivery(outcome: Result<TriggerOutcome>) -> Delivery {
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Error in voice reply: {:#}", e);
            return Delivery::Notice(failure_notice(&e));
        }
    };

    match outcome {
        TriggerOutcome::Ignore => Delivery::Nothing,
        TriggerOutcome::Notice(notice) => Delivery::Notice(notice),
        TriggerOutcome::Specific(path) | TriggerOutcome::Random(path) => {
            if voices::is_present(&path).await {
                Delivery::Voice(path)
            } else {
                warn!("Voice file not found: {}", path.display());
                Delivery::Notice(Notice::FileNotFound)
            }
        }
    }
}

/// Notice sent when handling a message failed. Missing files get their own
/// notice, everything else the generic apology.
pub fn failure_notice(err: &anyhow::Error) -> Notice {
    let missing_file = err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
    });
    if missing_file {
        Notice::FileNotFound
    } else {
        Notice::GeneralError
    }
}

/// How a message relates to the trigger word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Exact,
    Mention,
    Silent,
}

pub struct Responder {
    library: VoiceLibrary,
    trigger: String,
}

impl Responder {
    pub fn new(library: VoiceLibrary, trigger: &str) -> Self {
        Self {
            library,
            trigger: normalize(trigger),
        }
    }

    /// Decide the reply for `incoming`. `bot_id` identifies this bot so
    /// replies to its own messages always trigger.
    pub async fn respond(
        &self,
        incoming: &IncomingMessage,
        bot_id: u64,
    ) -> Result<TriggerOutcome> {
        let text = incoming.text.as_deref().unwrap_or("");

        match self.classify(text, incoming.is_reply_to(bot_id)) {
            Trigger::Exact => Ok(match self.library.designated().await {
                Some(path) => TriggerOutcome::Specific(path),
                None => TriggerOutcome::Notice(Notice::VoiceNotFound(
                    self.library.designated_name().to_string(),
                )),
            }),
            Trigger::Mention => {
                let files = match self.library.list().await? {
                    Listing::Missing => {
                        return Ok(TriggerOutcome::Notice(Notice::DirectoryMissing))
                    }
                    Listing::Files(files) => files,
                };

                let picked = voices::choose(&files, &mut rand::thread_rng()).cloned();
                Ok(match picked {
                    Some(path) => TriggerOutcome::Random(path),
                    None => TriggerOutcome::Notice(Notice::NoVoiceFiles),
                })
            }
            Trigger::Silent => Ok(TriggerOutcome::Ignore),
        }
    }

    fn classify(&self, text: &str, reply_to_bot: bool) -> Trigger {
        let text = normalize(text);
        if text == self.trigger {
            Trigger::Exact
        } else if text.contains(&self.trigger) || reply_to_bot {
            Trigger::Mention
        } else {
            Trigger::Silent
        }
    }
}

/// Lower-case and trim, the form trigger matching works on.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::Path;

    const BOT_ID: u64 = 4242;

    fn message(text: Option<&str>, reply_to: Option<u64>) -> IncomingMessage {
        IncomingMessage {
            user_id: 1,
            user_name: "alice".to_string(),
            chat_id: -100,
            chat_type: "group".to_string(),
            text: text.map(str::to_string),
            reply_to_user_id: reply_to,
        }
    }

    fn responder(dir: &Path) -> Responder {
        Responder::new(VoiceLibrary::new(dir, "ogg", "ben.ogg"), "ben")
    }

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"OggS").unwrap();
    }

    #[tokio::test]
    async fn test_exact_trigger_sends_designated() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "ben.ogg");
        touch(tmp.path(), "other.ogg");
        let r = responder(tmp.path());

        for text in ["ben", "BEN", "  Ben \n"] {
            let outcome = r.respond(&message(Some(text), None), BOT_ID).await.unwrap();
            assert_eq!(
                outcome,
                TriggerOutcome::Specific(tmp.path().join("ben.ogg")),
                "text {:?}",
                text
            );
        }
    }

    #[tokio::test]
    async fn test_exact_trigger_without_designated_file() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.ogg");
        let r = responder(tmp.path());

        let outcome = r.respond(&message(Some("ben"), None), BOT_ID).await.unwrap();
        assert_eq!(
            outcome,
            TriggerOutcome::Notice(Notice::VoiceNotFound("ben.ogg".to_string()))
        );
    }

    #[tokio::test]
    async fn test_exact_trigger_empty_directory_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let r = responder(tmp.path());

        let outcome = r.respond(&message(Some("ben"), None), BOT_ID).await.unwrap();
        assert!(matches!(
            outcome,
            TriggerOutcome::Notice(Notice::VoiceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mention_picks_from_directory() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.ogg");
        touch(tmp.path(), "b.ogg");
        let r = responder(tmp.path());

        let expected: HashSet<PathBuf> =
            [tmp.path().join("a.ogg"), tmp.path().join("b.ogg")].into();
        let mut seen = HashSet::new();
        for _ in 0..200 {
            match r
                .respond(&message(Some("hey ben whats up"), None), BOT_ID)
                .await
                .unwrap()
            {
                TriggerOutcome::Random(path) => {
                    assert!(expected.contains(&path));
                    seen.insert(path);
                }
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_mention_is_substring_match() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.ogg");
        let r = responder(tmp.path());

        let outcome = r
            .respond(&message(Some("BENjamin is here"), None), BOT_ID)
            .await
            .unwrap();
        assert_eq!(outcome, TriggerOutcome::Random(tmp.path().join("a.ogg")));
    }

    #[tokio::test]
    async fn test_mention_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let r = responder(&tmp.path().join("gone"));

        let outcome = r.respond(&message(Some("hi ben"), None), BOT_ID).await.unwrap();
        assert_eq!(outcome, TriggerOutcome::Notice(Notice::DirectoryMissing));
    }

    #[tokio::test]
    async fn test_mention_empty_directory() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "readme.txt");
        let r = responder(tmp.path());

        let outcome = r.respond(&message(Some("hi ben"), None), BOT_ID).await.unwrap();
        assert_eq!(outcome, TriggerOutcome::Notice(Notice::NoVoiceFiles));
    }

    #[tokio::test]
    async fn test_no_trigger_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.ogg");
        let r = responder(tmp.path());

        for text in [Some("hello there"), Some(""), None] {
            let outcome = r.respond(&message(text, None), BOT_ID).await.unwrap();
            assert_eq!(outcome, TriggerOutcome::Ignore);
        }

        // Replying to someone else is not a trigger
        let outcome = r
            .respond(&message(Some("hello"), Some(7)), BOT_ID)
            .await
            .unwrap();
        assert_eq!(outcome, TriggerOutcome::Ignore);
    }

    #[tokio::test]
    async fn test_reply_to_bot_always_responds() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.ogg");
        let r = responder(tmp.path());

        for text in [Some("lol"), Some(""), None] {
            let outcome = r
                .respond(&message(text, Some(BOT_ID)), BOT_ID)
                .await
                .unwrap();
            assert_eq!(outcome, TriggerOutcome::Random(tmp.path().join("a.ogg")));
        }
    }

    #[test]
    fn test_notice_text_names_designated_file() {
        assert_eq!(
            Notice::VoiceNotFound("ben.ogg".to_string()).text(),
            "⚠️ 'ben.ogg' not found in voices directory."
        );
    }

    #[tokio::test]
    async fn test_delivery_sends_present_file() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.ogg");
        let r = responder(tmp.path());

        let outcome = r.respond(&message(Some("hi ben"), None), BOT_ID).await;
        assert_eq!(
            delivery(outcome).await,
            Delivery::Voice(tmp.path().join("a.ogg"))
        );
    }

    #[tokio::test]
    async fn test_delivery_file_vanished_after_listing() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.ogg");
        let r = responder(tmp.path());

        let outcome = r.respond(&message(Some("hi ben"), None), BOT_ID).await;
        std::fs::remove_file(tmp.path().join("a.ogg")).unwrap();
        assert_eq!(
            delivery(outcome).await,
            Delivery::Notice(Notice::FileNotFound)
        );
    }

    #[tokio::test]
    async fn test_delivery_designated_vanished() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "ben.ogg");
        let r = responder(tmp.path());

        let outcome = r.respond(&message(Some("ben"), None), BOT_ID).await;
        std::fs::remove_file(tmp.path().join("ben.ogg")).unwrap();
        assert_eq!(
            delivery(outcome).await,
            Delivery::Notice(Notice::FileNotFound)
        );
    }

    #[tokio::test]
    async fn test_delivery_error_becomes_general_error() {
        let outcome = Err(anyhow::anyhow!("listing exploded"));
        assert_eq!(
            delivery(outcome).await,
            Delivery::Notice(Notice::GeneralError)
        );
    }

    #[tokio::test]
    async fn test_delivery_passes_notices_and_silence() {
        assert_eq!(
            delivery(Ok(TriggerOutcome::Ignore)).await,
            Delivery::Nothing
        );
        assert_eq!(
            delivery(Ok(TriggerOutcome::Notice(Notice::NoVoiceFiles))).await,
            Delivery::Notice(Notice::NoVoiceFiles)
        );
    }

    #[test]
    fn test_failure_notice_mapping() {
        let generic = anyhow::anyhow!("Bad Request: can't parse entities");
        assert_eq!(failure_notice(&generic), Notice::GeneralError);

        let missing = anyhow::Error::new(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ))
        .context("Failed to send voice voices/a.ogg");
        assert_eq!(failure_notice(&missing), Notice::FileNotFound);

        let denied = anyhow::Error::new(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "nope",
        ));
        assert_eq!(failure_notice(&denied), Notice::GeneralError);
    }
}
