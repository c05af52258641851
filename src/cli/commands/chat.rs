//! Interactive chat about one video.

use super::resolve_video_id;
use crate::assistant::VideoAssistant;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::conversation::ChatMessage;
use crate::error::Result;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Turns kept in the session before the oldest are dropped.
const MAX_HISTORY_MESSAGES: usize = 30;

/// Run the interactive chat command.
pub async fn run_chat(video: &str, settings: Settings) -> anyhow::Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let video_id = resolve_video_id(video)?;
    let assistant = VideoAssistant::new(&settings)?;
    let mut chat = ChatSession::new(assistant, &video_id);

    println!("\n{}", style(format!("Vidask Chat ({})", video_id)).bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            chat.clear_history();
            Output::info("Conversation history cleared.");
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let result = chat.send_message(input).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                println!("\n{} {}\n", style("Vidask:").cyan().bold(), response);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}

/// Chat session that owns the conversation history.
struct ChatSession {
    assistant: VideoAssistant,
    video_id: String,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    fn new(assistant: VideoAssistant, video_id: &str) -> Self {
        Self {
            assistant,
            video_id: video_id.to_string(),
            history: Vec::new(),
        }
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Ask a question with the history so far, recording the exchange on success.
    async fn send_message(&mut self, question: &str) -> Result<String> {
        let answer = self
            .assistant
            .answer(&self.video_id, question, &self.history)
            .await?;

        self.history.push(ChatMessage::user(question));
        self.history.push(ChatMessage::assistant(answer.clone()));
        self.trim_history(MAX_HISTORY_MESSAGES);
        debug!("Chat history now has {} messages", self.history.len());

        Ok(answer)
    }

    /// Drop the oldest turns beyond `max_messages`.
    fn trim_history(&mut self, max_messages: usize) {
        if self.history.len() > max_messages {
            let excess = self.history.len() - max_messages;
            self.history.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::tests::StaticTranscriptProvider;
    use crate::completion::ScriptedCompletion;
    use crate::config::Prompts;
    use crate::error::VidaskError;
    use std::sync::Arc;

    fn session(scripted: Arc<ScriptedCompletion>) -> ChatSession {
        let provider = Arc::new(StaticTranscriptProvider::new("vid", &["a talk about ferris"]));
        let assistant = VideoAssistant::with_components(
            &Settings::default(),
            Prompts::default(),
            provider,
            scripted,
            None,
        );
        ChatSession::new(assistant, "vid")
    }

    #[tokio::test]
    async fn test_history_grows_and_is_resupplied() {
        let scripted = Arc::new(ScriptedCompletion::new());
        scripted.push_reply("A crab.");
        scripted.push_reply("Orange.");
        let mut chat = session(scripted.clone());

        chat.send_message("Who is Ferris?").await.unwrap();
        chat.send_message("What color?").await.unwrap();

        assert_eq!(chat.history.len(), 4);
        let calls = scripted.calls();
        assert_eq!(calls[0].messages.len(), 1);
        assert_eq!(calls[1].messages[0], ChatMessage::user("Who is Ferris?"));
        assert_eq!(calls[1].messages[1], ChatMessage::assistant("A crab."));
    }

    #[tokio::test]
    async fn test_failed_turn_not_recorded() {
        let scripted = Arc::new(ScriptedCompletion::new());
        scripted.push_error(VidaskError::completion("down"));
        let mut chat = session(scripted);

        assert!(chat.send_message("Who is Ferris?").await.is_err());
        assert!(chat.history.is_empty());
    }

    #[tokio::test]
    async fn test_clear_and_trim() {
        let scripted = Arc::new(ScriptedCompletion::with_responder(|_| Ok("ok".to_string())));
        let mut chat = session(scripted);

        for i in 0..20 {
            chat.send_message(&format!("q{}", i)).await.unwrap();
        }
        assert_eq!(chat.history.len(), MAX_HISTORY_MESSAGES);
        assert_eq!(chat.history[0], ChatMessage::user("q5"));

        chat.clear_history();
        assert!(chat.history.is_empty());
    }
}
