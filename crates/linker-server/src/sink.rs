//! Terminal rendering of a chat send.

use std::io::Write;

use linker_stream::{ChatSink, PostCompletion};

/// Prints the loading indicator, progress and the final answer to stdout.
/// Remembers the last assistant-visible message so it can be kept in history.
#[derive(Default)]
pub struct TerminalSink {
    last_message: Option<String>,
    progress_shown: bool,
}

impl TerminalSink {
    pub fn take_last_message(&mut self) -> Option<String> {
        self.last_message.take()
    }

    fn end_progress_line(&mut self) {
        if self.progress_shown {
            println!();
            self.progress_shown = false;
        }
    }
}

impl ChatSink for TerminalSink {
    fn loading(&mut self, text: &str) {
        println!("{}", text);
    }

    fn progress(&mut self, status: &str) {
        print!("\r\x1b[2K  {}", status);
        let _ = std::io::stdout().flush();
        self.progress_shown = true;
    }

    fn result(&mut self, text: &str) {
        self.end_progress_line();
        println!("{}", text);
        self.last_message = Some(text.to_string());
    }

    fn error(&mut self, message: &str) {
        self.end_progress_line();
        eprintln!("Error: {}", message);
        self.last_message = Some(format!("Error: {}", message));
    }

    fn loading_finished(&mut self) {
        self.end_progress_line();
    }

    fn post_completion(&mut self, action: PostCompletion) {
        match action {
            PostCompletion::ReloadPage { notice, .. } => println!("{}", notice),
        }
    }
}
