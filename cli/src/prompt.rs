//! Calibration prompts answered on the console.

use crossbeam_channel::{select, Receiver};
use dnacap_core::{CoreError, CoreResult, Prompter};
use std::io::Write;

/// Reads answers from the console line channel. Ctrl-C, `q` or a closed
/// stdin abort the calibration.
pub struct ConsolePrompter<'a> {
    lines: &'a Receiver<String>,
    interrupts: &'a Receiver<()>,
}

impl<'a> ConsolePrompter<'a> {
    pub fn new(lines: &'a Receiver<String>, interrupts: &'a Receiver<()>) -> Self {
        Self { lines, interrupts }
    }

    fn next_line(&self) -> CoreResult<String> {
        select! {
            recv(self.lines) -> line => {
                let line = line.map_err(|_| CoreError::Aborted)?;
                let line = line.trim().to_string();
                if is_abort(&line) {
                    return Err(CoreError::Aborted);
                }
                Ok(line)
            }
            recv(self.interrupts) -> _ => Err(CoreError::Aborted),
        }
    }
}

fn is_abort(answer: &str) -> bool {
    answer.eq_ignore_ascii_case("q") || answer.eq_ignore_ascii_case("quit")
}

fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

fn show(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

impl Prompter for ConsolePrompter<'_> {
    fn notify(&self, message: &str) -> CoreResult<()> {
        println!("{message}");
        Ok(())
    }

    fn wait_for_confirm(&self, message: &str) -> CoreResult<()> {
        show(&format!("{message}, then press Enter (q to abort) "));
        self.next_line().map(drop)
    }

    fn ask_yes_no(&self, question: &str) -> CoreResult<bool> {
        show(&format!("{question} [y/n] "));
        loop {
            if let Some(answer) = parse_yes_no(&self.next_line()?) {
                return Ok(answer);
            }
            show("Please answer y or n: ");
        }
    }
}
