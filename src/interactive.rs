//! Read-eval loop for saving one page at a time from the terminal.

use crate::archiver::{interactive_file_stem, Archiver};
use crate::browser::BrowserSession;
use crate::dom::LiveDom;
use crate::error::{Result, ScribeError};
use crate::normalizer::Normalizer;
use crate::pacing::{Pacer, Situation};
use chrono::Local;
use console::Term;
use dialoguer::Input;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{error, info, warn};
use url::Url;

const WELCOME: &str = "Enter a URL to save as an e-reader PDF. Type 'q' or 'quit' to exit.";
const FALLBACK_TITLE: &str = "webpage";

/// Source of URLs typed by the user. `Ok(None)` means input is exhausted.
pub trait Prompt {
    fn read_url(&mut self) -> Result<Option<String>>;
}

/// Clears the terminal and asks for a URL on each round.
pub struct TerminalPrompt {
    term: Term,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompt for TerminalPrompt {
    fn read_url(&mut self) -> Result<Option<String>> {
        // Not a terminal when piped; clearing is cosmetic.
        let _ = self.term.clear_screen();
        self.term
            .write_line(WELCOME)
            .map_err(|e| ScribeError::Prompt(e.to_string()))?;

        match Input::<String>::new()
            .with_prompt("URL")
            .allow_empty(true)
            .interact_text_on(&self.term)
        {
            Ok(line) => Ok(Some(line)),
            Err(dialoguer::Error::IO(e)) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(ScribeError::Prompt(e.to_string())),
        }
    }
}

pub fn is_quit(input: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit")
}

/// Accepts full http(s) URLs and bare hosts such as `example.com/story`.
pub fn parse_input_url(input: &str) -> Result<Url> {
    let input = input.trim();
    let parsed = match Url::parse(input) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", input))
            .map_err(|e| invalid_input(input, e.to_string()))?,
        Err(e) => return Err(invalid_input(input, e.to_string())),
    };
    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(parsed),
        _ => Err(invalid_input(input, "only http and https pages can be saved".into())),
    }
}

fn invalid_input(input: &str, reason: String) -> ScribeError {
    ScribeError::Navigation {
        url: input.to_string(),
        reason,
    }
}

pub struct Interactive {
    normalizer: Normalizer,
    archiver: Archiver,
    pacer: Pacer,
}

impl Interactive {
    pub fn new(normalizer: Normalizer, archiver: Archiver, pacer: Pacer) -> Self {
        Self {
            normalizer,
            archiver,
            pacer,
        }
    }

    /// Prompt until the user quits or input ends. A failure on one URL is
    /// logged and the loop carries on. Returns how many PDFs were saved.
    pub async fn run<B, P>(&self, session: &mut B, prompt: &mut P) -> Result<usize>
    where
        B: BrowserSession + ?Sized,
        P: Prompt + ?Sized,
    {
        let mut saved = 0;
        while let Some(line) = prompt.read_url()? {
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if is_quit(input) {
                break;
            }

            match self.save(session, input).await {
                Ok(path) => {
                    info!("Done: {}", path.display());
                    saved += 1;
                    self.pacer.pause(Situation::AfterSave).await;
                }
                Err(e) => error!("Could not save {}: {}", input, e),
            }
        }
        Ok(saved)
    }

    async fn save<B: BrowserSession + ?Sized>(&self, session: &mut B, input: &str) -> Result<PathBuf> {
        let url = parse_input_url(input)?;
        info!("Opening {}", url);
        session.navigate(url.as_str()).await?;

        let title = match session.title().await {
            Ok(Some(t)) if !t.trim().is_empty() => t,
            Ok(_) => FALLBACK_TITLE.to_string(),
            Err(e) => {
                warn!("Could not read page title: {}", e);
                FALLBACK_TITLE.to_string()
            }
        };

        let report = self
            .normalizer
            .normalize(&mut LiveDom::new(&mut *session))
            .await?;
        info!(
            "Cleaned page ({} mode): removed {}, hidden {}",
            self.normalizer.mode(),
            report.removed,
            report.hidden
        );

        let stem = interactive_file_stem(Local::now(), &title);
        self.archiver.archive(session, &stem).await
    }
}
