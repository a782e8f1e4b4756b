//! Injectable decision providers.
//!
//! Every point where the compiler would stop and ask the operator
//! something goes through the [`Prompter`] trait, so the negotiation state
//! machine and the image-selection menu are identical in interactive and
//! unattended runs. [`InteractivePrompter`] reads stdin;
//! [`AutoPrompter`] applies first-viable-choice defaults and never blocks.

use std::io::{self, BufRead, Write};

use crate::docker::{MacvlanMode, MacvlanNetwork};

/// Outcome of the existing-network menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkChoice {
    /// Index into the candidate list.
    Existing(usize),
    CreateNew,
}

/// Failure of an interactive prompt.
///
/// Invalid answers re-prompt; only a closed input stream is an error,
/// since no further answer can ever arrive.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Input stream closed before a choice was made. Rerun with --auto for unattended runs")]
    Eof,
}

/// A provider of answers at the compiler's decision points.
pub trait Prompter {
    /// Pick one of the existing macvlan networks or ask for a new one.
    /// Only called when `candidates` is non-empty; the menu has already
    /// been printed.
    fn pick_network(&self, candidates: &[MacvlanNetwork]) -> NetworkChoice;

    /// Choose the forwarding mode for a network about to be created.
    fn pick_mode(&self) -> MacvlanMode;

    /// Yes/no confirmation, used by the negotiator's safety gate.
    fn confirm(&self, question: &str) -> bool;

    /// Pick an image from a non-empty list; the menu has already been
    /// printed.
    fn pick_image(&self, images: &[String]) -> usize;
}

/// Stdin-backed prompter for interactive runs.
///
/// Invalid input re-prompts rather than failing; the prompts block with no
/// timeout. A closed stdin terminates the run with a diagnostic, since
/// looping on a stream that can never answer again would spin forever.
pub struct InteractivePrompter;

impl InteractivePrompter {
    fn read_answer(input: &mut dyn BufRead, prompt: &str) -> Result<String, PromptError> {
        print!("{}", prompt);
        let _ = io::stdout().flush();
        let mut line = String::new();
        match input.read_line(&mut line) {
            // Zero bytes means EOF, not an empty answer.
            Ok(0) | Err(_) => Err(PromptError::Eof),
            Ok(_) => Ok(line.trim().to_string()),
        }
    }

    fn pick_index_from(
        input: &mut dyn BufRead,
        prompt: &str,
        count: usize,
    ) -> Result<usize, PromptError> {
        loop {
            let answer = Self::read_answer(input, prompt)?;
            if let Ok(choice) = answer.parse::<usize>() {
                if (1..=count).contains(&choice) {
                    return Ok(choice - 1);
                }
            }
            println!("Invalid choice. Try again.");
        }
    }

    fn pick_network_from(
        input: &mut dyn BufRead,
        count: usize,
    ) -> Result<NetworkChoice, PromptError> {
        loop {
            let answer = Self::read_answer(input, "Choose one or [C]reate new: ")?.to_lowercase();
            if answer == "c" {
                return Ok(NetworkChoice::CreateNew);
            }
            if let Ok(choice) = answer.parse::<usize>() {
                if (1..=count).contains(&choice) {
                    return Ok(NetworkChoice::Existing(choice - 1));
                }
            }
            println!("Invalid choice. Try again.");
        }
    }

    fn pick_mode_from(input: &mut dyn BufRead) -> Result<MacvlanMode, PromptError> {
        let answer = Self::read_answer(
            input,
            "Choose mode [bridge/private/vepa/passthru] (default: bridge): ",
        )?
        .to_lowercase();
        Ok(answer.parse().unwrap_or(MacvlanMode::Bridge))
    }

    fn confirm_from(input: &mut dyn BufRead, question: &str) -> Result<bool, PromptError> {
        let answer = Self::read_answer(input, &format!("{} [y/N]: ", question))?;
        Ok(answer.to_lowercase() == "y")
    }

    fn or_abort<T>(result: Result<T, PromptError>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        }
    }
}

impl Prompter for InteractivePrompter {
    fn pick_network(&self, candidates: &[MacvlanNetwork]) -> NetworkChoice {
        Self::or_abort(Self::pick_network_from(
            &mut io::stdin().lock(),
            candidates.len(),
        ))
    }

    fn pick_mode(&self) -> MacvlanMode {
        Self::or_abort(Self::pick_mode_from(&mut io::stdin().lock()))
    }

    fn confirm(&self, question: &str) -> bool {
        Self::or_abort(Self::confirm_from(&mut io::stdin().lock(), question))
    }

    fn pick_image(&self, images: &[String]) -> usize {
        Self::or_abort(Self::pick_index_from(
            &mut io::stdin().lock(),
            "Enter the number of the image you want to use: ",
            images.len(),
        ))
    }
}

/// First-viable-choice prompter for `--auto` and dry runs.
pub struct AutoPrompter;

impl Prompter for AutoPrompter {
    fn pick_network(&self, _candidates: &[MacvlanNetwork]) -> NetworkChoice {
        NetworkChoice::Existing(0)
    }

    fn pick_mode(&self) -> MacvlanMode {
        MacvlanMode::Bridge
    }

    fn confirm(&self, _question: &str) -> bool {
        true
    }

    fn pick_image(&self, _images: &[String]) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn input(answers: &str) -> Cursor<Vec<u8>> {
        Cursor::new(answers.as_bytes().to_vec())
    }

    #[test]
    fn test_pick_index_accepts_valid_choice() {
        let mut stdin = input("2\n");
        assert_eq!(
            InteractivePrompter::pick_index_from(&mut stdin, "> ", 3).unwrap(),
            1
        );
    }

    #[test]
    fn test_pick_index_reprompts_on_invalid_input() {
        let mut stdin = input("zero\n9\n1\n");
        assert_eq!(
            InteractivePrompter::pick_index_from(&mut stdin, "> ", 3).unwrap(),
            0
        );
    }

    #[test]
    fn test_pick_index_errors_on_closed_input() {
        let mut stdin = input("");
        assert!(matches!(
            InteractivePrompter::pick_index_from(&mut stdin, "> ", 3),
            Err(PromptError::Eof)
        ));
    }

    #[test]
    fn test_pick_index_errors_when_input_closes_after_bad_answer() {
        // One garbage line and then EOF must not loop forever.
        let mut stdin = input("nope\n");
        assert!(matches!(
            InteractivePrompter::pick_index_from(&mut stdin, "> ", 3),
            Err(PromptError::Eof)
        ));
    }

    #[test]
    fn test_pick_network_create_and_existing() {
        let mut stdin = input("c\n");
        assert_eq!(
            InteractivePrompter::pick_network_from(&mut stdin, 2).unwrap(),
            NetworkChoice::CreateNew
        );

        let mut stdin = input("2\n");
        assert_eq!(
            InteractivePrompter::pick_network_from(&mut stdin, 2).unwrap(),
            NetworkChoice::Existing(1)
        );
    }

    #[test]
    fn test_pick_network_errors_on_closed_input() {
        let mut stdin = input("");
        assert!(matches!(
            InteractivePrompter::pick_network_from(&mut stdin, 2),
            Err(PromptError::Eof)
        ));
    }

    #[test]
    fn test_pick_mode_defaults_on_blank_or_unknown() {
        let mut stdin = input("\n");
        assert_eq!(
            InteractivePrompter::pick_mode_from(&mut stdin).unwrap(),
            MacvlanMode::Bridge
        );

        let mut stdin = input("trunk\n");
        assert_eq!(
            InteractivePrompter::pick_mode_from(&mut stdin).unwrap(),
            MacvlanMode::Bridge
        );

        let mut stdin = input("private\n");
        assert_eq!(
            InteractivePrompter::pick_mode_from(&mut stdin).unwrap(),
            MacvlanMode::Private
        );
    }

    #[test]
    fn test_confirm_only_on_explicit_yes() {
        let mut stdin = input("y\n");
        assert!(InteractivePrompter::confirm_from(&mut stdin, "?").unwrap());

        let mut stdin = input("\n");
        assert!(!InteractivePrompter::confirm_from(&mut stdin, "?").unwrap());

        let mut stdin = input("");
        assert!(matches!(
            InteractivePrompter::confirm_from(&mut stdin, "?"),
            Err(PromptError::Eof)
        ));
    }
}
