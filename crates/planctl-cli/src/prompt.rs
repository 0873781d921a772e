//! Interactive confirmation for guarded lifecycle actions.
//!
//! Renders a guard prompt on stdout and reads the answer from stdin. Plain
//! confirmations take y/yes; type-to-confirm prompts require the plan name
//! typed back exactly.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use planctl_core::guard::{ConfirmationKind, ConfirmationPrompt};

/// The text shown before reading input, ending with the answer line.
pub(crate) fn render(prompt: &ConfirmationPrompt) -> String {
    let answer_line = match &prompt.kind {
        ConfirmationKind::Confirm => format!("{} [y/N] ", prompt.confirm_label),
        ConfirmationKind::TypeToConfirm { expected } => {
            format!("Type \"{expected}\" to confirm ({}): ", prompt.confirm_label)
        }
    };
    format!("{}\n{}\n{}", prompt.title, prompt.message, answer_line)
}

/// Show `prompt` and read the user's answer.
///
/// `assume_yes` (the `--yes` flag) skips the prompt entirely, including
/// type-to-confirm ones.
pub(crate) fn confirm(prompt: &ConfirmationPrompt, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    print!("{}", render(prompt));
    io::stdout().flush().context("failed to flush stdout")?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("failed to read confirmation input")?;

    Ok(answer_accepts(prompt, &input))
}

fn answer_accepts(prompt: &ConfirmationPrompt, input: &str) -> bool {
    match &prompt.kind {
        ConfirmationKind::Confirm => {
            matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        }
        ConfirmationKind::TypeToConfirm { .. } => prompt.accepts(input),
    }
}
