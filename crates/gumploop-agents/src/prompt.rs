//! Wrapping outgoing messages with correlation tokens.

use gumploop_models::{AgentKind, TokenPair};

/// Rewrites characters the UX reviewer CLI treats as commands.
///
/// A leading `/` or `!` on any line starts a slash or shell command, and
/// `@` anywhere triggers a file include.
pub fn neutralize(text: &str) -> String {
    text.lines()
        .map(|line| {
            let line = line.replace('@', "(at)");
            match line.trim_start().chars().next() {
                Some('/') | Some('!') => format!(" {}", line),
                _ => line,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the full message pasted into an agent's input.
///
/// The request token leads the message; the agent is told to finish its
/// reply with the acknowledgment token, which is what completion
/// detection looks for.
pub fn wrap_message(kind: AgentKind, text: &str, tokens: &TokenPair) -> String {
    let body = match kind {
        AgentKind::UxReviewer => neutralize(text),
        _ => text.to_string(),
    };
    format!(
        "[{request}]\n{body}\n\nWhen you have completely finished, end your final reply with this exact line:\n{ack}",
        request = tokens.request,
        body = body.trim_end(),
        ack = tokens.ack,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_puts_tokens_at_both_ends() {
        let tokens = TokenPair::generate();
        let msg = wrap_message(AgentKind::Implementer, "Write plan.md\n", &tokens);
        assert!(msg.starts_with(&format!("[{}]\n", tokens.request)));
        assert!(msg.ends_with(tokens.ack.as_str()));
        assert!(msg.contains("Write plan.md\n\nWhen you have"));
    }

    #[test]
    fn test_neutralize_commands_and_mentions() {
        let out = neutralize("/review now\n  !rm -rf x\nmail me@example.com\nplain");
        assert_eq!(out, " /review now\n   !rm -rf x\nmail me(at)example.com\nplain");
    }

    #[test]
    fn test_only_ux_reviewer_is_neutralized() {
        let tokens = TokenPair::generate();
        let text = "/compact\nsee @plan.md";
        let codex = wrap_message(AgentKind::TechReviewer, text, &tokens);
        assert!(codex.contains("\n/compact\nsee @plan.md"));
        let gemini = wrap_message(AgentKind::UxReviewer, text, &tokens);
        assert!(gemini.contains("\n /compact\nsee (at)plan.md"));
    }
}
