//! Pull individual tactic commands out of a reference solution block.
//!
//! Level solutions interleave tactics with `Hint "..."` blocks (which may
//! span several lines), bullet markers and comments. Only the tactic lines
//! are kept.

/// Bullet and indentation characters stripped from the front of each line.
const BULLET: char = '·';

/// Extract the tactic commands of a solution, in order.
pub fn extract_commands(solution: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut in_hint = false;
    let mut pending_hint = false;

    for raw_line in solution.lines() {
        let stripped = raw_line.trim();
        if stripped.is_empty() {
            continue;
        }
        let clean = stripped.trim_start_matches(|c| c == BULLET || c == ' ');
        if clean.is_empty() {
            continue;
        }
        if clean.starts_with("Hint") {
            in_hint = toggle_quote_state(in_hint, raw_line);
            // `Hint` on its own line: the quoted text starts on the next one.
            pending_hint = !raw_line.contains('"');
            continue;
        }
        if pending_hint {
            in_hint = toggle_quote_state(in_hint, raw_line);
            pending_hint = false;
            continue;
        }
        if in_hint {
            in_hint = toggle_quote_state(in_hint, raw_line);
            continue;
        }
        if clean.starts_with("--") {
            continue;
        }
        commands.push(clean.to_string());
    }
    commands
}

/// Whether a command looks like a tactic invocation (lowercase identifier first).
///
/// Filters out stray term syntax and closing punctuation in solution blocks.
pub fn is_tactic_like(command: &str) -> bool {
    command
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() && c.is_lowercase())
}

/// Flip `inside` once per unescaped double quote on the line.
fn toggle_quote_state(inside: bool, line: &str) -> bool {
    let mut state = inside;
    let mut escaped = false;
    for c in line.chars() {
        if c == '\\' && !escaped {
            escaped = true;
            continue;
        }
        if c == '"' && !escaped {
            state = !state;
        } else {
            escaped = false;
        }
    }
    state
}
