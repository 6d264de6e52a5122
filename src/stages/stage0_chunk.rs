use crate::models::{TurnRecord, Window, WindowConfig};

/// Perform Stage 0: split the turn sequence into overlapping windows
///
/// Windows hold `config.size` turns and consecutive windows share
/// `config.overlap` turns. Chunking stops once a window reaches the end of
/// the sequence, or when the turns left after the next stride number
/// `overlap` or fewer. With a clamped stride that tail is never emitted.
pub fn create_chunks(turns: &[TurnRecord], config: &WindowConfig) -> Vec<Window> {
    if turns.is_empty() {
        return Vec::new();
    }

    let total = turns.len();
    let size = config.size.max(1);
    let stride = config.stride();

    let mut windows = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + size).min(total);
        windows.push(build_window(windows.len(), &turns[start..end]));

        if end >= total {
            break;
        }

        let next_start = start + stride;
        if total.saturating_sub(next_start) <= config.overlap {
            break;
        }
        start = next_start;
    }

    windows
}

fn build_window(index: usize, turns: &[TurnRecord]) -> Window {
    Window {
        index,
        first_turn: turns.first().map(|t| t.index).unwrap_or_default(),
        last_turn: turns.last().map(|t| t.index).unwrap_or_default(),
        text: render_turns(turns),
    }
}

/// Render turns one per line as `[Q1] 수사관: text`, without a trailing newline
pub fn render_turns(turns: &[TurnRecord]) -> String {
    turns
        .iter()
        .map(|t| format!("[{}{}] {}: {}", t.role.tag(), t.index, t.speaker, t.text))
        .collect::<Vec<_>>()
        .join("\n")
}
