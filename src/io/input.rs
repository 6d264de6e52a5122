use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::models::{renumber_turns, validate_turns, Role, TurnRecord};

/// A turn starts with `문` (question) or `답` (answer), optionally followed by a colon
static TURN_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(문|답)\s*:?\s*(.*)$").expect("regex for turn start"));

/// Read extracted transcript text and segment it into turns
pub fn parse_transcript_file(path: &Path) -> Result<Vec<TurnRecord>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    Ok(parse_transcript_text(&content))
}

/// Segment raw transcript text into question/answer turns
///
/// Lines are trimmed and blank lines ignored. A line that does not open a new
/// turn is a continuation and is space-joined onto the previous turn's text;
/// continuation lines before the first turn are dropped.
pub fn parse_transcript_text(text: &str) -> Vec<TurnRecord> {
    let mut turns: Vec<TurnRecord> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match TURN_START.captures(line) {
            Some(caps) => {
                let role = if &caps[1] == "문" {
                    Role::Question
                } else {
                    Role::Answer
                };
                let body = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
                turns.push(TurnRecord::new(turns.len() + 1, role, body));
            }
            None => {
                if let Some(current) = turns.last_mut() {
                    current.text.push(' ');
                    current.text.push_str(line);
                }
            }
        }
    }

    turns
}

/// Load a reviewed turns file (JSON array of turn records)
///
/// The file may have been edited by hand. With `renumber` the turns are
/// renumbered from 1 and speakers re-derived first, which repairs inserted
/// or deleted rows; the sequence invariants are checked either way.
pub fn load_turns_file(path: &Path, renumber: bool) -> Result<Vec<TurnRecord>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    let mut turns: Vec<TurnRecord> =
        serde_json::from_str(&content).context("Failed to parse turns JSON")?;
    if renumber {
        renumber_turns(&mut turns);
    }
    validate_turns(&turns).with_context(|| {
        format!("Invalid turn sequence in {:?} (use --renumber to repair edits)", path)
    })?;
    Ok(turns)
}

/// Write turns as pretty JSON for review
pub fn write_turns_file(turns: &[TurnRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    serde_json::to_writer_pretty(file, turns).context("Failed to write JSON")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Speaker;

    #[test]
    fn test_basic_qa_parsing() {
        let turns = parse_transcript_text("문: 이름이 무엇입니까?\n답: 홍길동입니다.");

        assert_eq!(
            turns,
            vec![
                TurnRecord::new(1, Role::Question, "이름이 무엇입니까?"),
                TurnRecord::new(2, Role::Answer, "홍길동입니다."),
            ]
        );
        assert_eq!(turns[0].speaker, Speaker::Interrogator);
        assert_eq!(turns[1].speaker, Speaker::Subject);
    }

    #[test]
    fn test_qa_without_colon() {
        let turns = parse_transcript_text("문 이름이 무엇입니까?\n답 홍길동입니다.");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "이름이 무엇입니까?");
    }

    #[test]
    fn test_continuation_merge() {
        let text = "문: 당시 상황을 설명해주세요.\n답: 그날 저는 집에 있었습니다.\n아무것도 하지 않았습니다.\n그냥 TV를 봤습니다.";
        let turns = parse_transcript_text(text);

        assert_eq!(turns.len(), 2);
        assert_eq!(
            turns[1].text,
            "그날 저는 집에 있었습니다. 아무것도 하지 않았습니다. 그냥 TV를 봤습니다."
        );
    }

    #[test]
    fn test_blank_lines_and_leading_noise() {
        let text = "피의자 신문조서\n\n   문 :  질문1?  \n\n답: 답변1.\n";
        let turns = parse_transcript_text(text);

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "질문1?");
        assert_eq!(turns[1].text, "답변1.");
    }

    #[test]
    fn test_sequential_indices() {
        let text = ["문: 질문1?", "답: 답변1.", "문: 질문2?", "답: 답변2.", "문: 질문3?", "답: 답변3."].join("\n");
        let turns = parse_transcript_text(&text);

        assert_eq!(turns.len(), 6);
        assert_eq!(turns[0].index, 1);
        assert_eq!(turns[5].index, 6);
        assert!(validate_turns(&turns).is_ok());
    }

    #[test]
    fn test_empty_text() {
        assert!(parse_transcript_text("").is_empty());
        assert!(parse_transcript_text("no turns here\nat all").is_empty());
    }

    #[test]
    fn test_turns_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review").join("turns.json");
        let turns = parse_transcript_text("문: 테스트\n답: 응답");

        write_turns_file(&turns, &path).unwrap();
        let loaded = load_turns_file(&path, false).unwrap();

        assert_eq!(loaded, turns);
    }

    #[test]
    fn test_load_rejects_broken_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turns.json");
        std::fs::write(
            &path,
            r#"[{"index":1,"role":"Q","speaker":"interrogator","text":"q"},
                {"index":5,"role":"A","speaker":"subject","text":"a"}]"#,
        )
        .unwrap();

        let err = load_turns_file(&path, false).unwrap_err();
        assert!(format!("{:#}", err).contains("expected 2"));
    }

    #[test]
    fn test_load_renumbers_edited_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turns.json");
        std::fs::write(
            &path,
            r#"[{"index":1,"role":"Q","speaker":"interrogator","text":"q"},
                {"index":5,"role":"A","speaker":"interrogator","text":"a"},
                {"index":5,"role":"Q","speaker":"interrogator","text":"inserted"}]"#,
        )
        .unwrap();

        let turns = load_turns_file(&path, true).unwrap();

        let indices: Vec<usize> = turns.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(turns[1].speaker, Speaker::Subject);
        assert_eq!(turns[2].text, "inserted");
    }
}
