use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether a turn asks or answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Q", alias = "question")]
    Question,
    #[serde(rename = "A", alias = "answer")]
    Answer,
}

impl Role {
    /// Single-letter tag used in citations and rendered windows
    pub fn tag(self) -> char {
        match self {
            Role::Question => 'Q',
            Role::Answer => 'A',
        }
    }

    /// The speaker implied by this role
    pub fn speaker(self) -> Speaker {
        match self {
            Role::Question => Speaker::Interrogator,
            Role::Answer => Speaker::Subject,
        }
    }
}

/// Who is talking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    #[serde(alias = "수사관")]
    Interrogator,
    #[serde(alias = "피의자")]
    Subject,
}

impl Speaker {
    /// Label used when rendering a window for the model
    pub fn label(self) -> &'static str {
        match self {
            Speaker::Interrogator => "수사관",
            Speaker::Subject => "피의자",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One labeled dialogue turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// 1-based position in the full transcript
    pub index: usize,
    /// Question or answer
    pub role: Role,
    /// Always consistent with `role`
    pub speaker: Speaker,
    /// Utterance text, continuation lines already joined
    pub text: String,
}

impl TurnRecord {
    pub fn new(index: usize, role: Role, text: impl Into<String>) -> Self {
        Self {
            index,
            role,
            speaker: role.speaker(),
            text: text.into(),
        }
    }
}

/// Violations of the turn sequence invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("turn at position {position} has index {found}, expected {expected}")]
    IndexGap {
        position: usize,
        expected: usize,
        found: usize,
    },
    #[error("turn {index} is a {role:?} but is attributed to {speaker:?}")]
    SpeakerMismatch {
        index: usize,
        role: Role,
        speaker: Speaker,
    },
}

/// Check that indices run 1..=L without gaps and that every speaker matches its role
pub fn validate_turns(turns: &[TurnRecord]) -> Result<(), TurnError> {
    for (position, turn) in turns.iter().enumerate() {
        let expected = position + 1;
        if turn.index != expected {
            return Err(TurnError::IndexGap {
                position,
                expected,
                found: turn.index,
            });
        }
        if turn.speaker != turn.role.speaker() {
            return Err(TurnError::SpeakerMismatch {
                index: turn.index,
                role: turn.role,
                speaker: turn.speaker,
            });
        }
    }
    Ok(())
}

/// Restore the invariants after manual edits: renumber from 1 and re-derive speakers from roles
pub fn renumber_turns(turns: &mut [TurnRecord]) {
    for (position, turn) in turns.iter_mut().enumerate() {
        turn.index = position + 1;
        turn.speaker = turn.role.speaker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_speaker() {
        let q = TurnRecord::new(1, Role::Question, "이름이 무엇입니까?");
        let a = TurnRecord::new(2, Role::Answer, "홍길동입니다.");

        assert_eq!(q.speaker, Speaker::Interrogator);
        assert_eq!(a.speaker, Speaker::Subject);
    }

    #[test]
    fn test_validate_detects_gap() {
        let turns = vec![
            TurnRecord::new(1, Role::Question, "q"),
            TurnRecord::new(3, Role::Answer, "a"),
        ];

        assert_eq!(
            validate_turns(&turns),
            Err(TurnError::IndexGap {
                position: 1,
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn test_validate_detects_speaker_mismatch() {
        let mut turns = vec![TurnRecord::new(1, Role::Question, "q")];
        turns[0].speaker = Speaker::Subject;

        assert!(matches!(
            validate_turns(&turns),
            Err(TurnError::SpeakerMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_renumber_repairs_edits() {
        let mut turns = vec![
            TurnRecord::new(4, Role::Question, "q"),
            TurnRecord::new(4, Role::Answer, "a"),
            TurnRecord::new(9, Role::Answer, "a2"),
        ];
        turns[1].speaker = Speaker::Interrogator;

        renumber_turns(&mut turns);

        assert!(validate_turns(&turns).is_ok());
        assert_eq!(turns[2].index, 3);
        assert_eq!(turns[1].speaker, Speaker::Subject);
    }

    #[test]
    fn test_json_accepts_korean_speaker_labels() {
        let json = r#"{"index":1,"role":"A","speaker":"피의자","text":"네"}"#;
        let turn: TurnRecord = serde_json::from_str(json).unwrap();
        assert_eq!(turn.speaker, Speaker::Subject);
        assert_eq!(turn.role, Role::Answer);

        let out = serde_json::to_string(&turn).unwrap();
        assert!(out.contains(r#""role":"A""#));
        assert!(out.contains(r#""speaker":"subject""#));
    }
}
