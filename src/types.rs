use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Opaque ID types for readability
pub type QuestionId = i64;
pub type AttendeeId = String;

/// One of the two competing teams
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Team {
    #[serde(rename = "team_a")]
    A,
    #[serde(rename = "team_b")]
    B,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::A, Team::B];

    /// Tag used on the wire and in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Team::A => "team_a",
            Team::B => "team_b",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Team {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "team_a" => Ok(Team::A),
            "team_b" => Ok(Team::B),
            other => Err(StoreError::InvalidTeam(other.to_string())),
        }
    }
}

impl ToSql for Team {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Team {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: StoreError| FromSqlError::Other(Box::new(e)))
    }
}

/// Per-team vote counts attached to a single question
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteTally {
    pub team_a: u32,
    pub team_b: u32,
}

impl VoteTally {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::A => self.team_a,
            Team::B => self.team_b,
        }
    }
}

/// Aggregate points per team across all questions
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamScores {
    pub team_a: u32,
    pub team_b: u32,
}

impl TeamScores {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::A => self.team_a,
            Team::B => self.team_b,
        }
    }

    pub(crate) fn set(&mut self, team: Team, score: u32) {
        match team {
            Team::A => self.team_a = score,
            Team::B => self.team_b = score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub author: String,
    pub timestamp: String, // RFC 3339
    pub is_active: bool,
    pub is_past: bool,
    /// Once set, the question is locked for audience voting
    pub winner: Option<Team>,
    pub votes: VoteTally,
}

/// Question as supplied by a seed-data loader
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewQuestion {
    pub text: String,
    pub author: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DisplaySettings {
    pub scores_blurred: bool,
}

/// Whether an attendee has voted on a question, and for whom
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct VoteStatus {
    pub has_voted: bool,
    pub team: Option<Team>,
}

/// Full read-side view of the store. Every client renders from this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateSnapshot {
    pub active_question: Option<QuestionId>,
    /// Non-past questions, oldest first
    pub questions: Vec<Question>,
    /// Past questions, most recent first
    pub past_questions: Vec<Question>,
    pub scores: TeamScores,
    pub display_settings: DisplaySettings,
    pub last_updated: String,
}

impl StateSnapshot {
    pub fn active(&self) -> Option<&Question> {
        let id = self.active_question?;
        self.questions.iter().find(|q| q.id == id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Moderator,
    Display,
    Audience,
}

/// Display labels for the two teams
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamNames {
    pub team_a: String,
    pub team_b: String,
}

impl Default for TeamNames {
    fn default() -> Self {
        Self {
            team_a: "Team A".to_string(),
            team_b: "Team B".to_string(),
        }
    }
}

/// Where a panelist sits on stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PanelSide {
    TeamA,
    Moderator,
    TeamB,
}

/// A person on the panel, shown on the display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Panelist {
    pub name: String,
    pub position: String,
    pub company: String,
    pub side: PanelSide,
    /// Portrait URL, passed through to clients untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Order a roster for the stage: team A, then the moderator, then team B.
/// Order within a side is kept.
pub fn seating_order(mut panelists: Vec<Panelist>) -> Vec<Panelist> {
    panelists.sort_by_key(|p| p.side);
    panelists
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_parse() {
        assert_eq!("team_a".parse::<Team>().unwrap(), Team::A);
        assert_eq!("team_b".parse::<Team>().unwrap(), Team::B);
        assert!(matches!(
            "bc".parse::<Team>(),
            Err(StoreError::InvalidTeam(tag)) if tag == "bc"
        ));
    }

    #[test]
    fn test_team_serde_uses_wire_tags() {
        assert_eq!(serde_json::to_string(&Team::A).unwrap(), "\"team_a\"");
        let team: Team = serde_json::from_str("\"team_b\"").unwrap();
        assert_eq!(team, Team::B);
        assert!(serde_json::from_str::<Team>("\"team_c\"").is_err());
    }

    #[test]
    fn test_panelist_serde() {
        let json = r#"{"name":"Ada","position":"CTO","company":"Acme","side":"team_a"}"#;
        let panelist: Panelist = serde_json::from_str(json).unwrap();
        assert_eq!(panelist.side, PanelSide::TeamA);
        assert_eq!(panelist.image_url, None);
        assert_eq!(serde_json::to_string(&panelist).unwrap(), json);

        let bad = r#"{"name":"Ada","position":"CTO","company":"Acme","side":"bc"}"#;
        assert!(serde_json::from_str::<Panelist>(bad).is_err());
    }

    #[test]
    fn test_seating_order() {
        let panelist = |name: &str, side| Panelist {
            name: name.to_string(),
            position: String::new(),
            company: String::new(),
            side,
            image_url: None,
        };
        let roster = vec![
            panelist("b1", PanelSide::TeamB),
            panelist("mod", PanelSide::Moderator),
            panelist("a1", PanelSide::TeamA),
            panelist("b2", PanelSide::TeamB),
            panelist("a2", PanelSide::TeamA),
        ];
        let names: Vec<_> = seating_order(roster).into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["a1", "a2", "mod", "b1", "b2"]);
    }

    #[test]
    fn test_active_lookup() {
        let question = Question {
            id: 3,
            text: "Why Rust?".to_string(),
            author: "Alice".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            is_active: true,
            is_past: false,
            winner: None,
            votes: VoteTally::default(),
        };
        let snapshot = StateSnapshot {
            active_question: Some(3),
            questions: vec![question.clone()],
            past_questions: vec![],
            scores: TeamScores::default(),
            display_settings: DisplaySettings::default(),
            last_updated: chrono::Utc::now().to_rfc3339(),
        };
        assert_eq!(snapshot.active(), Some(&question));
    }
}
