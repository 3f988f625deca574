use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of goal slots a teacher can fill for one lesson.
pub const GOAL_SLOTS: usize = 5;
pub const MIN_STUDENT_NUM: u8 = 1;
pub const MAX_STUDENT_NUM: u8 = 40;
pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassName {
    #[serde(rename = "1반")]
    Class1,
    #[serde(rename = "2반")]
    Class2,
    #[serde(rename = "3반")]
    Class3,
    #[serde(rename = "4반")]
    Class4,
    #[serde(rename = "5반")]
    Class5,
    #[serde(rename = "6반")]
    Class6,
}

impl ClassName {
    pub const ALL: [ClassName; 6] = [
        ClassName::Class1,
        ClassName::Class2,
        ClassName::Class3,
        ClassName::Class4,
        ClassName::Class5,
        ClassName::Class6,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ClassName::Class1 => "1반",
            ClassName::Class2 => "2반",
            ClassName::Class3 => "3반",
            ClassName::Class4 => "4반",
            ClassName::Class5 => "5반",
            ClassName::Class6 => "6반",
        }
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ClassName {
    type Err = String;

    /// Accepts the label itself (`3반`) or the bare class number (`3`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let number = value.strip_suffix('반').unwrap_or(value);
        ClassName::ALL
            .iter()
            .copied()
            .find(|class| class.label().strip_suffix('반') == Some(number))
            .ok_or_else(|| format!("unknown class '{value}' (expected 1반..6반)"))
    }
}

/// What kind of follow-up a student asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HelpTopic {
    #[default]
    #[serde(rename = "선택 안 함")]
    NoneSelected,
    #[serde(rename = "개념 이해")]
    Concept,
    #[serde(rename = "문제 풀이")]
    ProblemSolving,
    #[serde(rename = "응용 연습")]
    Practice,
    #[serde(rename = "심화 학습")]
    Advanced,
    #[serde(rename = "기타")]
    Other,
}

impl HelpTopic {
    pub const ALL: [HelpTopic; 6] = [
        HelpTopic::NoneSelected,
        HelpTopic::Concept,
        HelpTopic::ProblemSolving,
        HelpTopic::Practice,
        HelpTopic::Advanced,
        HelpTopic::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HelpTopic::NoneSelected => "선택 안 함",
            HelpTopic::Concept => "개념 이해",
            HelpTopic::ProblemSolving => "문제 풀이",
            HelpTopic::Practice => "응용 연습",
            HelpTopic::Advanced => "심화 학습",
            HelpTopic::Other => "기타",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            HelpTopic::NoneSelected => "none",
            HelpTopic::Concept => "concept",
            HelpTopic::ProblemSolving => "problem-solving",
            HelpTopic::Practice => "practice",
            HelpTopic::Advanced => "advanced",
            HelpTopic::Other => "other",
        }
    }

    pub fn is_none_selected(self) -> bool {
        self == HelpTopic::NoneSelected
    }
}

impl fmt::Display for HelpTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HelpTopic {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        HelpTopic::ALL
            .iter()
            .copied()
            .find(|topic| topic.label() == value || topic.alias().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown help topic '{value}'"))
    }
}

/// One student's check-in for a lesson. Field names match the persisted JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentResponse {
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub class: ClassName,
    pub student_num: u8,
    pub goal_checks: Vec<bool>,
    pub understanding_level: u8,
    #[serde(
        default,
        serialize_with = "serialize_blank",
        deserialize_with = "deserialize_blank"
    )]
    pub difficult_part: Option<String>,
    #[serde(default)]
    pub help_needed: HelpTopic,
}

impl StudentResponse {
    pub fn achieved_count(&self) -> usize {
        self.goal_checks.iter().filter(|checked| **checked).count()
    }

    /// Slot `index` counts as unachieved when the checks stop short of it.
    pub fn achieved(&self, index: usize) -> bool {
        self.goal_checks.get(index).copied().unwrap_or(false)
    }
}

fn serialize_blank<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

fn deserialize_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|text| !text.trim().is_empty()))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GoalError {
    #[error("at least one learning goal is required")]
    NoGoals,
    #[error("at most 5 learning goals are allowed, got {0}")]
    TooMany(usize),
}

/// The teacher's goals for a lesson. Always exactly [`GOAL_SLOTS`] slots;
/// an empty slot is an inactive goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearningGoals {
    slots: Vec<String>,
}

impl LearningGoals {
    pub fn empty() -> Self {
        Self {
            slots: vec![String::new(); GOAL_SLOTS],
        }
    }

    /// Builds goals from teacher input: 1 to 5 labels, blanks skipped.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, GoalError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .map(|label| label.as_ref().trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();

        if labels.is_empty() {
            return Err(GoalError::NoGoals);
        }
        if labels.len() > GOAL_SLOTS {
            return Err(GoalError::TooMany(labels.len()));
        }

        Ok(Self::from_slots(labels))
    }

    /// Builds goals from stored slots, keeping positions; pads or truncates to five.
    pub fn from_slots(slots: Vec<String>) -> Self {
        let mut slots: Vec<String> = slots
            .into_iter()
            .map(|slot| slot.trim().to_string())
            .collect();
        slots.resize(GOAL_SLOTS, String::new());
        Self { slots }
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// Active goals with their slot index.
    pub fn active(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, label)| !label.is_empty())
            .map(|(index, label)| (index, label.as_str()))
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Length a check list needs to reach the last active slot.
    pub fn slot_span(&self) -> usize {
        self.active().last().map_or(0, |(index, _)| index + 1)
    }

    /// Turns 1-based positions in the active goal list into slot-indexed checks.
    pub fn checks_for(&self, achieved: &[usize]) -> Vec<bool> {
        let mut checks = vec![false; self.slot_span()];
        for (position, (index, _)) in self.active().enumerate() {
            checks[index] = achieved.contains(&(position + 1));
        }
        checks
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.slots
            .get(index)
            .map(String::as_str)
            .filter(|label| !label.is_empty())
    }
}

impl Default for LearningGoals {
    fn default() -> Self {
        Self::empty()
    }
}

/// Persisted shape of a date's goals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalFile {
    pub date: NaiveDate,
    pub goals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalRate {
    pub index: usize,
    pub label: String,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelCount {
    pub level: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCount {
    pub topic: HelpTopic,
    pub count: usize,
}

/// Everything the results view shows for one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub respondent_count: usize,
    /// `None` when nobody has responded.
    pub mean_understanding: Option<f64>,
    pub overall_achievement_rate: f64,
    pub goal_rates: Vec<GoalRate>,
    pub understanding_histogram: Vec<LevelCount>,
    pub help_histogram: Vec<TopicCount>,
    pub word_frequencies: BTreeMap<String, usize>,
}

impl AggregateReport {
    pub fn empty() -> Self {
        Self {
            respondent_count: 0,
            mean_understanding: None,
            overall_achievement_rate: 0.0,
            goal_rates: Vec::new(),
            understanding_histogram: (MIN_LEVEL..=MAX_LEVEL)
                .map(|level| LevelCount { level, count: 0 })
                .collect(),
            help_histogram: Vec::new(),
            word_frequencies: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.respondent_count == 0
    }

    pub fn mean_understanding_display(&self) -> String {
        match self.mean_understanding {
            Some(mean) => format!("{mean:.1}"),
            None => "-".to_string(),
        }
    }
}

pub fn understanding_emoji(level: u8) -> &'static str {
    match level {
        1 => "😵",
        2 => "😕",
        3 => "😐",
        4 => "🙂",
        5 => "😄",
        _ => "?",
    }
}
