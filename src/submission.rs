use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::models::{
    ClassName, HelpTopic, LearningGoals, StudentResponse, MAX_LEVEL, MAX_STUDENT_NUM, MIN_LEVEL,
    MIN_STUDENT_NUM,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("student number must be between 1 and 40, got {0}")]
    StudentNumber(u8),
    #[error("understanding level must be between 1 and 5, got {0}")]
    Level(u8),
    #[error("{checks} goal checks given but goals only reach slot {slots}")]
    TooManyChecks { checks: usize, slots: usize },
    #[error("check at least one goal or give an understanding level")]
    Empty,
    #[error("an understanding level is required")]
    MissingLevel,
}

/// Raw input from a student, before it becomes a stored response.
#[derive(Debug, Clone)]
pub struct Submission {
    pub class: ClassName,
    pub student_num: u8,
    pub goal_checks: Vec<bool>,
    pub understanding_level: Option<u8>,
    pub difficult_part: String,
    pub help_needed: HelpTopic,
}

impl Submission {
    pub fn into_response(
        self,
        date: NaiveDate,
        goals: &LearningGoals,
        now: NaiveDateTime,
    ) -> Result<StudentResponse, SubmissionError> {
        if !(MIN_STUDENT_NUM..=MAX_STUDENT_NUM).contains(&self.student_num) {
            return Err(SubmissionError::StudentNumber(self.student_num));
        }

        let slots = goals.slot_span();
        if self.goal_checks.len() > slots {
            return Err(SubmissionError::TooManyChecks {
                checks: self.goal_checks.len(),
                slots,
            });
        }

        let level = match self.understanding_level {
            Some(level) if (MIN_LEVEL..=MAX_LEVEL).contains(&level) => level,
            Some(level) => return Err(SubmissionError::Level(level)),
            None if self.goal_checks.iter().any(|checked| *checked) => {
                return Err(SubmissionError::MissingLevel)
            }
            None => return Err(SubmissionError::Empty),
        };

        let difficult_part = Some(self.difficult_part.trim().to_string()).filter(|t| !t.is_empty());

        Ok(StudentResponse {
            timestamp: now,
            date,
            class: self.class,
            student_num: self.student_num,
            goal_checks: self.goal_checks,
            understanding_level: level,
            difficult_part,
            help_needed: self.help_needed,
        })
    }
}
