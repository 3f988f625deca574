use crate::models::{
    AggregateReport, GoalRate, LearningGoals, LevelCount, StudentResponse, TopicCount, MAX_LEVEL,
    MIN_LEVEL,
};
use crate::words::{self, Script};

pub fn compute_report(
    responses: &[StudentResponse],
    goals: &LearningGoals,
    script: Script,
) -> AggregateReport {
    if responses.is_empty() {
        return AggregateReport::empty();
    }

    let goal_rates = goal_rates(responses, goals);

    AggregateReport {
        respondent_count: responses.len(),
        mean_understanding: mean_understanding(responses),
        overall_achievement_rate: overall_achievement_rate(responses, goals),
        goal_rates,
        understanding_histogram: understanding_histogram(responses),
        help_histogram: help_histogram(responses),
        word_frequencies: words::extract_word_frequencies(
            responses.iter().filter_map(|r| r.difficult_part.as_deref()),
            script,
        ),
    }
}

pub fn mean_understanding(responses: &[StudentResponse]) -> Option<f64> {
    if responses.is_empty() {
        return None;
    }
    let total: u32 = responses
        .iter()
        .map(|r| u32::from(r.understanding_level))
        .sum();
    Some(total as f64 / responses.len() as f64)
}

pub fn goal_rates(responses: &[StudentResponse], goals: &LearningGoals) -> Vec<GoalRate> {
    goals
        .active()
        .map(|(index, label)| GoalRate {
            index,
            label: label.to_string(),
            rate: percent(achieved_on(responses, index), responses.len()),
        })
        .collect()
}

/// Checks on inactive slots are ignored, so the result stays within 0..=100.
pub fn overall_achievement_rate(responses: &[StudentResponse], goals: &LearningGoals) -> f64 {
    let active = goals.active_count();
    if active == 0 {
        return 0.0;
    }

    let achieved: usize = goals
        .active()
        .map(|(index, _)| achieved_on(responses, index))
        .sum();
    percent(achieved, responses.len() * active)
}

/// Counts for levels 1 through 5, zero-filled.
pub fn understanding_histogram(responses: &[StudentResponse]) -> Vec<LevelCount> {
    (MIN_LEVEL..=MAX_LEVEL)
        .map(|level| LevelCount {
            level,
            count: responses
                .iter()
                .filter(|r| r.understanding_level == level)
                .count(),
        })
        .collect()
}

/// Requested topics in first-seen order; "none selected" is left out.
pub fn help_histogram(responses: &[StudentResponse]) -> Vec<TopicCount> {
    let mut counts: Vec<TopicCount> = Vec::new();

    for topic in responses
        .iter()
        .map(|r| r.help_needed)
        .filter(|topic| !topic.is_none_selected())
    {
        match counts.iter_mut().find(|entry| entry.topic == topic) {
            Some(entry) => entry.count += 1,
            None => counts.push(TopicCount { topic, count: 1 }),
        }
    }

    counts
}

fn achieved_on(responses: &[StudentResponse], index: usize) -> usize {
    responses.iter().filter(|r| r.achieved(index)).count()
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
