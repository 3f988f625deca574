use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{understanding_emoji, AggregateReport, LearningGoals};
use crate::words;

const LABEL_WIDTH: usize = 30;

/// Goal labels longer than 30 characters are cut and marked with `...`.
pub fn short_label(label: &str) -> String {
    if label.chars().count() > LABEL_WIDTH {
        let cut: String = label.chars().take(LABEL_WIDTH).collect();
        format!("{cut}...")
    } else {
        label.to_string()
    }
}

fn goal_rate(report: &AggregateReport, index: usize) -> f64 {
    report
        .goal_rates
        .iter()
        .find(|goal| goal.index == index)
        .map_or(0.0, |goal| goal.rate)
}

/// The downloadable plain-text report. Output depends only on the inputs.
pub fn to_text_report(report: &AggregateReport, date: NaiveDate, goals: &LearningGoals) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "형성평가 결과 보고서");
    let _ = writeln!(output, "날짜: {}", date.format("%Y-%m-%d"));
    let _ = writeln!(output);
    let _ = writeln!(output, "[기본 통계]");
    let _ = writeln!(output, "- 응답 학생 수: {}명", report.respondent_count);
    let _ = writeln!(
        output,
        "- 평균 이해도: {}/5.0",
        report.mean_understanding_display()
    );
    let _ = writeln!(
        output,
        "- 전체 목표 달성률: {:.1}%",
        report.overall_achievement_rate
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "[학습 목표별 달성률]");

    for (index, label) in goals.active() {
        let _ = writeln!(
            output,
            "- {}: {:.1}%",
            short_label(label),
            goal_rate(report, index)
        );
    }

    output
}

/// Terminal rendering of the results view: metrics, distributions, frequent words.
pub fn render_summary(report: &AggregateReport, date: NaiveDate, max_words: usize) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Results for {}", date.format("%Y-%m-%d"));

    if report.is_empty() {
        let _ = writeln!(output, "No responses submitted yet.");
        return output;
    }

    let _ = writeln!(output, "Respondents: {}", report.respondent_count);
    let _ = writeln!(
        output,
        "Mean understanding: {} / 5.0",
        report.mean_understanding_display()
    );
    let _ = writeln!(
        output,
        "Overall goal achievement: {:.1}%",
        report.overall_achievement_rate
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Goal Achievement");
    if report.goal_rates.is_empty() {
        let _ = writeln!(output, "No learning goals set for this date.");
    } else {
        for goal in &report.goal_rates {
            let _ = writeln!(
                output,
                "- Goal {} ({}): {:.1}%",
                goal.index + 1,
                short_label(&goal.label),
                goal.rate
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Understanding Distribution");
    for bucket in &report.understanding_histogram {
        let _ = writeln!(
            output,
            "- {} {}: {} {}",
            bucket.level,
            understanding_emoji(bucket.level),
            bucket.count,
            "#".repeat(bucket.count)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Help Requested");
    if report.help_histogram.is_empty() {
        let _ = writeln!(output, "No help requests.");
    } else {
        for entry in &report.help_histogram {
            let _ = writeln!(output, "- {}: {}", entry.topic, entry.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Difficult Parts");
    let top = words::top_words(&report.word_frequencies, max_words);
    if top.is_empty() {
        let _ = writeln!(output, "No written feedback.");
    } else {
        for (word, count) in top {
            let _ = writeln!(output, "- {word}: {count}");
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::compute_report;
    use crate::models::{ClassName, HelpTopic, StudentResponse};
    use crate::words::Script;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
    }

    fn sample_response(checks: &[bool], level: u8, help: HelpTopic) -> StudentResponse {
        StudentResponse {
            timestamp: date().and_hms_opt(9, 0, 0).unwrap(),
            date: date(),
            class: ClassName::Class1,
            student_num: 3,
            goal_checks: checks.to_vec(),
            understanding_level: level,
            difficult_part: Some("시어의 의미".to_string()),
            help_needed: help,
        }
    }

    #[test]
    fn text_report_matches_fixed_template() {
        let goals = LearningGoals::from_labels(["A", "B"]).unwrap();
        let responses = vec![
            sample_response(&[true, false], 4, HelpTopic::NoneSelected),
            sample_response(&[true, true], 5, HelpTopic::NoneSelected),
        ];
        let report = compute_report(&responses, &goals, Script::Hangul);

        let expected = "형성평가 결과 보고서\n\
                        날짜: 2025-03-04\n\
                        \n\
                        [기본 통계]\n\
                        - 응답 학생 수: 2명\n\
                        - 평균 이해도: 4.5/5.0\n\
                        - 전체 목표 달성률: 75.0%\n\
                        \n\
                        [학습 목표별 달성률]\n\
                        - A: 100.0%\n\
                        - B: 50.0%\n";
        assert_eq!(to_text_report(&report, date(), &goals), expected);
    }

    #[test]
    fn empty_report_lists_goals_at_zero() {
        let goals = LearningGoals::from_labels(["A"]).unwrap();
        let text = to_text_report(&AggregateReport::empty(), date(), &goals);

        assert!(text.contains("- 응답 학생 수: 0명"));
        assert!(text.contains("- 평균 이해도: -/5.0"));
        assert!(text.contains("- 전체 목표 달성률: 0.0%"));
        assert!(text.ends_with("- A: 0.0%\n"));
    }

    #[test]
    fn long_goal_labels_are_shortened() {
        let label = "가".repeat(31);
        assert_eq!(short_label(&label), format!("{}...", "가".repeat(30)));
        assert_eq!(short_label("짧은 목표"), "짧은 목표");
    }

    #[test]
    fn summary_shows_distributions_and_words() {
        let goals = LearningGoals::from_labels(["A"]).unwrap();
        let responses = vec![
            sample_response(&[true], 2, HelpTopic::Practice),
            sample_response(&[false], 2, HelpTopic::NoneSelected),
        ];
        let report = compute_report(&responses, &goals, Script::Hangul);
        let summary = render_summary(&report, date(), 10);

        assert!(summary.contains("Respondents: 2"));
        assert!(summary.contains("- Goal 1 (A): 50.0%"));
        assert!(summary.contains("- 2 😕: 2 ##"));
        assert!(summary.contains("- 응용 연습: 1"));
        assert!(!summary.contains("선택 안 함"));
        assert!(summary.contains("- 시어의: 2"));
    }

    #[test]
    fn summary_for_no_responses() {
        let summary = render_summary(&AggregateReport::empty(), date(), 10);
        assert!(summary.contains("No responses submitted yet."));
    }
}
