use std::io::{Read, Write};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{ClassName, HelpTopic, StudentResponse};

const UTF8_BOM: &str = "\u{FEFF}";

/// One CSV row. Header names are fixed; spreadsheet users rely on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "날짜")]
    pub date: NaiveDate,
    #[serde(rename = "반")]
    pub class: ClassName,
    #[serde(rename = "번호")]
    pub student_num: u8,
    #[serde(rename = "이해도")]
    pub understanding_level: u8,
    #[serde(rename = "달성 목표 수")]
    pub achieved_goals: usize,
    #[serde(rename = "어려운 부분")]
    pub difficult_part: String,
    #[serde(rename = "도움 필요")]
    pub help_needed: HelpTopic,
}

impl From<&StudentResponse> for ExportRow {
    fn from(response: &StudentResponse) -> Self {
        Self {
            date: response.date,
            class: response.class,
            student_num: response.student_num,
            understanding_level: response.understanding_level,
            achieved_goals: response.achieved_count(),
            difficult_part: response.difficult_part.clone().unwrap_or_default(),
            help_needed: response.help_needed,
        }
    }
}

pub fn to_tabular_export(responses: &[StudentResponse]) -> Vec<ExportRow> {
    responses.iter().map(ExportRow::from).collect()
}

/// Writes a BOM-prefixed UTF-8 CSV so spreadsheet tools pick the right encoding.
pub fn write_csv<W: Write>(rows: &[ExportRow], mut writer: W) -> anyhow::Result<()> {
    writer.write_all(UTF8_BOM.as_bytes())?;

    let mut csv_writer = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        csv_writer.write_record(HEADERS)?;
    }
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

const HEADERS: [&str; 7] = [
    "날짜",
    "반",
    "번호",
    "이해도",
    "달성 목표 수",
    "어려운 부분",
    "도움 필요",
];

pub fn read_csv<R: Read>(mut reader: R) -> anyhow::Result<Vec<ExportRow>> {
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    let contents = contents.strip_prefix(UTF8_BOM).unwrap_or(&contents);

    let mut csv_reader = csv::Reader::from_reader(contents.as_bytes());
    let mut rows = Vec::new();
    for result in csv_reader.deserialize::<ExportRow>() {
        rows.push(result?);
    }
    Ok(rows)
}

pub fn csv_file_name(date: NaiveDate) -> String {
    format!("형성평가_{}.csv", date.format("%Y-%m-%d"))
}

pub fn report_file_name(date: NaiveDate) -> String {
    format!("형성평가_보고서_{}.txt", date.format("%Y-%m-%d"))
}
