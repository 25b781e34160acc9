use anyhow::Error;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Short free-text answer.
    Text,
    Radio,
    Checkbox,
}

impl QuestionKind {
    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "text" => Ok(QuestionKind::Text),
            "radio" => Ok(QuestionKind::Radio),
            "checkbox" => Ok(QuestionKind::Checkbox),
            _ => Err(Error::msg(format!("Unknown question type: {}", s))),
        }
    }

    pub fn has_options(&self) -> bool {
        matches!(self, QuestionKind::Radio | QuestionKind::Checkbox)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Form {
    pub form_id: String,
    pub title: String,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbForm {
    pub id: Option<i64>,
    pub form_id: Option<String>,
    pub title: Option<String>,
    pub questions: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl TryFrom<DbForm> for Form {
    type Error = AppError;

    fn try_from(db: DbForm) -> Result<Self, Self::Error> {
        let questions = match db.questions {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };

        Ok(Self {
            form_id: db.form_id.unwrap_or_default(),
            title: db.title.unwrap_or_default(),
            questions,
            created_at: to_utc(db.created_at),
        })
    }
}

/// One answer, positionally aligned with its question.
///
/// Checkbox questions produce `Multiple`; everything else produces `Single`,
/// which is `None` when the field was left out of the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Multiple(Vec<String>),
    Single(Option<String>),
}

impl Answer {
    /// Flat text used for table cells and CSV export.
    pub fn to_cell(&self) -> String {
        match self {
            Answer::Single(Some(value)) => value.clone(),
            Answer::Single(None) => String::new(),
            Answer::Multiple(values) => values.join("; "),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub id: i64,
    pub form_id: String,
    pub student_id: String,
    pub answers: Vec<Answer>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbSubmission {
    pub id: Option<i64>,
    pub form_id: Option<String>,
    pub student_id: Option<String>,
    pub answers: Option<String>,
    pub submitted_at: Option<NaiveDateTime>,
}

impl TryFrom<DbSubmission> for Submission {
    type Error = AppError;

    fn try_from(db: DbSubmission) -> Result<Self, Self::Error> {
        let answers = match db.answers {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };

        Ok(Self {
            id: db.id.unwrap_or_default(),
            form_id: db.form_id.unwrap_or_default(),
            student_id: db.student_id.unwrap_or_default(),
            answers,
            submitted_at: to_utc(db.submitted_at),
        })
    }
}

fn to_utc(timestamp: Option<NaiveDateTime>) -> DateTime<Utc> {
    timestamp
        .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_kind_parsing() {
        assert_eq!(QuestionKind::from_str("text").unwrap(), QuestionKind::Text);
        assert_eq!(QuestionKind::from_str("radio").unwrap(), QuestionKind::Radio);
        assert_eq!(
            QuestionKind::from_str("checkbox").unwrap(),
            QuestionKind::Checkbox
        );
        assert!(QuestionKind::from_str("dropdown").is_err());
        assert!(!QuestionKind::Text.has_options());
        assert!(QuestionKind::Checkbox.has_options());
    }

    #[test]
    fn test_answer_json_shapes() {
        let answers = vec![
            Answer::Single(Some("Blue".to_string())),
            Answer::Single(None),
            Answer::Multiple(vec!["Rust".to_string(), "Go".to_string()]),
            Answer::Multiple(vec![]),
        ];

        let json = serde_json::to_string(&answers).unwrap();
        assert_eq!(json, r#"["Blue",null,["Rust","Go"],[]]"#);

        let parsed: Vec<Answer> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, answers);
    }

    #[test]
    fn test_answer_cells() {
        assert_eq!(Answer::Single(Some("42".to_string())).to_cell(), "42");
        assert_eq!(Answer::Single(None).to_cell(), "");
        assert_eq!(
            Answer::Multiple(vec!["a".to_string(), "b".to_string()]).to_cell(),
            "a; b"
        );
    }

    #[test]
    fn test_db_form_conversion() {
        let db = DbForm {
            id: Some(1),
            form_id: Some("abc".to_string()),
            title: Some("Survey".to_string()),
            questions: Some(r#"[{"text":"Color?","type":"radio","options":["Red","Blue"]}]"#.to_string()),
            created_at: None,
        };

        let form = Form::try_from(db).unwrap();
        assert_eq!(form.form_id, "abc");
        assert_eq!(form.questions.len(), 1);
        assert_eq!(form.questions[0].kind, QuestionKind::Radio);
        assert_eq!(form.questions[0].options, vec!["Red", "Blue"]);
    }

    #[test]
    fn test_db_form_with_corrupt_questions() {
        let db = DbForm {
            questions: Some("not json".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            Form::try_from(db),
            Err(AppError::Serialization(_))
        ));
    }
}
