use chrono::Utc;
use rocket::FromForm;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{Form, Question, QuestionKind};

/// Raw authoring input. The three question lists are parallel: entry `i` of
/// each describes question `i`.
#[derive(FromForm, Validate, Debug, Default)]
pub struct NewForm {
    #[validate(length(min = 1, message = "Form title is required"))]
    pub form_title: String,
    pub question_text: Vec<String>,
    pub question_type: Vec<String>,
    pub question_options: Vec<String>,
}

/// Splits a comma separated option string into trimmed labels.
pub fn split_options(raw: &str) -> Vec<String> {
    raw.split(',').map(|opt| opt.trim().to_string()).collect()
}

pub fn build_questions(
    texts: &[String],
    types: &[String],
    options: &[String],
) -> Result<Vec<Question>, AppError> {
    if texts.len() != types.len() || texts.len() != options.len() {
        return Err(AppError::Validation(format!(
            "Mismatched question fields: {} texts, {} types, {} option lists",
            texts.len(),
            types.len(),
            options.len()
        )));
    }

    texts
        .iter()
        .zip(types)
        .zip(options)
        .map(|((text, kind), raw_options)| {
            let kind = QuestionKind::from_str(kind)
                .map_err(|e| AppError::Validation(e.to_string()))?;

            let options = if kind.has_options() {
                split_options(raw_options)
            } else {
                Vec::new()
            };

            Ok(Question {
                text: text.clone(),
                kind,
                options,
            })
        })
        .collect()
}

impl NewForm {
    /// Validates the input and assigns a fresh form identifier.
    pub fn into_form(self) -> Result<Form, AppError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors
                .field_errors()
                .values()
                .flat_map(|field_errors| field_errors.iter())
                .map(|error| {
                    error
                        .message
                        .clone()
                        .unwrap_or_else(|| "Invalid value".into())
                        .to_string()
                })
                .collect();
            AppError::Validation(messages.join(", "))
        })?;

        let questions = build_questions(
            &self.question_text,
            &self.question_type,
            &self.question_options,
        )?;

        Ok(Form {
            form_id: Uuid::new_v4().to_string(),
            title: self.form_title,
            questions,
            created_at: Utc::now(),
        })
    }
}
