use crate::error::AppError;
use crate::models::{Answer, DbForm, DbSubmission, Form, Submission};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

#[instrument(skip(pool, form), fields(form_id = %form.form_id, title = %form.title))]
pub async fn create_form(pool: &Pool<Sqlite>, form: &Form) -> Result<(), AppError> {
    info!(question_count = form.questions.len(), "Creating form");
    let questions = serde_json::to_string(&form.questions)?;
    let created_at = form.created_at.naive_utc();

    sqlx::query(
        "INSERT INTO forms (form_id, title, questions, created_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(&form.form_id)
    .bind(&form.title)
    .bind(questions)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_all_forms(pool: &Pool<Sqlite>) -> Result<Vec<Form>, AppError> {
    info!("Getting all forms");
    let rows = sqlx::query_as::<_, DbForm>(
        "SELECT id, form_id, title, questions, created_at
         FROM forms
         ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Form::try_from).collect()
}

#[instrument(skip(pool))]
pub async fn find_form(pool: &Pool<Sqlite>, form_id: &str) -> Result<Option<Form>, AppError> {
    info!("Finding form by id");
    let row = sqlx::query_as::<_, DbForm>(
        "SELECT id, form_id, title, questions, created_at FROM forms WHERE form_id = ?",
    )
    .bind(form_id)
    .fetch_optional(pool)
    .await?;

    row.map(Form::try_from).transpose()
}

#[instrument(skip(pool))]
pub async fn get_form(pool: &Pool<Sqlite>, form_id: &str) -> Result<Form, AppError> {
    match find_form(pool, form_id).await? {
        Some(form) => Ok(form),
        None => Err(AppError::NotFound(format!(
            "Form with id {} not found in database",
            form_id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn find_submission(
    pool: &Pool<Sqlite>,
    form_id: &str,
    student_id: &str,
) -> Result<Option<Submission>, AppError> {
    info!("Checking for existing submission");
    let row = sqlx::query_as::<_, DbSubmission>(
        "SELECT id, form_id, student_id, answers, submitted_at
         FROM submissions
         WHERE form_id = ? AND student_id = ?",
    )
    .bind(form_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?;

    row.map(Submission::try_from).transpose()
}

/// Stores one student's answers for a form, refusing a second submission.
#[instrument(skip(pool, answers))]
pub async fn create_submission(
    pool: &Pool<Sqlite>,
    form_id: &str,
    student_id: &str,
    answers: &[Answer],
) -> Result<i64, AppError> {
    info!(answer_count = answers.len(), "Creating submission");

    if find_submission(pool, form_id, student_id).await?.is_some() {
        return Err(AppError::AlreadySubmitted {
            form_id: form_id.to_string(),
            student_id: student_id.to_string(),
        });
    }

    insert_submission(pool, form_id, student_id, answers).await
}

/// Inserts without the existence check. The unique index on
/// `(form_id, student_id)` turns a duplicate into `AlreadySubmitted`.
#[instrument(skip(pool, answers))]
pub async fn insert_submission(
    pool: &Pool<Sqlite>,
    form_id: &str,
    student_id: &str,
    answers: &[Answer],
) -> Result<i64, AppError> {
    let answers = serde_json::to_string(answers)?;

    let res = sqlx::query(
        "INSERT INTO submissions (form_id, student_id, answers)
         VALUES (?, ?, ?)",
    )
    .bind(form_id)
    .bind(student_id)
    .bind(answers)
    .execute(pool)
    .await
    .map_err(AppError::from);

    match res {
        Ok(res) => Ok(res.last_insert_rowid()),
        Err(err) if err.is_unique_violation() => {
            warn!("Duplicate submission rejected by unique index");
            Err(AppError::AlreadySubmitted {
                form_id: form_id.to_string(),
                student_id: student_id.to_string(),
            })
        }
        Err(err) => Err(err),
    }
}

#[instrument(skip(pool))]
pub async fn get_submissions_for_form(
    pool: &Pool<Sqlite>,
    form_id: &str,
) -> Result<Vec<Submission>, AppError> {
    info!("Getting submissions for form");
    let rows = sqlx::query_as::<_, DbSubmission>(
        "SELECT id, form_id, student_id, answers, submitted_at
         FROM submissions
         WHERE form_id = ?
         ORDER BY submitted_at, id",
    )
    .bind(form_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Submission::try_from).collect()
}

/// Form ids the student has already answered.
#[instrument(skip(pool))]
pub async fn get_submitted_form_ids(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<Vec<String>, AppError> {
    info!("Getting submitted form ids for student");
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT form_id FROM submissions WHERE student_id = ? ORDER BY id",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
