use std::collections::HashMap;

use rocket::State;
use rocket::form::Form as FormData;
use rocket::http::CookieJar;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::serde::json::Json;
use rocket_dyn_templates::{Template, context};
use serde::Serialize;
use serde_json::{Value, json};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

use crate::auth::{Student, verify_credentials};
use crate::authoring::NewForm;
use crate::db::{
    create_form, create_submission, find_submission, get_all_forms, get_form,
    get_submissions_for_form, get_submitted_form_ids,
};
use crate::error::AppError;
use crate::export::{CsvAttachment, attachment_filename, submission_row, submissions_csv};
use crate::models::{Answer, Question, QuestionKind};

const ALREADY_FILLED: &str = "You have already filled this form!";

#[derive(Serialize)]
pub struct Notice {
    pub kind: String,
    pub message: String,
}

fn notice(flash: Option<FlashMessage<'_>>) -> Option<Notice> {
    flash.map(|f| Notice {
        kind: match f.kind() {
            "error" => "danger".to_string(),
            kind => kind.to_string(),
        },
        message: f.message().to_string(),
    })
}

#[derive(Responder)]
pub enum PageOrRedirect {
    Page(Template),
    Redirect(Flash<Redirect>),
}

/// Request field that carries the answer to question `index`.
pub fn answer_field(index: usize) -> String {
    format!("q{}", index)
}

/// Reads one answer per question, in form order. Checkbox questions keep
/// every submitted value; other kinds keep the first one.
pub fn collect_answers(
    questions: &[Question],
    fields: &HashMap<String, Vec<String>>,
) -> Vec<Answer> {
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let values = fields.get(&answer_field(index));
            match question.kind {
                QuestionKind::Checkbox => Answer::Multiple(values.cloned().unwrap_or_default()),
                QuestionKind::Text | QuestionKind::Radio => {
                    Answer::Single(values.and_then(|v| v.first().cloned()))
                }
            }
        })
        .collect()
}

#[get("/")]
pub fn index(flash: Option<FlashMessage<'_>>) -> Template {
    Template::render(
        "index",
        context! {
            title: "Student Forms",
            flash: notice(flash),
        },
    )
}

#[get("/health")]
pub fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[get("/admin")]
pub async fn admin_dashboard(
    db: &State<Pool<Sqlite>>,
    flash: Option<FlashMessage<'_>>,
) -> Result<Template, AppError> {
    let forms = get_all_forms(db).await?;

    Ok(Template::render(
        "admin_dashboard",
        context! {
            title: "Admin Dashboard",
            forms: forms,
            flash: notice(flash),
        },
    ))
}

#[get("/create_form")]
pub fn create_form_page(flash: Option<FlashMessage<'_>>) -> Template {
    Template::render(
        "create_form",
        context! {
            title: "Create Form",
            flash: notice(flash),
        },
    )
}

#[post("/create_form", data = "<form>")]
pub async fn create_form_route(
    db: &State<Pool<Sqlite>>,
    form: FormData<NewForm>,
) -> Result<Flash<Redirect>, AppError> {
    let new_form = match form.into_inner().into_form() {
        Ok(new_form) => new_form,
        Err(AppError::Validation(msg)) => {
            warn!(message = %msg, "Rejected form definition");
            return Ok(Flash::error(Redirect::to("/create_form"), msg));
        }
        Err(e) => return Err(e),
    };

    create_form(db, &new_form).await?;
    info!(form_id = %new_form.form_id, "Form created");

    Ok(Flash::success(
        Redirect::to("/admin"),
        "Form created successfully!",
    ))
}

#[get("/student/login")]
pub fn student_login_page(flash: Option<FlashMessage<'_>>) -> Template {
    Template::render(
        "student_login",
        context! {
            title: "Student Login",
            flash: notice(flash),
        },
    )
}

#[derive(FromForm)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[post("/student/login", data = "<form>")]
pub fn student_login(form: FormData<LoginForm>, cookies: &CookieJar<'_>) -> Flash<Redirect> {
    info!(username = %form.username, "Login attempt");

    if verify_credentials(&form.username, &form.password) {
        info!(username = %form.username, "Authentication successful");
        Student::start_session(cookies, &form.username);
        Flash::success(
            Redirect::to("/student/dashboard"),
            format!("Welcome, {}!", form.username),
        )
    } else {
        warn!(username = %form.username, "Authentication failed");
        Flash::error(
            Redirect::to("/student/login"),
            "Invalid credentials, please try again.",
        )
    }
}

#[derive(Serialize)]
struct DashboardEntry {
    form_id: String,
    title: String,
    question_count: usize,
    submitted: bool,
}

#[get("/student/dashboard")]
pub async fn student_dashboard(
    student: Student,
    db: &State<Pool<Sqlite>>,
    flash: Option<FlashMessage<'_>>,
) -> Result<Template, AppError> {
    let forms = get_all_forms(db).await?;
    let submitted = get_submitted_form_ids(db, &student.username).await?;

    let entries: Vec<DashboardEntry> = forms
        .into_iter()
        .map(|form| DashboardEntry {
            submitted: submitted.contains(&form.form_id),
            question_count: form.questions.len(),
            form_id: form.form_id,
            title: form.title,
        })
        .collect();

    Ok(Template::render(
        "student_dashboard",
        context! {
            title: "Student Dashboard",
            student: student,
            forms: entries,
            flash: notice(flash),
        },
    ))
}

#[post("/student/logout")]
pub fn student_logout(cookies: &CookieJar<'_>) -> Flash<Redirect> {
    Student::end_session(cookies);
    Flash::success(Redirect::to("/student/login"), "Logged out successfully.")
}

fn already_filled() -> Flash<Redirect> {
    Flash::error(Redirect::to("/student/dashboard"), ALREADY_FILLED)
}

#[get("/fill_form/<form_id>")]
pub async fn fill_form_page(
    form_id: &str,
    student: Student,
    db: &State<Pool<Sqlite>>,
    flash: Option<FlashMessage<'_>>,
) -> Result<PageOrRedirect, AppError> {
    let form = get_form(db, form_id).await?;

    if find_submission(db, form_id, &student.username)
        .await?
        .is_some()
    {
        return Ok(PageOrRedirect::Redirect(already_filled()));
    }

    Ok(PageOrRedirect::Page(Template::render(
        "fill_form",
        context! {
            title: form.title.clone(),
            form: form,
            student: student,
            flash: notice(flash),
        },
    )))
}

#[post("/fill_form/<form_id>", data = "<answers>")]
pub async fn fill_form(
    form_id: &str,
    student: Student,
    db: &State<Pool<Sqlite>>,
    answers: FormData<HashMap<String, Vec<String>>>,
) -> Result<Flash<Redirect>, AppError> {
    let form = get_form(db, form_id).await?;

    if find_submission(db, form_id, &student.username)
        .await?
        .is_some()
    {
        return Ok(already_filled());
    }

    let answers = collect_answers(&form.questions, &answers);

    match create_submission(db, form_id, &student.username, &answers).await {
        Ok(submission_id) => {
            info!(
                submission_id,
                form_id = %form_id,
                student_id = %student.username,
                "Submission stored"
            );
            Ok(Flash::success(
                Redirect::to("/student/dashboard"),
                "Form submitted successfully!",
            ))
        }
        Err(AppError::AlreadySubmitted { .. }) => Ok(already_filled()),
        Err(e) => Err(e),
    }
}

#[get("/admin/view_submissions")]
pub async fn view_submissions(db: &State<Pool<Sqlite>>) -> Result<Template, AppError> {
    let forms = get_all_forms(db).await?;

    Ok(Template::render(
        "view_submissions",
        context! {
            title: "Submissions",
            forms: forms,
        },
    ))
}

#[derive(Serialize)]
struct SubmissionRow {
    submitted_at: String,
    cells: Vec<String>,
}

#[get("/admin/form_submissions/<form_id>")]
pub async fn form_submissions(
    form_id: &str,
    db: &State<Pool<Sqlite>>,
) -> Result<Template, AppError> {
    let form = get_form(db, form_id).await?;
    let submissions = get_submissions_for_form(db, form_id).await?;

    let rows: Vec<SubmissionRow> = submissions
        .iter()
        .map(|submission| SubmissionRow {
            submitted_at: submission.submitted_at.format("%Y-%m-%d %H:%M").to_string(),
            cells: submission_row(submission),
        })
        .collect();

    Ok(Template::render(
        "form_submissions",
        context! {
            title: format!("{} - Submissions", form.title),
            form: form,
            rows: rows,
        },
    ))
}

#[get("/admin/download_submissions/<form_id>")]
pub async fn download_submissions(
    form_id: &str,
    db: &State<Pool<Sqlite>>,
) -> Result<CsvAttachment, AppError> {
    let form = get_form(db, form_id).await?;
    let submissions = get_submissions_for_form(db, form_id).await?;

    info!(form_id = %form_id, rows = submissions.len(), "Exporting submissions");

    Ok(CsvAttachment::new(
        attachment_filename(&form.title),
        submissions_csv(&form, &submissions),
    ))
}
