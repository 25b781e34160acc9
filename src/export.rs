use rocket::Responder;
use rocket::http::Header;

use crate::models::{Form, Submission};

/// CSV body served as a file download.
#[derive(Responder)]
#[response(content_type = "text/csv")]
pub struct CsvAttachment {
    body: String,
    disposition: Header<'static>,
}

impl CsvAttachment {
    pub fn new(filename: String, body: String) -> Self {
        Self {
            body,
            disposition: Header::new(
                "Content-Disposition",
                format!("attachment; filename={}", filename),
            ),
        }
    }
}

pub fn header_row(form: &Form) -> Vec<String> {
    std::iter::once("Student ID".to_string())
        .chain(form.questions.iter().map(|q| q.text.clone()))
        .collect()
}

/// Student id followed by each answer, in question order.
pub fn submission_row(submission: &Submission) -> Vec<String> {
    std::iter::once(submission.student_id.clone())
        .chain(submission.answers.iter().map(|a| a.to_cell()))
        .collect()
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn write_record(out: &mut String, cells: &[String]) {
    let line: Vec<String> = cells.iter().map(|c| csv_quote(c)).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

pub fn submissions_csv(form: &Form, submissions: &[Submission]) -> String {
    let mut csv = String::new();
    write_record(&mut csv, &header_row(form));

    for submission in submissions {
        write_record(&mut csv, &submission_row(submission));
    }

    csv
}

/// `<title>_submissions.csv` with characters that would break the header removed.
pub fn attachment_filename(title: &str) -> String {
    let safe_title: String = title
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    format!("{}_submissions.csv", safe_title)
}
