use rocket::Request;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome};
use rocket::response::{Flash, Redirect};
use serde::Serialize;

use super::is_known_student;

pub const SESSION_COOKIE: &str = "student_username";

/// The logged-in student, taken from the private session cookie.
#[derive(Debug, Serialize, Clone)]
pub struct Student {
    pub username: String,
}

impl Student {
    pub fn start_session(cookies: &CookieJar<'_>, username: &str) {
        cookies.add_private(
            Cookie::build((SESSION_COOKIE, username.to_string()))
                .same_site(SameSite::Lax)
                .http_only(true),
        );
    }

    pub fn end_session(cookies: &CookieJar<'_>) {
        cookies.remove_private(Cookie::build(SESSION_COOKIE));
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Student {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("student_auth_guard");
        let _guard = auth_span.enter();

        let username = request
            .cookies()
            .get_private(SESSION_COOKIE)
            .map(|c| c.value().to_string());

        match username {
            Some(username) if is_known_student(&username) => {
                tracing::debug!(username = %username, "Student authenticated via session cookie");
                Outcome::Success(Student { username })
            }
            Some(username) => {
                tracing::warn!(username = %username, "Session cookie names an unknown student");
                Outcome::Error((Status::Unauthorized, ()))
            }
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

#[catch(401)]
pub fn unauthorized(_req: &Request) -> Flash<Redirect> {
    tracing::warn!("Unauthenticated access attempt");
    Flash::error(Redirect::to("/student/login"), "Please log in first.")
}
