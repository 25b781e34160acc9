#[cfg(test)]
pub mod test_utils {
    use crate::authoring::build_questions;
    use crate::db::{create_form, create_submission};
    use crate::error::AppError;
    use crate::models::{Answer, Form};
    use chrono::Utc;
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::{Client, LocalResponse};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;
    use std::sync::Once;
    use std::time::Duration;
    use uuid::Uuid;

    static INIT: Once = Once::new();

    #[derive(Default)]
    pub struct TestDbBuilder {
        forms: Vec<TestForm>,
        submissions: Vec<TestSubmission>,
    }

    pub struct TestForm {
        pub title: String,
        /// (text, type, comma separated options)
        pub questions: Vec<(String, String, String)>,
    }

    pub struct TestSubmission {
        pub form_title: String,
        pub student_id: String,
        pub answers: Vec<Answer>,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn form(mut self, title: &str, questions: &[(&str, &str, &str)]) -> Self {
            self.forms.push(TestForm {
                title: title.to_string(),
                questions: questions
                    .iter()
                    .map(|(text, kind, options)| {
                        (text.to_string(), kind.to_string(), options.to_string())
                    })
                    .collect(),
            });
            self
        }

        pub fn submission(mut self, form_title: &str, student_id: &str, answers: Vec<Answer>) -> Self {
            self.submissions.push(TestSubmission {
                form_title: form_title.to_string(),
                student_id: student_id.to_string(),
                answers,
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .parse_filters("debug")
                    .is_test(true)
                    .try_init();
            });

            let pool = memory_pool().await?;

            let mut form_id_map: HashMap<String, String> = HashMap::new();

            for test_form in &self.forms {
                let texts: Vec<String> = test_form.questions.iter().map(|q| q.0.clone()).collect();
                let types: Vec<String> = test_form.questions.iter().map(|q| q.1.clone()).collect();
                let options: Vec<String> =
                    test_form.questions.iter().map(|q| q.2.clone()).collect();

                let form = Form {
                    form_id: Uuid::new_v4().to_string(),
                    title: test_form.title.clone(),
                    questions: build_questions(&texts, &types, &options)?,
                    created_at: Utc::now(),
                };

                create_form(&pool, &form).await?;
                form_id_map.insert(form.title.clone(), form.form_id);
            }

            for submission in &self.submissions {
                let form_id = form_id_map.get(&submission.form_title).ok_or_else(|| {
                    AppError::NotFound(format!("Test form {} not declared", submission.form_title))
                })?;

                create_submission(&pool, form_id, &submission.student_id, &submission.answers)
                    .await?;
            }

            Ok(TestDb { pool, form_id_map })
        }
    }

    /// Single-connection in-memory database with migrations applied. One
    /// connection only, since each SQLite memory connection is its own database.
    pub async fn memory_pool() -> Result<Pool<Sqlite>, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub form_id_map: HashMap<String, String>,
    }

    impl TestDb {
        pub fn form_id(&self, title: &str) -> Option<String> {
            self.form_id_map.get(title).cloned()
        }

        pub async fn submission_count(&self, form_id: &str) -> Result<i64, sqlx::Error> {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM submissions WHERE form_id = ?")
                .bind(form_id)
                .fetch_one(&self.pool)
                .await
        }
    }

    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .form(
                "Course Feedback",
                &[
                    ("Name", "text", ""),
                    ("Rating", "radio", "Good, Okay, Bad"),
                    ("Topics", "checkbox", "Traits, Macros, Async"),
                ],
            )
            .form("Lunch Poll", &[("Favourite food", "radio", "Pizza, Sushi")])
            .build()
            .await
            .expect("Failed to build standard test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let rocket = crate::init_rocket(test_db.pool.clone()).await;
        let client = Client::tracked(rocket)
            .await
            .expect("Failed to build rocket client");

        (client, test_db)
    }

    pub async fn login_student<'c>(
        client: &'c Client,
        username: &str,
        password: &str,
    ) -> LocalResponse<'c> {
        client
            .post("/student/login")
            .header(ContentType::Form)
            .body(format!("username={}&password={}", username, password))
            .dispatch()
            .await
    }

    pub fn location<'a>(response: &'a LocalResponse<'_>) -> Option<&'a str> {
        response.headers().get_one("Location")
    }

    /// Follows a redirect by hand so the flashed notice gets rendered.
    pub async fn follow(client: &Client, response: LocalResponse<'_>) -> (Status, String) {
        let target = location(&response)
            .expect("Response was not a redirect")
            .to_string();

        let page = client.get(target).dispatch().await;
        let status = page.status();
        let body = page.into_string().await.unwrap_or_default();

        (status, body)
    }
}
