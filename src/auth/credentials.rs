use once_cell::sync::Lazy;
use std::collections::HashMap;

static PREDEFINED_STUDENTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut students = HashMap::new();

    students.insert("s1", "p1");
    students.insert("s2", "p2");
    students.insert("s3", "p3");

    students
});

pub fn verify_credentials(username: &str, password: &str) -> bool {
    PREDEFINED_STUDENTS
        .get(username)
        .is_some_and(|expected| *expected == password)
}

pub fn is_known_student(username: &str) -> bool {
    PREDEFINED_STUDENTS.contains_key(username)
}
