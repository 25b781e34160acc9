pub mod credentials;
pub mod student;

pub use credentials::*;
pub use student::*;
