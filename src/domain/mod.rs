//! Page records and the catalogs they draw their enumerations from.

pub mod catalog;
pub mod announcement;
pub mod course;
pub mod department;
pub mod document;
pub mod event;
pub mod library;
pub mod query;
pub mod record;
pub mod student;
pub mod verification;

pub use announcement::Announcement;
pub use course::Course;
pub use department::Department;
pub use document::Document;
pub use event::Event;
pub use library::{Book, Loan};
pub use query::Query;
pub use record::{Record, RecordId};
pub use student::Student;
pub use verification::Application;
