//! Exam event entities.

pub mod category;
pub mod model;
pub mod source;

pub use category::EventCategory;
pub use model::{CreateExamEvent, ExamEvent};
pub use source::DateSource;
