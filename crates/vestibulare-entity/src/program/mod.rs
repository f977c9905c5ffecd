//! Exam program entities.

pub mod model;

pub use model::{CreateExamProgram, ExamProgram};
