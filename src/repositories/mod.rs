pub mod project_repository;
pub mod quiz_repository;

pub use project_repository::{MongoProjectRepository, ProjectRepository};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};
