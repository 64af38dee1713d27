pub mod project;
pub mod quiz;
pub mod quiz_config;
pub mod quiz_question;
pub mod quiz_result;
pub use project::Project;
pub use quiz::{Quiz, QuizStatus};
pub use quiz_config::{Difficulty, QuizConfig};
pub use quiz_question::{Explanation, QuizQuestion};
pub use quiz_result::{AnswerRecord, QuizResult};
