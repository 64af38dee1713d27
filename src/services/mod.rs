pub mod project_service;
pub mod quiz_generation_service;
pub mod quiz_reconciler;
pub mod quiz_service;

pub use project_service::ProjectService;
pub use quiz_generation_service::QuizGenerationService;
pub use quiz_reconciler::QuizReconciler;
pub use quiz_service::QuizService;
