// Business logic services

pub mod action_type_service;
pub mod email_service;
pub mod level_service;
pub mod step_tree;
pub mod storage_service;
pub mod tag_service;
pub mod training_service;

pub use action_type_service::ActionTypeService;
pub use email_service::{EmailService, SmtpConfig};
pub use level_service::LevelService;
pub use step_tree::build_step_tree;
pub use storage_service::StorageService;
pub use tag_service::TagService;
pub use training_service::TrainingService;
