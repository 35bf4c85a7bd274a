// Application services - write paths and listings around the review store

pub mod directory_service;
pub mod review_service;

pub use directory_service::{DirectoryService, NewHospital, NewProfession};
pub use review_service::ReviewService;
