// Infrastructure - persistence, identity and request plumbing

pub mod database;          // Review store interface
pub mod sqlite_database;   // SQLite review store
pub mod id_generator;      // Record id generation
pub mod viewer;            // Viewer context
pub mod middleware;        // Request-scoped middleware
pub mod deadline;          // Per-request deadlines
pub mod monitoring;        // Tracing setup

pub use database::ReviewStore;
pub use sqlite_database::SqliteReviewStore;
pub use id_generator::IdGenerator;
pub use viewer::ViewerContext;
