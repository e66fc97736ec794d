pub mod edge_handlers;
pub mod error;
pub mod family_tree_handlers;
pub mod handlers;
pub mod node_position_handlers;
pub mod person_handlers;
pub mod relationship_handlers;
pub mod routes;
pub mod union_child_handlers;
pub mod user_extractor;
pub mod user_handlers;

pub use error::*;
pub use handlers::{health_check, AppState, HealthResponse, MessageResponse};
pub use routes::*;
