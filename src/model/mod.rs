pub mod common;
pub mod edge;
pub mod family_tree;
pub mod node_position;
pub mod person;
pub mod relationship;
pub mod union_child;
pub mod user_context;

pub use common::*;
pub use edge::*;
pub use family_tree::*;
pub use node_position::*;
pub use person::*;
pub use relationship::*;
pub use union_child::*;
pub use user_context::*;
