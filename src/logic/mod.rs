pub mod graph;
pub mod handles;
pub mod layout;
pub mod placement;
pub mod relationships;
pub mod union_children;
pub mod validate;

pub use graph::*;
pub use handles::*;
pub use layout::*;
pub use placement::*;
pub use relationships::*;
pub use union_children::*;
pub use validate::*;
