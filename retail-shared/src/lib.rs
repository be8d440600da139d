pub mod ids;
pub mod pagination;
pub mod pii;

pub use ids::{generate_id, EntityPrefix};
pub use pagination::Page;
pub use pii::Masked;
