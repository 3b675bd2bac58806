//! Small vector types shared by the index and its callers.

pub mod vector2;
pub mod vector3;

pub use vector2::Vector2;
pub use vector3::Vector3;
