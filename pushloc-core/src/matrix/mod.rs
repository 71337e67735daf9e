mod rotation;
mod vector3;

pub use rotation::RotationMatrix3;
pub use vector3::Vector3;
