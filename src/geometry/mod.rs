pub mod aabb;
pub mod min_max;
