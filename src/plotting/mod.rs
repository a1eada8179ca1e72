pub mod axis;
pub mod projector;
