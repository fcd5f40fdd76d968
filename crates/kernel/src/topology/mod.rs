pub mod model;
pub mod primitives;
