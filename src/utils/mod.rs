pub mod paths;
pub mod size;
pub mod validation;
