pub mod profile;
pub mod sample;
pub mod variant;
