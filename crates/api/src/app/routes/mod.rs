pub mod system;
pub mod upstream;
