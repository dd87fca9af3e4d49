pub mod audio;
pub mod frame;
pub mod input;
