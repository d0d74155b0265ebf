// src/io/mod.rs
pub mod reader;
pub mod writer;

pub use reader::load_rgb;
pub use writer::{artifact_name, ensure_dir, random_id, write_png};
