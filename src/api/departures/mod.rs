pub mod list;
pub mod refresh;
