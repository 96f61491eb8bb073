pub mod add;
pub mod common;
pub mod copy;
pub mod delete;
pub mod input;
pub mod list;
pub mod theme;
