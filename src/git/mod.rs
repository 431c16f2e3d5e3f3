mod repo;

pub use repo::{Decorations, GitRepo};
