#[path = "../helpers/mod.rs"]
mod helpers;

mod infrastructure;
