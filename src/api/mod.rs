pub mod admin;
pub mod expense;
