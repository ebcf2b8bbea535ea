pub mod expense;
pub mod role;
