//! Application services orchestrating domain logic.

pub mod error;
pub mod pages;
pub mod repos;
pub mod revalidation;
pub mod richtext;
