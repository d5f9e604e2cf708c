pub mod check;
pub mod pages;
pub mod token;
