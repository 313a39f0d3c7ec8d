pub mod pages;
pub mod preview;
