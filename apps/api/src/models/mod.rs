pub mod content;
pub mod facts;
