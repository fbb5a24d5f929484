pub mod prompt;
pub mod response;
pub mod ticket;
