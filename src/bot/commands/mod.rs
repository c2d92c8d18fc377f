pub mod help;
pub mod info;
pub mod maintenance;
pub mod trivia;
pub mod update;
