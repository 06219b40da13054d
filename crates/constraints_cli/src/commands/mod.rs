pub mod discover;
pub mod show;
pub mod verify;
