pub mod analysis;
pub mod catalog;
pub mod dictation;
pub mod events;
pub mod media;
pub mod modes;
pub mod session;
