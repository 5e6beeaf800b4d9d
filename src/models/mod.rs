pub mod account;
pub mod notification;
pub mod tutorial;
