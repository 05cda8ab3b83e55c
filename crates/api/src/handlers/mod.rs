pub mod admin;
pub mod allocation;
pub mod classroom;
pub mod student;
pub mod waitlist;
