pub mod booking;
pub mod client;
pub mod service;
pub mod staff;

pub use booking::{Booking, BookingStatus, BookingUpdate};
pub use client::Client;
pub use staff::StaffMember;
