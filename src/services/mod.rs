pub mod auth;
pub mod availability;
pub mod layout;
pub mod messaging;
pub mod overlap;
pub mod phone;
pub mod reminder;
pub mod reschedule;
pub mod timegrid;
