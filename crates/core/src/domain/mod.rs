pub mod booking;
pub mod contact;
pub mod draft;
pub mod hotel;
pub mod travel;
