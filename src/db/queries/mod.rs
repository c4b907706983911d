pub mod categories;
pub mod events;
pub mod participants;
pub mod registrations;
