//! Events that organizers publish and attendees register for.
//!
//! Pure domain: ownership and registration rules live here, storage and HTTP
//! do not.

pub mod event;
pub mod view;

pub use event::{Event, EventDetails, EventPatch, OwnerAction, already_registered, parse_event_date};
pub use view::{EventView, referenced_users};
