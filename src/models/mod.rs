//! Domain models for the challenge board.
//!
//! # Core Concepts
//!
//! - [`Challenge`]: A tracked startup engagement. Owns its actions, activities
//!   and contacts; deleting a challenge deletes all three.
//! - [`Action`]: A task on a challenge with an [`ActionOwner`], a calendar due
//!   date and done/urgent flags. Open actions drive every ranking decision.
//! - [`Activity`]: A timeline entry (call, meeting, email, note).
//! - [`Contact`]: A person attached to a challenge, grouped by organisation.
//! - [`User`]: A board member who can sign in. Admins manage other users.

mod action;
mod activity;
mod challenge;
mod contact;
mod user;

pub use action::*;
pub use activity::*;
pub use challenge::*;
pub use contact::*;
pub use user::*;
