//! Server side prepared statements that survive session changes.
//!
//! Statements are registered by name in a [`Registry`] as generators of SQL text or of
//! [`QuerySet`] builder queries, prepared in the database and then executed by name.
//! A statement that went missing from the session (a reconnection, a pooled connection
//! handed to another client) is prepared again on its first failing execution.
pub use prepkit_core::*;
pub use prepkit_macros::Model;
