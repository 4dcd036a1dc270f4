//! Shared library for the salon booking Lambda functions.
//!
//! Holds configuration, persistence, formatting and email plumbing used by
//! the API handlers and the scheduled reminder job.

pub mod calendar;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod format;
pub mod http;
pub mod models;
pub mod notifications;
pub mod secrets;
pub mod slots;
pub mod state;

pub use config::{Config, TemplateNames};
pub use db::create_pool;
pub use email::{Mailer, RawEmail, TemplatedEmail};
pub use error::{Error, Result};
pub use models::{
    AddonInput, AddonRow, BookingDetails, BookingDetailsRequest, CancellationRequest, ClientResponse,
    ClientRow, Price, SlotResponse, SlotRow,
};
pub use notifications::{send_due_reminders, ReminderScope, ReminderSummary};
pub use secrets::{get_database_credentials, get_secret, DatabaseCredentials};
pub use state::AppState;
