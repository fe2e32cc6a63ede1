//! Client library for an asynchronous file-conversion service.
//!
//! A [`session::transfer_session::TransferSession`] uploads one file for a
//! vendor, polls the service's processing status until it terminates, and
//! resolves with a download reference or a typed failure. Progress flows
//! through [`progress::ProgressObserver`]s registered on the session.

pub mod poller;
pub mod progress;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod types;
