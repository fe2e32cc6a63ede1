pub mod transfer_session;
