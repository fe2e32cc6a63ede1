pub mod artifact;
pub mod upload_channel;
