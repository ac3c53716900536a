use ledmap_core::ChannelError;

/// Errors that stop a probing session before it processes any frame.
#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("invalid probe parameters: {0}")]
    InvalidParams(String),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}
