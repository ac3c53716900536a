/// Errors raised before a clip is analysed.
#[derive(thiserror::Error, Debug)]
pub enum TrackError {
    #[error("invalid tracker parameters: {0}")]
    InvalidParams(String),
}
