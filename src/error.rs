use crate::tcp::SegmentError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("device I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Segment(#[from] SegmentError),
}
