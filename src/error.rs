use thiserror::Error;

/// Errors reported by the slide decoder seam.
#[derive(Debug, Clone, Error)]
pub enum SlideError {
    /// The slide could not be opened at all
    #[error("Failed to open slide '{path}': {reason}")]
    Open { path: String, reason: String },

    /// A level index outside the pyramid was requested
    #[error("Invalid level {level}: slide has {level_count} level(s)")]
    InvalidLevel { level: usize, level_count: usize },

    /// A region read failed inside the decoder
    #[error("Region read failed at level {level}, origin ({x}, {y}), size {width}x{height}: {reason}")]
    Read {
        level: usize,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        reason: String,
    },

    /// The pyramid metadata is inconsistent (empty, unordered downsamples, ...)
    #[error("Invalid pyramid: {0}")]
    InvalidPyramid(String),
}

/// Per-tile failures. All of these are recoverable: the driver records the
/// tile and moves on to the next one.
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// Resolved read dimensions were zero or negative
    #[error("Empty source region: resolved read size {read_w}x{read_h}")]
    EmptyRegion { read_w: i64, read_h: i64 },

    /// Resolved read dimensions exceed the per-tile safety ceiling
    #[error("Source region too large: {read_w}x{read_h} = {pixels} pixels exceeds ceiling of {ceiling}")]
    RegionTooLarge {
        read_w: u32,
        read_h: u32,
        pixels: u64,
        ceiling: u64,
    },

    /// The decoder failed while materializing the region
    #[error("Slide error: {0}")]
    Slide(#[from] SlideError),

    /// JPEG encoding failed
    #[error("JPEG encode failed: {message}")]
    Encode { message: String },

    /// Writing the encoded tile to disk failed
    #[error("Failed to write tile: {message}")]
    Write { message: String },
}

/// Fatal errors that abort an entire pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The slide failed to open or reported an error at open time
    #[error("Failed to open slide: {0}")]
    Open(#[from] SlideError),

    /// The output root directory could not be created
    #[error("Failed to create output directory '{path}': {message}")]
    OutputDir { path: String, message: String },

    /// A worker task panicked; this indicates a bug, not a bad tile
    #[error("Tile worker failed: {0}")]
    Worker(String),
}
