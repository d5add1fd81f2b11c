//! Human-in-the-loop confirmation of intermediate detection results.
//!
//! The pipeline pauses at a small number of checkpoints and offers the
//! current line-structure image to a collaborator, which may accept it,
//! ask for a re-run at a different axis size, or reject the run
//! outright. The trait keeps the pipeline free of any terminal or GUI
//! concern; a CLI can prompt on stdin, a batch runner can plug in
//! [`AutoConfirm`].

use image::GrayImage;

/// Where in the pipeline a confirmation is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// The shelf-scale line-structure image, before rotation.
    ShelfLines,
    /// The combined edge image for the region at this index.
    RegionEdges(usize),
}

/// A collaborator's verdict on one intermediate result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Keep the result and continue.
    Accepted,
    /// Re-run the extraction at this axis size and confirm again.
    Adjusted(u32),
    /// Abort the whole run.
    Rejected,
}

/// Reviews intermediate detection results.
///
/// Implementations may block for arbitrarily long (an interactive
/// prompt has no deadline); the pipeline calls this synchronously and
/// treats the call as pure.
pub trait Confirm {
    /// Judge the intermediate `image` produced at `checkpoint` with the
    /// given `axis_size`.
    fn confirm(&self, checkpoint: Checkpoint, image: &GrayImage, axis_size: u32) -> Confirmation;
}

/// Accepts every intermediate result without inspection.
///
/// The collaborator for non-interactive runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, _: Checkpoint, _: &GrayImage, _: u32) -> Confirmation {
        Confirmation::Accepted
    }
}
