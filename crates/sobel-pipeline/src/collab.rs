//! Capture and display collaborators.

use crate::CollaboratorError;
use sobel_core::{Frame, Resolution, SobelImage};

/// Supplies frames to the controller.
pub trait FrameSource: Send {
    /// Size of every frame this source produces.
    fn resolution(&self) -> Resolution;

    /// Fills `frame` with the next frame, blocking until one is available.
    ///
    /// `frame` always has [`resolution`](Self::resolution). An error ends
    /// the run.
    fn next_frame(&mut self, frame: &mut Frame) -> Result<(), CollaboratorError>;

    /// Short description for logs.
    fn describe(&self) -> String {
        "frame source".to_string()
    }
}

/// What the display reports back after showing a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayFeedback {
    /// The user asked to stop, e.g. by pressing `q`.
    pub stop_requested: bool,
}

impl DisplayFeedback {
    /// Keep going.
    pub const CONTINUE: Self = Self {
        stop_requested: false,
    };

    /// Stop after this frame.
    pub const STOP: Self = Self {
        stop_requested: true,
    };
}

/// Receives every gradient image on the controller thread.
pub trait FrameSink: Send {
    /// Shows one frame. Border rows and columns are zero.
    fn show(&mut self, image: &SobelImage) -> Result<DisplayFeedback, CollaboratorError>;

    /// Short description for logs.
    fn describe(&self) -> String {
        "frame sink".to_string()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn resolution(&self) -> Resolution {
        (**self).resolution()
    }

    fn next_frame(&mut self, frame: &mut Frame) -> Result<(), CollaboratorError> {
        (**self).next_frame(frame)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<D: FrameSink + ?Sized> FrameSink for Box<D> {
    fn show(&mut self, image: &SobelImage) -> Result<DisplayFeedback, CollaboratorError> {
        (**self).show(image)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
