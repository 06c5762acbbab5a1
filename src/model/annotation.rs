//! Annotation geometry and data structures.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MARKER_COLOR, MIN_SELECTION_SIZE};

/// Unique identifier for an annotation, scoped to its owning document.
pub type AnnotationId = u32;

/// Axis-aligned rectangle in the coordinate space of a document's rendered preview.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner X coordinate
    pub x: f32,
    /// Top-left corner Y coordinate
    pub y: f32,
    /// Width of the rectangle
    pub width: f32,
    /// Height of the rectangle
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a selection rectangle from two drag corners.
    ///
    /// Returns `None` unless both sides exceed [`MIN_SELECTION_SIZE`], which is
    /// the capture layer's rule for proposing a region at all.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Self> {
        let rect = Self::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs());

        if rect.width > MIN_SELECTION_SIZE && rect.height > MIN_SELECTION_SIZE {
            Some(rect)
        } else {
            None
        }
    }

    /// Flip negative extents so that width and height are never below zero.
    pub fn normalized(self) -> Self {
        let (x, width) = if self.width < 0.0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0.0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Self::new(x, y, width, height)
    }

    /// Scale both position and size, e.g. from displayed to natural pixels.
    pub fn scaled(self, sx: f32, sy: f32) -> Self {
        Self::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }
}

/// An annotation proposed by the capture layer, before the store assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDraft {
    pub rect: Rect,
    /// Free-text label
    pub text: String,
    /// Hex color string such as `#FF0000`
    pub color: String,
}

impl AnnotationDraft {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            text: String::new(),
            color: DEFAULT_MARKER_COLOR.to_string(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// A labeled, colored rectangle attached to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique identifier within the owning document.
    pub id: AnnotationId,
    /// Region in preview coordinates; width and height are never negative.
    pub rect: Rect,
    pub text: String,
    pub color: String,
}

impl Annotation {
    /// Create an annotation from a draft, normalising its rectangle.
    pub fn from_draft(id: AnnotationId, draft: AnnotationDraft) -> Self {
        Self {
            id,
            rect: draft.rect.normalized(),
            text: draft.text,
            color: draft.color,
        }
    }
}
