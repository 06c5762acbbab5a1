//! Global constants for the docmark workbench

/// Minimum width and height (in preview pixels) a dragged selection must
/// exceed before it is proposed as an annotation or OCR region.
pub const MIN_SELECTION_SIZE: f32 = 10.0;

/// Marker color used when the caller does not pick one
pub const DEFAULT_MARKER_COLOR: &str = "#FF0000";

/// Text stored on a document whose extraction failed
pub const EXTRACTION_ERROR_TEXT: &str = "Error processing document";

/// Alpha applied to the annotation fill when rendering an annotated image (0x33)
pub const ANNOTATION_FILL_ALPHA: u8 = 0x33;

/// Stroke width of annotation rectangles in rendered exports, in pixels
pub const ANNOTATION_STROKE_WIDTH: u32 = 2;

/// Content type prefix that classifies an upload as an image
pub const IMAGE_CONTENT_PREFIX: &str = "image/";

/// Content type of PDF uploads
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Default target language for translation requests
pub const DEFAULT_TRANSLATION_TARGET: &str = "hi";
