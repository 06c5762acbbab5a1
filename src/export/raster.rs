//! Annotated image rendering and export.

use std::ops::Range;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document as PdfDocument, Object, Stream, dictionary};

use super::ExportError;
use crate::color_utils::rgb_or_fallback;
use crate::constants::{ANNOTATION_FILL_ALPHA, ANNOTATION_STROKE_WIDTH};
use crate::model::{Annotation, Document, Rect};

/// Image pixels are placed at 96 dpi.
const PT_PER_PX: f32 = 0.75;

/// Draw every annotation onto a copy of `image`.
///
/// Each rectangle gets a stroke in its color centred on its edges, then a
/// translucent fill of the same color over its interior. Rectangles are in
/// image pixel coordinates and are clipped to the image.
pub fn render_annotated(image: &DynamicImage, annotations: &[Annotation]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    for annotation in annotations {
        let color = Rgb(rgb_or_fallback(&annotation.color));
        let rect = annotation.rect.normalized();
        stroke_rect(&mut canvas, rect, color);
        fill_rect(&mut canvas, rect, color, ANNOTATION_FILL_ALPHA);
    }
    canvas
}

/// Render an image document with its annotations and save it as a
/// single-page PDF. The page has the image's proportions, so it is
/// landscape exactly when the image is wider than tall.
pub fn export_annotated(document: &Document, path: &Path) -> Result<PathBuf, ExportError> {
    if !document.is_image() {
        return Err(ExportError::NotAnImage(document.name().to_string()));
    }

    let image = image::load_from_memory(&document.source.bytes)?;
    let (width, height) = image.dimensions();
    let rendered = render_annotated(&image, &document.annotations);

    let mut pdf = image_pdf(&rendered)?;
    pdf.compress();
    pdf.save(path)?;

    log::info!(
        "Exported '{}' ({}x{}, {} annotation(s)) to {:?}",
        document.name(),
        width,
        height,
        document.annotations.len(),
        path
    );
    Ok(path.to_path_buf())
}

/// Pixel range covered by `[start, end)` after clipping to `0..limit`.
fn pixel_span(start: f32, end: f32, limit: u32) -> Range<u32> {
    let clip = |v: f32| (v.round().max(0.0) as u32).min(limit);
    clip(start)..clip(end)
}

fn stroke_rect(canvas: &mut RgbImage, rect: Rect, color: Rgb<u8>) {
    let half = ANNOTATION_STROKE_WIDTH as f32 / 2.0;
    let (w, h) = canvas.dimensions();
    let right = rect.x + rect.width;
    let bottom = rect.y + rect.height;

    let outer_x = pixel_span(rect.x - half, right + half, w);
    let outer_y = pixel_span(rect.y - half, bottom + half, h);
    let inner_x = pixel_span(rect.x + half, right - half, w);
    let inner_y = pixel_span(rect.y + half, bottom - half, h);

    for y in outer_y {
        for x in outer_x.clone() {
            if inner_x.contains(&x) && inner_y.contains(&y) {
                continue;
            }
            canvas.put_pixel(x, y, color);
        }
    }
}

fn fill_rect(canvas: &mut RgbImage, rect: Rect, color: Rgb<u8>, alpha: u8) {
    let (w, h) = canvas.dimensions();
    let xs = pixel_span(rect.x, rect.x + rect.width, w);
    let ys = pixel_span(rect.y, rect.y + rect.height, h);

    let a = u16::from(alpha);
    let blend = |dst: u8, src: u8| ((u16::from(src) * a + u16::from(dst) * (255 - a)) / 255) as u8;

    for y in ys {
        for x in xs.clone() {
            let pixel = canvas.get_pixel_mut(x, y);
            for channel in 0..3 {
                pixel[channel] = blend(pixel[channel], color[channel]);
            }
        }
    }
}

/// Single-page PDF whose page is exactly the image.
fn image_pdf(image: &RgbImage) -> Result<PdfDocument, ExportError> {
    let (width, height) = image.dimensions();
    let page_width = width as f32 * PT_PER_PX;
    let page_height = height as f32 * PT_PER_PX;

    let mut doc = PdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.as_raw().clone(),
    ));
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im1" => image_id },
    });

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(page_width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(page_height),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(page_width),
            Object::Real(page_height),
        ],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}
