//! Composite sheet assembly.
//!
//! Canvas layout for a `rows x cols` grid of `w x h` cells with spacing `s` and border `b`:
//!
//! ```text
//! width  = cols * w + (cols - 1) * s + 2 * b
//! height = rows * h + (rows - 1) * s + 2 * b
//! ```
//!
//! Cell `(row, col)` starts at `(b + col * (w + s), b + row * (h + s))`. Uncovered pixels
//! stay transparent. Frame images of a different size are scaled to the cell with
//! nearest-neighbor filtering.

use crate::error::ApiError;
use crate::sheet::{FrameStatus, OutputSettings, Position, SpriteSheet};
use crate::storage::{composite_object_key, ObjectStore};
use async_trait::async_trait;
use image::imageops::FilterType;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use tracing::info;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[async_trait]
pub trait CompositeAssembler: Send + Sync {
    /// Assemble a sheet whose frames are all `completed`; returns the composite URL.
    async fn assemble(&self, sheet: &SpriteSheet) -> Result<String, ApiError>;
}

pub fn canvas_size(sheet: &SpriteSheet) -> (u32, u32) {
    let OutputSettings { spacing, border } = sheet.output_settings;
    let dims = sheet.dimensions;
    let size = sheet.frame_size;
    let width = dims.cols * size.width + dims.cols.saturating_sub(1) * spacing + 2 * border;
    let height = dims.rows * size.height + dims.rows.saturating_sub(1) * spacing + 2 * border;
    (width, height)
}

pub fn cell_origin(sheet: &SpriteSheet, position: Position) -> (u32, u32) {
    let OutputSettings { spacing, border } = sheet.output_settings;
    (
        border + position.col * (sheet.frame_size.width + spacing),
        border + position.row * (sheet.frame_size.height + spacing),
    )
}

/// Lay decoded frame images onto the sheet canvas. `cells` pairs each position with its image.
pub fn render_sheet(sheet: &SpriteSheet, cells: &[(Position, RgbaImage)]) -> RgbaImage {
    let (width, height) = canvas_size(sheet);
    let mut canvas = RgbaImage::from_pixel(width.max(1), height.max(1), TRANSPARENT);
    let (cell_w, cell_h) = (sheet.frame_size.width, sheet.frame_size.height);

    for (position, image) in cells {
        let (dest_x, dest_y) = cell_origin(sheet, *position);
        let scaled;
        let source = if image.width() == cell_w && image.height() == cell_h {
            image
        } else {
            scaled = image::imageops::resize(image, cell_w, cell_h, FilterType::Nearest);
            &scaled
        };
        image::imageops::replace(&mut canvas, source, dest_x as i64, dest_y as i64);
    }

    canvas
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| ApiError::CompositeFailed(format!("PNG encoding failed: {}", e)))?;
    Ok(bytes)
}

/// Fetches frame images from object storage, renders the grid and stores the PNG.
pub struct ImageCompositeAssembler {
    objects: Arc<dyn ObjectStore>,
}

impl ImageCompositeAssembler {
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }
}

#[async_trait]
impl CompositeAssembler for ImageCompositeAssembler {
    async fn assemble(&self, sheet: &SpriteSheet) -> Result<String, ApiError> {
        let mut cells = Vec::with_capacity(sheet.frames.len());
        for frame in sheet.frames_row_major() {
            let image_ref = match (frame.status, frame.image_ref.as_deref()) {
                (FrameStatus::Completed, Some(image_ref)) => image_ref,
                _ => {
                    return Err(ApiError::CompositeFailed(format!(
                        "frame {} ({}) is not completed",
                        frame.id, frame.position
                    )))
                }
            };
            let bytes = self.objects.fetch(image_ref).await.map_err(|e| {
                ApiError::CompositeFailed(format!("frame {}: {}", frame.id, e))
            })?;
            let decoded = image::load_from_memory(&bytes).map_err(|e| {
                ApiError::CompositeFailed(format!("frame {} could not be decoded: {}", frame.id, e))
            })?;
            cells.push((frame.position, decoded.to_rgba8()));
        }

        let canvas = render_sheet(sheet, &cells);
        let png = encode_png(&canvas)?;
        let key = composite_object_key(&sheet.id, &png);
        let url = self
            .objects
            .store(&png, "image/png", &key)
            .await
            .map_err(|e| ApiError::CompositeFailed(format!("storing composite failed: {}", e)))?;

        info!(
            sheet_id = %sheet.id,
            width = canvas.width(),
            height = canvas.height(),
            "Composite assembled"
        );
        Ok(url)
    }
}
