//! Rendering a filled (or partially filled) grid as an image: a white square for each open cell, a
//! black square for each block, and each assigned letter drawn in the middle of its cell using an
//! 8x8 bitmap font scaled up to fit.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgba, RgbaImage};
use std::path::Path;
use thiserror::Error;

use crate::grid_config::Crossword;
use crate::types::Assignment;

/// The width and height of each cell, in pixels.
pub const CELL_SIZE: u32 = 100;

/// The black margin around the white interior of each open cell.
pub const CELL_BORDER: u32 = 2;

/// Each pixel of a glyph becomes a `GLYPH_SCALE` x `GLYPH_SCALE` square.
pub const GLYPH_SCALE: u32 = 8;

const GLYPH_SIZE: u32 = 8;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, Error)]
pub enum ImageExportError {
    #[error("couldn't write image: {0}")]
    Image(#[from] image::ImageError),
}

/// Look up the bitmap for a letter. Each byte is a row, top to bottom, and bit 0 is the leftmost
/// pixel.
fn glyph(letter: char) -> Option<[u8; 8]> {
    BASIC_FONTS.get(letter).or_else(|| LATIN_FONTS.get(letter))
}

/// Fill the square with corners `(x0, y0)` (inclusive) and `(x1, y1)` (exclusive).
fn fill_rect(image: &mut RgbaImage, (x0, y0): (u32, u32), (x1, y1): (u32, u32), color: Rgba<u8>) {
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, color);
        }
    }
}

fn draw_letter(image: &mut RgbaImage, letter: char, (x0, y0): (u32, u32)) {
    let Some(rows) = glyph(letter) else {
        log::warn!("No glyph for {letter:?}; leaving its cell blank");
        return;
    };

    for (row, bits) in (0..GLYPH_SIZE).zip(rows) {
        for column in 0..GLYPH_SIZE {
            if bits & (1 << column) != 0 {
                let x = x0 + column * GLYPH_SCALE;
                let y = y0 + row * GLYPH_SCALE;
                fill_rect(image, (x, y), (x + GLYPH_SCALE, y + GLYPH_SCALE), BLACK);
            }
        }
    }
}

/// Draw the grid for the given assignment. The image is `CELL_SIZE` pixels per cell in each
/// direction.
#[must_use]
pub fn render_image(crossword: &Crossword, assignment: &Assignment) -> RgbaImage {
    let to_px = |cells: usize| u32::try_from(cells).unwrap_or(u32::MAX).saturating_mul(CELL_SIZE);
    let mut image = RgbaImage::from_pixel(to_px(crossword.width), to_px(crossword.height), BLACK);

    let letters = crossword.letter_grid(assignment);
    let glyph_offset = CELL_BORDER + (CELL_SIZE - 2 * CELL_BORDER - GLYPH_SIZE * GLYPH_SCALE) / 2;

    for (i, row) in crossword.structure.iter().enumerate() {
        for (j, &open) in row.iter().enumerate() {
            if !open {
                continue;
            }

            let (x, y) = (to_px(j), to_px(i));
            fill_rect(
                &mut image,
                (x + CELL_BORDER, y + CELL_BORDER),
                (x + CELL_SIZE - CELL_BORDER, y + CELL_SIZE - CELL_BORDER),
                WHITE,
            );

            if let Some(letter) = letters[i][j] {
                draw_letter(&mut image, letter, (x + glyph_offset, y + glyph_offset));
            }
        }
    }

    image
}

/// Render the grid and write it to `path`. The format is chosen from the file extension; PNG is
/// supported.
pub fn save_image(
    crossword: &Crossword,
    assignment: &Assignment,
    path: impl AsRef<Path>,
) -> Result<(), ImageExportError> {
    render_image(crossword, assignment).save(path)?;
    Ok(())
}
