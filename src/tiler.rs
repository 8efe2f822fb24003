//! Cuts a cover bitmap into a grid of independently owned tiles.

use std::collections::BTreeMap;

use crate::bitmap::Bitmap;
use crate::grid::Cell;

#[derive(Clone, Debug)]
pub struct TileSet {
    tile_w: u32,
    tile_h: u32,
    cols: u32,
    rows: u32,
    tiles: BTreeMap<Cell, Bitmap>,
}

impl TileSet {
    pub fn tile_size(&self) -> (u32, u32) { (self.tile_w, self.tile_h) }
    pub fn cols(&self) -> u32 { self.cols }
    pub fn rows(&self) -> u32 { self.rows }
    pub fn len(&self) -> usize { self.tiles.len() }
    pub fn is_empty(&self) -> bool { self.tiles.is_empty() }

    pub fn get(&self, cell: Cell) -> Option<&Bitmap> { self.tiles.get(&cell) }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, &Bitmap)> {
        self.tiles.iter().map(|(c, b)| (*c, b))
    }

    /// Pastes every tile back at its grid offset.
    pub fn reassemble(&self) -> Bitmap {
        let width = self.tiles.iter()
            .map(|(c, b)| c.col as u32 * self.tile_w + b.width())
            .max()
            .unwrap_or(0);
        let height = self.tiles.iter()
            .map(|(c, b)| c.row as u32 * self.tile_h + b.height())
            .max()
            .unwrap_or(0);
        let mut out = Bitmap::new(width, height, [0, 0, 0, 0]);
        for (cell, bmp) in &self.tiles {
            out.blit(bmp, cell.col as u32 * self.tile_w, cell.row as u32 * self.tile_h);
        }
        out
    }
}

/// Partitions `bitmap` into a `ceil(W/tile_w) × ceil(H/tile_h)` grid.
/// Edge tiles are clipped when the dimensions are not exact multiples.
pub fn tile(bitmap: &Bitmap, tile_w: u32, tile_h: u32) -> TileSet {
    let tile_w = tile_w.max(1);
    let tile_h = tile_h.max(1);
    let cols = bitmap.width().div_ceil(tile_w);
    let rows = bitmap.height().div_ceil(tile_h);

    let mut tiles = BTreeMap::new();
    for row in 0..rows {
        for col in 0..cols {
            let piece = bitmap.crop(col * tile_w, row * tile_h, tile_w, tile_h);
            tiles.insert(Cell::new(col as i32, row as i32), piece);
        }
    }

    TileSet { tile_w, tile_h, cols, rows, tiles }
}
