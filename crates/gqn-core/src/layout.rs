/// Normalized placement of one image axis inside the figure
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Grid of image axes: a (query, generated) pair per batch item.
///
/// Pairs are packed `floor(sqrt(batch_size))` to a row.
#[derive(Clone, Debug)]
pub struct FigureLayout {
    pub batch_size: usize,
    pub pairs_per_row: usize,
    pub rows: usize,
}

impl FigureLayout {
    pub fn new(batch_size: usize) -> Self {
        let pairs_per_row = ((batch_size as f64).sqrt().floor() as usize).max(1);
        let rows = batch_size.div_ceil(pairs_per_row).max(1);
        Self {
            batch_size,
            pairs_per_row,
            rows,
        }
    }

    pub fn columns(&self) -> usize {
        self.pairs_per_row * 2
    }

    pub fn axis_count(&self) -> usize {
        self.batch_size * 2
    }

    pub fn query_axis(batch_index: usize) -> usize {
        batch_index * 2
    }

    pub fn generated_axis(batch_index: usize) -> usize {
        batch_index * 2 + 1
    }

    /// Row and column of an axis in the grid
    pub fn cell(&self, axis: usize) -> (usize, usize) {
        let columns = self.columns();
        (axis / columns, axis % columns)
    }

    pub fn rect(&self, axis: usize) -> AxisRect {
        let (row, column) = self.cell(axis);
        let width = 1.0 / self.columns() as f32;
        let height = 1.0 / self.rows as f32;
        AxisRect {
            x: width * column as f32,
            y: height * row as f32,
            width,
            height,
        }
    }
}
