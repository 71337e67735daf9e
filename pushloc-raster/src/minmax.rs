//! Min/max k-d tree over the cells of an elevation grid.
//!
//! The tree is a balanced binary subdivision of the cell rectangle,
//! splitting along the larger side at each level, down to single cells.
//! Every node stores the elevation envelope `(min, max)` of the cells it
//! covers, which is what lets the Duvenhage traversal discard whole
//! subregions a ray cannot touch.
//!
//! Invariant, checked by the tests: for every node and every cell under
//! it, `node.min_elevation <= cell elevations <= node.max_elevation`. A
//! cell's own envelope is the min/max of its four corner samples, which
//! bounds the bilinear surface over the cell exactly (the extrema of a
//! bilinear function over a rectangle sit at its corners).

/// One node of the tree, covering the cell rectangle
/// `[min_row, min_row + rows) x [min_column, min_column + columns)`.
#[derive(Debug, Clone)]
pub struct MinMaxNode {
    pub min_row: usize,
    pub min_column: usize,
    pub rows: usize,
    pub columns: usize,
    pub min_elevation: f64,
    pub max_elevation: f64,
    children: Option<(usize, usize)>,
}

impl MinMaxNode {
    /// Indices of the two children, lower half first, or `None` for a
    /// single-cell leaf.
    #[inline]
    pub fn children(&self) -> Option<(usize, usize)> {
        self.children
    }

    /// True when the node covers exactly one cell.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// True when the split of an internal node is along the row
    /// (latitude) direction.
    #[inline]
    pub fn splits_along_rows(&self) -> bool {
        self.rows >= self.columns
    }

    /// Row or column index of the split boundary of an internal node.
    #[inline]
    pub fn split_index(&self) -> usize {
        if self.splits_along_rows() {
            self.min_row + self.rows / 2
        } else {
            self.min_column + self.columns / 2
        }
    }
}

/// The complete tree; nodes are stored in a flat arena, root first.
#[derive(Debug, Clone, Default)]
pub struct MinMaxTree {
    nodes: Vec<MinMaxNode>,
}

impl MinMaxTree {
    /// Builds the tree over a `(rows + 1) x (columns + 1)` sample grid
    /// stored row-major in `elevations` (so `rows x columns` cells).
    pub fn build(elevations: &[f64], sample_rows: usize, sample_columns: usize) -> Self {
        let cell_rows = sample_rows - 1;
        let cell_columns = sample_columns - 1;
        let mut tree = Self {
            nodes: Vec::with_capacity(2 * cell_rows * cell_columns),
        };
        tree.build_node(elevations, sample_columns, 0, 0, cell_rows, cell_columns);
        tree
    }

    #[inline]
    pub fn root(&self) -> &MinMaxNode {
        &self.nodes[0]
    }

    #[inline]
    pub fn node(&self, index: usize) -> &MinMaxNode {
        &self.nodes[index]
    }

    /// Elevation envelope of an arbitrary cell rectangle, walking down
    /// from the root and merging the envelopes of the covering nodes.
    pub fn elevation_range(
        &self,
        min_row: usize,
        min_column: usize,
        rows: usize,
        columns: usize,
    ) -> (f64, f64) {
        let mut range = (f64::INFINITY, f64::NEG_INFINITY);
        self.merge_range(0, min_row, min_column, rows, columns, &mut range);
        range
    }

    fn merge_range(
        &self,
        index: usize,
        min_row: usize,
        min_column: usize,
        rows: usize,
        columns: usize,
        range: &mut (f64, f64),
    ) {
        let node = &self.nodes[index];
        let row_overlap = node.min_row < min_row + rows && min_row < node.min_row + node.rows;
        let column_overlap =
            node.min_column < min_column + columns && min_column < node.min_column + node.columns;
        if !row_overlap || !column_overlap {
            return;
        }

        let contained = min_row <= node.min_row
            && node.min_row + node.rows <= min_row + rows
            && min_column <= node.min_column
            && node.min_column + node.columns <= min_column + columns;
        if contained || node.is_leaf() {
            range.0 = range.0.min(node.min_elevation);
            range.1 = range.1.max(node.max_elevation);
            return;
        }

        let (first, second) = node.children().unwrap_or((index, index));
        self.merge_range(first, min_row, min_column, rows, columns, range);
        self.merge_range(second, min_row, min_column, rows, columns, range);
    }

    fn build_node(
        &mut self,
        elevations: &[f64],
        sample_columns: usize,
        min_row: usize,
        min_column: usize,
        rows: usize,
        columns: usize,
    ) -> usize {
        let index = self.nodes.len();
        self.nodes.push(MinMaxNode {
            min_row,
            min_column,
            rows,
            columns,
            min_elevation: f64::INFINITY,
            max_elevation: f64::NEG_INFINITY,
            children: None,
        });

        if rows == 1 && columns == 1 {
            // leaf: envelope of the four corner samples
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for di in 0..2 {
                for dj in 0..2 {
                    let h = elevations[(min_row + di) * sample_columns + (min_column + dj)];
                    min = min.min(h);
                    max = max.max(h);
                }
            }
            self.nodes[index].min_elevation = min;
            self.nodes[index].max_elevation = max;
            return index;
        }

        let (first, second) = if rows >= columns {
            let half = rows / 2;
            (
                self.build_node(elevations, sample_columns, min_row, min_column, half, columns),
                self.build_node(
                    elevations,
                    sample_columns,
                    min_row + half,
                    min_column,
                    rows - half,
                    columns,
                ),
            )
        } else {
            let half = columns / 2;
            (
                self.build_node(elevations, sample_columns, min_row, min_column, rows, half),
                self.build_node(
                    elevations,
                    sample_columns,
                    min_row,
                    min_column + half,
                    rows,
                    columns - half,
                ),
            )
        };

        let min = self.nodes[first]
            .min_elevation
            .min(self.nodes[second].min_elevation);
        let max = self.nodes[first]
            .max_elevation
            .max(self.nodes[second].max_elevation);
        let node = &mut self.nodes[index];
        node.children = Some((first, second));
        node.min_elevation = min;
        node.max_elevation = max;
        index
    }
}
