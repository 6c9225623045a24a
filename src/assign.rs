//! Round-robin channel assignment.
//!
//! Every tile-block decomposes into a grid of steps; each step's bytes go to
//! exactly one physical channel. [`ChannelAssignmentTable`] is that mapping,
//! validated to be a bijection onto the channel set so that one cross-channel
//! page read always reconstructs a whole, spatially local tile-block.

use alloc::vec;
use alloc::vec::Vec;

use crate::geometry::GeometryError;

/// A position in a tile-block's step grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StepPos {
    /// Step row, `0..step_rows`.
    pub row: usize,
    /// Step column, `0..step_cols`.
    pub col: usize,
}

/// Validated step-grid to channel mapping, with its precomputed inverse.
///
/// For the reference table `[[0,4],[1,5],[2,6],[3,7]]` the inverse is
/// `channel c -> StepPos { row: c % 4, col: c / 4 }`: channels 0-3 serve the
/// left step column, channels 4-7 the right.
#[derive(Clone, Debug)]
pub struct ChannelAssignmentTable {
    step_rows: usize,
    step_cols: usize,
    forward: Vec<usize>,
    inverse: Vec<StepPos>,
}

impl ChannelAssignmentTable {
    /// Validate a row-major matrix against the step grid and channel set.
    pub(crate) fn from_rows(
        rows: &[Vec<usize>],
        step_rows: usize,
        step_cols: usize,
        channels: usize,
    ) -> Result<Self, GeometryError> {
        if rows.len() != step_rows {
            return Err(GeometryError::TableShape {
                rows: rows.len(),
                cols: rows.first().map_or(0, Vec::len),
                step_rows,
                step_cols,
            });
        }
        for row in rows {
            if row.len() != step_cols {
                return Err(GeometryError::TableShape {
                    rows: rows.len(),
                    cols: row.len(),
                    step_rows,
                    step_cols,
                });
            }
        }
        let cells = step_rows * step_cols;
        if cells != channels {
            return Err(GeometryError::ChannelCount {
                table: cells,
                channels,
            });
        }

        let mut forward = Vec::with_capacity(cells);
        let mut inverse = vec![StepPos { row: 0, col: 0 }; channels];
        let mut seen = vec![false; channels];
        for (r, row) in rows.iter().enumerate() {
            for (c, &channel) in row.iter().enumerate() {
                if channel >= channels {
                    return Err(GeometryError::ChannelRange { channel, channels });
                }
                if seen[channel] {
                    return Err(GeometryError::DuplicateChannel { channel });
                }
                seen[channel] = true;
                forward.push(channel);
                inverse[channel] = StepPos { row: r, col: c };
            }
        }

        Ok(Self {
            step_rows,
            step_cols,
            forward,
            inverse,
        })
    }

    /// Number of channels (equals the step cell count).
    pub fn channels(&self) -> usize {
        self.inverse.len()
    }

    /// Step rows per tile-block.
    pub fn step_rows(&self) -> usize {
        self.step_rows
    }

    /// Step columns per tile-block.
    pub fn step_cols(&self) -> usize {
        self.step_cols
    }

    /// The channel that receives the given step's bytes.
    ///
    /// # Panics
    ///
    /// Panics if `step` lies outside the step grid.
    pub fn channel_at(&self, step: StepPos) -> usize {
        assert!(
            step.row < self.step_rows && step.col < self.step_cols,
            "step ({},{}) outside {}x{} grid",
            step.row,
            step.col,
            self.step_rows,
            self.step_cols
        );
        self.forward[step.row * self.step_cols + step.col]
    }

    /// The step that routes to the given channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn step_of(&self, channel: usize) -> StepPos {
        self.inverse[channel]
    }
}
