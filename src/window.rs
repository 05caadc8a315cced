//! Addressable pixel windows and the register words that select them.

/// Physical width of the panel's addressing space (short edge).
pub const PANEL_WIDTH: u16 = 132;
/// Physical height of the panel's addressing space (long edge).
pub const PANEL_HEIGHT: u16 = 176;

/// Panel registers written as `(register << 8) | value` words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Register bank select (EFh) - the value selects the bank
    BankSelect = 0xEF,
    /// Entry Mode (18h) - scan direction / orientation
    EntryMode = 0x18,
    /// Column Start (12h) - first column of the write window
    ColumnStart = 0x12,
    /// Row Start (13h) - first row of the write window
    RowStart = 0x13,
    /// Column End (15h) - last column of the write window
    ColumnEnd = 0x15,
    /// Row End (16h) - last row of the write window
    RowEnd = 0x16,
}

/// Bank holding the addressing registers.
pub const ADDRESSING_BANK: u8 = 0x08;

impl Register {
    /// Pack the register and an 8-bit value into one command word.
    pub const fn word(self, value: u8) -> u16 {
        ((self as u16) << 8) | value as u16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    Portrait = 0x00,
    /// Columns are scanned in reverse, so column-start > column-end.
    Landscape = 0x05,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    Column,
    Row,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Toward higher register values.
    Forward,
    /// Toward lower register values.
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WindowError {
    ColumnOutOfRange,
    RowOutOfRange,
}

/// Bounds a sprite may travel within along one axis, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Travel {
    pub axis: Axis,
    pub step: u8,
    pub min: u8,
    pub max: u8,
}

impl Travel {
    /// Whole visible column range, one column per move.
    pub const fn columns() -> Self {
        Self {
            axis: Axis::Column,
            step: 1,
            min: 0,
            max: (PANEL_WIDTH - 1) as u8,
        }
    }

    /// Whole visible row range, one row per move.
    pub const fn rows() -> Self {
        Self {
            axis: Axis::Row,
            step: 1,
            min: 0,
            max: (PANEL_HEIGHT - 1) as u8,
        }
    }
}

/// A rectangular write window in physical register coordinates.
///
/// Writing pixel data after the window's words have been sent fills it in
/// scan order; the panel wraps its write cursor inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Window {
    orientation: Orientation,
    column_start: u8,
    column_end: u8,
    row_start: u8,
    row_end: u8,
}

/// Portrait 20x15 block, 35 columns from the left and 90 rows from the top.
pub const SPRITE_WINDOW: Window = Window::from_raw(Orientation::Portrait, 35, 54, 90, 104);

/// Landscape 76x140 image region.
pub const IMAGE_WINDOW: Window = Window::from_raw(Orientation::Landscape, 103, 28, 18, 157);

impl Window {
    /// Number of command words sent to select a window.
    pub const WORDS: usize = 6;

    const fn from_raw(
        orientation: Orientation,
        column_start: u8,
        column_end: u8,
        row_start: u8,
        row_end: u8,
    ) -> Self {
        Self {
            orientation,
            column_start,
            column_end,
            row_start,
            row_end,
        }
    }

    pub fn new(
        orientation: Orientation,
        column_start: u8,
        column_end: u8,
        row_start: u8,
        row_end: u8,
    ) -> Result<Self, WindowError> {
        if u16::from(column_start.max(column_end)) >= PANEL_WIDTH {
            return Err(WindowError::ColumnOutOfRange);
        }
        if u16::from(row_start.max(row_end)) >= PANEL_HEIGHT {
            return Err(WindowError::RowOutOfRange);
        }
        Ok(Self::from_raw(
            orientation,
            column_start,
            column_end,
            row_start,
            row_end,
        ))
    }

    /// Window covering a `width` x `height` area from the origin.
    ///
    /// Dimensions are clamped to the physical addressing space.
    pub const fn full_screen(orientation: Orientation, width: u16, height: u16) -> Self {
        let last_column = if width > PANEL_WIDTH {
            PANEL_WIDTH
        } else {
            width
        };
        let last_row = if height > PANEL_HEIGHT {
            PANEL_HEIGHT
        } else {
            height
        };
        let last_column = last_column.saturating_sub(1) as u8;
        let last_row = last_row.saturating_sub(1) as u8;
        match orientation {
            Orientation::Portrait => Self::from_raw(orientation, 0, last_column, 0, last_row),
            Orientation::Landscape => Self::from_raw(orientation, last_column, 0, 0, last_row),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn columns(&self) -> (u8, u8) {
        (self.column_start, self.column_end)
    }

    pub fn rows(&self) -> (u8, u8) {
        (self.row_start, self.row_end)
    }

    pub fn width(&self) -> u16 {
        u16::from(self.column_start.abs_diff(self.column_end)) + 1
    }

    pub fn height(&self) -> u16 {
        u16::from(self.row_start.abs_diff(self.row_end)) + 1
    }

    /// Pixels the panel expects after this window has been addressed.
    pub fn area(&self) -> u32 {
        u32::from(self.width()) * u32::from(self.height())
    }

    /// Command words selecting this window, in transmission order.
    ///
    /// Bounds are written column-start, row-start, column-end, row-end. The
    /// registers latch independently once the bank is selected; the vendor
    /// init blocks write column-end before row-start and are replayed as-is.
    pub fn to_words(&self) -> [u16; Self::WORDS] {
        [
            Register::BankSelect.word(ADDRESSING_BANK),
            Register::EntryMode.word(self.orientation as u8),
            Register::ColumnStart.word(self.column_start),
            Register::RowStart.word(self.row_start),
            Register::ColumnEnd.word(self.column_end),
            Register::RowEnd.word(self.row_end),
        ]
    }

    /// Lowest and highest register value on `axis`.
    fn span(&self, axis: Axis) -> (u8, u8) {
        let (a, b) = match axis {
            Axis::Column => self.columns(),
            Axis::Row => self.rows(),
        };
        (a.min(b), a.max(b))
    }

    /// Whether one `travel.step` in `direction` keeps the window inside `travel`.
    pub fn can_shift(&self, travel: &Travel, direction: Direction) -> bool {
        let (low, high) = self.span(travel.axis);
        match direction {
            Direction::Forward => high
                .checked_add(travel.step)
                .is_some_and(|edge| edge <= travel.max),
            Direction::Backward => low
                .checked_sub(travel.step)
                .is_some_and(|edge| edge >= travel.min),
        }
    }

    /// Move both bounds on the travel axis by one step.
    ///
    /// Returns `false` and leaves the window untouched when the move would
    /// leave the travel range.
    pub fn shift(&mut self, travel: &Travel, direction: Direction) -> bool {
        if !self.can_shift(travel, direction) {
            return false;
        }
        let (start, end) = match travel.axis {
            Axis::Column => (&mut self.column_start, &mut self.column_end),
            Axis::Row => (&mut self.row_start, &mut self.row_end),
        };
        match direction {
            Direction::Forward => {
                *start += travel.step;
                *end += travel.step;
            }
            Direction::Backward => {
                *start -= travel.step;
                *end -= travel.step;
            }
        }
        true
    }
}
