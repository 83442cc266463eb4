//! Baudot (ITA2, US-TTY figures) code tables.
//!
//! Pure mapping between characters and 5-bit codes. The shift state is
//! carried by the caller; nothing here has side effects.
//!
//! CR, LF and space occupy the same code in both tables. The LTRS and FIGS
//! shift codes are not characters and never resolve from [`lookup`].

/// Shift code selecting the Letters table.
pub const LTRS: u8 = 0x1F;

/// Shift code selecting the Figures table.
pub const FIGS: u8 = 0x1B;

/// Carriage return (both tables).
pub const CR: u8 = 0x08;

/// Line feed (both tables).
pub const LF: u8 = 0x02;

/// Mask of the five data bits.
pub const CODE_MASK: u8 = 0x1F;

/// Which of the two code tables is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftState {
    Letters,
    Figures,
}

impl ShiftState {
    /// Shift code that switches the receiver into this state.
    #[inline]
    pub fn shift_code(self) -> u8 {
        match self {
            ShiftState::Letters => LTRS,
            ShiftState::Figures => FIGS,
        }
    }

    /// The other table.
    #[inline]
    pub fn other(self) -> Self {
        match self {
            ShiftState::Letters => ShiftState::Figures,
            ShiftState::Figures => ShiftState::Letters,
        }
    }
}

impl Default for ShiftState {
    fn default() -> Self {
        ShiftState::Letters
    }
}

// Index = 5-bit code. `None` for NUL and the two shift codes.
static LETTERS: [Option<char>; 32] = [
    None,       Some('E'), Some('\n'), Some('A'), Some(' '), Some('S'), Some('I'), Some('U'),
    Some('\r'), Some('D'), Some('R'),  Some('J'), Some('N'), Some('F'), Some('C'), Some('K'),
    Some('T'),  Some('Z'), Some('L'),  Some('W'), Some('H'), Some('Y'), Some('P'), Some('Q'),
    Some('O'),  Some('B'), Some('G'),  None,      Some('M'), Some('X'), Some('V'), None,
];

static FIGURES: [Option<char>; 32] = [
    None,       Some('3'), Some('\n'), Some('-'),  Some(' '), Some('\x07'), Some('8'), Some('7'),
    Some('\r'), Some('$'), Some('4'),  Some('\''), Some(','), Some('!'),    Some(':'), Some('('),
    Some('5'),  Some('"'), Some(')'),  Some('2'),  Some('#'), Some('6'),    Some('0'), Some('1'),
    Some('9'),  Some('?'), Some('&'),  None,       Some('.'), Some('/'),    Some(';'), None,
];

#[inline]
fn table(shift: ShiftState) -> &'static [Option<char>; 32] {
    match shift {
        ShiftState::Letters => &LETTERS,
        ShiftState::Figures => &FIGURES,
    }
}

/// Look up `c` in the table selected by `shift`.
///
/// Returns `None` when the character is absent from that table. Probing the
/// other table is the caller's job.
#[inline]
pub fn lookup(c: char, shift: ShiftState) -> Option<u8> {
    table(shift)
        .iter()
        .position(|&entry| entry == Some(c))
        .map(|code| code as u8)
}

/// Reverse mapping: the character a code stands for in `shift`.
#[inline]
pub fn decode(code: u8, shift: ShiftState) -> Option<char> {
    table(shift)[(code & CODE_MASK) as usize]
}

/// Resolve `c` against the `current` table first, then the other one.
///
/// Returns the table the code belongs to, so the caller can tell whether a
/// shift is needed. `None` means the character cannot be sent at all.
#[inline]
pub fn resolve(c: char, current: ShiftState) -> Option<(ShiftState, u8)> {
    lookup(c, current)
        .map(|code| (current, code))
        .or_else(|| lookup(c, current.other()).map(|code| (current.other(), code)))
}
