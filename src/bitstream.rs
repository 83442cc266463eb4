//! Bitstream generator: message text to framed Baudot symbols.
//!
//! # Plan layout
//!
//! ```text
//! [CR][LF][LTRS|FIGS] [c0] [c1] [FIGS] [c2] ...
//!  └── preamble ────┘  └── message, shift inserted only on demand
//! ```
//!
//! Each symbol is framed as `0 d0 d1 d2 d3 d4 1 1` (start bit, five data
//! bits least-significant first, two stop bits).
//!
//! # Caller invariant
//!
//! Input must already be upper-cased. Lower-case letters are not in either
//! table and are skipped like any other unencodable character.

use crate::baudot::{self, ShiftState, CR, FIGS, LF, LTRS};

/// Bits per framed symbol (1 start + 5 data + 2 stop).
pub const SYMBOL_BITS: usize = 8;

/// Number of symbols every plan starts with (CR, LF, initial shift).
pub const PREAMBLE_SYMBOLS: usize = 3;

/// Shift state used when a message has no encodable character.
pub const EMPTY_MESSAGE_SHIFT: ShiftState = ShiftState::Letters;

/// One Baudot code unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Symbol {
    code: u8,
}

impl Symbol {
    /// Wrap a 5-bit code (upper bits are ignored).
    #[inline]
    pub const fn new(code: u8) -> Self {
        Self { code: code & baudot::CODE_MASK }
    }

    #[inline]
    pub fn code(&self) -> u8 {
        self.code
    }

    /// True for LTRS and FIGS.
    #[inline]
    pub fn is_shift(&self) -> bool {
        self.code == LTRS || self.code == FIGS
    }

    /// Framed bits in transmission order.
    #[inline]
    pub fn bits(&self) -> [u8; SYMBOL_BITS] {
        let mut bits = [0, 0, 0, 0, 0, 0, 1, 1];
        for (i, bit) in bits[1..6].iter_mut().enumerate() {
            *bit = (self.code >> i) & 1;
        }
        bits
    }

    /// Inverse of [`Symbol::bits`].
    ///
    /// Returns `None` if the start or stop bits are wrong.
    pub fn from_bits(bits: &[u8]) -> Option<Self> {
        if bits.len() != SYMBOL_BITS || bits[0] != 0 || bits[6] != 1 || bits[7] != 1 {
            return None;
        }
        let code = bits[1..6]
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &b)| acc | ((b & 1) << i));
        Some(Self::new(code))
    }
}

/// The ordered symbols for one message.
///
/// Built once per send and never mutated. Iterating it again yields the same
/// symbols, so it can be measured before being transmitted.
#[derive(Clone, Debug)]
pub struct TransmissionPlan<I> {
    chars: I,
    initial: ShiftState,
}

impl<'a> TransmissionPlan<core::str::Chars<'a>> {
    /// Plan for an already upper-cased message.
    pub fn new(message: &'a str) -> Self {
        Self::from_chars(message.chars())
    }
}

impl<I> TransmissionPlan<I>
where
    I: Iterator<Item = char> + Clone,
{
    /// Plan over any character source (e.g. a case-folding adapter).
    pub fn from_chars(chars: I) -> Self {
        let initial = initial_shift(chars.clone());
        Self { chars, initial }
    }

    /// Shift state announced by the preamble.
    #[inline]
    pub fn initial_shift(&self) -> ShiftState {
        self.initial
    }

    /// Symbols in transmission order, preamble included.
    pub fn symbols(&self) -> Symbols<I> {
        Symbols {
            chars: self.chars.clone(),
            shift: self.initial,
            stage: Stage::Cr,
            pending: None,
        }
    }

    /// Flattened bit sequence, one entry per tone-hold interval.
    pub fn bits(&self) -> Bits<I> {
        Bits {
            symbols: self.symbols(),
            current: [0; SYMBOL_BITS],
            pos: SYMBOL_BITS,
        }
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols().count()
    }

    #[inline]
    pub fn bit_count(&self) -> usize {
        self.symbol_count() * SYMBOL_BITS
    }

    /// Characters that resolve in neither table.
    pub fn skipped(&self) -> usize {
        self.chars
            .clone()
            .filter(|&c| baudot::resolve(c, ShiftState::Letters).is_none())
            .count()
    }
}

/// Table of the first encodable character, or [`EMPTY_MESSAGE_SHIFT`].
fn initial_shift<I: Iterator<Item = char>>(mut chars: I) -> ShiftState {
    chars
        .find_map(|c| {
            if baudot::lookup(c, ShiftState::Letters).is_some() {
                Some(ShiftState::Letters)
            } else if baudot::lookup(c, ShiftState::Figures).is_some() {
                Some(ShiftState::Figures)
            } else {
                None
            }
        })
        .unwrap_or(EMPTY_MESSAGE_SHIFT)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Cr,
    Lf,
    InitialShift,
    Message,
}

/// Iterator over the symbols of a [`TransmissionPlan`].
#[derive(Clone, Debug)]
pub struct Symbols<I> {
    chars: I,
    shift: ShiftState,
    stage: Stage,
    /// Character symbol queued behind a shift symbol.
    pending: Option<Symbol>,
}

impl<I> Symbols<I> {
    /// Shift state after the symbols yielded so far.
    #[inline]
    pub fn shift(&self) -> ShiftState {
        self.shift
    }
}

impl<I: Iterator<Item = char>> Iterator for Symbols<I> {
    type Item = Symbol;

    fn next(&mut self) -> Option<Symbol> {
        if let Some(symbol) = self.pending.take() {
            return Some(symbol);
        }

        match self.stage {
            Stage::Cr => {
                self.stage = Stage::Lf;
                Some(Symbol::new(CR))
            }
            Stage::Lf => {
                self.stage = Stage::InitialShift;
                Some(Symbol::new(LF))
            }
            Stage::InitialShift => {
                self.stage = Stage::Message;
                Some(Symbol::new(self.shift.shift_code()))
            }
            Stage::Message => loop {
                let c = self.chars.next()?;
                let Some((table, code)) = baudot::resolve(c, self.shift) else {
                    continue;
                };
                if table != self.shift {
                    self.shift = table;
                    self.pending = Some(Symbol::new(code));
                    return Some(Symbol::new(table.shift_code()));
                }
                return Some(Symbol::new(code));
            },
        }
    }
}

/// Iterator over the framed bits of a [`TransmissionPlan`].
#[derive(Clone, Debug)]
pub struct Bits<I> {
    symbols: Symbols<I>,
    current: [u8; SYMBOL_BITS],
    pos: usize,
}

impl<I: Iterator<Item = char>> Iterator for Bits<I> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.pos == SYMBOL_BITS {
            self.current = self.symbols.next()?.bits();
            self.pos = 0;
        }
        let bit = self.current[self.pos];
        self.pos += 1;
        Some(bit)
    }
}
