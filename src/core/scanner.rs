// Quote-context automaton
//
// Every stage that needs to know whether a byte is structural walks the input
// through Dialect::transition. The block scanner, the offset emitter, the sequential
// reference scan and the field splitter all share it, so they can never
// disagree about where a row ends.

/// Number of parser states; sizes the per-chunk transition table.
pub const NUM_STATES: usize = 4;

/// Quote context at a byte position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ParserState {
    #[default]
    Unquoted = 0,
    Quoted = 1,
    /// A quote was seen inside a quoted field: the next byte decides whether
    /// it closed the field or opened a doubled (escaped) quote.
    QuoteClosing = 2,
    /// Inside a comment; only the terminator is meaningful.
    Comment = 3,
}

impl ParserState {
    pub const ALL: [ParserState; NUM_STATES] = [
        ParserState::Unquoted,
        ParserState::Quoted,
        ParserState::QuoteClosing,
        ParserState::Comment,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// True where a delimiter or terminator is structural.
    #[inline]
    pub fn is_unquoted(self) -> bool {
        matches!(self, ParserState::Unquoted | ParserState::QuoteClosing)
    }
}

/// The structural bytes of the input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub quote: u8,
    pub doublequote: bool,
    pub comment: Option<u8>,
    pub terminator: u8,
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect {
            delimiter: b',',
            quote: b'"',
            doublequote: true,
            comment: None,
            terminator: b'\n',
        }
    }
}

impl Dialect {
    /// State after consuming `byte` in `state`.
    #[inline]
    pub fn transition(&self, state: ParserState, byte: u8) -> ParserState {
        match state {
            ParserState::Unquoted => self.unquoted(byte),
            ParserState::Quoted => {
                if byte != self.quote {
                    ParserState::Quoted
                } else if self.doublequote {
                    ParserState::QuoteClosing
                } else {
                    ParserState::Unquoted
                }
            }
            ParserState::QuoteClosing => {
                if byte == self.quote {
                    ParserState::Quoted
                } else {
                    self.unquoted(byte)
                }
            }
            ParserState::Comment => {
                if byte == self.terminator {
                    ParserState::Unquoted
                } else {
                    ParserState::Comment
                }
            }
        }
    }

    #[inline]
    fn unquoted(&self, byte: u8) -> ParserState {
        if byte == self.quote {
            ParserState::Quoted
        } else if Some(byte) == self.comment {
            ParserState::Comment
        } else {
            ParserState::Unquoted
        }
    }

    /// Whether `byte`, read in `state`, terminates the current row.
    #[inline]
    pub fn ends_row(&self, state: ParserState, byte: u8) -> bool {
        byte == self.terminator && state != ParserState::Quoted
    }

    /// Whether `byte`, read in `state`, separates two fields.
    #[inline]
    pub fn ends_field(&self, state: ParserState, byte: u8) -> bool {
        byte == self.delimiter && state.is_unquoted()
    }

    /// Walk `bytes` (located at absolute offset `base`) from `state`.
    ///
    /// Calls `emit` with the absolute start of every row that begins inside the
    /// walk, i.e. one past each row terminator, as long as that start is below
    /// `limit`. Returns the outgoing state and the number of starts emitted.
    #[inline]
    pub fn scan<F: FnMut(usize)>(
        &self,
        bytes: &[u8],
        base: usize,
        mut state: ParserState,
        limit: usize,
        mut emit: F,
    ) -> (ParserState, usize) {
        let mut rows = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            if self.ends_row(state, byte) {
                let next = base + i + 1;
                if next < limit {
                    emit(next);
                    rows += 1;
                }
            }
            state = self.transition(state, byte);
        }
        (state, rows)
    }
}
