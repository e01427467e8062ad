//! Grammar-element framework for RFC 7230 productions.
//!
//! Per-production parsing is decoupled from the message state machine: an
//! element recognizes one instance of a production at the start of its input
//! and reports a [`Step`]; list productions expose `begin`/`increment`
//! stepping so callers can walk comma-separated values without allocating.
//!
//! The combinators mirror a consume/validate algorithm: [`consume`] returns
//! the matched length (zero on non-match), [`is_valid`] checks that a slice
//! matches a production exactly, and [`validate`] turns a mismatch into
//! [`FieldError::InvalidArgument`]. In these combinators both `Reject` and
//! `NeedMore` are treated as non-match, since the slice under validation is
//! complete by definition.
//!
//! Everything here dispatches statically; there are no trait objects on the
//! parse path.

mod primitives;

pub use primitives::ChunkExtList;
pub use primitives::FieldValue;
pub use primitives::ProtocolList;
pub use primitives::QuotedString;
pub use primitives::Token;
pub use primitives::TokenList;
pub use primitives::TransferCodingList;

use crate::protocol::FieldError;
use std::marker::PhantomData;
use std::ops::Range;

/// Outcome of one element-parse attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The element consumed input up to the returned position and may
    /// continue if more follows.
    Advance(usize),
    /// The element is complete; its terminator sits at the returned position.
    End(usize),
    /// The input ended before the element could be decided.
    NeedMore,
    /// The input does not match the production.
    Reject,
}

/// One grammar production, recognized at the start of the input.
pub trait Element {
    fn parse(input: &[u8]) -> Step;
}

/// Outcome of one list-stepping attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStep {
    /// An element was found at `elem`; scanning resumes at `next`.
    Item { elem: Range<usize>, next: usize },
    /// The list is complete; its terminator sits at `next`.
    End { next: usize },
    /// The input ended before the next element could be decided.
    NeedMore,
    /// The input does not match the list production.
    Reject,
}

/// A comma-separated list production with `begin`/`increment` stepping.
pub trait List {
    /// Locates the first element.
    fn begin(input: &[u8]) -> ListStep;

    /// Locates the element after position `at`, which must be the `next`
    /// position of a previously returned [`ListStep::Item`].
    fn increment(input: &[u8], at: usize) -> ListStep;
}

/// Returns the number of bytes one `E` occupies at the start of `input`,
/// or zero when the input does not begin with a complete `E`.
pub fn consume<E: Element>(input: &[u8]) -> usize {
    match E::parse(input) {
        Step::End(next) => next,
        _ => 0,
    }
}

/// Returns the number of bytes the list `L` occupies at the start of
/// `input`, or zero on non-match.
pub fn consume_list<L: List>(input: &[u8]) -> usize {
    let mut step = L::begin(input);
    loop {
        match step {
            ListStep::Item { next, .. } => step = L::increment(input, next),
            ListStep::End { next } => return next,
            ListStep::NeedMore | ListStep::Reject => return 0,
        }
    }
}

/// Returns true if `input` matches `E` exactly.
pub fn is_valid<E: Element>(input: &[u8]) -> bool {
    consume::<E>(input) == input.len()
}

/// Returns true if `input` matches the list `L` exactly.
pub fn is_valid_list<L: List>(input: &[u8]) -> bool {
    consume_list::<L>(input) == input.len()
}

/// Fails with [`FieldError::InvalidArgument`] unless `input` matches `E`
/// exactly.
pub fn validate<E: Element>(input: &[u8]) -> Result<(), FieldError> {
    if is_valid::<E>(input) {
        Ok(())
    } else {
        Err(FieldError::invalid_argument("bad syntax"))
    }
}

/// Fails with [`FieldError::InvalidArgument`] unless `input` matches the
/// list `L` exactly.
pub fn validate_list<L: List>(input: &[u8]) -> Result<(), FieldError> {
    if is_valid_list::<L>(input) {
        Ok(())
    } else {
        Err(FieldError::invalid_argument("bad syntax"))
    }
}

/// Iterates the element slices of a list value in order.
///
/// Yields `Err(())` once and then ends if the value does not match the list
/// production; callers map that onto the taxonomy error for their context.
pub fn list_items<L: List>(input: &[u8]) -> ListItems<'_, L> {
    ListItems { input, state: IterState::Begin, _list: PhantomData }
}

pub struct ListItems<'a, L: List> {
    input: &'a [u8],
    state: IterState,
    _list: PhantomData<L>,
}

#[derive(Clone, Copy)]
enum IterState {
    Begin,
    At(usize),
    Done,
}

impl<'a, L: List> Iterator for ListItems<'a, L> {
    type Item = Result<&'a [u8], ()>;

    fn next(&mut self) -> Option<Self::Item> {
        let step = match self.state {
            IterState::Begin => L::begin(self.input),
            IterState::At(pos) => L::increment(self.input, pos),
            IterState::Done => return None,
        };
        match step {
            ListStep::Item { elem, next } => {
                self.state = IterState::At(next);
                Some(Ok(&self.input[elem]))
            }
            ListStep::End { next } => {
                self.state = IterState::Done;
                // trailing bytes after the list terminator are a mismatch
                if next == self.input.len() {
                    None
                } else {
                    Some(Err(()))
                }
            }
            ListStep::NeedMore | ListStep::Reject => {
                self.state = IterState::Done;
                Some(Err(()))
            }
        }
    }
}
