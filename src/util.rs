use std::ops::RangeFrom;
use std::sync::{Mutex, MutexGuard};

use nom::error::{make_error, ErrorKind, ParseError};
use nom::{Err, IResult, InputIter, InputLength, Slice};
use tinyvec::ArrayVec;

pub fn be_u48<I, E: ParseError<I>>(input: I) -> IResult<I, u64, E>
where
    I: Slice<RangeFrom<usize>> + InputIter<Item = u8> + InputLength,
{
    let bound: usize = 6;

    if input.input_len() < bound {
        Err(Err::Error(make_error(input, ErrorKind::Eof)))
    } else {
        let mut res = 0u64;

        for byte in input.iter_elements().take(bound) {
            res = (res << 8) + byte as u64;
        }

        Ok((input.slice(bound..), res))
    }
}

/// The big-endian bytes of `value` with leading zeros stripped, at most
/// `width` bytes. A zero value yields no bytes at all.
pub fn min_be_bytes(value: u64, width: usize) -> ArrayVec<[u8; 8]> {
    debug_assert!(width <= 8);
    let mut out = ArrayVec::new();
    let bytes = value.to_be_bytes();
    let mut significant = &bytes[8 - width..];
    while let Some((0, rest)) = significant.split_first() {
        significant = rest;
    }
    out.extend_from_slice(significant);
    out
}

/// Big-endian value of up to 8 raw bytes.
pub fn be_value(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// Lock a mutex, recovering the guard if a previous holder panicked.
pub fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
