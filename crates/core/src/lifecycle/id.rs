use std::collections::VecDeque;
use std::sync::Mutex;

use rand::Rng;

use crate::domain::booking::BookingId;

pub const BOOKING_ID_LEN: usize = 8;
const ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub trait BookingIdGenerator: Send + Sync {
    fn next_id(&self) -> BookingId;
}

/// Eight random characters from `A-Z0-9`. Uniqueness is enforced at insert.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomBookingIdGenerator;

impl BookingIdGenerator for RandomBookingIdGenerator {
    fn next_id(&self) -> BookingId {
        let mut rng = rand::thread_rng();
        let id = (0..BOOKING_ID_LEN)
            .map(|_| char::from(ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())]))
            .collect();
        BookingId(id)
    }
}

/// Hands out a fixed list of ids in order, repeating the last one once the
/// list runs out. Used to force collisions deterministically.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    remaining: Mutex<VecDeque<BookingId>>,
    last: Mutex<Option<BookingId>>,
}

impl SequenceIdGenerator {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let remaining = ids.into_iter().map(|id| BookingId::normalize(id.as_ref())).collect();
        Self { remaining: Mutex::new(remaining), last: Mutex::new(None) }
    }
}

impl BookingIdGenerator for SequenceIdGenerator {
    fn next_id(&self) -> BookingId {
        let next = match self.remaining.lock() {
            Ok(mut remaining) => remaining.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        let mut last = match self.last.lock() {
            Ok(last) => last,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(id) = next {
            *last = Some(id);
        }
        last.clone().unwrap_or_else(|| BookingId("A".repeat(BOOKING_ID_LEN)))
    }
}

pub fn is_well_formed(id: &BookingId) -> bool {
    id.as_str().len() == BOOKING_ID_LEN
        && id.as_str().bytes().all(|byte| byte.is_ascii_uppercase() || byte.is_ascii_digit())
}
