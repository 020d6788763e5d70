//! Chronologically sortable child keys.
//!
//! A key is 20 characters: 8 encode the creation time in milliseconds, 12 are
//! random. Keys created within the same millisecond reuse the previous random
//! part incremented by one, so lexical order always equals creation order.

use std::sync::Mutex;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

#[derive(Debug, Default)]
struct PushIdState {
    last_push_time: Option<u64>,
    last_random: [u8; RANDOM_CHARS],
}

/// Generator of push keys
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<PushIdState>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a key for `now_millis`
    pub fn generate(&self, now_millis: i64) -> String {
        let now = u64::try_from(now_millis).unwrap_or(0);
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if state.last_push_time == Some(now) {
            increment(&mut state.last_random);
        } else {
            state.last_random = random_indices();
        }
        state.last_push_time = Some(now);

        let mut key = String::with_capacity(TIME_CHARS + RANDOM_CHARS);
        let mut time_chars = [0u8; TIME_CHARS];
        let mut remaining = now;
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }
        key.extend(time_chars.iter().map(|&c| c as char));
        key.extend(
            state
                .last_random
                .iter()
                .map(|&index| PUSH_CHARS[index as usize] as char),
        );
        key
    }
}

fn random_indices() -> [u8; RANDOM_CHARS] {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    let mut indices = [0u8; RANDOM_CHARS];
    for (index, byte) in indices.iter_mut().zip(bytes.iter()) {
        *index = byte & 63;
    }
    indices
}

fn increment(indices: &mut [u8; RANDOM_CHARS]) {
    for index in indices.iter_mut().rev() {
        if *index == 63 {
            *index = 0;
        } else {
            *index += 1;
            return;
        }
    }
}
