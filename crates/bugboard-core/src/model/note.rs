use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One entry in a report's append-only timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub text: String,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Note {
    /// Build a note with a freshly generated client-side id.
    #[must_use]
    pub fn new(text: impl Into<String>, time: DateTime<Utc>, author: Option<String>) -> Self {
        Self {
            id: generate_note_id(time),
            text: text.into(),
            time,
            author,
        }
    }
}

/// Time-prefixed note id: base-36 Unix millis followed by a random base-36 tail.
#[must_use]
pub fn generate_note_id(time: DateTime<Utc>) -> String {
    let millis = u64::try_from(time.timestamp_millis()).unwrap_or(0);
    let tail: u64 = rand::thread_rng().gen_range(36_u64.pow(8)..u64::MAX);
    let mut id = to_base36(millis);
    id.push_str(&to_base36(tail));
    id
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(13);
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}
