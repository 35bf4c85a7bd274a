// ID Generator - Snowflake-like 64-bit record ids
// Layout: [timestamp_ms:42][node_id:10][sequence:12]

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::RecordId;

const NODE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;
pub const MAX_NODE_ID: u16 = (1 << NODE_BITS) - 1;

#[derive(Debug)]
struct GeneratorState {
    last_timestamp: u64,
    sequence: u64,
}

/// Ids are strictly increasing per node, so ordering by id is insertion order
#[derive(Debug)]
pub struct IdGenerator {
    node_id: u16,
    state: Mutex<GeneratorState>,
}

impl IdGenerator {
    /// Node ids above `MAX_NODE_ID` are masked into range
    pub fn new(node_id: u16) -> Self {
        Self {
            node_id: node_id & MAX_NODE_ID,
            state: Mutex::new(GeneratorState {
                last_timestamp: 0,
                sequence: 0,
            }),
        }
    }

    pub fn next_id(&self) -> RecordId {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut now = current_millis().max(state.last_timestamp);
        if now == state.last_timestamp {
            state.sequence = (state.sequence + 1) & MAX_SEQUENCE;
            if state.sequence == 0 {
                // Sequence exhausted, spin until the next millisecond
                while now <= state.last_timestamp {
                    std::hint::spin_loop();
                    now = current_millis();
                }
            }
        } else {
            state.sequence = 0;
        }
        state.last_timestamp = now;

        let id = ((now & 0x3FF_FFFF_FFFF) << (NODE_BITS + SEQUENCE_BITS))
            | ((self.node_id as u64) << SEQUENCE_BITS)
            | state.sequence;
        id as RecordId
    }
}

fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
