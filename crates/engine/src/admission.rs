// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue admission and parameter patching.

use crate::EngineError;
use sluice_core::{fingerprint, Clock, EnqueueRequest, KeyedRequest};
use sluice_queue::RequestQueue;

/// Fingerprint a validated request and admit it to the queue.
///
/// With `queue_dedup` set, admission goes through the keyed path so a
/// resident duplicate is suppressed while still reporting success to the
/// caller. Returns [`EngineError::QueueFull`] when there is no room.
pub fn admit(
    queue: &dyn RequestQueue<KeyedRequest>,
    request: EnqueueRequest,
    label_override: Vec<String>,
    queue_dedup: bool,
    clock: &dyn Clock,
) -> Result<(), EngineError> {
    let key = fingerprint(request.raw.as_bytes());
    let keyed = KeyedRequest {
        request,
        request_key: key,
        enqueue_time_ms: clock.epoch_ms(),
        label_override,
    };

    let admitted = if queue_dedup {
        queue.enqueue_keyed(key, keyed)?
    } else {
        queue.enqueue(keyed)?
    };
    if !admitted {
        return Err(EngineError::QueueFull);
    }
    Ok(())
}

/// Merge `patch` onto `base`, overwriting on conflicts.
///
/// Objects merge recursively; any other pairing replaces the base value
/// outright.
pub fn merge_patch(base: &mut serde_json::Value, patch: &serde_json::Value) {
    use serde_json::Value;

    if let (Value::Object(base_map), Value::Object(patch_map)) = (&mut *base, patch) {
        for (key, patch_value) in patch_map {
            match base_map.get_mut(key) {
                Some(slot) if slot.is_object() && patch_value.is_object() => {
                    merge_patch(slot, patch_value);
                }
                _ => {
                    base_map.insert(key.clone(), patch_value.clone());
                }
            }
        }
        return;
    }
    *base = patch.clone();
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
