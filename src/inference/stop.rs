// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Stop-sequence matching for completion output

/// Byte offset of the earliest stop sequence in `text`, if any
pub fn find_stop(text: &str, stop_sequences: &[String]) -> Option<usize> {
    stop_sequences
        .iter()
        .filter(|stop| !stop.is_empty())
        .filter_map(|stop| text.find(stop.as_str()))
        .min()
}

/// Cuts `text` before its earliest stop sequence
///
/// Returns true when a stop sequence was found.
pub fn truncate_at_stop(text: &mut String, stop_sequences: &[String]) -> bool {
    match find_stop(text, stop_sequences) {
        Some(at) => {
            text.truncate(at);
            true
        }
        None => false,
    }
}
