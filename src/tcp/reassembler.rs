use super::ByteStream;
use log::trace;
use std::collections::BTreeMap;

/// Puts substrings of a byte stream back in order.
///
/// Substrings may arrive in any order, overlap, or repeat. Bytes that extend
/// the stream are written to the output immediately; bytes beyond a gap are
/// held until the gap fills. Nothing past the output's free capacity is ever
/// held, so memory stays bounded by the window regardless of stream offsets.
#[derive(Debug)]
pub struct Reassembler {
    output: ByteStream,
    /// Held ranges keyed by first index. Entries never overlap or touch.
    pending: BTreeMap<u64, Vec<u8>>,
    bytes_pending: u64,
    /// Index one past the final byte, once the last substring was seen.
    terminate_index: Option<u64>,
}

impl Reassembler {
    pub fn new(output: ByteStream) -> Self {
        Reassembler {
            output,
            pending: BTreeMap::new(),
            bytes_pending: 0,
            terminate_index: None,
        }
    }

    /// Insert `data`, whose first byte has stream index `first_index`.
    pub fn insert(&mut self, first_index: u64, data: &[u8], is_last_substring: bool) {
        let expecting = self.expecting_index();
        let capacity = self.output.available_capacity() as u64;
        let unacceptable = expecting + capacity;

        if self.output.is_closed() || capacity == 0 || first_index >= unacceptable {
            trace!(
                "reassembler dropped [{}, {}) outside window [{}, {})",
                first_index,
                first_index + data.len() as u64,
                expecting,
                unacceptable
            );
            return;
        }

        let last_index = first_index + data.len() as u64;
        if is_last_substring && last_index <= unacceptable {
            self.terminate_index = Some(last_index);
        }

        let start = first_index.max(expecting);
        let end = last_index.min(unacceptable);
        if start < end {
            let slice = &data[(start - first_index) as usize..(end - first_index) as usize];
            self.store(start, slice);
            self.flush();
        }

        if self.terminate_index == Some(self.expecting_index()) {
            self.output.close();
        }
    }

    /// Merge `data` at `start` into the pending set.
    fn store(&mut self, start: u64, data: &[u8]) {
        let mut start = start;
        let mut end = start + data.len() as u64;
        let mut merged = data.to_vec();

        // a predecessor that overlaps or touches absorbs the new range
        let before = self
            .pending
            .range(..=start)
            .next_back()
            .map(|(&s, bytes)| (s, s + bytes.len() as u64));
        if let Some((prev_start, prev_end)) = before {
            if prev_end >= end {
                return;
            }
            if prev_end >= start {
                if let Some(mut prev) = self.pending.remove(&prev_start) {
                    self.bytes_pending -= prev.len() as u64;
                    prev.extend_from_slice(&merged[(prev_end - start) as usize..]);
                    merged = prev;
                    start = prev_start;
                }
            }
        }

        // successors starting inside or right at the end are swallowed
        while let Some(next_start) = self.pending.range(start..=end).next().map(|(&s, _)| s) {
            let Some(next) = self.pending.remove(&next_start) else {
                break;
            };
            self.bytes_pending -= next.len() as u64;
            let next_end = next_start + next.len() as u64;
            if next_end > end {
                merged.extend_from_slice(&next[(end - next_start) as usize..]);
                end = next_end;
            }
        }

        self.bytes_pending += merged.len() as u64;
        self.pending.insert(start, merged);
    }

    /// Write every pending range that now continues the stream.
    fn flush(&mut self) {
        while let Some((&start, _)) = self.pending.first_key_value() {
            if start != self.expecting_index() {
                break;
            }
            let Some((_, bytes)) = self.pending.pop_first() else {
                break;
            };
            self.bytes_pending -= bytes.len() as u64;
            self.output.push(&bytes);
        }
    }

    /// Index of the next byte the output is waiting for.
    fn expecting_index(&self) -> u64 {
        self.output.bytes_pushed()
    }

    /// Bytes held back because a gap precedes them.
    pub fn bytes_pending(&self) -> u64 {
        self.bytes_pending
    }

    pub fn reader(&self) -> &ByteStream {
        &self.output
    }

    pub fn reader_mut(&mut self) -> &mut ByteStream {
        &mut self.output
    }

    pub fn writer(&self) -> &ByteStream {
        &self.output
    }
}
