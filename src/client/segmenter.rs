// ABOUTME: Splits outbound text into PDU-sized segments linked by a shared reference
// ABOUTME: Never splits a character; leases references so concurrent messages never share one

use crate::client::error::{SmppError, SmppResult};
use crate::client::types::OutboundMessage;
use crate::codec::{MAX_PDU_SIZE, PduHeader};
use crate::datatypes::{CodingWidth, DataCoding};
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// Concatenated messages are limited by the one-octet segment count
pub const MAX_SEGMENTS: usize = 255;

/// Widest submit_sm body apart from the message itself
const MAX_SUBMIT_SM_FIELDS: usize = 94;
/// message_payload TLV header plus the three SAR TLVs
const MAX_SUBMIT_SM_TLV_OVERHEAD: usize = 4 + 6 + 5 + 5;

/// Largest segment payload, in octets, that still fits one submit_sm
pub const MAX_SEGMENT_OCTETS: usize =
    MAX_PDU_SIZE as usize - PduHeader::SIZE - MAX_SUBMIT_SM_FIELDS - MAX_SUBMIT_SM_TLV_OVERHEAD;

/// Payload capacity of one PDU, in encoding units, per coding width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentCapacities {
    /// GSM 7-bit and IA5, in septets (default: 160)
    pub seven_bit: usize,
    /// Latin-1, binary and unknown codings, in octets (default: 140)
    pub eight_bit: usize,
    /// UCS-2, in UTF-16 code units (default: 70)
    pub sixteen_bit: usize,
}

impl Default for SegmentCapacities {
    fn default() -> Self {
        Self {
            seven_bit: 160,
            eight_bit: 140,
            sixteen_bit: 70,
        }
    }
}

impl SegmentCapacities {
    pub fn new(seven_bit: usize, eight_bit: usize, sixteen_bit: usize) -> Self {
        Self {
            seven_bit,
            eight_bit,
            sixteen_bit,
        }
    }

    pub fn for_coding(&self, data_coding: DataCoding) -> usize {
        match data_coding.width() {
            CodingWidth::SevenBit => self.seven_bit,
            CodingWidth::EightBit => self.eight_bit,
            CodingWidth::SixteenBit => self.sixteen_bit,
        }
    }

    /// Octets one full segment takes. Septets are carried one per octet.
    pub fn octets_for(&self, data_coding: DataCoding) -> usize {
        let capacity = self.for_coding(data_coding);
        match data_coding.width() {
            CodingWidth::SixteenBit => capacity.saturating_mul(2),
            CodingWidth::SevenBit | CodingWidth::EightBit => capacity,
        }
    }

    /// Octets of the widest full segment across all codings
    pub fn largest_segment_octets(&self) -> usize {
        self.seven_bit
            .max(self.eight_bit)
            .max(self.sixteen_bit.saturating_mul(2))
    }
}

/// Links the segments of one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concatenation {
    /// Shared by every segment of the message
    pub reference: u16,
    /// 1-based
    pub index: u8,
    pub total: u8,
}

/// One PDU's worth of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSegment {
    /// Assigned by the session when the segment is submitted
    pub sequence_number: Option<u32>,
    pub payload: Bytes,
    /// Payload length in encoding units
    pub units: usize,
    /// `None` when the message fits a single PDU
    pub concatenation: Option<Concatenation>,
}

impl MessageSegment {
    pub fn index(&self) -> u8 {
        self.concatenation.map_or(1, |c| c.index)
    }
}

#[derive(Debug, Default)]
struct PoolState {
    next: u16,
    leased: HashSet<u16>,
}

/// Hands out concatenation references, skipping any still held by a
/// submission in flight
#[derive(Debug, Default)]
pub struct ReferencePool {
    state: Mutex<PoolState>,
}

impl ReferencePool {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lease(self: &Arc<Self>) -> ReferenceLease {
        let mut state = self.state();
        let mut reference = state.next;
        for _ in 0..=u16::MAX {
            if !state.leased.contains(&reference) {
                break;
            }
            reference = reference.wrapping_add(1);
        }
        if !state.leased.insert(reference) {
            warn!(reference, "every concatenation reference is leased, sharing one");
        }
        state.next = reference.wrapping_add(1);

        ReferenceLease {
            pool: Arc::clone(self),
            reference,
        }
    }

    pub fn in_use(&self) -> usize {
        self.state().leased.len()
    }

    fn release(&self, reference: u16) {
        self.state().leased.remove(&reference);
    }
}

/// A held reference, returned to the pool on drop
#[derive(Debug)]
pub struct ReferenceLease {
    pool: Arc<ReferencePool>,
    reference: u16,
}

impl ReferenceLease {
    pub fn reference(&self) -> u16 {
        self.reference
    }
}

impl Drop for ReferenceLease {
    fn drop(&mut self) {
        self.pool.release(self.reference);
    }
}

/// Segmenter output. Holds the reference lease for as long as the segments
/// are in flight.
#[derive(Debug)]
pub struct SegmentedMessage {
    pub segments: Vec<MessageSegment>,
    lease: Option<ReferenceLease>,
}

impl SegmentedMessage {
    pub fn reference(&self) -> Option<u16> {
        self.lease.as_ref().map(ReferenceLease::reference)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Segmenter {
    capacities: SegmentCapacities,
    references: Arc<ReferencePool>,
}

impl Segmenter {
    pub fn new(capacities: SegmentCapacities) -> Self {
        Self::with_pool(capacities, Arc::new(ReferencePool::new()))
    }

    pub fn with_pool(capacities: SegmentCapacities, references: Arc<ReferencePool>) -> Self {
        Self {
            capacities,
            references,
        }
    }

    pub fn capacities(&self) -> SegmentCapacities {
        self.capacities
    }

    /// Encode the message text and split it into PDU-sized segments.
    ///
    /// All checks happen here, before anything is written.
    pub fn segment(&self, message: &OutboundMessage) -> SmppResult<SegmentedMessage> {
        if message.text().is_empty() {
            return Err(SmppError::EmptyMessage);
        }

        let data_coding = message.data_coding();
        let capacity = self.capacities.for_coding(data_coding);
        let invalid_capacity = || SmppError::InvalidSegmentCapacity {
            data_coding,
            capacity,
        };
        if capacity == 0 || self.capacities.octets_for(data_coding) > MAX_SEGMENT_OCTETS {
            return Err(invalid_capacity());
        }

        let encoded = data_coding.encode(message.text())?;
        let octets = Bytes::copy_from_slice(encoded.octets());

        if encoded.units() <= capacity {
            return Ok(SegmentedMessage {
                segments: vec![MessageSegment {
                    sequence_number: None,
                    payload: octets,
                    units: encoded.units(),
                    concatenation: None,
                }],
                lease: None,
            });
        }

        // (octet range, units) per chunk, cut only on character boundaries
        let mut chunks: Vec<(usize, usize, usize)> = Vec::new();
        let (mut start_octet, mut start_unit) = (0, 0);
        let (mut last_octet, mut last_unit) = (0, 0);
        for &(octet_end, unit_end) in encoded.boundaries() {
            if unit_end - start_unit > capacity {
                if last_unit == start_unit {
                    // a single character wider than the capacity
                    return Err(invalid_capacity());
                }
                chunks.push((start_octet, last_octet, last_unit - start_unit));
                start_octet = last_octet;
                start_unit = last_unit;
                if unit_end - start_unit > capacity {
                    return Err(invalid_capacity());
                }
            }
            last_octet = octet_end;
            last_unit = unit_end;
        }
        chunks.push((start_octet, last_octet, last_unit - start_unit));

        if chunks.len() > MAX_SEGMENTS {
            return Err(SmppError::MessageTooLong {
                segments: chunks.len(),
            });
        }

        let lease = self.references.lease();
        let total = chunks.len() as u8;
        let segments = chunks
            .into_iter()
            .enumerate()
            .map(|(i, (from, to, units))| MessageSegment {
                sequence_number: None,
                payload: octets.slice(from..to),
                units,
                concatenation: Some(Concatenation {
                    reference: lease.reference(),
                    index: i as u8 + 1,
                    total,
                }),
            })
            .collect();

        Ok(SegmentedMessage {
            segments,
            lease: Some(lease),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{Address, EncodingError};

    fn message(text: &str, data_coding: DataCoding) -> OutboundMessage {
        OutboundMessage::builder()
            .from(Address::alphanumeric("ACME"))
            .to(Address::international("447700900123"))
            .text(text)
            .data_coding(data_coding)
            .build()
            .unwrap()
    }

    fn segmenter() -> Segmenter {
        Segmenter::new(SegmentCapacities::default())
    }

    #[test]
    fn short_message_is_one_segment() {
        let result = segmenter()
            .segment(&message("Hello", DataCoding::SmscDefault))
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.segments[0].concatenation, None);
        assert_eq!(result.segments[0].payload.as_ref(), b"Hello");
        assert_eq!(result.reference(), None);
    }

    #[test]
    fn exact_capacity_is_one_segment() {
        let text = "a".repeat(160);
        let result = segmenter()
            .segment(&message(&text, DataCoding::SmscDefault))
            .unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn long_message_splits_into_ceil_segments() {
        let text = "a".repeat(161);
        let result = segmenter()
            .segment(&message(&text, DataCoding::SmscDefault))
            .unwrap();
        assert_eq!(result.len(), 2);

        let reference = result.reference().unwrap();
        for (i, segment) in result.segments.iter().enumerate() {
            let concat = segment.concatenation.unwrap();
            assert_eq!(concat.reference, reference);
            assert_eq!(concat.index as usize, i + 1);
            assert_eq!(concat.total, 2);
        }
        assert_eq!(result.segments[0].units, 160);
        assert_eq!(result.segments[1].units, 1);

        let text = "b".repeat(1000);
        let result = segmenter()
            .segment(&message(&text, DataCoding::Latin1))
            .unwrap();
        assert_eq!(result.len(), 1000_usize.div_ceil(140));
    }

    #[test]
    fn ucs2_140_characters_make_two_segments() {
        let text = "й".repeat(140);
        let result = segmenter()
            .segment(&message(&text, DataCoding::Ucs2))
            .unwrap();
        assert_eq!(result.len(), 2);
        let indices: Vec<u8> = result.segments.iter().map(MessageSegment::index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert!(result.segments.iter().all(|s| s.units <= 70));
        assert!(result.segments.iter().all(|s| s.payload.len() == 140));
    }

    #[test]
    fn escape_pairs_stay_together() {
        // 159 basic characters then a two-septet euro sign
        let text = format!("{}€", "a".repeat(159));
        let result = segmenter()
            .segment(&message(&text, DataCoding::SmscDefault))
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.segments[0].units, 159);
        assert_eq!(result.segments[1].units, 2);
        assert_eq!(result.segments[1].payload.as_ref(), &[0x1B, 0x65]);
    }

    #[test]
    fn surrogate_pairs_stay_together() {
        let text = format!("{}😀", "a".repeat(69));
        let result = segmenter()
            .segment(&message(&text, DataCoding::Ucs2))
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.segments[1].units, 2);
        assert_eq!(result.segments[1].payload.len(), 4);
    }

    #[test]
    fn errors_before_io() {
        assert!(matches!(
            segmenter().segment(&message("", DataCoding::SmscDefault)),
            Err(SmppError::EmptyMessage)
        ));

        let zero = Segmenter::new(SegmentCapacities::new(160, 140, 0));
        assert!(matches!(
            zero.segment(&message("hi", DataCoding::Ucs2)),
            Err(SmppError::InvalidSegmentCapacity { capacity: 0, .. })
        ));

        let narrow = Segmenter::new(SegmentCapacities::new(160, 140, 1));
        assert!(matches!(
            narrow.segment(&message("a😀", DataCoding::Ucs2)),
            Err(SmppError::InvalidSegmentCapacity { capacity: 1, .. })
        ));

        let oversized = Segmenter::new(SegmentCapacities::new(160, 70_000, 70));
        assert!(matches!(
            oversized.segment(&message("hi", DataCoding::Latin1)),
            Err(SmppError::InvalidSegmentCapacity { capacity: 70_000, .. })
        ));

        let text = "a".repeat(160 * 255 + 1);
        assert!(matches!(
            segmenter().segment(&message(&text, DataCoding::SmscDefault)),
            Err(SmppError::MessageTooLong { segments: 256 })
        ));

        assert!(matches!(
            segmenter().segment(&message("日本", DataCoding::SmscDefault)),
            Err(SmppError::Encoding(EncodingError::Unencodable { character: '日', .. }))
        ));
    }

    #[test]
    fn concurrent_messages_get_distinct_references() {
        let segmenter = segmenter();
        let text = "a".repeat(200);
        let first = segmenter.segment(&message(&text, DataCoding::SmscDefault)).unwrap();
        let second = segmenter.segment(&message(&text, DataCoding::SmscDefault)).unwrap();
        assert_ne!(first.reference(), second.reference());
    }

    #[test]
    fn released_references_are_skipped_only_while_held() {
        let pool = Arc::new(ReferencePool::new());
        let held = pool.lease();
        assert_eq!(held.reference(), 0);
        assert_eq!(pool.in_use(), 1);

        {
            let next = pool.lease();
            assert_eq!(next.reference(), 1);
        }
        assert_eq!(pool.in_use(), 1);

        // wrap around to 0, which is still held
        pool.state().next = 0;
        assert_eq!(pool.lease().reference(), 1);
        drop(held);
        assert_eq!(pool.in_use(), 0);
    }
}
