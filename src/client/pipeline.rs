// ABOUTME: Submission pipeline: readiness check, segmentation, in-order submit_sm writes
// ABOUTME: Collects one outcome per segment, bounded by the submission timeout

use crate::client::config::RebindingSubmissions;
use crate::client::error::{SegmentError, SegmentOutcome, SmppError, SmppResult};
use crate::client::segmenter::MessageSegment;
use crate::client::session::{LinkLoss, Session, Shared};
use crate::client::state::SessionState;
use crate::client::types::OutboundMessage;
use crate::connection::{ConnectionError, Connector};
use crate::datatypes::submit_sm::{MAX_SHORT_MESSAGE_LEN, REGISTERED_DELIVERY_RECEIPT};
use crate::datatypes::{SubmitSm, Tlv, tlv::tags};
use crate::Frame;
use std::io;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

impl<C: Connector> Shared<C> {
    /// Wait for Bound according to the rebinding policy
    async fn ready(&self, deadline: Instant) -> SmppResult<()> {
        let mut states = self.state.subscribe();
        loop {
            let state = *states.borrow_and_update();
            match state {
                SessionState::Bound => return Ok(()),
                SessionState::Rebinding => match self.config.rebinding_submissions {
                    RebindingSubmissions::Reject => return Err(SmppError::SessionRebinding),
                    RebindingSubmissions::Queue => {
                        debug!("submission waiting for rebind");
                        match timeout_at(deadline, states.changed()).await {
                            Ok(Ok(())) => continue,
                            Ok(Err(_)) => return Err(SmppError::SessionNotReady(state)),
                            Err(_) => return Err(SmppError::Timeout),
                        }
                    }
                },
                other => return Err(SmppError::SessionNotReady(other)),
            }
        }
    }
}

/// Build the submit_sm for one segment
fn submit_sm_for(
    message: &OutboundMessage,
    segment: &MessageSegment,
    sequence_number: u32,
) -> SubmitSm {
    let mut pdu = SubmitSm::new(
        sequence_number,
        message.source().clone(),
        message.destination().clone(),
    );
    pdu.data_coding = message.data_coding();
    if message.requests_delivery_receipt() {
        pdu.registered_delivery = REGISTERED_DELIVERY_RECEIPT;
    }

    if segment.payload.len() > MAX_SHORT_MESSAGE_LEN {
        pdu.tlvs
            .push(Tlv::new(tags::MESSAGE_PAYLOAD, segment.payload.clone()));
    } else {
        pdu.short_message = segment.payload.clone();
    }

    if let Some(concatenation) = segment.concatenation {
        pdu.tlvs.extend([
            Tlv::from_u16(tags::SAR_MSG_REF_NUM, concatenation.reference),
            Tlv::from_u8(tags::SAR_TOTAL_SEGMENTS, concatenation.total),
            Tlv::from_u8(tags::SAR_SEGMENT_SEQNUM, concatenation.index),
        ]);
    }
    pdu
}

/// Only transport failures say anything about the link. An encode error
/// means nothing was written, and an interrupted write means the link is
/// already being torn down.
fn classify_write_error(err: &ConnectionError) -> SegmentError {
    match err {
        ConnectionError::Codec(err) => SegmentError::Unencodable(err.to_string()),
        ConnectionError::Io(io) if io.kind() == io::ErrorKind::Interrupted => {
            SegmentError::Interrupted
        }
        other => SegmentError::WriteFailed(other.to_string()),
    }
}

impl<C: Connector> Session<C> {
    /// Submit a message, split into segments when it does not fit one PDU
    ///
    /// Returns one outcome per segment, in segment order, once every segment
    /// has been answered or the submission timeout has passed. Errors are
    /// returned only for problems found before anything was written.
    pub async fn submit(&self, message: &OutboundMessage) -> SmppResult<Vec<SegmentOutcome>> {
        let shared = &self.shared;
        let deadline = Instant::now() + shared.config.submit_timeout;

        shared.ready(deadline).await?;
        let mut segmented = shared.segmenter.segment(message)?;
        debug!(
            segments = segmented.len(),
            reference = ?segmented.reference(),
            "submitting message"
        );

        let mut outcomes = Vec::with_capacity(segmented.len());
        let mut waiting = Vec::with_capacity(segmented.len());
        let mut write_failure: Option<SegmentError> = None;

        for segment in &mut segmented.segments {
            let segment_index = segment.index();
            if let Some(failure) = &write_failure {
                outcomes.push(SegmentOutcome {
                    segment_index,
                    sequence_number: None,
                    result: Err(failure.clone()),
                });
                continue;
            }

            let sequence_number = shared.next_sequence();
            segment.sequence_number = Some(sequence_number);
            let response = shared.pending.register(sequence_number);
            let pdu = submit_sm_for(message, segment, sequence_number);

            let generation = shared.generation();
            match shared.write(&Frame::SubmitSm(Box::new(pdu)), deadline).await {
                Ok(()) => waiting.push((segment_index, sequence_number, response)),
                Err(err) => {
                    shared.pending.cancel(sequence_number);
                    warn!(segment_index, sequence_number, error = %err, "submit_sm write failed");

                    let failure = classify_write_error(&err);
                    if matches!(failure, SegmentError::WriteFailed(_)) {
                        shared.report(generation, LinkLoss::WriteFailed);
                    }
                    outcomes.push(SegmentOutcome {
                        segment_index,
                        sequence_number: Some(sequence_number),
                        result: Err(failure.clone()),
                    });
                    write_failure = Some(failure);
                }
            }
        }

        for (segment_index, sequence_number, response) in waiting {
            let result = match timeout_at(deadline, response).await {
                Ok(Ok(correlation)) => correlation,
                Ok(Err(_)) => Err(SegmentError::Interrupted),
                Err(_) => {
                    shared.pending.cancel(sequence_number);
                    Err(SegmentError::TimedOut)
                }
            };
            debug!(segment_index, sequence_number, ?result, "segment finished");
            outcomes.push(SegmentOutcome {
                segment_index,
                sequence_number: Some(sequence_number),
                result,
            });
        }

        outcomes.sort_by_key(|outcome| outcome.segment_index);
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::segmenter::{SegmentCapacities, Segmenter};
    use crate::codec::CodecError;
    use crate::datatypes::{Address, DataCoding};

    fn message(text: &str, data_coding: DataCoding) -> OutboundMessage {
        OutboundMessage::builder()
            .from(Address::alphanumeric("ACME"))
            .to(Address::international("447700900123"))
            .text(text)
            .data_coding(data_coding)
            .with_delivery_receipt()
            .build()
            .unwrap()
    }

    #[test]
    fn single_segment_goes_in_short_message() {
        let message = message("Hello", DataCoding::SmscDefault);
        let segmented = Segmenter::new(SegmentCapacities::default())
            .segment(&message)
            .unwrap();

        let pdu = submit_sm_for(&message, &segmented.segments[0], 11);
        assert_eq!(pdu.sequence_number, 11);
        assert_eq!(pdu.short_message.as_ref(), b"Hello");
        assert_eq!(pdu.registered_delivery, REGISTERED_DELIVERY_RECEIPT);
        assert!(pdu.tlvs.is_empty());
    }

    #[test]
    fn segments_carry_sar_parameters() {
        let text = "x".repeat(20);
        let message = message(&text, DataCoding::SmscDefault);
        let segmented = Segmenter::new(SegmentCapacities::new(8, 8, 4))
            .segment(&message)
            .unwrap();
        let reference = segmented.reference().unwrap();

        let pdu = submit_sm_for(&message, &segmented.segments[2], 5);
        assert_eq!(pdu.short_message.len(), 4);
        assert_eq!(
            pdu.tlvs,
            vec![
                Tlv::from_u16(tags::SAR_MSG_REF_NUM, reference),
                Tlv::from_u8(tags::SAR_TOTAL_SEGMENTS, 3),
                Tlv::from_u8(tags::SAR_SEGMENT_SEQNUM, 3),
            ]
        );
    }

    #[test]
    fn only_transport_errors_count_as_write_failures() {
        let codec = ConnectionError::Codec(CodecError::TlvError("value too long".into()));
        assert!(matches!(classify_write_error(&codec), SegmentError::Unencodable(_)));

        let torn_down = ConnectionError::Io(io::Error::new(io::ErrorKind::Interrupted, "x"));
        assert_eq!(classify_write_error(&torn_down), SegmentError::Interrupted);

        let stalled = ConnectionError::Io(io::Error::new(io::ErrorKind::TimedOut, "x"));
        assert!(matches!(classify_write_error(&stalled), SegmentError::WriteFailed(_)));
    }

    #[test]
    fn large_segments_use_message_payload() {
        let text = "y".repeat(300);
        let message = message(&text, DataCoding::Latin1);
        let segmented = Segmenter::new(SegmentCapacities::new(160, 400, 70))
            .segment(&message)
            .unwrap();

        let pdu = submit_sm_for(&message, &segmented.segments[0], 1);
        assert!(pdu.short_message.is_empty());
        assert_eq!(pdu.payload().len(), 300);
    }
}
