// ABOUTME: Routes each inbound frame to exactly one handler by kind
// ABOUTME: Resolves submissions, feeds keep-alive, parses receipts and answers peer requests

use crate::client::error::SegmentError;
use crate::client::handlers::{Handlers, Unsolicited};
use crate::client::keepalive::KeepAliveMonitor;
use crate::client::pending::PendingResponses;
use crate::codec::Frame;
use crate::datatypes::{
    DataSmResponse, DeliverSmResponse, EnquireLinkResponse, GenericNack, UnbindResponse,
    command_id::is_response_id,
};
use crate::receipt::ReceiptParser;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// What the reader task must do after a frame was dispatched
#[derive(Debug, PartialEq)]
pub(crate) enum Dispatch {
    Handled,
    /// Send this response to the peer
    Reply(Frame),
    /// The peer unbound: send this response, then treat the link as lost
    PeerUnbind(Frame),
}

#[derive(Debug)]
pub(crate) struct Dispatcher {
    pending: Arc<PendingResponses>,
    keepalive: Arc<KeepAliveMonitor>,
    handlers: Arc<Handlers>,
    parser: ReceiptParser,
    unhandled: AtomicU64,
}

impl Dispatcher {
    pub(crate) fn new(
        pending: Arc<PendingResponses>,
        keepalive: Arc<KeepAliveMonitor>,
        handlers: Arc<Handlers>,
    ) -> Self {
        Self {
            pending,
            keepalive,
            handlers,
            parser: ReceiptParser::new(),
            unhandled: AtomicU64::new(0),
        }
    }

    /// Frames no route existed for, since the session started
    pub(crate) fn unhandled_frames(&self) -> u64 {
        self.unhandled.load(Ordering::Relaxed)
    }

    pub(crate) fn dispatch(&self, frame: Frame) -> Dispatch {
        debug!(
            pdu = frame.name(),
            sequence_number = frame.sequence_number(),
            "dispatching frame"
        );

        match frame {
            Frame::SubmitSmResp(resp) => {
                let result = if resp.command_status.is_ok() {
                    Ok(resp.message_id)
                } else {
                    Err(SegmentError::Rejected(resp.command_status))
                };
                if !self.pending.resolve(resp.sequence_number, result) {
                    warn!(
                        sequence_number = resp.sequence_number,
                        "submit_sm_resp matches no outstanding submission"
                    );
                }
                Dispatch::Handled
            }

            Frame::GenericNack(nack) => {
                warn!(
                    sequence_number = nack.sequence_number,
                    status = %nack.command_status,
                    "generic_nack from peer"
                );
                self.pending.resolve(
                    nack.sequence_number,
                    Err(SegmentError::ProtocolRejected(nack.command_status)),
                );
                Dispatch::Handled
            }

            Frame::EnquireLinkResp(_) => {
                self.keepalive.record_pong();
                Dispatch::Handled
            }

            Frame::EnquireLink(req) => Dispatch::Reply(Frame::EnquireLinkResp(
                EnquireLinkResponse::new(req.sequence_number),
            )),

            Frame::DeliverSm(pdu) => {
                let text = pdu.text();
                match self.parser.parse(&text) {
                    Ok(receipt) => {
                        debug!(id = %receipt.id, stat = %receipt.stat, "delivery receipt");
                        self.handlers.emit_receipt(&receipt);
                    }
                    Err(error) => {
                        debug!(sequence_number = pdu.sequence_number, "deliver_sm is not a receipt");
                        self.handlers.emit_unsolicited(&Unsolicited::UnparsedReceipt {
                            sequence_number: pdu.sequence_number,
                            text,
                            error,
                        });
                    }
                }
                Dispatch::Reply(Frame::DeliverSmResp(DeliverSmResponse::new(
                    pdu.sequence_number,
                    "",
                )))
            }

            Frame::DataSm(pdu) => {
                let sequence_number = pdu.sequence_number;
                self.handlers.emit_unsolicited(&Unsolicited::Data(pdu));
                Dispatch::Reply(Frame::DataSmResp(DataSmResponse::new(sequence_number, "")))
            }

            Frame::Unbind(req) => Dispatch::PeerUnbind(Frame::UnbindResp(UnbindResponse::new(
                req.sequence_number,
            ))),

            Frame::UnbindResp(resp) => {
                self.pending.resolve(resp.sequence_number, Ok(String::new()));
                Dispatch::Handled
            }

            other => self.unhandled(other),
        }
    }

    fn unhandled(&self, frame: Frame) -> Dispatch {
        let command_id = frame.command_id();
        let sequence_number = frame.sequence_number();
        self.unhandled.fetch_add(1, Ordering::Relaxed);
        warn!(
            pdu = frame.name(),
            command_id = format_args!("{command_id:#010x}"),
            sequence_number,
            "no route for inbound frame"
        );
        self.handlers.emit_unsolicited(&Unsolicited::UnhandledFrameKind {
            command_id,
            sequence_number,
        });

        // A request we do not understand still needs an answer
        match frame {
            Frame::Unknown { .. } if !is_response_id(command_id) => Dispatch::Reply(
                Frame::GenericNack(GenericNack::invalid_command_id(sequence_number)),
            ),
            _ => Dispatch::Handled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::keepalive::KeepAliveConfig;
    use crate::codec::PduHeader;
    use crate::datatypes::{
        Address, CommandStatus, DataSm, DeliverSm, EnquireLink, SubmitSmResponse, Tlv, Unbind,
        tlv::tags,
    };
    use crate::receipt::DeliveryReceipt;
    use bytes::Bytes;
    use std::sync::Mutex;

    struct Fixture {
        dispatcher: Dispatcher,
        pending: Arc<PendingResponses>,
        keepalive: Arc<KeepAliveMonitor>,
        receipts: Arc<Mutex<Vec<DeliveryReceipt>>>,
        events: Arc<Mutex<Vec<Unsolicited>>>,
    }

    fn fixture() -> Fixture {
        let pending = Arc::new(PendingResponses::new());
        let keepalive = Arc::new(KeepAliveMonitor::new(KeepAliveConfig::default()));
        let receipts = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(Mutex::new(Vec::new()));

        let handlers = Arc::new(Handlers::default());
        let sink = Arc::clone(&receipts);
        handlers.add_receipt(Arc::new(move |r: &DeliveryReceipt| {
            sink.lock().unwrap().push(r.clone())
        }));
        let sink = Arc::clone(&events);
        handlers.add_unsolicited(Arc::new(move |e: &Unsolicited| {
            sink.lock().unwrap().push(e.clone())
        }));

        Fixture {
            dispatcher: Dispatcher::new(Arc::clone(&pending), Arc::clone(&keepalive), handlers),
            pending,
            keepalive,
            receipts,
            events,
        }
    }

    fn deliver(sequence_number: u32, text: &str) -> Frame {
        Frame::DeliverSm(Box::new(DeliverSm {
            sequence_number,
            source_addr: Address::international("447700900123"),
            short_message: Bytes::copy_from_slice(text.as_bytes()),
            ..Default::default()
        }))
    }

    #[tokio::test]
    async fn submit_responses_resolve_pending() {
        let f = fixture();
        let ok = f.pending.register(3);
        let rejected = f.pending.register(4);
        let nacked = f.pending.register(5);

        f.dispatcher
            .dispatch(Frame::SubmitSmResp(SubmitSmResponse::new(3, "m-3")));
        f.dispatcher.dispatch(Frame::SubmitSmResp(SubmitSmResponse::error(
            4,
            CommandStatus::ThrottlingError,
        )));
        f.dispatcher.dispatch(Frame::GenericNack(GenericNack::new(
            CommandStatus::InvalidCommandLength,
            5,
        )));

        assert_eq!(ok.await.unwrap(), Ok("m-3".to_string()));
        assert_eq!(
            rejected.await.unwrap(),
            Err(SegmentError::Rejected(CommandStatus::ThrottlingError))
        );
        assert_eq!(
            nacked.await.unwrap(),
            Err(SegmentError::ProtocolRejected(CommandStatus::InvalidCommandLength))
        );
    }

    #[test]
    fn receipts_reach_receipt_handlers() {
        let f = fixture();
        let text = "id:ABC123 sub:001 dlvrd:001 submit date:2401010101 \
done date:2401010102 stat:DELIVRD err:000 text:Hello";

        let outcome = f.dispatcher.dispatch(deliver(8, text));
        assert_eq!(
            outcome,
            Dispatch::Reply(Frame::DeliverSmResp(DeliverSmResponse::new(8, "")))
        );

        let receipts = f.receipts.lock().unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].id, "ABC123");
        assert!(f.events.lock().unwrap().is_empty());
    }

    #[test]
    fn receipt_in_message_payload_is_parsed() {
        let f = fixture();
        let text = "id:XYZ sub:001 dlvrd:000 submit date:2401010101 \
done date:2401010102 stat:UNDELIV err:001 Text:none";
        let frame = Frame::DeliverSm(Box::new(DeliverSm {
            sequence_number: 2,
            tlvs: vec![Tlv::new(tags::MESSAGE_PAYLOAD, text.as_bytes().to_vec())],
            ..Default::default()
        }));

        f.dispatcher.dispatch(frame);
        assert_eq!(f.receipts.lock().unwrap()[0].stat, "UNDELIV");
    }

    #[test]
    fn non_receipts_are_unsolicited() {
        let f = fixture();
        f.dispatcher.dispatch(deliver(9, "hello there"));

        let events = f.events.lock().unwrap();
        match &events[..] {
            [Unsolicited::UnparsedReceipt {
                sequence_number: 9,
                text,
                ..
            }] => assert_eq!(text, "hello there"),
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn peer_requests_are_answered() {
        let f = fixture();
        assert_eq!(
            f.dispatcher.dispatch(Frame::EnquireLink(EnquireLink::new(12))),
            Dispatch::Reply(Frame::EnquireLinkResp(EnquireLinkResponse::new(12)))
        );
        assert_eq!(
            f.dispatcher.dispatch(Frame::Unbind(Unbind::new(13))),
            Dispatch::PeerUnbind(Frame::UnbindResp(UnbindResponse::new(13)))
        );

        let data = DataSm {
            sequence_number: 14,
            ..Default::default()
        };
        assert_eq!(
            f.dispatcher.dispatch(Frame::DataSm(Box::new(data.clone()))),
            Dispatch::Reply(Frame::DataSmResp(DataSmResponse::new(14, "")))
        );
        assert_eq!(
            f.events.lock().unwrap()[0],
            Unsolicited::Data(Box::new(data))
        );
    }

    #[test]
    fn enquire_link_resp_records_pong() {
        let f = fixture();
        let mut pongs = f.keepalive.subscribe();
        f.dispatcher
            .dispatch(Frame::EnquireLinkResp(EnquireLinkResponse::new(1)));
        assert!(pongs.has_changed().unwrap());
        assert_eq!(f.keepalive.status().total_pongs, 1);
    }

    #[test]
    fn unknown_frames_are_counted_and_nacked() {
        let f = fixture();
        let header = PduHeader {
            command_length: 16,
            command_id: 0x0000_0102,
            command_status: CommandStatus::Ok,
            sequence_number: 21,
        };
        let outcome = f.dispatcher.dispatch(Frame::Unknown {
            header,
            body: Bytes::new(),
        });
        assert_eq!(
            outcome,
            Dispatch::Reply(Frame::GenericNack(GenericNack::invalid_command_id(21)))
        );

        // a stray response is counted but not answered
        let stray = f
            .dispatcher
            .dispatch(Frame::DeliverSmResp(DeliverSmResponse::new(22, "")));
        assert_eq!(stray, Dispatch::Handled);

        assert_eq!(f.dispatcher.unhandled_frames(), 2);
        assert_eq!(
            f.events.lock().unwrap()[0],
            Unsolicited::UnhandledFrameKind {
                command_id: 0x0000_0102,
                sequence_number: 21
            }
        );
    }
}
