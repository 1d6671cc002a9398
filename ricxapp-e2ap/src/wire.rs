//! Reference PDU engine
//!
//! Encodes E2AP PDUs as a protocol-IE container:
//!
//! ```text
//! +-------+-----------+-------------+----------+------------------------+
//! | class | procedure | criticality | IE count | IE ... IE              |
//! |  u8   |    u8     |     u8      |   u16    |                        |
//! +-------+-----------+-------------+----------+------------------------+
//! IE: id (u16) | criticality (u8) | length (u16) | value (length bytes)
//! ```
//!
//! All multi-byte integers are big-endian. IE ids and criticalities follow
//! E2AP; IE values use fixed-width fields and length-prefixed octet strings.
//! Every read is bounds-checked.

use std::collections::HashSet;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use ricxapp_common::RicRequestId;

use crate::codec::{CodecError, PduEngine};
use crate::pdu::{Criticality, E2apPdu, MessageClass, ProcedureCode};
use crate::procedures::*;

/// PDU header length (class, procedure, criticality, IE count)
pub const HEADER_LEN: usize = 5;

/// IE header length (id, criticality, length)
pub const IE_HEADER_LEN: usize = 5;

/// Largest IE count accepted in one container.
pub const MAX_IE_COUNT: u16 = 64;

/// E2AP protocol IE ids
pub mod ie_id {
    /// Cause
    pub const CAUSE: u16 = 1;
    /// RANfunctionID
    pub const RAN_FUNCTION_ID: u16 = 5;
    /// RICactionID
    pub const RIC_ACTION_ID: u16 = 15;
    /// RICactions-Admitted
    pub const RIC_ACTIONS_ADMITTED: u16 = 17;
    /// RICactions-NotAdmitted
    pub const RIC_ACTIONS_NOT_ADMITTED: u16 = 18;
    /// RICcallProcessID
    pub const RIC_CALL_PROCESS_ID: u16 = 20;
    /// RICcontrolAckRequest
    pub const RIC_CONTROL_ACK_REQUEST: u16 = 21;
    /// RICcontrolHeader
    pub const RIC_CONTROL_HEADER: u16 = 22;
    /// RICcontrolMessage
    pub const RIC_CONTROL_MESSAGE: u16 = 23;
    /// RICindicationHeader
    pub const RIC_INDICATION_HEADER: u16 = 25;
    /// RICindicationMessage
    pub const RIC_INDICATION_MESSAGE: u16 = 26;
    /// RICindicationSN
    pub const RIC_INDICATION_SN: u16 = 27;
    /// RICindicationType
    pub const RIC_INDICATION_TYPE: u16 = 28;
    /// RICrequestID
    pub const RIC_REQUEST_ID: u16 = 29;
    /// RICsubscriptionDetails
    pub const RIC_SUBSCRIPTION_DETAILS: u16 = 30;
    /// RICcontrolOutcome
    pub const RIC_CONTROL_OUTCOME: u16 = 32;
    /// TransactionID
    pub const TRANSACTION_ID: u16 = 49;
}

const ACTION_HAS_DEFINITION: u8 = 0x01;
const ACTION_HAS_SUBSEQUENT: u8 = 0x02;

/// Reference engine for the IE container format
#[derive(Debug, Clone, Copy, Default)]
pub struct WireEngine;

impl PduEngine for WireEngine {
    fn min_pdu_len(&self) -> usize {
        HEADER_LEN
    }

    fn pack(&self, pdu: &E2apPdu, out: &mut [u8]) -> Result<usize, CodecError> {
        let mut ies = IeWriter::default();
        write_ies(pdu, &mut ies)?;

        let mut encoded = BytesMut::with_capacity(HEADER_LEN + ies.buf.len());
        encoded.put_u8(pdu.message_class() as u8);
        encoded.put_u8(pdu.procedure_code() as u8);
        encoded.put_u8(pdu.criticality() as u8);
        encoded.put_u16(ies.count);
        encoded.extend_from_slice(&ies.buf);

        if encoded.len() > out.len() {
            return Err(CodecError::buffer_too_small(format!(
                "{} needs {} bytes, buffer holds {}",
                pdu.name(),
                encoded.len(),
                out.len()
            )));
        }
        out[..encoded.len()].copy_from_slice(&encoded);
        Ok(encoded.len())
    }

    fn unpack(&self, data: &[u8]) -> Result<E2apPdu, CodecError> {
        let mut buf = data;
        if buf.remaining() < HEADER_LEN {
            return Err(CodecError::malformed("truncated PDU header"));
        }
        let class = buf.get_u8();
        let procedure = buf.get_u8();
        let _criticality = buf.get_u8();
        let count = buf.get_u16();

        let class = MessageClass::from_u8(class)
            .ok_or_else(|| CodecError::unsupported(format!("unknown message class {class}")))?;
        let procedure = ProcedureCode::from_u8(procedure).ok_or_else(|| {
            CodecError::unsupported(format!("unsupported procedure code {procedure}"))
        })?;

        let mut ies = IeList::parse(buf, count)?;
        let pdu = read_pdu(class, procedure, &mut ies)?;
        ies.reject_unknown()?;
        Ok(pdu)
    }
}

// ============================================================================
// Encoding
// ============================================================================

#[derive(Default)]
struct IeWriter {
    buf: BytesMut,
    count: u16,
}

impl IeWriter {
    fn put(&mut self, id: u16, criticality: Criticality, value: &[u8]) -> Result<(), CodecError> {
        let len = u16::try_from(value.len()).map_err(|_| {
            CodecError::malformed(format!("IE {id} value of {} bytes exceeds 65535", value.len()))
        })?;
        self.count = self
            .count
            .checked_add(1)
            .ok_or_else(|| CodecError::malformed("too many IEs"))?;
        self.buf.put_u16(id);
        self.buf.put_u8(criticality as u8);
        self.buf.put_u16(len);
        self.buf.put_slice(value);
        Ok(())
    }

    fn put_request_id(&mut self, request_id: RicRequestId) -> Result<(), CodecError> {
        let mut value = [0u8; 4];
        value[..2].copy_from_slice(&request_id.requestor_id.to_be_bytes());
        value[2..].copy_from_slice(&request_id.instance_id.to_be_bytes());
        self.put(ie_id::RIC_REQUEST_ID, Criticality::Reject, &value)
    }

    fn put_ran_function_id(&mut self, ran_function_id: u16) -> Result<(), CodecError> {
        self.put(
            ie_id::RAN_FUNCTION_ID,
            Criticality::Reject,
            &ran_function_id.to_be_bytes(),
        )
    }

    fn put_cause(&mut self, cause: Cause, criticality: Criticality) -> Result<(), CodecError> {
        self.put(ie_id::CAUSE, criticality, &[cause.group as u8, cause.value])
    }

    fn put_not_admitted(&mut self, list: &[ActionNotAdmitted]) -> Result<(), CodecError> {
        let mut value = BytesMut::with_capacity(1 + list.len() * 3);
        value.put_u8(list_len(list.len())?);
        for item in list {
            value.put_u8(item.action_id);
            value.put_u8(item.cause.group as u8);
            value.put_u8(item.cause.value);
        }
        self.put(ie_id::RIC_ACTIONS_NOT_ADMITTED, Criticality::Reject, &value)
    }

    fn put_optional(
        &mut self,
        id: u16,
        criticality: Criticality,
        value: &Option<Bytes>,
    ) -> Result<(), CodecError> {
        match value {
            Some(value) => self.put(id, criticality, value),
            None => Ok(()),
        }
    }
}

fn list_len(len: usize) -> Result<u8, CodecError> {
    u8::try_from(len).map_err(|_| CodecError::malformed(format!("list of {len} items too long")))
}

fn octet_len(len: usize, what: &str) -> Result<u16, CodecError> {
    u16::try_from(len)
        .map_err(|_| CodecError::malformed(format!("{what} of {len} bytes exceeds 65535")))
}

fn subscription_details(req: &SubscriptionRequest) -> Result<BytesMut, CodecError> {
    let mut value = BytesMut::new();
    value.put_u16(octet_len(req.event_trigger.len(), "event trigger")?);
    value.put_slice(&req.event_trigger);
    value.put_u8(list_len(req.actions.len())?);
    for action in &req.actions {
        let mut flags = 0u8;
        if action.definition.is_some() {
            flags |= ACTION_HAS_DEFINITION;
        }
        if action.subsequent_action.is_some() {
            flags |= ACTION_HAS_SUBSEQUENT;
        }
        value.put_u8(action.id);
        value.put_u8(action.action_type as u8);
        value.put_u8(flags);
        if let Some(definition) = &action.definition {
            value.put_u16(octet_len(definition.len(), "action definition")?);
            value.put_slice(definition);
        }
        if let Some(subsequent) = action.subsequent_action {
            value.put_u8(subsequent.action_type as u8);
            value.put_u8(subsequent.time_to_wait);
        }
    }
    Ok(value)
}

fn write_ies(pdu: &E2apPdu, ies: &mut IeWriter) -> Result<(), CodecError> {
    use ie_id::*;

    match pdu {
        E2apPdu::SubscriptionRequest(m) => {
            ies.put_request_id(m.request_id)?;
            ies.put_ran_function_id(m.ran_function_id)?;
            ies.put(
                RIC_SUBSCRIPTION_DETAILS,
                Criticality::Reject,
                &subscription_details(m)?,
            )?;
        }
        E2apPdu::SubscriptionResponse(m) => {
            ies.put_request_id(m.request_id)?;
            ies.put_ran_function_id(m.ran_function_id)?;
            let mut admitted = BytesMut::with_capacity(1 + m.admitted.len());
            admitted.put_u8(list_len(m.admitted.len())?);
            admitted.put_slice(&m.admitted);
            ies.put(RIC_ACTIONS_ADMITTED, Criticality::Reject, &admitted)?;
            if !m.not_admitted.is_empty() {
                ies.put_not_admitted(&m.not_admitted)?;
            }
        }
        E2apPdu::SubscriptionFailure(m) => {
            ies.put_request_id(m.request_id)?;
            ies.put_ran_function_id(m.ran_function_id)?;
            ies.put_cause(m.cause, Criticality::Reject)?;
            if !m.not_admitted.is_empty() {
                ies.put_not_admitted(&m.not_admitted)?;
            }
        }
        E2apPdu::SubscriptionDeleteRequest(m) => {
            ies.put_request_id(m.request_id)?;
            ies.put_ran_function_id(m.ran_function_id)?;
        }
        E2apPdu::SubscriptionDeleteResponse(m) => {
            ies.put_request_id(m.request_id)?;
            ies.put_ran_function_id(m.ran_function_id)?;
        }
        E2apPdu::SubscriptionDeleteFailure(m) => {
            ies.put_request_id(m.request_id)?;
            ies.put_ran_function_id(m.ran_function_id)?;
            ies.put_cause(m.cause, Criticality::Ignore)?;
        }
        E2apPdu::ControlRequest(m) => {
            ies.put_request_id(m.request_id)?;
            ies.put_ran_function_id(m.ran_function_id)?;
            ies.put_optional(RIC_CALL_PROCESS_ID, Criticality::Reject, &m.call_process_id)?;
            ies.put(RIC_CONTROL_HEADER, Criticality::Reject, &m.header)?;
            ies.put(RIC_CONTROL_MESSAGE, Criticality::Reject, &m.message)?;
            if let Some(ack) = m.ack_request {
                ies.put(RIC_CONTROL_ACK_REQUEST, Criticality::Reject, &[ack as u8])?;
            }
        }
        E2apPdu::ControlAcknowledge(m) => {
            ies.put_request_id(m.request_id)?;
            ies.put_ran_function_id(m.ran_function_id)?;
            ies.put_optional(RIC_CALL_PROCESS_ID, Criticality::Reject, &m.call_process_id)?;
            ies.put_optional(RIC_CONTROL_OUTCOME, Criticality::Reject, &m.outcome)?;
        }
        E2apPdu::ControlFailure(m) => {
            ies.put_request_id(m.request_id)?;
            ies.put_ran_function_id(m.ran_function_id)?;
            ies.put_optional(RIC_CALL_PROCESS_ID, Criticality::Reject, &m.call_process_id)?;
            ies.put_cause(m.cause, Criticality::Ignore)?;
            ies.put_optional(RIC_CONTROL_OUTCOME, Criticality::Reject, &m.outcome)?;
        }
        E2apPdu::Indication(m) => {
            ies.put_request_id(m.request_id)?;
            ies.put_ran_function_id(m.ran_function_id)?;
            ies.put(RIC_ACTION_ID, Criticality::Reject, &[m.action_id])?;
            if let Some(sn) = m.sequence_number {
                ies.put(RIC_INDICATION_SN, Criticality::Reject, &sn.to_be_bytes())?;
            }
            ies.put(
                RIC_INDICATION_TYPE,
                Criticality::Reject,
                &[m.indication_type as u8],
            )?;
            ies.put(RIC_INDICATION_HEADER, Criticality::Reject, &m.header)?;
            ies.put(RIC_INDICATION_MESSAGE, Criticality::Reject, &m.message)?;
            ies.put_optional(RIC_CALL_PROCESS_ID, Criticality::Reject, &m.call_process_id)?;
        }
        E2apPdu::ResetRequest(m) => {
            ies.put(TRANSACTION_ID, Criticality::Reject, &[m.transaction_id])?;
            ies.put_cause(m.cause, Criticality::Ignore)?;
        }
        E2apPdu::ResetResponse(m) => {
            ies.put(TRANSACTION_ID, Criticality::Reject, &[m.transaction_id])?;
        }
    }
    Ok(())
}

// ============================================================================
// Decoding
// ============================================================================

struct RawIe<'a> {
    id: u16,
    criticality: Criticality,
    value: &'a [u8],
    consumed: bool,
}

struct IeList<'a> {
    ies: Vec<RawIe<'a>>,
}

impl<'a> IeList<'a> {
    fn parse(mut buf: &'a [u8], count: u16) -> Result<Self, CodecError> {
        if count > MAX_IE_COUNT {
            return Err(CodecError::malformed(format!(
                "{count} IEs exceeds limit of {MAX_IE_COUNT}"
            )));
        }
        let mut ies: Vec<RawIe<'a>> = Vec::with_capacity(usize::from(count));
        let mut seen = HashSet::with_capacity(usize::from(count));
        for index in 0..count {
            if buf.remaining() < IE_HEADER_LEN {
                return Err(CodecError::malformed(format!(
                    "truncated header of IE {index} of {count}"
                )));
            }
            let id = buf.get_u16();
            let criticality = buf.get_u8();
            let len = usize::from(buf.get_u16());
            let criticality = Criticality::from_u8(criticality).ok_or_else(|| {
                CodecError::malformed(format!("IE {id}: invalid criticality {criticality}"))
            })?;
            if buf.len() < len {
                return Err(CodecError::malformed(format!(
                    "IE {id}: length {len} exceeds remaining {} bytes",
                    buf.len()
                )));
            }
            let (value, rest) = buf.split_at(len);
            buf = rest;
            if !seen.insert(id) {
                return Err(CodecError::malformed(format!("duplicate IE {id}")));
            }
            ies.push(RawIe {
                id,
                criticality,
                value,
                consumed: false,
            });
        }
        if !buf.is_empty() {
            return Err(CodecError::malformed(format!(
                "{} trailing bytes after {count} IEs",
                buf.len()
            )));
        }
        Ok(Self { ies })
    }

    fn take(&mut self, id: u16) -> Option<&'a [u8]> {
        self.ies.iter_mut().find(|ie| ie.id == id).map(|ie| {
            ie.consumed = true;
            ie.value
        })
    }

    fn require(&mut self, id: u16, name: &str) -> Result<&'a [u8], CodecError> {
        self.take(id)
            .ok_or_else(|| CodecError::malformed(format!("missing mandatory IE {name} ({id})")))
    }

    fn reject_unknown(&self) -> Result<(), CodecError> {
        match self
            .ies
            .iter()
            .find(|ie| !ie.consumed && ie.criticality == Criticality::Reject)
        {
            Some(ie) => Err(CodecError::malformed(format!(
                "unexpected IE {} with criticality reject",
                ie.id
            ))),
            None => Ok(()),
        }
    }
}

/// Bounds-checked reader over one IE value.
struct ValueReader<'a> {
    buf: &'a [u8],
    what: &'static str,
}

impl<'a> ValueReader<'a> {
    fn new(buf: &'a [u8], what: &'static str) -> Self {
        Self { buf, what }
    }

    fn need(&self, n: usize) -> Result<(), CodecError> {
        if self.buf.remaining() < n {
            return Err(CodecError::malformed(format!(
                "{}: need {n} bytes, {} left",
                self.what,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn u16(&mut self) -> Result<u16, CodecError> {
        self.need(2)?;
        Ok(self.buf.get_u16())
    }

    fn octets(&mut self, len: usize) -> Result<Bytes, CodecError> {
        self.need(len)?;
        Ok(self.buf.copy_to_bytes(len))
    }

    fn finish(self) -> Result<(), CodecError> {
        if self.buf.has_remaining() {
            return Err(CodecError::malformed(format!(
                "{}: {} unexpected trailing bytes",
                self.what,
                self.buf.remaining()
            )));
        }
        Ok(())
    }
}

fn read_request_id(ies: &mut IeList<'_>) -> Result<RicRequestId, CodecError> {
    let mut r = ValueReader::new(
        ies.require(ie_id::RIC_REQUEST_ID, "RICrequestID")?,
        "RICrequestID",
    );
    let requestor_id = r.u16()?;
    let instance_id = r.u16()?;
    r.finish()?;
    Ok(RicRequestId::new(requestor_id, instance_id))
}

fn read_ran_function_id(ies: &mut IeList<'_>) -> Result<u16, CodecError> {
    let mut r = ValueReader::new(
        ies.require(ie_id::RAN_FUNCTION_ID, "RANfunctionID")?,
        "RANfunctionID",
    );
    let id = r.u16()?;
    r.finish()?;
    Ok(id)
}

fn read_u8_ie(ies: &mut IeList<'_>, id: u16, name: &'static str) -> Result<u8, CodecError> {
    let mut r = ValueReader::new(ies.require(id, name)?, name);
    let value = r.u8()?;
    r.finish()?;
    Ok(value)
}

fn read_cause(ies: &mut IeList<'_>) -> Result<Cause, CodecError> {
    let mut r = ValueReader::new(ies.require(ie_id::CAUSE, "Cause")?, "Cause");
    let group = r.u8()?;
    let value = r.u8()?;
    r.finish()?;
    Cause::from_wire(group, value)
}

fn read_octets(ies: &mut IeList<'_>, id: u16, name: &str) -> Result<Bytes, CodecError> {
    Ok(Bytes::copy_from_slice(ies.require(id, name)?))
}

fn read_optional_octets(ies: &mut IeList<'_>, id: u16) -> Option<Bytes> {
    ies.take(id).map(Bytes::copy_from_slice)
}

fn read_not_admitted(ies: &mut IeList<'_>) -> Result<Vec<ActionNotAdmitted>, CodecError> {
    let Some(value) = ies.take(ie_id::RIC_ACTIONS_NOT_ADMITTED) else {
        return Ok(Vec::new());
    };
    let mut r = ValueReader::new(value, "RICactions-NotAdmitted");
    let count = r.u8()?;
    let mut list = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let action_id = r.u8()?;
        let group = r.u8()?;
        let value = r.u8()?;
        list.push(ActionNotAdmitted {
            action_id,
            cause: Cause::from_wire(group, value)?,
        });
    }
    r.finish()?;
    Ok(list)
}

fn read_subscription_details(
    value: &[u8],
) -> Result<(Bytes, Vec<RicAction>), CodecError> {
    let mut r = ValueReader::new(value, "RICsubscriptionDetails");
    let trigger_len = usize::from(r.u16()?);
    let event_trigger = r.octets(trigger_len)?;
    let count = r.u8()?;
    let mut actions = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let id = r.u8()?;
        let action_type = r.u8()?;
        let action_type = RicActionType::from_u8(action_type).ok_or_else(|| {
            CodecError::malformed(format!("action {id}: unknown action type {action_type}"))
        })?;
        let flags = r.u8()?;
        if flags & !(ACTION_HAS_DEFINITION | ACTION_HAS_SUBSEQUENT) != 0 {
            return Err(CodecError::malformed(format!(
                "action {id}: unknown flags {flags:#04x}"
            )));
        }
        let definition = if flags & ACTION_HAS_DEFINITION != 0 {
            let len = usize::from(r.u16()?);
            Some(r.octets(len)?)
        } else {
            None
        };
        let subsequent_action = if flags & ACTION_HAS_SUBSEQUENT != 0 {
            let kind = r.u8()?;
            let action_type = SubsequentActionType::from_u8(kind).ok_or_else(|| {
                CodecError::malformed(format!("action {id}: unknown subsequent action {kind}"))
            })?;
            Some(SubsequentAction {
                action_type,
                time_to_wait: r.u8()?,
            })
        } else {
            None
        };
        actions.push(RicAction {
            id,
            action_type,
            definition,
            subsequent_action,
        });
    }
    r.finish()?;
    Ok((event_trigger, actions))
}

fn read_pdu(
    class: MessageClass,
    procedure: ProcedureCode,
    ies: &mut IeList<'_>,
) -> Result<E2apPdu, CodecError> {
    use ie_id::*;
    use MessageClass::*;
    use ProcedureCode::*;

    let pdu = match (procedure, class) {
        (RicSubscription, InitiatingMessage) => {
            let request_id = read_request_id(ies)?;
            let ran_function_id = read_ran_function_id(ies)?;
            let details = ies.require(RIC_SUBSCRIPTION_DETAILS, "RICsubscriptionDetails")?;
            let (event_trigger, actions) = read_subscription_details(details)?;
            SubscriptionRequest {
                request_id,
                ran_function_id,
                event_trigger,
                actions,
            }
            .into()
        }
        (RicSubscription, SuccessfulOutcome) => {
            let request_id = read_request_id(ies)?;
            let ran_function_id = read_ran_function_id(ies)?;
            let mut r = ValueReader::new(
                ies.require(RIC_ACTIONS_ADMITTED, "RICactions-Admitted")?,
                "RICactions-Admitted",
            );
            let count = usize::from(r.u8()?);
            let admitted = r.octets(count)?.to_vec();
            r.finish()?;
            SubscriptionResponse {
                request_id,
                ran_function_id,
                admitted,
                not_admitted: read_not_admitted(ies)?,
            }
            .into()
        }
        (RicSubscription, UnsuccessfulOutcome) => SubscriptionFailure {
            request_id: read_request_id(ies)?,
            ran_function_id: read_ran_function_id(ies)?,
            cause: read_cause(ies)?,
            not_admitted: read_not_admitted(ies)?,
        }
        .into(),
        (RicSubscriptionDelete, InitiatingMessage) => SubscriptionDeleteRequest {
            request_id: read_request_id(ies)?,
            ran_function_id: read_ran_function_id(ies)?,
        }
        .into(),
        (RicSubscriptionDelete, SuccessfulOutcome) => SubscriptionDeleteResponse {
            request_id: read_request_id(ies)?,
            ran_function_id: read_ran_function_id(ies)?,
        }
        .into(),
        (RicSubscriptionDelete, UnsuccessfulOutcome) => SubscriptionDeleteFailure {
            request_id: read_request_id(ies)?,
            ran_function_id: read_ran_function_id(ies)?,
            cause: read_cause(ies)?,
        }
        .into(),
        (RicControl, InitiatingMessage) => {
            let request_id = read_request_id(ies)?;
            let ran_function_id = read_ran_function_id(ies)?;
            let call_process_id = read_optional_octets(ies, RIC_CALL_PROCESS_ID);
            let header = read_octets(ies, RIC_CONTROL_HEADER, "RICcontrolHeader")?;
            let message = read_octets(ies, RIC_CONTROL_MESSAGE, "RICcontrolMessage")?;
            let ack_request = match ies.take(RIC_CONTROL_ACK_REQUEST) {
                Some(value) => {
                    let mut r = ValueReader::new(value, "RICcontrolAckRequest");
                    let raw = r.u8()?;
                    r.finish()?;
                    Some(ControlAckRequest::from_u8(raw).ok_or_else(|| {
                        CodecError::malformed(format!("unknown control ack request {raw}"))
                    })?)
                }
                None => None,
            };
            ControlRequest {
                request_id,
                ran_function_id,
                call_process_id,
                header,
                message,
                ack_request,
            }
            .into()
        }
        (RicControl, SuccessfulOutcome) => ControlAcknowledge {
            request_id: read_request_id(ies)?,
            ran_function_id: read_ran_function_id(ies)?,
            call_process_id: read_optional_octets(ies, RIC_CALL_PROCESS_ID),
            outcome: read_optional_octets(ies, RIC_CONTROL_OUTCOME),
        }
        .into(),
        (RicControl, UnsuccessfulOutcome) => ControlFailure {
            request_id: read_request_id(ies)?,
            ran_function_id: read_ran_function_id(ies)?,
            call_process_id: read_optional_octets(ies, RIC_CALL_PROCESS_ID),
            cause: read_cause(ies)?,
            outcome: read_optional_octets(ies, RIC_CONTROL_OUTCOME),
        }
        .into(),
        (RicIndication, InitiatingMessage) => {
            let request_id = read_request_id(ies)?;
            let ran_function_id = read_ran_function_id(ies)?;
            let action_id = read_u8_ie(ies, RIC_ACTION_ID, "RICactionID")?;
            let sequence_number = match ies.take(RIC_INDICATION_SN) {
                Some(value) => {
                    let mut r = ValueReader::new(value, "RICindicationSN");
                    let sn = r.u16()?;
                    r.finish()?;
                    Some(sn)
                }
                None => None,
            };
            let raw_type = read_u8_ie(ies, RIC_INDICATION_TYPE, "RICindicationType")?;
            let indication_type = RicIndicationType::from_u8(raw_type).ok_or_else(|| {
                CodecError::malformed(format!("unknown indication type {raw_type}"))
            })?;
            Indication {
                request_id,
                ran_function_id,
                action_id,
                sequence_number,
                indication_type,
                header: read_octets(ies, RIC_INDICATION_HEADER, "RICindicationHeader")?,
                message: read_octets(ies, RIC_INDICATION_MESSAGE, "RICindicationMessage")?,
                call_process_id: read_optional_octets(ies, RIC_CALL_PROCESS_ID),
            }
            .into()
        }
        (Reset, InitiatingMessage) => ResetRequest {
            transaction_id: read_u8_ie(ies, TRANSACTION_ID, "TransactionID")?,
            cause: read_cause(ies)?,
        }
        .into(),
        (Reset, SuccessfulOutcome) => ResetResponse {
            transaction_id: read_u8_ie(ies, TRANSACTION_ID, "TransactionID")?,
        }
        .into(),
        (procedure, class) => {
            return Err(CodecError::unsupported(format!(
                "{procedure:?} has no {class:?}"
            )))
        }
    };
    Ok(pdu)
}
