//! Paginated attribute discovery
//!
//! A single Read By Type or Read By Group Type response only carries as
//! many elements as fit in one MTU, so discovering every attribute of a
//! type means repeating the request with an advancing start handle. The
//! peer signals the end with an Attribute Not Found error, or the walk ends
//! on its own once a page reaches the top of the handle space.

use super::constants::*;
use super::error::{DecodeResult, PaginationError, PaginationResult};
use super::observer::PduObserver;
use super::pdu::{decode, Frame};
use super::request::{encode_read_by_group_request, encode_read_by_type_request};
use super::transport::AttTransport;
use super::types::{ReadByGroupElement, ReadByTypeElement};
use crate::uuid::Uuid;
use log::{debug, trace, warn};

/// What varies between the two discovery procedures
pub trait DiscoveryStrategy {
    /// Element accumulated from each page
    type Element;

    /// Opcode of the request this strategy sends
    fn request_opcode(&self) -> u8;

    /// Opcode of the response it expects
    fn response_opcode(&self) -> u8;

    /// Encode a request for `[start_handle, end_handle]`
    fn encode_request(&self, start_handle: u16, end_handle: u16, uuid: &Uuid) -> Vec<u8>;

    /// Decode every element of `frame`, or `None` if `frame` is not this
    /// strategy's response
    fn page_elements(&self, frame: &Frame<'_>) -> Option<DecodeResult<Vec<Self::Element>>>;

    /// Handle the next page has to start after
    fn last_handle(&self, element: &Self::Element) -> u16;
}

/// Read By Type discovery
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadByType;

impl DiscoveryStrategy for ReadByType {
    type Element = ReadByTypeElement;

    fn request_opcode(&self) -> u8 {
        ATT_READ_BY_TYPE_REQ
    }

    fn response_opcode(&self) -> u8 {
        ATT_READ_BY_TYPE_RSP
    }

    fn encode_request(&self, start_handle: u16, end_handle: u16, uuid: &Uuid) -> Vec<u8> {
        encode_read_by_type_request(start_handle, end_handle, uuid)
    }

    fn page_elements(&self, frame: &Frame<'_>) -> Option<DecodeResult<Vec<ReadByTypeElement>>> {
        match frame {
            Frame::ReadByType(page) => Some(page.elements().collect()),
            _ => None,
        }
    }

    fn last_handle(&self, element: &ReadByTypeElement) -> u16 {
        element.handle
    }
}

/// Read By Group Type discovery
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadByGroupType;

impl DiscoveryStrategy for ReadByGroupType {
    type Element = ReadByGroupElement;

    fn request_opcode(&self) -> u8 {
        ATT_READ_BY_GROUP_TYPE_REQ
    }

    fn response_opcode(&self) -> u8 {
        ATT_READ_BY_GROUP_TYPE_RSP
    }

    fn encode_request(&self, start_handle: u16, end_handle: u16, uuid: &Uuid) -> Vec<u8> {
        encode_read_by_group_request(start_handle, end_handle, uuid)
    }

    fn page_elements(&self, frame: &Frame<'_>) -> Option<DecodeResult<Vec<ReadByGroupElement>>> {
        match frame {
            Frame::ReadByGroupType(page) => Some(page.elements().collect()),
            _ => None,
        }
    }

    fn last_handle(&self, element: &ReadByGroupElement) -> u16 {
        element.end_handle
    }
}

/// Where the driver is in the request/response cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    AwaitingSend,
    AwaitingResponse,
    Accumulating,
    Done,
    Failed,
}

impl DiscoveryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DiscoveryState::Done | DiscoveryState::Failed)
    }
}

/// Discovery configuration
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Size of the buffer each response is received into
    pub receive_buffer_size: usize,
    /// First handle searched by the `discover_*` helpers
    pub start_handle: u16,
    /// Last handle searched by the `discover_*` helpers
    pub end_handle: u16,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            receive_buffer_size: ATT_DEFAULT_MTU,
            start_handle: ATT_HANDLE_MIN,
            end_handle: ATT_HANDLE_MAX,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_receive_buffer_size(mut self, size: usize) -> Self {
        self.receive_buffer_size = size;
        self
    }

    pub fn with_range(mut self, start_handle: u16, end_handle: u16) -> Self {
        self.start_handle = start_handle;
        self.end_handle = end_handle;
        self
    }
}

/// Outcome of one request/response round
enum Round {
    Next(u16),
    Finished,
}

/// Drives paginated discovery over a transport.
///
/// The transport is used exclusively for the duration of each call; one
/// request is outstanding at a time.
pub struct Discovery<'o, T: AttTransport> {
    transport: T,
    config: DiscoveryConfig,
    observer: Option<Box<dyn PduObserver + 'o>>,
    state: DiscoveryState,
    cursor: u16,
    rounds: usize,
}

impl<'o, T: AttTransport> Discovery<'o, T> {
    /// Create a driver with the default configuration
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, DiscoveryConfig::default())
    }

    pub fn with_config(transport: T, config: DiscoveryConfig) -> Self {
        Self {
            transport,
            config,
            observer: None,
            state: DiscoveryState::AwaitingSend,
            cursor: ATT_HANDLE_MIN,
            rounds: 0,
        }
    }

    /// Install an observer that sees every PDU sent and received
    pub fn with_observer<O: PduObserver + 'o>(mut self, observer: O) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn set_config(&mut self, config: DiscoveryConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// State reached by the last call
    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    /// Start handle of the most recent request
    pub fn cursor(&self) -> u16 {
        self.cursor
    }

    /// Request/response rounds performed by the last call
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Read every attribute of type `uuid` in `[start_handle, end_handle]`
    pub fn read_by_type(
        &mut self,
        uuid: &Uuid,
        start_handle: u16,
        end_handle: u16,
    ) -> PaginationResult<Vec<ReadByTypeElement>> {
        self.read_multiple(&ReadByType, uuid, start_handle, end_handle)
    }

    /// Read every group of type `uuid` in `[start_handle, end_handle]`
    pub fn read_by_group_type(
        &mut self,
        uuid: &Uuid,
        start_handle: u16,
        end_handle: u16,
    ) -> PaginationResult<Vec<ReadByGroupElement>> {
        self.read_multiple(&ReadByGroupType, uuid, start_handle, end_handle)
    }

    /// [`read_by_type`](Self::read_by_type) over the configured range
    pub fn discover_by_type(&mut self, uuid: &Uuid) -> PaginationResult<Vec<ReadByTypeElement>> {
        let (start, end) = (self.config.start_handle, self.config.end_handle);
        self.read_by_type(uuid, start, end)
    }

    /// [`read_by_group_type`](Self::read_by_group_type) over the configured range
    pub fn discover_by_group_type(
        &mut self,
        uuid: &Uuid,
    ) -> PaginationResult<Vec<ReadByGroupElement>> {
        let (start, end) = (self.config.start_handle, self.config.end_handle);
        self.read_by_group_type(uuid, start, end)
    }

    /// All primary service groups over the configured range
    pub fn discover_primary_services(&mut self) -> PaginationResult<Vec<ReadByGroupElement>> {
        self.discover_by_group_type(&Uuid::PRIMARY_SERVICE)
    }

    /// Run one discovery procedure to completion.
    ///
    /// Returns everything accumulated, in the order the peer sent it. Any
    /// failure discards partial results; [`cursor`](Self::cursor) tells how
    /// far the walk got.
    pub fn read_multiple<S: DiscoveryStrategy>(
        &mut self,
        strategy: &S,
        uuid: &Uuid,
        start_handle: u16,
        end_handle: u16,
    ) -> PaginationResult<Vec<S::Element>> {
        self.state = DiscoveryState::AwaitingSend;
        self.cursor = start_handle;
        self.rounds = 0;

        if start_handle == ATT_HANDLE_RESERVED || start_handle > end_handle {
            self.state = DiscoveryState::Failed;
            return Err(PaginationError::InvalidRange {
                start: start_handle,
                end: end_handle,
            });
        }

        let mut buf = vec![0u8; self.config.receive_buffer_size.max(ATT_ERROR_RSP_LEN)];
        let mut accumulated = Vec::new();

        loop {
            match self.round(strategy, uuid, end_handle, &mut buf, &mut accumulated) {
                Ok(Round::Next(cursor)) => {
                    trace!("new start = 0x{:04x}", cursor);
                    self.cursor = cursor;
                }
                Ok(Round::Finished) => {
                    debug!(
                        "discovery of {} complete: {} elements in {} rounds",
                        uuid,
                        accumulated.len(),
                        self.rounds
                    );
                    self.state = DiscoveryState::Done;
                    return Ok(accumulated);
                }
                Err(e) => {
                    warn!("discovery of {} failed at 0x{:04x}: {}", uuid, self.cursor, e);
                    self.state = DiscoveryState::Failed;
                    return Err(e);
                }
            }
        }
    }

    fn round<S: DiscoveryStrategy>(
        &mut self,
        strategy: &S,
        uuid: &Uuid,
        end_handle: u16,
        buf: &mut [u8],
        accumulated: &mut Vec<S::Element>,
    ) -> PaginationResult<Round> {
        self.state = DiscoveryState::AwaitingSend;
        self.rounds += 1;

        let request = strategy.encode_request(self.cursor, end_handle, uuid);
        trace!(
            "requesting 0x{:04x}..=0x{:04x} (opcode 0x{:02x})",
            self.cursor,
            end_handle,
            strategy.request_opcode()
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.on_request(&request);
        }
        self.transport.send(&request)?;

        self.state = DiscoveryState::AwaitingResponse;
        let len = self.transport.receive(buf)?;
        let pdu = &buf[..len.min(buf.len())];
        if let Some(observer) = self.observer.as_mut() {
            observer.on_response(pdu);
        }

        let frame = decode(pdu)?;
        if let Frame::Error(err) = frame {
            if err.request_opcode != strategy.request_opcode() {
                return Err(PaginationError::UnexpectedErrorContext {
                    expected: strategy.request_opcode(),
                    actual: err.request_opcode,
                });
            }
            if err.is_attribute_not_found() {
                debug!("attribute not found from 0x{:04x}, end of data", self.cursor);
                return Ok(Round::Finished);
            }
            return Err(PaginationError::AttributeServerError {
                code: err.error_code_kind(),
                handle: err.handle,
            });
        }

        let elements = match strategy.page_elements(&frame) {
            Some(elements) => elements?,
            None => {
                return Err(PaginationError::UnexpectedResponseOpcode {
                    expected: strategy.response_opcode(),
                    actual: frame.opcode(),
                })
            }
        };

        self.state = DiscoveryState::Accumulating;
        let last = match elements.last() {
            Some(element) => strategy.last_handle(element),
            None => {
                return Err(PaginationError::EmptyPage {
                    opcode: frame.opcode(),
                })
            }
        };
        if last < self.cursor {
            return Err(PaginationError::NonAdvancingPage {
                cursor: self.cursor,
                last,
            });
        }

        trace!("page of {} elements, last handle 0x{:04x}", elements.len(), last);
        accumulated.extend(elements);

        if last == ATT_HANDLE_MAX || last >= end_handle {
            Ok(Round::Finished)
        } else {
            Ok(Round::Next(last + 1))
        }
    }
}
