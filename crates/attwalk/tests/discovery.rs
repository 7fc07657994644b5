//! End-to-end discovery scenarios against scripted peers

use attwalk::att::{
    ATT_ERROR_ATTRIBUTE_NOT_FOUND, ATT_ERROR_RSP, ATT_HANDLE_MAX, ATT_HANDLE_MIN,
    ATT_READ_BY_GROUP_TYPE_REQ, ATT_READ_BY_GROUP_TYPE_RSP, ATT_READ_BY_TYPE_REQ,
    ATT_READ_BY_TYPE_RSP,
};
use attwalk::{
    AttTransport, Discovery, DiscoveryConfig, DiscoveryState, L2capAttSocket, LogObserver,
    PaginationError, ReadByGroupElement, Uuid,
};
use std::collections::VecDeque;
use std::io;
use std::os::unix::io::FromRawFd;
use std::thread;

/// Mock peer answering each request with the next queued response
struct ScriptedPeer {
    responses: VecDeque<Vec<u8>>,
    requests: Vec<Vec<u8>>,
}

impl ScriptedPeer {
    fn new(responses: Vec<Vec<u8>>) -> Self {
        Self {
            responses: responses.into(),
            requests: Vec::new(),
        }
    }
}

impl AttTransport for ScriptedPeer {
    fn send(&mut self, pdu: &[u8]) -> io::Result<()> {
        self.requests.push(pdu.to_vec());
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pdu = self
            .responses
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "peer went quiet"))?;
        let len = pdu.len().min(buf.len());
        buf[..len].copy_from_slice(&pdu[..len]);
        Ok(len)
    }
}

fn group_page(element_size: u8, groups: &[(u16, u16, &[u8])]) -> Vec<u8> {
    let mut pdu = vec![ATT_READ_BY_GROUP_TYPE_RSP, element_size];
    for (start, end, uuid) in groups {
        pdu.extend_from_slice(&start.to_le_bytes());
        pdu.extend_from_slice(&end.to_le_bytes());
        pdu.extend_from_slice(uuid);
    }
    pdu
}

fn not_found(request_opcode: u8, handle: u16) -> Vec<u8> {
    let mut pdu = vec![ATT_ERROR_RSP, request_opcode];
    pdu.extend_from_slice(&handle.to_le_bytes());
    pdu.push(ATT_ERROR_ATTRIBUTE_NOT_FOUND);
    pdu
}

#[test]
fn test_primary_service_discovery() {
    let service_a = [0x00, 0x18];
    let service_b = [0x0F, 0x18];
    let mut peer = ScriptedPeer::new(vec![
        group_page(6, &[(1, 5, &service_a[..])]),
        group_page(6, &[(5, 20, &service_b[..])]),
        not_found(ATT_READ_BY_GROUP_TYPE_REQ, 21),
    ]);

    let services = Discovery::new(&mut peer)
        .read_by_group_type(&Uuid::PRIMARY_SERVICE, ATT_HANDLE_MIN, ATT_HANDLE_MAX)
        .unwrap();

    assert_eq!(
        services,
        vec![
            ReadByGroupElement {
                start_handle: 1,
                end_handle: 5,
                group_type: Uuid::Uuid16(0x1800),
            },
            ReadByGroupElement {
                start_handle: 5,
                end_handle: 20,
                group_type: Uuid::Uuid16(0x180F),
            },
        ]
    );

    // Each request carries the primary service UUID and the advancing start
    assert_eq!(peer.requests.len(), 3);
    assert_eq!(peer.requests[0], vec![0x10, 0x01, 0x00, 0xFF, 0xFF, 0x00, 0x28]);
    assert_eq!(peer.requests[1][1..3], [0x06, 0x00]);
    assert_eq!(peer.requests[2][1..3], [0x15, 0x00]);
}

#[test]
fn test_128bit_services_with_larger_buffer() {
    let custom = [0x5A; 16];
    let mut peer = ScriptedPeer::new(vec![
        group_page(20, &[(0x0010, 0x0018, &custom[..]), (0x0019, 0xFFFF, &custom[..])]),
    ]);

    let config = DiscoveryConfig::default().with_receive_buffer_size(64);
    let mut discovery = Discovery::with_config(&mut peer, config).with_observer(LogObserver);

    let services = discovery.discover_primary_services().unwrap();
    assert_eq!(services.len(), 2);
    assert_eq!(services[1].group_type, Uuid::Uuid128(custom));
    assert_eq!(discovery.state(), DiscoveryState::Done);
    assert_eq!(discovery.rounds(), 1);
}

#[test]
fn test_characteristic_declarations() {
    // handle(2) + properties(1) + value handle(2) + UUID(2)
    let page = |entries: &[(u16, u16, u16)]| {
        let mut pdu = vec![ATT_READ_BY_TYPE_RSP, 7];
        for (handle, value_handle, uuid) in entries {
            pdu.extend_from_slice(&handle.to_le_bytes());
            pdu.push(0x02);
            pdu.extend_from_slice(&value_handle.to_le_bytes());
            pdu.extend_from_slice(&uuid.to_le_bytes());
        }
        pdu
    };
    let mut peer = ScriptedPeer::new(vec![
        page(&[(0x0002, 0x0003, 0x2A00), (0x0004, 0x0005, 0x2A01)]),
        page(&[(0x0007, 0x0008, 0x2A19)]),
        not_found(ATT_READ_BY_TYPE_REQ, 0x0009),
    ]);

    let mut discovery = Discovery::new(&mut peer);
    let declarations = discovery.discover_by_type(&Uuid::CHARACTERISTIC).unwrap();

    let handles: Vec<u16> = declarations.iter().map(|d| d.handle).collect();
    assert_eq!(handles, vec![0x0002, 0x0004, 0x0007]);
    assert!(declarations.iter().all(|d| d.value.len() == 5));
    assert_eq!(declarations[2].value, vec![0x02, 0x08, 0x00, 0x19, 0x2A]);
}

#[test]
fn test_truncated_response_is_reported() -> attwalk::error::Result<()> {
    // A 23 byte receive buffer cuts a 20-byte-element page mid element
    let custom = [0x77; 16];
    let mut peer = ScriptedPeer::new(vec![group_page(
        20,
        &[(0x0001, 0x0004, &custom[..]), (0x0005, 0x0009, &custom[..])],
    )]);

    let result = Discovery::new(&mut peer).discover_primary_services();
    match result {
        Err(PaginationError::Decode(_)) => {}
        other => panic!("expected decode failure, got {:?}", other),
    }

    // The crate-level error wraps every layer
    let uuid: Uuid = "2800".parse()?;
    assert_eq!(uuid, Uuid::PRIMARY_SERVICE);
    Ok(())
}

#[test]
fn test_discovery_over_seqpacket_socket() {
    let mut fds = [0 as libc::c_int; 2];
    let result =
        unsafe { libc::socketpair(libc::AF_UNIX, libc::SOCK_SEQPACKET, 0, fds.as_mut_ptr()) };
    assert_eq!(result, 0);
    let (client, mut server) = unsafe {
        (
            L2capAttSocket::from_raw_fd(fds[0]),
            L2capAttSocket::from_raw_fd(fds[1]),
        )
    };

    let peer = thread::spawn(move || {
        let responses = vec![
            vec![ATT_READ_BY_TYPE_RSP, 3, 0x01, 0x00, 0xAA, 0x02, 0x00, 0xBB],
            not_found(ATT_READ_BY_TYPE_REQ, 0x0003),
        ];
        let mut buf = [0u8; 23];
        let mut starts = Vec::new();
        for response in responses {
            let len = server.receive(&mut buf).unwrap();
            assert_eq!(buf[0], ATT_READ_BY_TYPE_REQ);
            assert_eq!(len, 7);
            starts.push(u16::from_le_bytes([buf[1], buf[2]]));
            server.send(&response).unwrap();
        }
        starts
    });

    let mut discovery = Discovery::new(client);
    let values = discovery
        .read_by_type(&Uuid::Uuid16(0x2A00), ATT_HANDLE_MIN, ATT_HANDLE_MAX)
        .unwrap();

    assert_eq!(values.len(), 2);
    assert_eq!(values[1].value, vec![0xBB]);
    assert_eq!(peer.join().unwrap(), vec![0x0001, 0x0003]);
}
