//! Transports carrying ATT PDUs
//!
//! Discovery only needs a blocking send/receive pair over one logical
//! channel. Establishing that channel is up to the caller.

use std::io;
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use std::time::Duration;

/// A half-duplex request/response channel for ATT PDUs
pub trait AttTransport {
    /// Send one complete PDU
    fn send(&mut self, pdu: &[u8]) -> io::Result<()>;

    /// Block until one PDU arrives and copy it into `buf`.
    ///
    /// Returns the number of bytes written.
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: AttTransport + ?Sized> AttTransport for &mut T {
    fn send(&mut self, pdu: &[u8]) -> io::Result<()> {
        (**self).send(pdu)
    }

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).receive(buf)
    }
}

/// ATT over a connected L2CAP SEQPACKET socket on the LE ATT channel
#[derive(Debug)]
pub struct L2capAttSocket {
    fd: RawFd,
}

impl L2capAttSocket {
    /// Set how long `receive` blocks before failing with `WouldBlock`/`TimedOut`.
    ///
    /// `None` blocks indefinitely.
    pub fn set_receive_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        let timeout = timeout.unwrap_or(Duration::ZERO);
        let timeval = libc::timeval {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_usec: timeout.subsec_micros() as libc::suseconds_t,
        };

        let result = unsafe {
            libc::setsockopt(
                self.fd,
                libc::SOL_SOCKET,
                libc::SO_RCVTIMEO,
                &timeval as *const _ as *const libc::c_void,
                std::mem::size_of::<libc::timeval>() as libc::socklen_t,
            )
        };

        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl AttTransport for L2capAttSocket {
    fn send(&mut self, pdu: &[u8]) -> io::Result<()> {
        let written = unsafe {
            libc::send(
                self.fd,
                pdu.as_ptr() as *const libc::c_void,
                pdu.len(),
                0,
            )
        };

        if written < 0 {
            return Err(io::Error::last_os_error());
        }
        if written as usize != pdu.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "short write on L2CAP socket",
            ));
        }
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = unsafe {
            libc::recv(
                self.fd,
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
                0,
            )
        };

        if read < 0 {
            return Err(io::Error::last_os_error());
        }
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "L2CAP channel closed",
            ));
        }
        Ok(read as usize)
    }
}

impl FromRawFd for L2capAttSocket {
    /// Takes ownership of a connected L2CAP socket; it is closed on drop.
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self { fd }
    }
}

impl AsRawFd for L2capAttSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for L2capAttSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn socket_pair() -> (L2capAttSocket, L2capAttSocket) {
        let mut fds = [0 as libc::c_int; 2];
        let result =
            unsafe { libc::socketpair(libc::AF_UNIX, libc::SOCK_SEQPACKET, 0, fds.as_mut_ptr()) };
        assert_eq!(result, 0);
        unsafe {
            (
                L2capAttSocket::from_raw_fd(fds[0]),
                L2capAttSocket::from_raw_fd(fds[1]),
            )
        }
    }

    #[test]
    fn test_seqpacket_preserves_boundaries() {
        let (mut a, mut b) = socket_pair();

        a.send(&[0x01, 0x08, 0x01, 0x00, 0x0A]).unwrap();
        a.send(&[0x09, 0x03, 0x01, 0x00, 0x42]).unwrap();

        let mut buf = [0u8; 23];
        assert_eq!(b.receive(&mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], &[0x01, 0x08, 0x01, 0x00, 0x0A]);
        assert_eq!(b.receive(&mut buf).unwrap(), 5);
        assert_eq!(buf[0], 0x09);
    }

    #[test]
    fn test_receive_timeout() {
        let (_a, mut b) = socket_pair();
        b.set_receive_timeout(Some(Duration::from_millis(10))).unwrap();

        let mut buf = [0u8; 23];
        let err = b.receive(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ));
    }

    #[test]
    fn test_closed_peer_is_eof() {
        let (a, mut b) = socket_pair();
        drop(a);

        let mut buf = [0u8; 23];
        let err = b.receive(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
