//! Retrieving the served certificate chain.
//!
//! The handshake uses a verifier that accepts anything: an expired or
//! untrusted chain must still be captured so it can be reported on. The
//! trust verdict is computed afterwards by [`crate::authorize`].

use crate::parser::parse_pem_chain;
use crate::CertAuditError;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, SignatureScheme};
use std::io::{ErrorKind, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Certificates presented by a server (leaf first) and the negotiated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedChain {
    /// `host:port`, or the file the chain was read from.
    pub origin: String,
    /// DER certificates in the order the server sent them.
    pub certificates: Vec<Vec<u8>>,
    /// Negotiated protocol, e.g. "TLSv1.3". Unknown for offline chains.
    pub protocol: Option<String>,
    pub cipher_suite: Option<String>,
}

impl ServedChain {
    /// Build a chain from a PEM bundle (leaf first) instead of a live connection.
    pub fn from_pem(origin: impl Into<String>, data: &[u8]) -> Result<Self, CertAuditError> {
        Ok(ServedChain {
            origin: origin.into(),
            certificates: parse_pem_chain(data)?,
            protocol: None,
            cipher_suite: None,
        })
    }
}

/// Connect to `hostname:port`, complete a TLS handshake and capture the served chain.
///
/// `timeout` bounds the TCP connect and the whole handshake. The socket is
/// closed on every return path.
pub fn fetch_chain(
    hostname: &str,
    port: u16,
    timeout: Duration,
) -> Result<ServedChain, CertAuditError> {
    let origin = format!("{}:{}", hostname, port);
    let deadline = Instant::now() + timeout;

    let addrs = (hostname, port)
        .to_socket_addrs()
        .map_err(|e| CertAuditError::Connection(format!("failed to resolve {}: {}", origin, e)))?;

    let mut last_error = None;
    let mut socket = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, remaining(deadline, timeout)?) {
            Ok(stream) => {
                socket = Some(stream);
                break;
            }
            Err(e) => last_error = Some(e),
        }
    }
    let mut socket = match (socket, last_error) {
        (Some(socket), _) => socket,
        (None, Some(e)) if is_timeout(&e) => return Err(CertAuditError::Timeout(timeout)),
        (None, Some(e)) => {
            return Err(CertAuditError::Connection(format!(
                "failed to connect to {}: {}",
                origin, e
            )))
        }
        (None, None) => {
            return Err(CertAuditError::Connection(format!(
                "no addresses found for {}",
                origin
            )))
        }
    };
    tracing::info!(%origin, "connected");

    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .dangerous()
    .with_custom_certificate_verifier(Arc::new(NoCertificateVerification))
    .with_no_client_auth();

    let server_name = ServerName::try_from(hostname.to_owned())
        .map_err(|e| CertAuditError::Connection(format!("invalid server name {}: {}", hostname, e)))?;
    let mut conn = ClientConnection::new(Arc::new(config), server_name)?;

    // Each socket operation may only block for what is left before the deadline.
    while conn.is_handshaking() {
        if conn.wants_write() {
            socket.set_write_timeout(Some(remaining(deadline, timeout)?))?;
            conn.write_tls(&mut socket)
                .map_err(|e| handshake_io_error(&origin, timeout, e))?;
        } else if conn.wants_read() {
            socket.set_read_timeout(Some(remaining(deadline, timeout)?))?;
            let read = conn
                .read_tls(&mut socket)
                .map_err(|e| handshake_io_error(&origin, timeout, e))?;
            if read == 0 {
                return Err(CertAuditError::Connection(format!(
                    "{} closed the connection during the TLS handshake",
                    origin
                )));
            }
            conn.process_new_packets().map_err(|e| {
                CertAuditError::Connection(format!("TLS handshake with {} failed: {}", origin, e))
            })?;
        } else {
            return Err(CertAuditError::Connection(format!(
                "TLS handshake with {} stalled",
                origin
            )));
        }
    }

    let certificates: Vec<Vec<u8>> = conn
        .peer_certificates()
        .unwrap_or_default()
        .iter()
        .map(|cert| cert.as_ref().to_vec())
        .collect();
    if certificates.is_empty() {
        return Err(CertAuditError::Connection(format!(
            "{} presented no certificates",
            origin
        )));
    }

    let protocol = conn
        .protocol_version()
        .map(|v| format!("{:?}", v).replace('_', "."));
    let cipher_suite = conn
        .negotiated_cipher_suite()
        .map(|suite| format!("{:?}", suite.suite()));

    conn.send_close_notify();
    // The peer may already have gone away; the chain is captured either way.
    if let Ok(left) = remaining(deadline, timeout) {
        let _ = socket.set_write_timeout(Some(left));
        while conn.wants_write() {
            if conn.write_tls(&mut socket).is_err() {
                break;
            }
        }
    }
    let _ = socket.flush();
    let _ = socket.shutdown(Shutdown::Both);

    tracing::info!(
        %origin,
        certificates = certificates.len(),
        protocol = protocol.as_deref().unwrap_or("unknown"),
        "retrieved certificate chain"
    );

    Ok(ServedChain {
        origin,
        certificates,
        protocol,
        cipher_suite,
    })
}

/// Time left before `deadline`, or a timeout error once it has passed.
fn remaining(deadline: Instant, timeout: Duration) -> Result<Duration, CertAuditError> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        return Err(CertAuditError::Timeout(timeout));
    }
    Ok(left)
}

fn handshake_io_error(origin: &str, timeout: Duration, e: std::io::Error) -> CertAuditError {
    if is_timeout(&e) {
        CertAuditError::Timeout(timeout)
    } else {
        CertAuditError::Connection(format!("TLS handshake with {} failed: {}", origin, e))
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

/// Accepts every server certificate and handshake signature.
#[derive(Debug)]
struct NoCertificateVerification;

impl ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _: &CertificateDer<'_>,
        _: &[CertificateDer<'_>],
        _: &ServerName<'_>,
        _: &[u8],
        _: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _: &[u8],
        _: &CertificateDer<'_>,
        _: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _: &[u8],
        _: &CertificateDer<'_>,
        _: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA1,
            SignatureScheme::ECDSA_SHA1_Legacy,
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
            SignatureScheme::ED448,
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn from_pem_keeps_order_and_has_no_session() {
        let pem = b"-----BEGIN CERTIFICATE-----\nMAA=\n-----END CERTIFICATE-----\n\
                    -----BEGIN CERTIFICATE-----\nMAEA\n-----END CERTIFICATE-----\n";
        let chain = ServedChain::from_pem("chain.pem", pem).unwrap();
        assert_eq!(chain.origin, "chain.pem");
        assert_eq!(chain.certificates, vec![vec![0x30, 0x00], vec![0x30, 0x01, 0x00]]);
        assert!(chain.protocol.is_none());
        assert!(chain.cipher_suite.is_none());
    }

    #[test]
    fn from_pem_rejects_non_pem() {
        assert!(ServedChain::from_pem("x", b"not a certificate").is_err());
    }

    #[test]
    fn refused_connection_is_a_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let err = fetch_chain("127.0.0.1", port, Duration::from_secs(2)).unwrap_err();
        assert!(matches!(
            err,
            CertAuditError::Connection(_) | CertAuditError::Timeout(_)
        ));
    }

    #[test]
    fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let started = Instant::now();
        let err = fetch_chain("127.0.0.1", port, Duration::from_millis(300)).unwrap_err();
        assert!(matches!(err, CertAuditError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(listener);
    }

    #[test]
    fn dripping_server_is_bounded_by_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            // A handshake record header announcing 16000 bytes, then one byte at a time.
            if stream.write_all(&[0x16, 0x03, 0x03, 0x3e, 0x80]).is_err() {
                return;
            }
            for _ in 0..40 {
                std::thread::sleep(Duration::from_millis(100));
                if stream.write_all(&[0]).is_err() {
                    return;
                }
            }
        });

        let started = Instant::now();
        let err = fetch_chain("127.0.0.1", port, Duration::from_millis(500)).unwrap_err();
        let elapsed = started.elapsed();
        assert!(matches!(err, CertAuditError::Timeout(_)), "{:?}", err);
        assert!(elapsed < Duration::from_millis(1500), "took {:?}", elapsed);
        server.join().unwrap();
    }

    #[test]
    fn remaining_time_runs_out() {
        let timeout = Duration::from_millis(10);
        let past = Instant::now();
        std::thread::sleep(Duration::from_millis(1));
        assert!(matches!(
            remaining(past, timeout),
            Err(CertAuditError::Timeout(_))
        ));
        let left = remaining(Instant::now() + Duration::from_secs(60), timeout).unwrap();
        assert!(left > Duration::from_secs(50));
    }
}
