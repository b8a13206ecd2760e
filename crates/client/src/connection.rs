//! Transport setup: dialing, TLS and credentials.
//!
//! A resolved [`Target`] is dialled as `http://<endpoint>`. With TLS on,
//! the TCP stream is wrapped by `tokio-rustls` before HTTP/2 starts.
//!
//! # Security caveat
//!
//! TLS here encrypts the transport but does **not** authenticate the peer:
//! any server certificate is accepted (handshake signatures are still
//! checked). This matches what the record store deployments expect today
//! and leaves the connection open to an active man-in-the-middle. Do not
//! treat `tls://` as proof of talking to the right store.

use crate::error::ClientError;
use hyper_util::rt::TokioIo;
use recordbase_config::{Target, DEFAULT_TLS_PORT};
use recordbase_proto::record::record_service_client::RecordServiceClient;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::io;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::interceptor::InterceptedService;
use tonic::service::Interceptor;
use tonic::transport::{Channel, Endpoint, Uri};

/// Metadata key carrying the bearer token.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Generated client with credentials attached to every call.
pub type RecordClient = RecordServiceClient<InterceptedService<Channel, TokenInterceptor>>;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Attaches `authorization: Bearer <token>` to outgoing calls.
/// An empty token attaches nothing.
#[derive(Clone)]
pub struct TokenInterceptor {
    value: Option<MetadataValue<Ascii>>,
}

impl TokenInterceptor {
    pub fn new(token: &str) -> Result<Self, ClientError> {
        if token.is_empty() {
            return Ok(Self { value: None });
        }
        let value = format!("Bearer {}", token)
            .parse::<MetadataValue<Ascii>>()
            .map_err(|_| ClientError::Connect("token is not valid ASCII metadata".into()))?;
        Ok(Self { value: Some(value) })
    }

    pub fn has_token(&self) -> bool {
        self.value.is_some()
    }
}

impl std::fmt::Debug for TokenInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenInterceptor")
            .field("has_token", &self.has_token())
            .finish()
    }
}

impl Interceptor for TokenInterceptor {
    fn call(&mut self, mut request: tonic::Request<()>) -> Result<tonic::Request<()>, tonic::Status> {
        if let Some(value) = &self.value {
            request
                .metadata_mut()
                .insert(AUTHORIZATION_HEADER, value.clone());
        }
        Ok(request)
    }
}

// ---------------------------------------------------------------------------
// Dialing
// ---------------------------------------------------------------------------

/// Open a channel to the target. The caller bounds this with a deadline.
pub async fn dial(target: &Target) -> Result<Channel, ClientError> {
    let endpoint = Endpoint::from_shared(format!("http://{}", target.endpoint)).map_err(|e| {
        ClientError::Connect(format!("invalid endpoint {}: {}", target.endpoint, e))
    })?;

    let channel = if target.use_tls {
        let connector = TlsConnector::from(Arc::new(tls_config()?));
        endpoint
            .connect_with_connector(tower::service_fn(move |uri: Uri| {
                let connector = connector.clone();
                async move { connect_tls(connector, uri).await }
            }))
            .await
    } else {
        endpoint.connect().await
    };

    channel.map_err(|e| ClientError::Connect(format!("{}: {}", target.endpoint, describe(&e))))
}

async fn connect_tls(connector: TlsConnector, uri: Uri) -> io::Result<TokioIo<TlsStream<TcpStream>>> {
    let (host, port) = tls_host_port(&uri)?;

    let tcp = TcpStream::connect((host.as_str(), port)).await?;
    tcp.set_nodelay(true)?;

    let server_name =
        ServerName::try_from(host).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let stream = connector.connect(server_name, tcp).await?;
    Ok(TokioIo::new(stream))
}

/// Host and port to dial for a TLS target, defaulting to [`DEFAULT_TLS_PORT`].
fn tls_host_port(uri: &Uri) -> io::Result<(String, u16)> {
    let host = uri
        .host()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "endpoint has no host"))?;
    // IPv6 literals arrive bracketed.
    let host = host.trim_start_matches('[').trim_end_matches(']');
    Ok((host.to_string(), uri.port_u16().unwrap_or(DEFAULT_TLS_PORT)))
}

/// Render an error with its source chain; tonic's transport errors hide
/// the useful part in `source()`.
fn describe(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

// ---------------------------------------------------------------------------
// TLS
// ---------------------------------------------------------------------------

/// Client TLS config: ring provider, ALPN `h2`, no peer verification.
pub fn tls_config() -> Result<rustls::ClientConfig, ClientError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| ClientError::Connect(format!("tls setup: {}", e)))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"h2".to_vec()];
    Ok(config)
}

/// Accepts every server certificate. See the module-level caveat.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
