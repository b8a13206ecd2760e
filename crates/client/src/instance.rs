//! Record operations against one connected store.

use crate::connection::{self, RecordClient, TokenInterceptor};
use crate::convert;
use crate::deadline;
use crate::error::{ClientError, Result};
use recordbase_common::Entry;
use recordbase_config::{ClientConfig, Resolver, Target};
use recordbase_proto::record::record_service_client::RecordServiceClient;
use recordbase_proto::record::UpdateType;

/// A connection to one record store.
///
/// The instance exclusively owns its channel. Operations take `&self` and
/// may run concurrently from many tasks; the channel multiplexes them.
/// [`Instance::close`] consumes the instance, so nothing can run after it.
#[derive(Debug)]
pub struct Instance {
    client: RecordClient,
    endpoint: String,
}

impl Instance {
    /// Connect using prefix conventions: `tls://` on the endpoint turns
    /// TLS on, `$VAR` on the token reads it from the environment.
    pub async fn connect(endpoint: &str, token: &str, timeout_ms: i64) -> Result<Self> {
        Self::connect_with_tls(endpoint, token, false, timeout_ms).await
    }

    /// Connect with an explicit TLS flag. A `tls://` prefix still wins.
    pub async fn connect_with_tls(
        endpoint: &str,
        token: &str,
        use_tls: bool,
        timeout_ms: i64,
    ) -> Result<Self> {
        let target = Resolver::default().resolve(endpoint, token, use_tls);
        Self::connect_target(target, timeout_ms).await
    }

    /// Validate `config` and connect with its connect timeout.
    pub async fn connect_with_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Self::connect_target(config.target(), config.connect_timeout_ms).await
    }

    /// Connect to an already resolved target.
    pub async fn connect_target(target: Target, timeout_ms: i64) -> Result<Self> {
        let rpc = "connect";
        let _timer = recordbase_metrics::start_rpc(rpc);

        let interceptor = observe(rpc, TokenInterceptor::new(&target.token))?;
        if target.use_tls {
            tracing::warn!(
                endpoint = %target.endpoint,
                "TLS enabled without peer certificate verification"
            );
        }

        let channel = observe(
            rpc,
            deadline::scoped(timeout_ms, |_| connection::dial(&target)).await,
        )?;

        tracing::info!(
            endpoint = %target.endpoint,
            tls = target.use_tls,
            authenticated = interceptor.has_token(),
            "connected to record store"
        );

        Ok(Self {
            client: RecordServiceClient::with_interceptor(channel, interceptor),
            endpoint: target.endpoint,
        })
    }

    /// The resolved endpoint this instance is connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Read one entry.
    ///
    /// A missing record is not an error: it yields `Entry::default()`.
    /// File data is only filled in when `include_file_contents` is set.
    pub async fn get(
        &self,
        tenant: &str,
        primary_key: &str,
        include_file_contents: bool,
        timeout_ms: i64,
    ) -> Result<Entry> {
        let rpc = "get";
        let _timer = recordbase_metrics::start_rpc(rpc);
        tracing::debug!(tenant, primary_key, include_file_contents, timeout_ms, "get");

        let req = convert::get_request(tenant, primary_key, include_file_contents);
        let mut client = self.client.clone();

        let found = deadline::scoped(timeout_ms, |deadline| async move {
            let mut request = tonic::Request::new(req);
            deadline.apply(&mut request);
            match client.get(request).await {
                Ok(resp) => Ok(Some(resp.into_inner())),
                Err(status) if status.code() == tonic::Code::NotFound => Ok(None),
                Err(status) => Err(ClientError::from_status(status, timeout_ms)),
            }
        })
        .await;

        match observe(rpc, found)? {
            Some(resp) => Ok(convert::entry_from_proto(resp)),
            None => {
                recordbase_metrics::metrics().not_found.inc();
                tracing::debug!(tenant, primary_key, "entry not found");
                Ok(Entry::default())
            }
        }
    }

    /// Merge `entry` into the stored entry: submitted fields change, the
    /// rest are left alone.
    pub async fn merge(&self, entry: &Entry, timeout_ms: i64) -> Result<()> {
        self.update(entry, UpdateType::Merge, timeout_ms).await
    }

    /// Replace the stored entry with `entry`.
    pub async fn replace(&self, entry: &Entry, timeout_ms: i64) -> Result<()> {
        self.update(entry, UpdateType::Replace, timeout_ms).await
    }

    async fn update(&self, entry: &Entry, update_type: UpdateType, timeout_ms: i64) -> Result<()> {
        let rpc = match update_type {
            UpdateType::Merge => "merge",
            UpdateType::Replace => "replace",
        };

        // Encoding problems surface before anything is sent.
        let req = observe(
            rpc,
            convert::update_request(entry, update_type).map_err(ClientError::from),
        )?;

        let _timer = recordbase_metrics::start_rpc(rpc);
        tracing::debug!(
            tenant = %entry.tenant,
            primary_key = %entry.primary_key,
            update_type = update_type.as_str_name(),
            timeout_ms,
            "update"
        );

        let mut client = self.client.clone();
        let result = deadline::scoped(timeout_ms, |deadline| async move {
            let mut request = tonic::Request::new(req);
            deadline.apply(&mut request);
            client
                .update(request)
                .await
                .map(|_| ())
                .map_err(|status| ClientError::from_status(status, timeout_ms))
        })
        .await;

        observe(rpc, result)
    }

    /// Release the connection.
    pub fn close(self) {
        tracing::info!(endpoint = %self.endpoint, "closing record store connection");
    }
}

/// Count and log a failed call, passing the result through.
fn observe<T>(rpc: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        recordbase_metrics::record_failure(rpc, e.kind());
        tracing::warn!(rpc, kind = e.kind(), "record store call failed: {}", e);
    }
    result
}
