//! Blocking facade for synchronous callers.
//!
//! Each instance drives its own current-thread tokio runtime, so no
//! background threads are started. Calls may come from several threads at
//! once. Do not call these methods from inside an async context; use the
//! async [`crate::Instance`] there.

use crate::error::Result;
use recordbase_common::{Entry, Format};
use recordbase_config::ClientConfig;
use serde_json::{Map, Value};
use tokio::runtime::{Builder, Runtime};

/// Synchronous counterpart of [`crate::Instance`].
#[derive(Debug)]
pub struct Instance {
    // Dropped before the runtime.
    inner: crate::Instance,
    runtime: Runtime,
}

fn runtime() -> Result<Runtime> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

impl Instance {
    /// See [`crate::Instance::connect`].
    pub fn connect(endpoint: &str, token: &str, timeout_ms: i64) -> Result<Self> {
        let runtime = runtime()?;
        let inner = runtime.block_on(crate::Instance::connect(endpoint, token, timeout_ms))?;
        Ok(Self { inner, runtime })
    }

    /// See [`crate::Instance::connect_with_tls`].
    pub fn connect_with_tls(
        endpoint: &str,
        token: &str,
        use_tls: bool,
        timeout_ms: i64,
    ) -> Result<Self> {
        let runtime = runtime()?;
        let inner = runtime.block_on(crate::Instance::connect_with_tls(
            endpoint, token, use_tls, timeout_ms,
        ))?;
        Ok(Self { inner, runtime })
    }

    /// See [`crate::Instance::connect_with_config`].
    pub fn connect_with_config(config: &ClientConfig) -> Result<Self> {
        let runtime = runtime()?;
        let inner = runtime.block_on(crate::Instance::connect_with_config(config))?;
        Ok(Self { inner, runtime })
    }

    pub fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }

    pub fn get(
        &self,
        tenant: &str,
        primary_key: &str,
        include_file_contents: bool,
        timeout_ms: i64,
    ) -> Result<Entry> {
        self.runtime.block_on(
            self.inner
                .get(tenant, primary_key, include_file_contents, timeout_ms),
        )
    }

    pub fn merge(&self, entry: &Entry, timeout_ms: i64) -> Result<()> {
        self.runtime.block_on(self.inner.merge(entry, timeout_ms))
    }

    pub fn replace(&self, entry: &Entry, timeout_ms: i64) -> Result<()> {
        self.runtime.block_on(self.inner.replace(entry, timeout_ms))
    }

    pub fn get_map(
        &self,
        tenant: &str,
        primary_key: &str,
        include_file_contents: bool,
        timeout_ms: i64,
    ) -> Result<Map<String, Value>> {
        self.runtime.block_on(
            self.inner
                .get_map(tenant, primary_key, include_file_contents, timeout_ms),
        )
    }

    pub fn get_serialized(
        &self,
        tenant: &str,
        primary_key: &str,
        include_file_contents: bool,
        format: Format,
        timeout_ms: i64,
    ) -> Result<Vec<u8>> {
        self.runtime.block_on(self.inner.get_serialized(
            tenant,
            primary_key,
            include_file_contents,
            format,
            timeout_ms,
        ))
    }

    pub fn merge_serialized(&self, payload: &[u8], format: Format, timeout_ms: i64) -> Result<()> {
        self.runtime
            .block_on(self.inner.merge_serialized(payload, format, timeout_ms))
    }

    pub fn replace_serialized(
        &self,
        payload: &[u8],
        format: Format,
        timeout_ms: i64,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.replace_serialized(payload, format, timeout_ms))
    }

    /// Release the connection, then the runtime.
    pub fn close(self) {
        let Self { inner, runtime } = self;
        {
            let _guard = runtime.enter();
            inner.close();
        }
        drop(runtime);
    }
}
