//! Get-or-create client registry.
//!
//! Clients are expensive and own the backend allocator, so every caller
//! asking for structurally equal [`ClientOptions`] must receive the same
//! [`Client`] instance, including callers racing from different threads.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use devjit_device::{AllocatorAdapter, Client, ClientKey, ClientOptions, HostAllocator};

use crate::error::{RegistryError, Result};

/// Obtains the shared client for a set of options.
pub trait ClientRegistry: Send + Sync {
    /// Return the client for `options`, creating it on first use.
    fn get_or_create_client(&self, options: &ClientOptions) -> Result<Arc<Client>>;
}

/// Builds a new client for options not seen before.
pub type ClientFactory = Box<dyn Fn(&ClientOptions) -> Result<Client> + Send + Sync>;

/// In-process client registry.
///
/// A factory that panics poisons the map without changing it. Later
/// creation reports [`RegistryError::Poisoned`]; `len` still reads it.
pub struct LocalClientRegistry {
    factory: ClientFactory,
    clients: Mutex<HashMap<ClientKey, Arc<Client>>>,
}

impl LocalClientRegistry {
    /// Registry using `factory` to build clients.
    pub fn new(factory: ClientFactory) -> Self {
        Self {
            factory,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Registry whose clients allocate through a host allocator adapter.
    pub fn host_backed() -> Self {
        Self::new(Box::new(host_backed_client))
    }

    /// Number of distinct clients created so far.
    pub fn len(&self) -> usize {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for LocalClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalClientRegistry")
            .field("clients", &self.len())
            .finish()
    }
}

impl ClientRegistry for LocalClientRegistry {
    fn get_or_create_client(&self, options: &ClientOptions) -> Result<Arc<Client>> {
        let key = options.key();
        // Creation happens under the lock so concurrent callers with equal
        // options never build two clients.
        let mut clients = self
            .clients
            .lock()
            .map_err(|_| RegistryError::Poisoned { registry: "clients" })?;
        if let Some(client) = clients.get(&key) {
            return Ok(Arc::clone(client));
        }
        let client = Arc::new((self.factory)(options)?);
        tracing::info!(
            platform = options.platform.name(),
            threads = ?options.intra_op_parallelism_threads,
            allowed_devices = ?options.allowed_devices,
            "created compilation client"
        );
        clients.insert(key, Arc::clone(&client));
        Ok(client)
    }
}

fn host_backed_client(options: &ClientOptions) -> Result<Client> {
    let allocator = HostAllocator::new(format!("{}/backend", options.platform.name()));
    let adapter = AllocatorAdapter::for_platform(Arc::new(allocator), Arc::clone(&options.platform));
    Ok(Client::new(options.clone(), Arc::new(adapter)))
}
