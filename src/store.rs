use crate::domain::{Address, IdentifiedAddress};
use crate::error::{ResolverError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// On-disk shape of the record store: addresses keyed by country code.
pub type CountryPartitions = BTreeMap<String, Vec<Address>>;

/// Store of canonical addresses with stable identifiers.
///
/// `register` is the atomic load -> compute next id -> append -> persist
/// operation; implementations must serialize it so concurrent registrations
/// for the same country cannot mint the same identifier.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Loads the full candidate set, identifiers included.
    async fn load_all(&self) -> Result<Vec<IdentifiedAddress>>;

    /// Registers a new address and returns it with its assigned identifier.
    async fn register(&self, address: Address) -> Result<IdentifiedAddress>;
}

/// Derives identifiers for every stored record: `{COUNTRY}_{index}` with the
/// index strictly increasing within each country partition.
fn flatten_partitions(partitions: &CountryPartitions) -> Vec<IdentifiedAddress> {
    let mut records = Vec::new();
    for (country_code, addresses) in partitions {
        for (idx, address) in addresses.iter().enumerate() {
            records.push(IdentifiedAddress {
                id: format!("{}_{}", country_code, idx),
                address: address.clone(),
            });
        }
    }
    records
}

/// Identifier policy: upper-cased country code, then the count of existing
/// records whose identifier already carries that exact prefix.
fn next_id(records: &[IdentifiedAddress], country: &str) -> String {
    let prefix = format!("{}_", country.to_uppercase());
    let count = records.iter().filter(|r| r.id.starts_with(&prefix)).count();
    format!("{}{}", prefix, count)
}

/// Durable record store persisted as a single JSON document.
///
/// A missing file is an empty store; malformed content is an error so that a
/// bad read can never silently drop existing records on the next write.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes the read-modify-write in register().
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn load_partitions(&self) -> Result<CountryPartitions> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Store file {} not found, treating as empty", self.path.display());
                return Ok(CountryPartitions::new());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map_err(|e| {
            ResolverError::Store(format!(
                "malformed store file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn persist_partitions(&self, partitions: &CountryPartitions) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(partitions)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[async_trait]
impl AddressStore for JsonFileStore {
    async fn load_all(&self) -> Result<Vec<IdentifiedAddress>> {
        Ok(flatten_partitions(&self.load_partitions()?))
    }

    async fn register(&self, address: Address) -> Result<IdentifiedAddress> {
        let _guard = self.write_lock.lock().await;

        let mut partitions = self.load_partitions()?;
        let records = flatten_partitions(&partitions);
        let id = next_id(&records, &address.country);

        let partition_key = address.country.to_uppercase();
        partitions
            .entry(partition_key)
            .or_default()
            .push(address.clone());
        self.persist_partitions(&partitions)?;

        debug!("Registered address in {} with id {}", self.path.display(), id);
        Ok(IdentifiedAddress { id, address })
    }
}

/// In-memory store implementation for development and testing.
pub struct InMemoryStore {
    partitions: Mutex<CountryPartitions>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            partitions: Mutex::new(CountryPartitions::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressStore for InMemoryStore {
    async fn load_all(&self) -> Result<Vec<IdentifiedAddress>> {
        Ok(flatten_partitions(&*self.partitions.lock().await))
    }

    async fn register(&self, address: Address) -> Result<IdentifiedAddress> {
        let mut partitions = self.partitions.lock().await;
        let records = flatten_partitions(&partitions);
        let id = next_id(&records, &address.country);

        if records.iter().any(|r| r.address == address) {
            warn!("Registering address identical to an existing record, minting {}", id);
        }

        partitions
            .entry(address.country.to_uppercase())
            .or_default()
            .push(address.clone());
        Ok(IdentifiedAddress { id, address })
    }
}
