//! Registry storage layout.
//!
//! Reads and appends `records[name]` and `names` directly in the Registry's
//! storage. Records of a name are kept in strictly increasing activation
//! order, which is what makes the binary searches in [`find_active_record`]
//! and [`active_record`] valid.

use alloy_primitives::{Address, U256};

use crate::catalog::{SystemContract, REGISTRY_ADDR};
use crate::errors::{CorruptRegistry, InstallError};
use crate::onchain::{
    decode_address, decode_short_string, decode_u64, dynamic_array_base_slot, encode_address,
    encode_short_string, encode_u64, mapping_string_slot, registry_slots,
};
use crate::state::{StateWriter, StorageReader};

/// One `(address, activation)` entry registered for a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryRecord {
    /// Contract address effective from `activation`
    pub addr: Address,
    /// First block at which `addr` is active
    pub activation: u64,
}

impl RegistryRecord {
    /// Create a record.
    pub const fn new(addr: Address, activation: u64) -> Self {
        Self { addr, activation }
    }
}

/// Result of appending a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The record was written
    Appended,
    /// An identical record was already the latest one
    Unchanged,
}

/// Upper bound accepted for `records[name].length` and `names.length`.
///
/// The mock Registry lets anyone write any slot, so a larger length is
/// reported as corrupt storage instead of being walked.
pub const MAX_REGISTRY_ENTRIES: u64 = 1024;

/// Slot holding `records[name].length`.
fn records_length_slot(name: &str) -> U256 {
    mapping_string_slot(name, registry_slots::RECORDS)
}

fn record_slot(base: U256, index: u64, offset: u64) -> U256 {
    base + U256::from(index * registry_slots::RECORD_SIZE + offset)
}

fn array_length(state: &impl StorageReader, slot: U256, what: &str) -> Result<u64, CorruptRegistry> {
    let length = state.read_storage(REGISTRY_ADDR, slot).map(decode_u64).unwrap_or(0);
    if length > MAX_REGISTRY_ENTRIES {
        return Err(CorruptRegistry(format!("{what} has {length} entries")));
    }
    Ok(length)
}

fn read_activation(state: &impl StorageReader, base: U256, index: u64) -> u64 {
    let slot = record_slot(base, index, registry_slots::RECORD_ACTIVATION_OFFSET);
    state.read_storage(REGISTRY_ADDR, slot).map(decode_u64).unwrap_or(0)
}

fn read_record(state: &impl StorageReader, base: U256, index: u64) -> RegistryRecord {
    let slot = record_slot(base, index, registry_slots::RECORD_ADDR_OFFSET);
    let addr = state.read_storage(REGISTRY_ADDR, slot).map(decode_address).unwrap_or_default();
    RegistryRecord { addr, activation: read_activation(state, base, index) }
}

/// Read the Registry owner.
pub fn read_owner(state: &impl StorageReader) -> Option<Address> {
    state
        .read_storage(REGISTRY_ADDR, registry_slots::OWNER)
        .map(decode_address)
        .filter(|owner| !owner.is_zero())
}

/// Number of records stored for `contract`.
pub fn records_len(
    state: &impl StorageReader,
    contract: SystemContract,
) -> Result<u64, CorruptRegistry> {
    array_length(state, records_length_slot(contract.name()), contract.name())
}

/// Read every record of `contract`, in activation order.
pub fn read_records(
    state: &impl StorageReader,
    contract: SystemContract,
) -> Result<Vec<RegistryRecord>, CorruptRegistry> {
    let length = records_len(state, contract)?;
    let base = dynamic_array_base_slot(records_length_slot(contract.name()));
    Ok((0..length).map(|i| read_record(state, base, i)).collect())
}

/// The record of `contract` effective at `block`.
///
/// Binary search over the stored activations: reads O(log n) slots. A
/// selected record without an address is corrupt storage.
pub fn find_active_record(
    state: &impl StorageReader,
    contract: SystemContract,
    block: u64,
) -> Result<Option<RegistryRecord>, CorruptRegistry> {
    let length = records_len(state, contract)?;
    let base = dynamic_array_base_slot(records_length_slot(contract.name()));

    let (mut low, mut high) = (0, length);
    while low < high {
        let mid = low + (high - low) / 2;
        if read_activation(state, base, mid) <= block {
            low = mid + 1;
        } else {
            high = mid;
        }
    }

    let Some(index) = low.checked_sub(1) else { return Ok(None) };
    let record = read_record(state, base, index);
    if record.addr.is_zero() {
        return Err(CorruptRegistry(format!("record {index} of {contract} has no address")));
    }
    Ok(Some(record))
}

/// Latest record of `contract`, if any.
pub(crate) fn latest_record(
    state: &impl StorageReader,
    contract: SystemContract,
) -> Result<Option<RegistryRecord>, CorruptRegistry> {
    let length = records_len(state, contract)?;
    let base = dynamic_array_base_slot(records_length_slot(contract.name()));
    Ok(length.checked_sub(1).map(|last| read_record(state, base, last)))
}

/// Read the `names` array. Entries stored with the long-string encoding are
/// skipped: no canonical name is long enough to need it.
pub fn read_names(state: &impl StorageReader) -> Result<Vec<String>, CorruptRegistry> {
    let length = array_length(state, registry_slots::NAMES, "names")?;
    let base = dynamic_array_base_slot(registry_slots::NAMES);

    Ok((0..length)
        .filter_map(|i| {
            let word = state.read_storage(REGISTRY_ADDR, base + U256::from(i))?;
            decode_short_string(word)
        })
        .collect())
}

/// The record effective at `block`: greatest activation not exceeding it.
pub fn active_record(records: &[RegistryRecord], block: u64) -> Option<RegistryRecord> {
    let idx = records.partition_point(|record| record.activation <= block);
    idx.checked_sub(1).map(|i| records[i])
}

/// Write the Registry owner.
pub(crate) fn write_owner(state: &mut impl StateWriter, owner: Address) {
    state.set_storage(REGISTRY_ADDR, registry_slots::OWNER, encode_address(owner));
}

/// Check whether `record` can be appended to `records[contract]` without
/// writing anything.
///
/// Appending the current latest record again is a no-op. Any other record
/// whose activation does not strictly exceed the latest one is rejected.
pub(crate) fn check_append(
    state: &impl StorageReader,
    contract: SystemContract,
    record: RegistryRecord,
) -> Result<AppendOutcome, InstallError> {
    let latest = latest_record(state, contract)?;
    match latest {
        Some(latest) if latest == record => return Ok(AppendOutcome::Unchanged),
        Some(latest) if latest.activation >= record.activation => {
            return Err(InstallError::ConflictingRecord {
                name: contract.name(),
                latest: latest.activation,
                requested: record.activation,
            });
        }
        _ => {}
    }

    if records_len(state, contract)? == MAX_REGISTRY_ENTRIES {
        return Err(CorruptRegistry(format!("no room for another {contract} record")).into());
    }
    // First record also pushes the name.
    if latest.is_none()
        && array_length(state, registry_slots::NAMES, "names")? == MAX_REGISTRY_ENTRIES
    {
        return Err(CorruptRegistry("no room for another name".to_string()).into());
    }
    Ok(AppendOutcome::Appended)
}

/// Append `record` to `records[contract]`, adding the name to `names` on
/// first registration. Same acceptance rules as [`check_append`].
pub(crate) fn append_record(
    state: &mut impl StateWriter,
    contract: SystemContract,
    record: RegistryRecord,
) -> Result<AppendOutcome, InstallError> {
    if check_append(&*state, contract, record)? == AppendOutcome::Unchanged {
        return Ok(AppendOutcome::Unchanged);
    }

    let name = contract.name();
    let index = records_len(&*state, contract)?;
    let length_slot = records_length_slot(name);
    let base = dynamic_array_base_slot(length_slot);
    state.set_storage(
        REGISTRY_ADDR,
        record_slot(base, index, registry_slots::RECORD_ADDR_OFFSET),
        encode_address(record.addr),
    );
    state.set_storage(
        REGISTRY_ADDR,
        record_slot(base, index, registry_slots::RECORD_ACTIVATION_OFFSET),
        encode_u64(record.activation),
    );
    state.set_storage(REGISTRY_ADDR, length_slot, encode_u64(index + 1));

    if index == 0 {
        push_name(state, name)?;
    }
    Ok(AppendOutcome::Appended)
}

fn push_name(state: &mut impl StateWriter, name: &'static str) -> Result<(), CorruptRegistry> {
    let length = array_length(&*state, registry_slots::NAMES, "names")?;
    let base = dynamic_array_base_slot(registry_slots::NAMES);
    // Canonical names are all shorter than 32 bytes.
    if let Some(word) = encode_short_string(name) {
        state.set_storage(REGISTRY_ADDR, base + U256::from(length), word);
        state.set_storage(REGISTRY_ADDR, registry_slots::NAMES, encode_u64(length + 1));
    }
    Ok(())
}
