use alloy_primitives::{Address, Keccak256, B256, U256};

/// Compute the base slot for a Solidity dynamic array's data.
///
/// For `string[] names` at slot 2:
///   base = keccak256(abi.encode(2))
///   names[0] lives at base + 0
///   names[1] lives at base + 1
///   etc.
pub fn dynamic_array_base_slot(array_slot: U256) -> U256 {
    let mut hasher = Keccak256::new();
    hasher.update(B256::from(array_slot.to_be_bytes()).as_slice());
    U256::from_be_bytes(hasher.finalize().0)
}

/// Compute the storage slot for a Solidity `mapping(string => T)` entry.
///
/// String keys are hashed unpadded:
///   slot = keccak256(bytes(key) . abi.encode(mapping_slot))
pub fn mapping_string_slot(key: &str, mapping_slot: U256) -> U256 {
    let mut hasher = Keccak256::new();
    hasher.update(key.as_bytes());
    hasher.update(B256::from(mapping_slot.to_be_bytes()).as_slice());
    U256::from_be_bytes(hasher.finalize().0)
}

/// Decode an address from a B256 storage value (left-padded with zeros).
pub fn decode_address(value: B256) -> Address {
    Address::from_slice(&value[12..32])
}

/// Decode a u64 from a B256 storage value, saturating values that do not fit.
pub fn decode_u64(value: B256) -> u64 {
    U256::from_be_bytes(value.0).saturating_to()
}

/// Encode a u64 value into a B256 storage value.
pub fn encode_u64(value: u64) -> B256 {
    B256::from(U256::from(value).to_be_bytes())
}

/// Encode an address into a B256 storage value (left-padded).
pub fn encode_address(addr: Address) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[12..32].copy_from_slice(addr.as_slice());
    B256::from(bytes)
}

/// Encode a string shorter than 32 bytes the way Solidity stores it in place:
/// data left-aligned, `len * 2` in the last byte.
///
/// Returns `None` for strings that need the long (out-of-place) encoding.
pub fn encode_short_string(value: &str) -> Option<B256> {
    let data = value.as_bytes();
    if data.len() >= 32 {
        return None;
    }
    let mut word = [0u8; 32];
    word[..data.len()].copy_from_slice(data);
    word[31] = (data.len() * 2) as u8;
    Some(B256::from(word))
}

/// Decode an in-place Solidity short string.
///
/// Returns `None` when the word holds a long-string marker (odd last byte) or
/// the data is not UTF-8.
pub fn decode_short_string(word: B256) -> Option<String> {
    let marker = word[31];
    if marker & 1 == 1 {
        return None;
    }
    let len = usize::from(marker / 2);
    if len >= 32 {
        return None;
    }
    String::from_utf8(word[..len].to_vec()).ok()
}
