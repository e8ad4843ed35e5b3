/// Registry contract storage layout.
///
/// `contract Registry is Ownable` with
/// `mapping(string => Record[]) records` and `string[] names`, where
/// `struct Record { address addr; uint256 activation; }`.
pub mod registry_slots {
    use alloy_primitives::U256;

    /// slot 0: owner (address, from Ownable)
    pub const OWNER: U256 = U256::from_limbs([0, 0, 0, 0]);
    /// slot 1: records mapping base (mapping(string => Record[]))
    pub const RECORDS: U256 = U256::from_limbs([1, 0, 0, 0]);
    /// slot 2: names.length (dynamic array length)
    pub const NAMES: U256 = U256::from_limbs([2, 0, 0, 0]);

    /// Slots occupied by one `Record` in the records array
    pub const RECORD_SIZE: u64 = 2;
    /// Offset of `Record.addr` within a record
    pub const RECORD_ADDR_OFFSET: u64 = 0;
    /// Offset of `Record.activation` within a record
    pub const RECORD_ACTIVATION_OFFSET: u64 = 1;
}

/// EIP-1967 proxy storage slots as `U256` storage keys.
pub mod eip1967_slots {
    use alloy_primitives::U256;

    /// Implementation address slot (`catalog::IMPLEMENTATION_SLOT`)
    pub const IMPLEMENTATION: U256 = U256::from_limbs([
        0x20a3ca505d382bbc,
        0xca3e2076cc3735a9,
        0x0667c828492db98d,
        0x360894a13ba1a321,
    ]);
    /// Admin address slot (`catalog::ADMIN_SLOT`)
    pub const ADMIN: U256 = U256::from_limbs([
        0xd6a717850b5d6103,
        0x243e63b6e8ee1178,
        0x73ae13b9f8a6016e,
        0xb53127684a568b31,
    ]);
}
