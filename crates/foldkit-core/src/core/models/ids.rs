use slotmap::new_key_type;

// Stable handles into the slot maps owned by a `Structure`.
new_key_type! {
    pub struct AtomId;
    pub struct ResidueId;
    pub struct ChainId;
}
