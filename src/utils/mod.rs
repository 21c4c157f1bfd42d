use foldhash::fast::RandomState;

/// The hasher shared by every name-keyed map in the crate.
///
/// Map iteration order never reaches the output: transcripts are written in
/// input order and counters are order independent.
#[inline]
pub fn get_hasher() -> RandomState {
    RandomState::default()
}
