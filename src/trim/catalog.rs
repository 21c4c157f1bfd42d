use crate::utils::get_hasher;
use foldhash::fast::RandomState;
use log::debug;
use std::collections::HashMap;

/// The adapters an operator chose to act on, keyed by identifier, with the
/// length of each adapter's reference sequence.
///
/// The catalog is built once from the `identifier:length` tokens given on the
/// command line and is read-only afterwards.
#[derive(Debug, Clone)]
pub struct AdapterCatalog {
    lengths: HashMap<String, usize, RandomState>,
}

impl AdapterCatalog {
    /// Builds a catalog from any number of adapter lists, each holding
    /// whitespace-separated `identifier:length` tokens.
    ///
    /// Tokens that do not parse (no colon, a non-numeric or zero length) are
    /// skipped. Hits against such an adapter will therefore never match the
    /// catalog and are ignored downstream.
    pub fn from_specs<I, S>(specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>, {
        let mut lengths = HashMap::with_hasher(get_hasher());

        for spec in specs {
            for token in spec.as_ref().split_whitespace() {
                match parse_adapter_token(token) {
                    Some((id, length)) => {
                        lengths.insert(id.to_string(), length);
                    }
                    None => debug!("Skipping unparsable adapter token '{token}'"),
                }
            }
        }

        Self { lengths }
    }

    /// The reference length of adapter `id`, if it is cataloged.
    #[inline]
    pub fn length(&self, id: &str) -> Option<usize> {
        self.lengths.get(id).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

/// Splits `identifier:length` into its parts. The length must be a positive
/// integer.
fn parse_adapter_token(token: &str) -> Option<(&str, usize)> {
    let (id, length) = token.split_once(':')?;
    let length = length.parse::<usize>().ok().filter(|&l| l > 0)?;
    if id.is_empty() { None } else { Some((id, length)) }
}
