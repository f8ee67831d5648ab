//! Character states and state alphabets.
//!
//! A state alphabet is an ordered, immutable collection of states split into
//! three denominations: fundamental states (atomic, mutually exclusive, each
//! with a stable index), ambiguous states (uncertain which one of a member
//! set) and polymorphic states (definitely multiple of a member set).
//!
//! The fixed alphabets (DNA, RNA, protein, restriction sites) are
//! process-wide singletons shared read-only by every matrix of that data
//! type; reference equality of their states is `Arc::ptr_eq` on the alphabet
//! plus [`StateId`] equality.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::error::{ModelError, Result};
use crate::matrix::DataType;

/// Handle of a state within its owning [`StateAlphabet`] (arena index).
pub type StateId = usize;

/// Denomination of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    /// Atomic, mutually exclusive state.
    Fundamental,

    /// Uncertainty among the member states.
    Ambiguous,

    /// Simultaneous possession of the member states.
    Polymorphic,
}

/// A single character state.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    /// Symbol representing this state (e.g. "A").
    pub symbol: String,

    /// Denomination of this state.
    pub kind: StateKind,

    /// Stable index among fundamental states, in declaration order.
    /// `None` for multi-states.
    pub index: Option<usize>,

    /// Member states of a multi-state; empty for fundamental states.
    pub member_states: Vec<StateId>,
}

/// An immutable, ordered collection of states with symbol lookup.
///
/// Built through [`StateAlphabetBuilder`]; never mutated afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct StateAlphabet {
    /// Alphabet label.
    pub label: Option<String>,

    states: Vec<State>,
    symbol_index: HashMap<String, StateId>,
}

impl StateAlphabet {
    /// Get a state by handle.
    #[must_use]
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    /// Look up a state handle by its symbol. Symbols must match exactly.
    #[must_use]
    pub fn state_for_symbol(&self, symbol: &str) -> Option<StateId> {
        self.symbol_index.get(symbol).copied()
    }

    /// Symbol of a state, if the handle is valid.
    #[must_use]
    pub fn symbol(&self, id: StateId) -> Option<&str> {
        self.states.get(id).map(|s| s.symbol.as_str())
    }

    /// Number of states (all denominations).
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the alphabet has no states.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterate over `(handle, state)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states.iter().enumerate()
    }

    /// Handles of all fundamental states, in index order.
    #[must_use]
    pub fn fundamental_states(&self) -> Vec<StateId> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind == StateKind::Fundamental)
            .map(|(id, _)| id)
            .collect()
    }
}

/// Staged construction of a [`StateAlphabet`].
///
/// Enforces the alphabet invariants: symbols are unique, fundamental indices
/// are assigned in declaration order, and every multi-state member must
/// already exist at the time the multi-state is defined (no forward
/// references).
#[derive(Debug, Default)]
pub struct StateAlphabetBuilder {
    label: Option<String>,
    states: Vec<State>,
    symbol_index: HashMap<String, StateId>,
    next_fundamental_index: usize,
}

impl StateAlphabetBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(label: Option<String>) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    fn label_for_error(&self) -> String {
        self.label.clone().unwrap_or_else(|| "<unlabeled>".to_string())
    }

    fn check_symbol(&self, symbol: &str) -> Result<()> {
        if self.symbol_index.contains_key(symbol) {
            return Err(ModelError::DuplicateStateSymbol {
                symbol: symbol.to_string(),
                alphabet: self.label_for_error(),
            });
        }
        Ok(())
    }

    /// Add a fundamental state, returning its handle.
    pub fn add_fundamental(&mut self, symbol: impl Into<String>) -> Result<StateId> {
        let symbol = symbol.into();
        self.check_symbol(&symbol)?;
        let id = self.states.len();
        self.symbol_index.insert(symbol.clone(), id);
        self.states.push(State {
            symbol,
            kind: StateKind::Fundamental,
            index: Some(self.next_fundamental_index),
            member_states: Vec::new(),
        });
        self.next_fundamental_index += 1;
        Ok(id)
    }

    /// Add an ambiguous state over the given members, returning its handle.
    pub fn add_ambiguous(
        &mut self,
        symbol: impl Into<String>,
        members: &[StateId],
    ) -> Result<StateId> {
        self.add_multistate(symbol.into(), StateKind::Ambiguous, members)
    }

    /// Add a polymorphic state over the given members, returning its handle.
    pub fn add_polymorphic(
        &mut self,
        symbol: impl Into<String>,
        members: &[StateId],
    ) -> Result<StateId> {
        self.add_multistate(symbol.into(), StateKind::Polymorphic, members)
    }

    fn add_multistate(
        &mut self,
        symbol: String,
        kind: StateKind,
        members: &[StateId],
    ) -> Result<StateId> {
        self.check_symbol(&symbol)?;
        if members.is_empty() {
            return Err(ModelError::EmptyMemberSet {
                symbol,
                alphabet: self.label_for_error(),
            });
        }
        for &member in members {
            if member >= self.states.len() {
                return Err(ModelError::UnknownMemberState {
                    handle: member,
                    alphabet: self.label_for_error(),
                });
            }
        }
        let id = self.states.len();
        self.symbol_index.insert(symbol.clone(), id);
        self.states.push(State {
            symbol,
            kind,
            index: None,
            member_states: members.to_vec(),
        });
        Ok(id)
    }

    /// Look up an already-added state by symbol.
    #[must_use]
    pub fn state_for_symbol(&self, symbol: &str) -> Option<StateId> {
        self.symbol_index.get(symbol).copied()
    }

    /// Handles of all states added so far.
    #[must_use]
    pub fn all_states(&self) -> Vec<StateId> {
        (0..self.states.len()).collect()
    }

    /// Freeze the builder into an immutable alphabet.
    #[must_use]
    pub fn build(self) -> StateAlphabet {
        StateAlphabet {
            label: self.label,
            states: self.states,
            symbol_index: self.symbol_index,
        }
    }
}

/// Build an IUPAC nucleotide alphabet with the given thymine/uracil symbol.
fn build_nucleotide(label: &str, t: &str) -> Result<StateAlphabet> {
    let mut b = StateAlphabetBuilder::new(Some(label.to_string()));
    let a = b.add_fundamental("A")?;
    let c = b.add_fundamental("C")?;
    let g = b.add_fundamental("G")?;
    let tu = b.add_fundamental(t)?;
    let gap = b.add_fundamental("-")?;
    b.add_ambiguous("?", &[a, c, g, tu, gap])?;
    b.add_ambiguous("N", &[a, c, g, tu])?;
    b.add_ambiguous("X", &[a, c, g, tu])?;
    b.add_ambiguous("R", &[a, g])?;
    b.add_ambiguous("Y", &[c, tu])?;
    b.add_ambiguous("M", &[a, c])?;
    b.add_ambiguous("W", &[a, tu])?;
    b.add_ambiguous("S", &[c, g])?;
    b.add_ambiguous("K", &[g, tu])?;
    b.add_ambiguous("V", &[a, c, g])?;
    b.add_ambiguous("H", &[a, c, tu])?;
    b.add_ambiguous("D", &[a, g, tu])?;
    b.add_ambiguous("B", &[c, g, tu])?;
    Ok(b.build())
}

/// Build the 20-amino-acid protein alphabet.
fn build_protein() -> Result<StateAlphabet> {
    let mut b = StateAlphabetBuilder::new(Some("protein".to_string()));
    let mut residues = HashMap::new();
    for symbol in [
        "A", "C", "D", "E", "F", "G", "H", "I", "K", "L", "M", "N", "P", "Q", "R", "S", "T", "V",
        "W", "Y",
    ] {
        residues.insert(symbol, b.add_fundamental(symbol)?);
    }
    let gap = b.add_fundamental("-")?;
    let all: Vec<StateId> = residues.values().copied().collect();
    b.add_ambiguous("B", &[residues["D"], residues["N"]])?;
    b.add_ambiguous("Z", &[residues["E"], residues["Q"]])?;
    b.add_ambiguous("X", &all)?;
    let mut with_gap = all;
    with_gap.push(gap);
    b.add_ambiguous("?", &with_gap)?;
    Ok(b.build())
}

/// Build the restriction-site alphabet (presence/absence).
fn build_restriction() -> Result<StateAlphabet> {
    let mut b = StateAlphabetBuilder::new(Some("restriction".to_string()));
    b.add_fundamental("0")?;
    b.add_fundamental("1")?;
    Ok(b.build())
}

/// Build the default "standard" alphabet used when a standard-data block
/// declares no states of its own: digits 0-9, a gap and a full ambiguity.
fn build_default_standard() -> Result<StateAlphabet> {
    let mut b = StateAlphabetBuilder::new(Some("standard".to_string()));
    let mut all = Vec::new();
    for digit in 0..10u8 {
        all.push(b.add_fundamental(digit.to_string())?);
    }
    all.push(b.add_fundamental("-")?);
    b.add_ambiguous("?", &all)?;
    Ok(b.build())
}

#[allow(clippy::expect_used)] // Static alphabet that is guaranteed to be valid
static DNA: LazyLock<Arc<StateAlphabet>> =
    LazyLock::new(|| Arc::new(build_nucleotide("dna", "T").expect("valid alphabet")));

#[allow(clippy::expect_used)] // Static alphabet that is guaranteed to be valid
static RNA: LazyLock<Arc<StateAlphabet>> =
    LazyLock::new(|| Arc::new(build_nucleotide("rna", "U").expect("valid alphabet")));

#[allow(clippy::expect_used)] // Static alphabet that is guaranteed to be valid
static PROTEIN: LazyLock<Arc<StateAlphabet>> =
    LazyLock::new(|| Arc::new(build_protein().expect("valid alphabet")));

#[allow(clippy::expect_used)] // Static alphabet that is guaranteed to be valid
static RESTRICTION: LazyLock<Arc<StateAlphabet>> =
    LazyLock::new(|| Arc::new(build_restriction().expect("valid alphabet")));

#[allow(clippy::expect_used)] // Static alphabet that is guaranteed to be valid
static DEFAULT_STANDARD: LazyLock<Arc<StateAlphabet>> =
    LazyLock::new(|| Arc::new(build_default_standard().expect("valid alphabet")));

/// The process-wide DNA alphabet.
#[must_use]
pub fn dna() -> &'static Arc<StateAlphabet> {
    &DNA
}

/// The process-wide RNA alphabet.
#[must_use]
pub fn rna() -> &'static Arc<StateAlphabet> {
    &RNA
}

/// The process-wide protein alphabet.
#[must_use]
pub fn protein() -> &'static Arc<StateAlphabet> {
    &PROTEIN
}

/// The process-wide restriction-site alphabet.
#[must_use]
pub fn restriction() -> &'static Arc<StateAlphabet> {
    &RESTRICTION
}

/// The default alphabet for standard data blocks that declare no states.
#[must_use]
pub fn default_standard() -> &'static Arc<StateAlphabet> {
    &DEFAULT_STANDARD
}

/// The fixed singleton alphabet for a data type.
///
/// Returns `None` for data types without a fixed alphabet ("standard" gets a
/// fresh alphabet per character block; "continuous" has none).
#[must_use]
pub fn fixed_alphabet(data_type: DataType) -> Option<&'static Arc<StateAlphabet>> {
    match data_type {
        DataType::Dna => Some(dna()),
        DataType::Rna => Some(rna()),
        DataType::Protein => Some(protein()),
        DataType::Restriction => Some(restriction()),
        DataType::Standard | DataType::Continuous => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fundamental_indices_in_declaration_order() {
        let alphabet = dna();
        let a = alphabet.state_for_symbol("A").unwrap();
        let t = alphabet.state_for_symbol("T").unwrap();
        assert_eq!(alphabet.state(a).unwrap().index, Some(0));
        assert_eq!(alphabet.state(t).unwrap().index, Some(3));
    }

    #[test]
    fn test_fixed_alphabets_are_singletons() {
        assert!(Arc::ptr_eq(dna(), dna()));
        assert!(Arc::ptr_eq(
            fixed_alphabet(DataType::Rna).unwrap(),
            rna()
        ));
        assert!(fixed_alphabet(DataType::Standard).is_none());
        assert!(fixed_alphabet(DataType::Continuous).is_none());
    }

    #[test]
    fn test_ambiguity_members() {
        let alphabet = dna();
        let r = alphabet.state_for_symbol("R").unwrap();
        let state = alphabet.state(r).unwrap();
        assert_eq!(state.kind, StateKind::Ambiguous);
        let symbols: Vec<_> = state
            .member_states
            .iter()
            .map(|&m| alphabet.symbol(m).unwrap())
            .collect();
        assert_eq!(symbols, vec!["A", "G"]);
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let mut b = StateAlphabetBuilder::new(Some("test".to_string()));
        b.add_fundamental("0").unwrap();
        let err = b.add_fundamental("0").unwrap_err();
        assert!(err.to_string().contains("Duplicate state symbol"));
    }

    #[test]
    fn test_forward_member_reference_rejected() {
        let mut b = StateAlphabetBuilder::new(None);
        let zero = b.add_fundamental("0").unwrap();
        let err = b.add_ambiguous("?", &[zero, 99]).unwrap_err();
        assert!(matches!(err, ModelError::UnknownMemberState { handle: 99, .. }));
    }

    #[test]
    fn test_multistate_over_multistate() {
        // Polymorphic states may include previously defined multi-states.
        let mut b = StateAlphabetBuilder::new(None);
        let zero = b.add_fundamental("0").unwrap();
        let one = b.add_fundamental("1").unwrap();
        let unc = b.add_ambiguous("?", &[zero, one]).unwrap();
        let poly = b.add_polymorphic("P", &[zero, unc]).unwrap();
        let alphabet = b.build();
        assert_eq!(alphabet.state(poly).unwrap().kind, StateKind::Polymorphic);
    }

    #[test]
    fn test_protein_alphabet() {
        let alphabet = protein();
        assert_eq!(alphabet.fundamental_states().len(), 21);
        let x = alphabet.state_for_symbol("X").unwrap();
        assert_eq!(alphabet.state(x).unwrap().member_states.len(), 20);
    }

    #[test]
    fn test_symbol_lookup_is_exact() {
        assert!(dna().state_for_symbol("a").is_none());
        assert!(dna().state_for_symbol("A").is_some());
    }
}
