//! Character-block builder.
//!
//! Parses `characters` blocks into character matrices. Three symbol spaces
//! intersect here and must all resolve: state ids against their alphabet,
//! column ids against the format declarations, and row taxa against the
//! owning taxon namespace. Fixed data types (DNA, RNA, protein, restriction
//! sites) bind to the process-wide singleton alphabets: document-declared
//! states for those types resolve into the singleton by symbol, so every
//! cell of a fixed-type matrix carries the singleton alphabet by
//! construction and never a document-local copy.

use std::collections::HashMap;
use std::sync::Arc;

use roxmltree::Node;
use tracing::debug;

use phylodata_model::{
    state, Cell, CellValue, CharacterMatrix, CharacterSequence, CharacterType, CharacterTypeId,
    DataSet, DataType, MatrixRow, StateAlphabet, StateAlphabetBuilder, StateId,
};

use crate::annotations::{annotate, parse_meta};
use crate::config::ReaderConfig;
use crate::error::{NexmlError, Result};
use crate::registry::DocumentRegistries;
use crate::xml::{declared_type, find_child, find_children, get_attribute, get_text, require_attribute};

/// How a block encodes its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    /// Packed symbol sequence in a `seq` element.
    Seq,

    /// Explicit list of column-indexed `cell` elements.
    Cell,
}

/// Map a declared block type ("DnaSeqs", "StandardCells", ...) to its data
/// type and row encoding.
fn parse_declared_type(declared: &str, context: &str) -> Result<(DataType, Encoding)> {
    let (stem, encoding) = if let Some(stem) = declared.strip_suffix("Seqs") {
        (stem, Encoding::Seq)
    } else if let Some(stem) = declared.strip_suffix("Cells") {
        (stem, Encoding::Cell)
    } else {
        return Err(NexmlError::UnsupportedType {
            declared: declared.to_string(),
            context: context.to_string(),
        });
    };

    let data_type = match stem {
        "Dna" => DataType::Dna,
        "Rna" => DataType::Rna,
        "Protein" | "AA" => DataType::Protein,
        "Restriction" => DataType::Restriction,
        "Standard" => DataType::Standard,
        "Continuous" => DataType::Continuous,
        _ => {
            return Err(NexmlError::UnsupportedType {
                declared: declared.to_string(),
                context: context.to_string(),
            });
        }
    };
    Ok((data_type, encoding))
}

/// Format declarations of one block: alphabets, state-id maps, and columns.
#[derive(Default)]
struct FormatContext {
    /// Alphabets in declaration order. For fixed data types this holds the
    /// singleton only.
    alphabets: Vec<Arc<StateAlphabet>>,

    /// States-block xml id → index into `alphabets`.
    alphabet_by_id: HashMap<String, usize>,

    /// `(states block id, state xml id)` → state handle in that alphabet.
    state_ids: HashMap<(String, String), StateId>,

    /// Column xml id → column position.
    columns: HashMap<String, CharacterTypeId>,

    /// Per column, the states-block id its alphabet came from.
    column_states_block: Vec<Option<String>>,

    /// Column descriptors in declaration order.
    character_types: Vec<CharacterType>,
}

impl FormatContext {
    /// The alphabet a column without an explicit reference falls back to.
    fn default_alphabet(
        &self,
        data_type: DataType,
        context: &str,
    ) -> Result<Option<Arc<StateAlphabet>>> {
        if !data_type.has_states() {
            return Ok(None);
        }
        if let Some(fixed) = state::fixed_alphabet(data_type) {
            return Ok(Some(Arc::clone(fixed)));
        }
        match self.alphabets.len() {
            0 => Ok(Some(Arc::clone(state::default_standard()))),
            1 => Ok(Some(Arc::clone(&self.alphabets[0]))),
            _ => Err(NexmlError::NoDefaultAlphabet {
                context: context.to_string(),
            }),
        }
    }
}

/// Parse every `characters` block of a document.
pub fn parse_char_matrices(
    root: Node<'_, '_>,
    dataset: &mut DataSet,
    registries: &DocumentRegistries,
    config: &ReaderConfig,
) -> Result<()> {
    let ns = config.namespace();
    for block in find_children(root, "characters", ns) {
        let matrix = parse_block(block, registries, config)?;
        dataset.char_matrices.push(matrix);
    }
    Ok(())
}

/// Parse one `characters` block into a matrix.
fn parse_block(
    block: Node<'_, '_>,
    registries: &DocumentRegistries,
    config: &ReaderConfig,
) -> Result<CharacterMatrix> {
    let ns = config.namespace();
    let block_id = require_attribute(block, "id", "characters block")?;
    let context = format!("characters block '{block_id}'");
    let label = get_attribute(block, "label").map(str::to_string);

    let otus_id = require_attribute(block, "otus", &context)?;
    let namespace_index = *registries.taxon_namespaces.get(otus_id).ok_or_else(|| {
        NexmlError::UnresolvedReference {
            kind: "taxon namespace",
            id: otus_id.to_string(),
            context: context.clone(),
        }
    })?;

    let declared = declared_type(block, &context)?;
    let (data_type, encoding) = parse_declared_type(declared, &context)?;

    let mut format = FormatContext::default();
    if let Some(fixed) = state::fixed_alphabet(data_type) {
        format.alphabets.push(Arc::clone(fixed));
    }
    if let Some(format_el) = find_child(block, "format", ns) {
        parse_format(format_el, data_type, &mut format, registries, config, &context)?;
    }

    let mut matrix = CharacterMatrix::new(data_type, namespace_index, label);
    annotate(&mut matrix, block, &registries.namespaces, ns)?;
    matrix.state_alphabets = format.alphabets.clone();
    matrix.character_types = format.character_types.clone();

    if let Some(matrix_el) = find_child(block, "matrix", ns) {
        for row_el in find_children(matrix_el, "row", ns) {
            let row = parse_row(
                row_el,
                data_type,
                encoding,
                &format,
                otus_id,
                block_id,
                registries,
                config,
            )?;
            matrix.push_row(row);
        }
    }

    debug!(
        block = block_id,
        data_type = data_type.as_str(),
        rows = matrix.len(),
        "parsed character matrix"
    );
    Ok(matrix)
}

/// Parse a `format` element: states blocks first, then column declarations.
fn parse_format(
    format_el: Node<'_, '_>,
    data_type: DataType,
    format: &mut FormatContext,
    registries: &DocumentRegistries,
    config: &ReaderConfig,
    context: &str,
) -> Result<()> {
    let ns = config.namespace();

    for states_el in find_children(format_el, "states", ns) {
        parse_states_block(states_el, data_type, format, config, context)?;
    }

    for char_el in find_children(format_el, "char", ns) {
        let char_id = require_attribute(char_el, "id", context)?;
        let label = get_attribute(char_el, "label").map(str::to_string);

        let (alphabet, states_block) = match get_attribute(char_el, "states") {
            Some(states_id) => {
                let index = *format.alphabet_by_id.get(states_id).ok_or_else(|| {
                    NexmlError::UnresolvedReference {
                        kind: "state alphabet",
                        id: states_id.to_string(),
                        context: format!("column '{char_id}' of {context}"),
                    }
                })?;
                (
                    Some(Arc::clone(&format.alphabets[index])),
                    Some(states_id.to_string()),
                )
            }
            None => (
                format.default_alphabet(data_type, &format!("column '{char_id}' of {context}"))?,
                None,
            ),
        };

        let column = format.character_types.len();
        if format.columns.insert(char_id.to_string(), column).is_some() {
            return Err(NexmlError::DuplicateId {
                id: char_id.to_string(),
                context: context.to_string(),
            });
        }
        let mut character_type = CharacterType::new(label, alphabet);
        annotate(&mut character_type, char_el, &registries.namespaces, ns)?;
        format.character_types.push(character_type);
        format.column_states_block.push(states_block);
    }

    Ok(())
}

/// Parse one `states` block.
///
/// For fixed data types every listed state must map by symbol into the
/// singleton alphabet; the document cannot invent new states. For standard
/// data a fresh alphabet is built, fundamentals first, multi-states only
/// over already-defined states.
fn parse_states_block(
    states_el: Node<'_, '_>,
    data_type: DataType,
    format: &mut FormatContext,
    config: &ReaderConfig,
    context: &str,
) -> Result<()> {
    let ns = config.namespace();
    let states_id = require_attribute(states_el, "id", context)?;
    let states_context = format!("states block '{states_id}' of {context}");

    if let Some(fixed) = state::fixed_alphabet(data_type) {
        // Bind to the singleton: resolve each declared state by symbol.
        for state_el in states_el.children().filter(|c| c.is_element()) {
            let state_id = require_attribute(state_el, "id", &states_context)?;
            let symbol = require_attribute(state_el, "symbol", &states_context)?;
            let handle = fixed.state_for_symbol(symbol).ok_or_else(|| {
                NexmlError::UnknownStateSymbol {
                    symbol: symbol.to_string(),
                    context: states_context.clone(),
                }
            })?;
            format
                .state_ids
                .insert((states_id.to_string(), state_id.to_string()), handle);
        }
        format.alphabet_by_id.insert(states_id.to_string(), 0);
        return Ok(());
    }

    // Document-defined alphabet: fundamental states first, then multi-states
    // in terms of already-known states.
    let mut builder =
        StateAlphabetBuilder::new(get_attribute(states_el, "label").map(str::to_string));
    let mut local_ids: HashMap<String, StateId> = HashMap::new();

    for state_el in states_el.children().filter(|c| c.is_element()) {
        let tag = state_el.tag_name().name();
        let state_id = require_attribute(state_el, "id", &states_context)?;
        let symbol = require_attribute(state_el, "symbol", &states_context)?;

        let handle = match tag {
            "state" => builder.add_fundamental(symbol)?,
            "uncertain_state_set" | "polymorphic_state_set" => {
                let mut members = Vec::new();
                for member in find_children(state_el, "member", ns) {
                    let member_id = require_attribute(member, "state", &states_context)?;
                    let member_handle = *local_ids.get(member_id).ok_or_else(|| {
                        NexmlError::UnresolvedReference {
                            kind: "member state",
                            id: member_id.to_string(),
                            context: states_context.clone(),
                        }
                    })?;
                    members.push(member_handle);
                }
                if tag == "uncertain_state_set" {
                    builder.add_ambiguous(symbol, &members)?
                } else {
                    builder.add_polymorphic(symbol, &members)?
                }
            }
            other => {
                return Err(NexmlError::UnsupportedType {
                    declared: other.to_string(),
                    context: states_context.clone(),
                });
            }
        };

        if local_ids.insert(state_id.to_string(), handle).is_some() {
            return Err(NexmlError::DuplicateId {
                id: state_id.to_string(),
                context: states_context.clone(),
            });
        }
    }

    let alphabet = Arc::new(builder.build());
    let index = format.alphabets.len();
    format.alphabets.push(alphabet);
    format.alphabet_by_id.insert(states_id.to_string(), index);
    for (state_xml_id, handle) in local_ids {
        format
            .state_ids
            .insert((states_id.to_string(), state_xml_id), handle);
    }
    Ok(())
}

/// Parse one `row` element into a matrix row.
#[allow(clippy::too_many_arguments)]
fn parse_row(
    row_el: Node<'_, '_>,
    data_type: DataType,
    encoding: Encoding,
    format: &FormatContext,
    otus_id: &str,
    block_id: &str,
    registries: &DocumentRegistries,
    config: &ReaderConfig,
) -> Result<MatrixRow> {
    let ns = config.namespace();
    let row_id = require_attribute(row_el, "id", &format!("row of characters block '{block_id}'"))?;
    let label = get_attribute(row_el, "label").map(str::to_string);
    let row_context = format!(
        "row '{}' of characters block '{block_id}'",
        label.as_deref().unwrap_or(row_id)
    );

    let otu_id = require_attribute(row_el, "otu", &row_context)?;
    let taxon = *registries.taxa.resolve(otus_id, otu_id).ok_or_else(|| {
        NexmlError::UnresolvedReference {
            kind: "taxon",
            id: otu_id.to_string(),
            context: row_context.clone(),
        }
    })?;

    let sequence = match encoding {
        Encoding::Seq => parse_seq_row(row_el, data_type, format, &row_context, config)?,
        Encoding::Cell => parse_cell_row(row_el, data_type, format, &row_context, registries, config)?,
    };

    let mut row = MatrixRow {
        taxon,
        label,
        sequence,
        annotations: Vec::new(),
    };
    row.annotations = parse_meta(row_el, &registries.namespaces, ns)?;
    Ok(row)
}

/// Parse a packed `seq` row.
fn parse_seq_row(
    row_el: Node<'_, '_>,
    data_type: DataType,
    format: &FormatContext,
    row_context: &str,
    config: &ReaderConfig,
) -> Result<CharacterSequence> {
    let ns = config.namespace();
    let mut sequence = CharacterSequence::new();
    let Some(seq_el) = find_child(row_el, "seq", ns) else {
        return Ok(sequence);
    };
    let text = get_text(seq_el);

    if data_type == DataType::Continuous {
        for token in text.split_whitespace() {
            let value = token
                .parse::<f64>()
                .map_err(|_| NexmlError::InvalidValue {
                    value: token.to_string(),
                    expected: "real number",
                    context: row_context.to_string(),
                })?;
            sequence.push(Cell::new(CellValue::Continuous(value)));
        }
        return Ok(sequence);
    }

    // Standard symbols are whitespace-delimited tokens (they may be
    // multi-character); fixed-alphabet symbols are packed single characters.
    let symbols: Vec<String> = if data_type == DataType::Standard {
        text.split_whitespace().map(str::to_string).collect()
    } else {
        text.chars()
            .filter(|c| !c.is_whitespace())
            .map(String::from)
            .collect()
    };

    for (position, symbol) in symbols.iter().enumerate() {
        let alphabet = alphabet_for_column(format, data_type, position, row_context)?;
        let state = alphabet.state_for_symbol(symbol).ok_or_else(|| {
            NexmlError::UnknownStateSymbol {
                symbol: symbol.clone(),
                context: format!("{row_context}, column {position}"),
            }
        })?;
        sequence.push(Cell::new(CellValue::State { alphabet, state }));
    }
    Ok(sequence)
}

/// The alphabet governing a column position in sequence form.
fn alphabet_for_column(
    format: &FormatContext,
    data_type: DataType,
    position: usize,
    context: &str,
) -> Result<Arc<StateAlphabet>> {
    if let Some(character_type) = format.character_types.get(position) {
        if let Some(alphabet) = &character_type.alphabet {
            return Ok(Arc::clone(alphabet));
        }
    }
    format
        .default_alphabet(data_type, context)?
        .ok_or_else(|| NexmlError::NoDefaultAlphabet {
            context: context.to_string(),
        })
}

/// Parse an explicit `cell` row. Cells name their column and state by id and
/// may arrive in any order; they are placed at the column's position.
fn parse_cell_row(
    row_el: Node<'_, '_>,
    data_type: DataType,
    format: &FormatContext,
    row_context: &str,
    registries: &DocumentRegistries,
    config: &ReaderConfig,
) -> Result<CharacterSequence> {
    let ns = config.namespace();
    let mut sequence = CharacterSequence::new();

    for cell_el in find_children(row_el, "cell", ns) {
        let char_id = require_attribute(cell_el, "char", row_context)?;
        let column = *format.columns.get(char_id).ok_or_else(|| {
            NexmlError::UnresolvedReference {
                kind: "character",
                id: char_id.to_string(),
                context: row_context.to_string(),
            }
        })?;
        let state_attr = require_attribute(cell_el, "state", row_context)?;

        let value = if data_type == DataType::Continuous {
            let value = state_attr
                .parse::<f64>()
                .map_err(|_| NexmlError::InvalidValue {
                    value: state_attr.to_string(),
                    expected: "real number",
                    context: row_context.to_string(),
                })?;
            CellValue::Continuous(value)
        } else {
            let character_type = &format.character_types[column];
            let alphabet = character_type.alphabet.as_ref().ok_or_else(|| {
                NexmlError::NoDefaultAlphabet {
                    context: format!("column '{char_id}' of {row_context}"),
                }
            })?;
            let states_block = format.column_states_block[column].as_deref();
            let state = resolve_cell_state(format, states_block, state_attr, alphabet)
                .ok_or_else(|| NexmlError::UnresolvedReference {
                    kind: "state",
                    id: state_attr.to_string(),
                    context: format!("column '{char_id}' of {row_context}"),
                })?;
            CellValue::State {
                alphabet: Arc::clone(alphabet),
                state,
            }
        };

        let mut cell = Cell::new(value);
        cell.annotations = parse_meta(cell_el, &registries.namespaces, ns)?;
        sequence.place(column, cell);
    }
    Ok(sequence)
}

/// Resolve a cell's state reference against its column's alphabet: by the
/// declared state id when the column has a states block, by symbol as a
/// fallback for fixed alphabets.
fn resolve_cell_state(
    format: &FormatContext,
    states_block: Option<&str>,
    state_attr: &str,
    alphabet: &Arc<StateAlphabet>,
) -> Option<StateId> {
    if let Some(block) = states_block {
        if let Some(handle) = format
            .state_ids
            .get(&(block.to_string(), state_attr.to_string()))
        {
            return Some(*handle);
        }
        return None;
    }
    alphabet.state_for_symbol(state_attr)
}
