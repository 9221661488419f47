use super::error::FormatError;
use super::format::Dialect;
use super::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::builder::StructureBuilder;
use crate::core::models::residue::ResidueKind;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::BufRead;

const ATOM_SITE_PREFIX: &str = "_atom_site.";

/// Reader for the token-table (mmCIF) format.
///
/// Only the `_atom_site.` loop is interpreted. Author-assigned identifiers
/// (`auth_*`) take precedence over label identifiers so that chain ids and
/// residue numbers match what the legacy format would carry.
pub struct MmcifFile;

/// Column positions of the `_atom_site.` fields used to build a structure.
struct AtomSiteColumns {
    group: Option<usize>,
    serial: usize,
    atom_name: usize,
    res_name: usize,
    chain: usize,
    res_seq: usize,
    insertion_code: Option<usize>,
    x: usize,
    y: usize,
    z: usize,
    occupancy: Option<usize>,
    b_factor: Option<usize>,
    element: Option<usize>,
    model: Option<usize>,
}

impl AtomSiteColumns {
    fn resolve(fields: &[String], line: usize) -> Result<Self, FormatError> {
        let index: HashMap<&str, usize> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.as_str(), i))
            .collect();

        let any = |names: &[&str]| names.iter().find_map(|n| index.get(n).copied());
        let require = |names: &[&str]| {
            any(names).ok_or_else(|| {
                FormatError::parse(
                    Dialect::Mmcif,
                    line,
                    format!("Missing required column _atom_site.{}", names[0]),
                )
            })
        };

        Ok(Self {
            group: any(&["group_PDB"]),
            serial: require(&["id"])?,
            atom_name: require(&["auth_atom_id", "label_atom_id"])?,
            res_name: require(&["auth_comp_id", "label_comp_id"])?,
            chain: require(&["auth_asym_id", "label_asym_id"])?,
            res_seq: require(&["auth_seq_id", "label_seq_id"])?,
            insertion_code: any(&["pdbx_PDB_ins_code"]),
            x: require(&["Cartn_x"])?,
            y: require(&["Cartn_y"])?,
            z: require(&["Cartn_z"])?,
            occupancy: any(&["occupancy"]),
            b_factor: any(&["B_iso_or_equiv"]),
            element: any(&["type_symbol"]),
            model: any(&["pdbx_PDB_model_num"]),
        })
    }
}

/// Splits a data line into tokens, honouring single and double quotes.
///
/// A quote only closes a token when followed by whitespace or end of line,
/// so names such as `O5'` survive inside unquoted tokens.
fn tokenize(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let len = chars.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < len {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        if chars[i] == '\'' || chars[i] == '"' {
            let quote = chars[i];
            let start = i + 1;
            let mut j = start;
            while j < len && !(chars[j] == quote && (j + 1 == len || chars[j + 1].is_whitespace())) {
                j += 1;
            }
            tokens.push(chars[start..j.min(len)].iter().collect());
            i = j + 1;
            continue;
        }

        let start = i;
        while i < len && !chars[i].is_whitespace() {
            i += 1;
        }
        tokens.push(chars[start..i].iter().collect());
    }

    tokens
}

fn value(token: &str) -> Option<&str> {
    match token {
        "?" | "." => None,
        other => Some(other),
    }
}

fn parse_number<T: std::str::FromStr>(
    row: &[String],
    column: usize,
    line: usize,
    what: &str,
) -> Result<T, FormatError> {
    let raw = row.get(column).map(String::as_str).unwrap_or("?");
    value(raw)
        .and_then(|v| v.parse::<T>().ok())
        .ok_or_else(|| FormatError::parse(Dialect::Mmcif, line, format!("Invalid {} '{}'", what, raw)))
}

fn optional<'a>(row: &'a [String], column: Option<usize>) -> Option<&'a str> {
    column.and_then(|c| row.get(c)).and_then(|t| value(t))
}

impl StructureFile for MmcifFile {
    const DIALECT: Dialect = Dialect::Mmcif;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, FormatError> {
        let mut name = String::new();
        let mut fields: Vec<String> = Vec::new();
        let mut rows: Vec<(usize, Vec<String>)> = Vec::new();
        let mut loop_line = 0usize;

        #[derive(PartialEq)]
        enum State {
            Scanning,
            LoopHeader,
            AtomSiteFields,
            AtomSiteRows,
            Done,
        }
        let mut state = State::Scanning;
        let mut pending: Vec<String> = Vec::new();
        let mut pending_line = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_num = idx + 1;
            let trimmed = line.trim();

            if name.is_empty() {
                if let Some(block) = trimmed.strip_prefix("data_") {
                    name = block.to_string();
                    continue;
                }
            }
            if state == State::Done {
                continue;
            }

            match state {
                State::Scanning => {
                    if trimmed == "loop_" {
                        state = State::LoopHeader;
                        loop_line = line_num;
                    }
                }
                State::LoopHeader => {
                    if trimmed.starts_with(ATOM_SITE_PREFIX) {
                        fields.push(trimmed[ATOM_SITE_PREFIX.len()..].to_string());
                        state = State::AtomSiteFields;
                    } else if !trimmed.is_empty() && !trimmed.starts_with('#') {
                        state = if trimmed == "loop_" {
                            loop_line = line_num;
                            State::LoopHeader
                        } else {
                            State::Scanning
                        };
                    }
                }
                State::AtomSiteFields => {
                    if let Some(field) = trimmed.strip_prefix(ATOM_SITE_PREFIX) {
                        fields.push(field.split_whitespace().next().unwrap_or_default().to_string());
                    } else if !trimmed.is_empty() {
                        state = State::AtomSiteRows;
                    }
                }
                _ => {}
            }

            if state == State::AtomSiteRows {
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.starts_with('#')
                    || trimmed.starts_with("loop_")
                    || trimmed.starts_with('_')
                    || trimmed.starts_with("data_")
                {
                    state = State::Done;
                    continue;
                }
                if pending.is_empty() {
                    pending_line = line_num;
                }
                pending.extend(tokenize(trimmed));
                if pending.len() > fields.len() {
                    return Err(FormatError::parse(
                        Dialect::Mmcif,
                        pending_line,
                        format!(
                            "Row has {} values, expected {}",
                            pending.len(),
                            fields.len()
                        ),
                    ));
                }
                if pending.len() == fields.len() {
                    rows.push((pending_line, std::mem::take(&mut pending)));
                }
            }
        }

        if fields.is_empty() {
            return Err(FormatError::MissingRecord {
                dialect: Dialect::Mmcif,
                record: "_atom_site. loop".to_string(),
            });
        }
        if !pending.is_empty() {
            return Err(FormatError::parse(
                Dialect::Mmcif,
                pending_line,
                format!(
                    "Row has {} values, expected {}",
                    pending.len(),
                    fields.len()
                ),
            ));
        }

        let columns = AtomSiteColumns::resolve(&fields, loop_line)?;
        build_structure(&name, &columns, &rows)
    }
}

fn build_structure(
    name: &str,
    columns: &AtomSiteColumns,
    rows: &[(usize, Vec<String>)],
) -> Result<Structure, FormatError> {
    let mut builder = StructureBuilder::new(name);
    let mut current_model: Option<usize> = None;

    for (line, row) in rows {
        let line = *line;

        let model = optional(row, columns.model)
            .and_then(|m| m.parse::<usize>().ok())
            .unwrap_or(1);
        if current_model != Some(model) {
            builder.start_model(model);
            current_model = Some(model);
        }

        let chain_token = optional(row, Some(columns.chain)).unwrap_or(" ");
        let mut chain_chars = chain_token.chars();
        let chain_id = match (chain_chars.next(), chain_chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(FormatError::parse(
                    Dialect::Mmcif,
                    line,
                    format!(
                        "Chain identifier '{}' does not fit a single character",
                        chain_token
                    ),
                ));
            }
        };

        let kind = match optional(row, columns.group) {
            Some("HETATM") => ResidueKind::Hetero,
            _ => ResidueKind::Standard,
        };
        let res_name = optional(row, Some(columns.res_name)).unwrap_or("UNK");
        let res_seq: isize = parse_number(row, columns.res_seq, line, "residue number")?;
        let insertion_code = optional(row, columns.insertion_code).and_then(|s| s.chars().next());

        let serial: usize = parse_number(row, columns.serial, line, "atom serial")?;
        let x: f64 = parse_number(row, columns.x, line, "x coordinate")?;
        let y: f64 = parse_number(row, columns.y, line, "y coordinate")?;
        let z: f64 = parse_number(row, columns.z, line, "z coordinate")?;
        let atom_name = optional(row, Some(columns.atom_name)).ok_or_else(|| {
            FormatError::parse(Dialect::Mmcif, line, "Missing atom name")
        })?;

        builder.start_chain(chain_id);
        builder
            .start_residue(res_seq, insertion_code, res_name, kind)
            .map_err(|e| FormatError::from_build(Dialect::Mmcif, line, e))?;

        let mut atom = Atom::new(atom_name, Point3::new(x, y, z));
        atom.serial = serial;
        atom.element = optional(row, columns.element).map(str::to_string);
        atom.occupancy = optional(row, columns.occupancy)
            .and_then(|v| v.parse().ok())
            .unwrap_or(1.0);
        atom.b_factor = optional(row, columns.b_factor)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        builder
            .add_atom(atom)
            .map_err(|e| FormatError::from_build(Dialect::Mmcif, line, e))?;
    }

    Ok(builder.build())
}
