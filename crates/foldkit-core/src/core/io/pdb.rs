use super::error::FormatError;
use super::format::Dialect;
use super::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::builder::StructureBuilder;
use crate::core::models::residue::{Residue, ResidueKind};
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

const MIN_ATOM_RECORD_LEN: usize = 54;
const RESIDUE_NUMBER_RANGE: std::ops::RangeInclusive<isize> = -999..=9999;
const COORDINATE_WIDTH: usize = 8;

/// Controls which residues are serialised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub include_hetero: bool,
}

/// Reader and writer for the legacy fixed-column PDB format.
pub struct PdbFile;

fn column(line: &str, start: usize, end: usize) -> Option<&str> {
    let end = end.min(line.len());
    if start >= end {
        return Some("");
    }
    line.get(start..end)
}

fn column_char(line: &str, index: usize) -> Option<char> {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| *c != ' ')
}

fn parse_field<T: std::str::FromStr>(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    what: &str,
) -> Result<T, FormatError> {
    let raw = column(line, start, end)
        .ok_or_else(|| FormatError::parse(Dialect::Pdb, line_num, format!("Invalid {}", what)))?;
    raw.trim().parse::<T>().map_err(|_| {
        FormatError::parse(
            Dialect::Pdb,
            line_num,
            format!("Invalid {} '{}'", what, raw.trim()),
        )
    })
}

fn parse_optional_f64(line: &str, start: usize, end: usize, default: f64) -> f64 {
    column(line, start, end)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl StructureFile for PdbFile {
    const DIALECT: Dialect = Dialect::Pdb;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, FormatError> {
        let mut builder: Option<StructureBuilder> = None;
        let mut name = String::new();
        let mut model_count = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_num = idx + 1;
            let record = column(&line, 0, 6).unwrap_or_default().trim_end();

            match record {
                "HEADER" => {
                    if let Some(id) = column(&line, 62, 66).map(str::trim) {
                        if !id.is_empty() {
                            name = id.to_string();
                        }
                    }
                }
                "MODEL" => {
                    model_count += 1;
                    let serial = column(&line, 10, 14)
                        .and_then(|s| s.trim().parse().ok())
                        .unwrap_or(model_count);
                    builder
                        .get_or_insert_with(|| StructureBuilder::new(&name))
                        .start_model(serial);
                }
                "TER" | "ENDMDL" => {
                    if let Some(builder) = builder.as_mut() {
                        builder.end_chain();
                    }
                }
                "ATOM" | "HETATM" => {
                    let builder = builder.get_or_insert_with(|| StructureBuilder::new(&name));
                    read_atom_record(builder, &line, line_num, record == "HETATM")?;
                }
                "END" => break,
                _ => {}
            }
        }

        let mut structure = match builder {
            Some(builder) => builder.build(),
            None => Structure::new(&name),
        };
        structure.name = name;
        Ok(structure)
    }
}

fn read_atom_record(
    builder: &mut StructureBuilder,
    line: &str,
    line_num: usize,
    is_hetatm: bool,
) -> Result<(), FormatError> {
    if line.len() < MIN_ATOM_RECORD_LEN {
        return Err(FormatError::parse(
            Dialect::Pdb,
            line_num,
            format!(
                "Atom record has {} columns, expected at least {}",
                line.len(),
                MIN_ATOM_RECORD_LEN
            ),
        ));
    }
    if !line.is_ascii() {
        return Err(FormatError::parse(
            Dialect::Pdb,
            line_num,
            "Atom record contains non-ASCII characters",
        ));
    }

    let serial: usize = parse_field(line, line_num, 6, 11, "atom serial")?;
    let atom_name = column(line, 12, 16).unwrap_or_default().trim();
    let res_name = column(line, 17, 20).unwrap_or_default().trim();
    let chain_id = column_char(line, 21).unwrap_or(' ');
    let res_seq: isize = parse_field(line, line_num, 22, 26, "residue number")?;
    let insertion_code = column_char(line, 26);
    let x: f64 = parse_field(line, line_num, 30, 38, "x coordinate")?;
    let y: f64 = parse_field(line, line_num, 38, 46, "y coordinate")?;
    let z: f64 = parse_field(line, line_num, 46, 54, "z coordinate")?;
    let occupancy = parse_optional_f64(line, 54, 60, 1.0);
    let b_factor = parse_optional_f64(line, 60, 66, 0.0);
    let element = column(line, 76, 78)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let kind = if is_hetatm {
        ResidueKind::Hetero
    } else {
        ResidueKind::Standard
    };

    builder.start_chain(chain_id);
    builder
        .start_residue(res_seq, insertion_code, res_name, kind)
        .map_err(|e| FormatError::from_build(Dialect::Pdb, line_num, e))?;

    let mut atom = Atom::new(atom_name, Point3::new(x, y, z));
    atom.serial = serial;
    atom.element = element;
    atom.occupancy = occupancy;
    atom.b_factor = b_factor;
    builder
        .add_atom(atom)
        .map_err(|e| FormatError::from_build(Dialect::Pdb, line_num, e))?;
    Ok(())
}

fn format_atom_name(name: &str, element: &str) -> String {
    if name.len() < 4 && element.len() == 1 {
        format!(" {:<3}", name)
    } else {
        format!("{:<4}", name)
    }
}

/// Residue numbers and coordinates that overflow their columns would shift
/// every field after them.
fn check_fits(chain: char, residue: &Residue, atom: &Atom) -> Result<(), FormatError> {
    if !RESIDUE_NUMBER_RANGE.contains(&residue.number) {
        return Err(FormatError::unwritable(
            Dialect::Pdb,
            format!(
                "Residue number {} in chain {} does not fit in 4 columns",
                residue.number, chain
            ),
        ));
    }
    let p = atom.position;
    for value in [p.x, p.y, p.z] {
        if !value.is_finite() || format!("{:.3}", value).len() > COORDINATE_WIDTH {
            return Err(FormatError::unwritable(
                Dialect::Pdb,
                format!(
                    "Coordinate {} of atom {} in {} {}{} does not fit in 8 columns",
                    value, atom.name, residue.name, chain, residue.number
                ),
            ));
        }
    }
    Ok(())
}

impl PdbFile {
    /// Serialises a structure to the fixed-column layout.
    ///
    /// Atom serials are renumbered from 1 and every `TER` record consumes a
    /// serial. `MODEL`/`ENDMDL` wrap each model only when there are several.
    pub fn write_to(
        structure: &Structure,
        options: WriteOptions,
        writer: &mut impl Write,
    ) -> Result<(), FormatError> {
        let multi_model = structure.models().len() > 1;
        let mut serial = 1usize;

        for model in structure.models() {
            if multi_model {
                writeln!(writer, "MODEL     {:>4}", model.serial)?;
            }

            for &chain_id in model.chains() {
                let Some(chain) = structure.chain(chain_id) else {
                    continue;
                };
                let mut last_residue = None;

                for (residue_id, residue) in structure.residues_of(chain_id) {
                    if residue.is_hetero() && !options.include_hetero {
                        continue;
                    }
                    let record = if residue.is_hetero() { "HETATM" } else { "ATOM  " };
                    let icode = residue.insertion_code.unwrap_or(' ');

                    for (_, atom) in structure.atoms_of(residue_id) {
                        check_fits(chain.id, residue, atom)?;
                        let element = atom.element_symbol();
                        writeln!(
                            writer,
                            "{}{:>5} {} {:>3} {}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}  ",
                            record,
                            serial % 100_000,
                            format_atom_name(&atom.name, &element),
                            residue.name,
                            chain.id,
                            residue.number,
                            icode,
                            atom.position.x,
                            atom.position.y,
                            atom.position.z,
                            atom.occupancy,
                            atom.b_factor,
                            element,
                        )?;
                        serial += 1;
                    }
                    last_residue = Some(residue);
                }

                if let Some(residue) = last_residue {
                    writeln!(
                        writer,
                        "TER   {:>5}      {:>3} {}{:>4}{}",
                        serial % 100_000,
                        residue.name,
                        chain.id,
                        residue.number,
                        residue.insertion_code.unwrap_or(' '),
                    )?;
                    serial += 1;
                }
            }

            if multi_model {
                writeln!(writer, "ENDMDL")?;
            }
        }

        writeln!(writer, "END")?;
        Ok(())
    }

    pub fn write_to_string(
        structure: &Structure,
        options: WriteOptions,
    ) -> Result<String, FormatError> {
        let mut buffer = Vec::new();
        Self::write_to(structure, options, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            FormatError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    pub fn write_to_path<P: AsRef<Path>>(
        structure: &Structure,
        options: WriteOptions,
        path: P,
    ) -> Result<(), FormatError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(structure, options, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Prefixes PDB text with HEADER, TITLE and COMPND records naming the model,
/// so viewers label it.
pub fn apply_pdb_header(pdb: &str, name: &str) -> String {
    format!(
        "HEADER    \"{name}\"{pad}00-JAN-00   0XXX\n\
         TITLE     \"{name}\"\n\
         COMPND    MOL_ID: 1;\n\
         COMPND   2 MOLECULE: {name};\n\
         COMPND   3 CHAIN: A;\n\
         {pdb}",
        pad = " ".repeat(40usize.saturating_sub(name.len() + 2).max(1)),
    )
}
