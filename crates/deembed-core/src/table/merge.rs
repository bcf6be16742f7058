//! Merged multi-structure table
//!
//! Combines the structures of each measurement set into one wide table,
//! outer-joined on frequency, with a `set_id` column identifying the set.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use super::{TableError, FREQ_COLUMN, PARAMS};
use crate::math::conversions::reim_2_dbdeg;
use crate::network::Network;
use crate::source::StructureRole;

/// The structures of one measurement set
#[derive(Debug, Clone)]
pub struct MergeGroup {
    /// Set identifier written to the `set_id` column
    pub id: String,
    /// Networks by role
    pub structures: Vec<(StructureRole, Network)>,
}

impl MergeGroup {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            structures: Vec::new(),
        }
    }

    pub fn with(mut self, role: StructureRole, network: Network) -> Self {
        self.structures.push((role, network));
        self
    }
}

fn freq_key(f: f64) -> u64 {
    // -0.0 + 0.0 == +0.0
    (f + 0.0).to_bits()
}

/// Write all groups to one table and return the number of data rows
///
/// Columns are `set_id`, `Freq(Hz)`, then `<role>_S11_dB`,
/// `<role>_S11_deg`, ... for every role present in any group. Cells for a
/// structure that was not measured at a row's frequency are left empty.
pub fn write_merged<W: Write>(groups: &[MergeGroup], writer: W) -> Result<usize, TableError> {
    let roles: BTreeSet<StructureRole> = groups
        .iter()
        .flat_map(|g| g.structures.iter().map(|(role, _)| *role))
        .collect();

    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["set_id".to_string(), FREQ_COLUMN.to_string()];
    for role in &roles {
        for (param, _, _) in PARAMS {
            header.push(format!("{}_{}_dB", role, param));
            header.push(format!("{}_{}_deg", role, param));
        }
    }
    wtr.write_record(&header)?;

    let mut rows = 0;
    for group in groups {
        // frequency -> role -> index into that structure's sweep
        let mut joined: BTreeMap<u64, (f64, BTreeMap<StructureRole, (usize, &Network)>)> =
            BTreeMap::new();
        for (role, network) in &group.structures {
            for (k, &f) in network.f().iter().enumerate() {
                joined
                    .entry(freq_key(f))
                    .or_insert_with(|| (f, BTreeMap::new()))
                    .1
                    .insert(*role, (k, network));
            }
        }

        for (f, present) in joined.values() {
            let mut row = Vec::with_capacity(header.len());
            row.push(group.id.clone());
            row.push(f.to_string());
            for role in &roles {
                match present.get(role) {
                    Some(&(k, network)) => {
                        for (_, i, j) in PARAMS {
                            let (db, deg) = reim_2_dbdeg(network.s[[k, i, j]]);
                            row.push(db.to_string());
                            row.push(deg.to_string());
                        }
                    }
                    None => row.extend(std::iter::repeat(String::new()).take(2 * PARAMS.len())),
                }
            }
            wtr.write_record(&row)?;
            rows += 1;
        }
    }

    wtr.flush()?;
    Ok(rows)
}
