use std::collections::HashSet;

use anyhow::Result;
use isopack_core::{PackageSpec, Requirement};
use isopack_store::InstalledIndex;

use crate::entry::Entry;

/// Every installed spec transitively reachable from the declared entries
/// through satisfied requirements, in post-order, each spec listed once.
/// The visited set keys on (name, version), so dependency cycles among
/// installed packages terminate.
pub(crate) fn legitimate(
    index: &mut InstalledIndex,
    entries: &[Entry],
) -> Result<Vec<PackageSpec>> {
    let mut seen = HashSet::new();
    let mut legit = Vec::new();
    for entry in entries {
        visit(index, &entry.name, &entry.requirement, &mut seen, &mut legit)?;
    }
    Ok(legit)
}

fn visit(
    index: &mut InstalledIndex,
    name: &str,
    requirement: &Requirement,
    seen: &mut HashSet<String>,
    legit: &mut Vec<PackageSpec>,
) -> Result<()> {
    let Some(spec) = index.find(name, requirement)? else {
        return Ok(());
    };
    if !seen.insert(spec.full_name()) {
        return Ok(());
    }

    for (dep_name, dep_req) in &spec.dependencies {
        let dep_requirement = Requirement::from_req(dep_req.clone());
        visit(index, dep_name, &dep_requirement, seen, legit)?;
    }

    legit.push(spec);
    Ok(())
}
