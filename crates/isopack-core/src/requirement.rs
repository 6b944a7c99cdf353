use std::fmt;

use anyhow::{anyhow, Context};
use semver::{BuildMetadata, Comparator, Op, Version, VersionReq};

/// The merged version-constraint set for one declared package name. A
/// version is allowed when every constraint in the set matches it; the
/// empty set allows everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Requirement {
    constraints: Vec<VersionReq>,
}

impl Requirement {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn from_req(req: VersionReq) -> Self {
        if req == VersionReq::STAR {
            return Self::any();
        }
        Self {
            constraints: vec![req],
        }
    }

    pub fn parse(input: &str) -> anyhow::Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(Self::any());
        }
        let req = VersionReq::parse(trimmed)
            .with_context(|| format!("invalid version requirement: {trimmed}"))?;
        Ok(Self::from_req(req))
    }

    pub fn allows(&self, version: &Version) -> bool {
        self.constraints.iter().all(|req| req.matches(version))
    }

    /// Non-destructive merge. Fails when the combined set is statically
    /// unsatisfiable: some exact pin in the set is excluded by another
    /// constraint. Constraint sets this check cannot decide are accepted
    /// and resolved against the installed index at activation time.
    pub fn merged(&self, other: &Requirement) -> anyhow::Result<Requirement> {
        let mut combined = self.constraints.clone();
        for req in &other.constraints {
            if !combined.contains(req) {
                combined.push(req.clone());
            }
        }

        for pin in combined.iter().filter_map(exact_pin) {
            if let Some(blocking) = combined.iter().find(|req| !req.matches(&pin)) {
                return Err(anyhow!(
                    "requirements are unsatisfiable: ={pin} excluded by {blocking}"
                ));
            }
        }

        Ok(Requirement {
            constraints: combined,
        })
    }

    pub fn merge(&mut self, other: &Requirement) -> anyhow::Result<()> {
        *self = self.merged(other)?;
        Ok(())
    }
}

fn exact_pin(req: &VersionReq) -> Option<Version> {
    let [comparator] = req.comparators.as_slice() else {
        return None;
    };
    comparator_pin(comparator)
}

fn comparator_pin(comparator: &Comparator) -> Option<Version> {
    if comparator.op != Op::Exact {
        return None;
    }
    let (Some(minor), Some(patch)) = (comparator.minor, comparator.patch) else {
        return None;
    };
    Some(Version {
        major: comparator.major,
        minor,
        patch,
        pre: comparator.pre.clone(),
        build: BuildMetadata::EMPTY,
    })
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraints.is_empty() {
            return f.write_str("*");
        }
        let rendered = self
            .constraints
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&rendered)
    }
}
