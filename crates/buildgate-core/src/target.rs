//! The build target tuple.
//!
//! A check is addressed by a single CLI argument of the form
//! `actor/owner/repo/branch`. Actor and owner are alternative values for
//! the queue record's one owning-account field: a fork's build may be
//! attributed to either, so lookups match on one or the other.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when a CLI tuple cannot be parsed into a [`BuildTarget`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    /// Fewer than four segments, or an empty segment.
    #[error("Expected build target in the form 'actor/owner/repo/branch', got '{input}'")]
    Malformed { input: String },
}

/// Identifies the build being checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTarget {
    pub actor: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl BuildTarget {
    /// Parse an `actor/owner/repo/branch` tuple.
    ///
    /// The branch is the remainder after the third separator, so branch
    /// names containing `/` survive intact. Fewer than four segments or an
    /// empty segment is malformed.
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let mut parts = input.splitn(4, '/');
        let (actor, owner, repo, branch) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(actor), Some(owner), Some(repo), Some(branch)) => {
                    (actor, owner, repo, branch)
                }
                _ => {
                    return Err(TargetError::Malformed {
                        input: input.to_string(),
                    })
                }
            };

        if actor.is_empty() || owner.is_empty() || repo.is_empty() || branch.is_empty() {
            return Err(TargetError::Malformed {
                input: input.to_string(),
            });
        }

        Ok(BuildTarget {
            actor: actor.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
        })
    }
}

impl FromStr for BuildTarget {
    type Err = TargetError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.actor, self.owner, self.repo, self.branch
        )
    }
}
