//! Verification gate: the check every result must pass before release.

use tracing::{error, info};

use super::commitment::{Commitment, CommitmentScheme, ProofStatement};
use crate::{OpsError, OpsResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Pending,
    Verified,
    Rejected,
}

impl GateState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GateState::Pending)
    }
}

/// Proof that a commitment passed the gate. Only `VerificationGate::check`
/// constructs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCommitment {
    commitment: Commitment,
    circuit_version: String,
}

impl VerifiedCommitment {
    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    pub fn circuit_version(&self) -> &str {
        &self.circuit_version
    }
}

/// A single-use gate for one commitment.
#[derive(Debug)]
pub struct VerificationGate {
    commitment: Commitment,
    state: GateState,
}

impl VerificationGate {
    pub fn new(commitment: Commitment) -> Self {
        VerificationGate {
            commitment,
            state: GateState::Pending,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Re-derive the commitment for `statement` and compare it to the one
    /// held by the gate.
    ///
    /// # Errors
    /// - `VerificationFailed` on mismatch (the gate becomes `Rejected`)
    /// - `Message` if the gate already reached a terminal state
    /// - any error from re-deriving the commitment (the gate becomes `Rejected`)
    pub fn check(
        &mut self,
        scheme: &dyn CommitmentScheme,
        statement: &ProofStatement<'_>,
    ) -> OpsResult<VerifiedCommitment> {
        if self.state.is_terminal() {
            return Err(OpsError::Message(format!(
                "verification gate already {:?}",
                self.state
            )));
        }

        let expected = match scheme.commit(statement) {
            Ok(c) => c,
            Err(e) => {
                self.state = GateState::Rejected;
                return Err(e);
            }
        };

        if expected != self.commitment {
            self.state = GateState::Rejected;
            error!(
                expected = %expected,
                actual = %self.commitment,
                "commitment mismatch, run rejected"
            );
            return Err(OpsError::VerificationFailed {
                expected: expected.to_string(),
                actual: self.commitment.to_string(),
            });
        }

        self.state = GateState::Verified;
        info!(commitment = %self.commitment, "commitment verified");
        Ok(VerifiedCommitment {
            commitment: self.commitment.clone(),
            circuit_version: statement.circuit_version().to_string(),
        })
    }
}
