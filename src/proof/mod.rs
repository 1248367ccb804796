//! Commitment engine and verification gate.

pub mod canonical;
pub mod commitment;
pub mod gate;

pub use canonical::CanonicalBytes;
pub use commitment::{
    COMMITMENT_SCHEME, Commitment, CommitmentScheme, HashCommitment, ProofStatement, commit,
    verify,
};
pub use gate::{GateState, VerificationGate, VerifiedCommitment};
