//! Governance ledger — multisig approval protocol
//!
//! Privileged operations are gated behind an administrator set with a
//! signature threshold. At most one operation is pending approval at a time;
//! administrators approve it in any order, approvals are idempotent, and the
//! operation executes exactly once, on the call whose approval reaches the
//! threshold. A call carrying a different payload while another is pending is
//! a hard conflict, never a silent overwrite.
//!
//! The threshold is read at execution time on every call, so an
//! administrator-set change can never execute a leftover operation under a
//! stale threshold (the conservative policy; see `sign`).

use serde::{Deserialize, Serialize};
use tracing::debug;
use types::ids::Address;

use crate::errors::GovernanceError;

/// Upper bound on the administrator set, so approvals fit a u64 bitmap.
pub const MAX_ADMINS: usize = 6;

/// The privileged operations subject to multisig approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    SetAdminSigners,
    SetFees,
    SetPermissions,
    SetOracleConfig,
    SetOraclePrice,
    InitCustody,
    WithdrawFees,
    DeleteAuction,
}

/// Result of recording one approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalState {
    /// Approval recorded; more signatures required before execution.
    Pending { signed: u8, required: u8 },
    /// The threshold was reached on this call: apply the effect now.
    Executed,
}

/// A privileged call awaiting approvals.
///
/// The approval bitmap is an explicit field on the record, indexed by the
/// administrator's position in the ordered set. Each approval is a pure
/// update of this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub kind: OperationKind,
    pub payload_hash: [u8; 32],
    approvals: u64,
}

impl PendingOperation {
    fn new(kind: OperationKind, payload_hash: [u8; 32]) -> Self {
        Self {
            kind,
            payload_hash,
            approvals: 0,
        }
    }

    /// Number of administrators who have approved.
    pub fn approval_count(&self) -> u32 {
        self.approvals.count_ones()
    }

    /// Whether the administrator at `index` has approved.
    pub fn has_approved(&self, index: usize) -> bool {
        self.approvals & (1u64 << index) != 0
    }

    fn record(&mut self, index: usize) {
        self.approvals |= 1u64 << index;
    }
}

/// The multisig account: ordered administrator set, threshold, and the
/// single pending-operation slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multisig {
    admins: Vec<Address>,
    min_signatures: u8,
    pending: Option<PendingOperation>,
}

impl Multisig {
    /// Create a multisig over an ordered administrator set.
    pub fn new(admins: Vec<Address>, min_signatures: u8) -> Result<Self, GovernanceError> {
        validate_admin_set(&admins, min_signatures)?;
        Ok(Self {
            admins,
            min_signatures,
            pending: None,
        })
    }

    pub fn admins(&self) -> &[Address] {
        &self.admins
    }

    pub fn min_signatures(&self) -> u8 {
        self.min_signatures
    }

    /// The operation currently awaiting approvals, if any.
    pub fn pending(&self) -> Option<&PendingOperation> {
        self.pending.as_ref()
    }

    pub fn is_admin(&self, who: &Address) -> bool {
        self.admin_index(who).is_some()
    }

    fn admin_index(&self, who: &Address) -> Option<usize> {
        self.admins.iter().position(|a| a == who)
    }

    /// Record `admin`'s approval of `(kind, payload_hash)`.
    ///
    /// - No pending record: one is created with this approval.
    /// - Identical kind and payload pending: the approval is recorded
    ///   idempotently (approving twice counts once).
    /// - Anything else pending: `StaleMismatch`.
    ///
    /// Returns [`ApprovalState::Executed`] exactly once per proposal, on the
    /// call whose approval reaches the *current* threshold; the pending
    /// record is cleared before returning, so the caller must apply the
    /// operation's effect immediately and atomically.
    pub fn sign(
        &mut self,
        admin: &Address,
        kind: OperationKind,
        payload_hash: [u8; 32],
    ) -> Result<ApprovalState, GovernanceError> {
        let index = self
            .admin_index(admin)
            .ok_or(GovernanceError::Unauthorized)?;

        if let Some(p) = &self.pending {
            if p.kind != kind || p.payload_hash != payload_hash {
                return Err(GovernanceError::StaleMismatch);
            }
        }
        let pending = self
            .pending
            .get_or_insert_with(|| PendingOperation::new(kind, payload_hash));

        pending.record(index);
        let signed = pending.approval_count();

        if signed >= u32::from(self.min_signatures) {
            self.pending = None;
            debug!(?kind, signed, "governance operation approved for execution");
            return Ok(ApprovalState::Executed);
        }

        debug!(?kind, signed, required = self.min_signatures, "approval recorded");
        Ok(ApprovalState::Pending {
            signed: signed as u8,
            required: self.min_signatures,
        })
    }

    /// Clear the pending operation. Any current administrator may cancel.
    pub fn cancel(&mut self, admin: &Address) -> Result<(), GovernanceError> {
        if !self.is_admin(admin) {
            return Err(GovernanceError::Unauthorized);
        }
        if self.pending.take().is_none() {
            return Err(GovernanceError::NoPendingOperation);
        }
        Ok(())
    }

    /// Change the signature threshold. Clears any pending operation so no
    /// approval collected under the old rules can carry over.
    pub fn set_min_signatures(&mut self, min_signatures: u8) -> Result<(), GovernanceError> {
        validate_admin_set(&self.admins, min_signatures)?;
        self.min_signatures = min_signatures;
        self.pending = None;
        Ok(())
    }

    /// Replace the administrator set. Clears any pending operation: bitmap
    /// indices refer to positions in the old set and would be meaningless.
    pub fn set_admins(
        &mut self,
        admins: Vec<Address>,
        min_signatures: u8,
    ) -> Result<(), GovernanceError> {
        validate_admin_set(&admins, min_signatures)?;
        self.admins = admins;
        self.min_signatures = min_signatures;
        self.pending = None;
        Ok(())
    }
}

fn validate_admin_set(admins: &[Address], min_signatures: u8) -> Result<(), GovernanceError> {
    if admins.len() > MAX_ADMINS {
        return Err(GovernanceError::TooManyAdmins {
            count: admins.len(),
            max: MAX_ADMINS,
        });
    }
    if min_signatures == 0 || usize::from(min_signatures) > admins.len() {
        return Err(GovernanceError::InvalidThreshold {
            requested: min_signatures,
            admins: admins.len(),
        });
    }
    for (i, admin) in admins.iter().enumerate() {
        if admins[..i].contains(admin) {
            return Err(GovernanceError::DuplicateAdmin { admin: *admin });
        }
    }
    Ok(())
}
