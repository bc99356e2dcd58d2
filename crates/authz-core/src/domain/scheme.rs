//! # Scheme Dispatch
//!
//! Every signature scheme authenticates a [`SignatureRecord`] behind the same
//! trait. Schemes with state (Lamport) stage their side effects in the
//! transaction they are handed; stateless schemes ignore it.

use super::ecdsa::EcdsaVerifier;
use super::entities::{
    FrostPublicKey, GroupId, Principal, SchemeTag, SignaturePayload, SignatureRecord, StateDelta,
};
use super::errors::AuthError;
use super::frost::{group_address, FrostVerifier};
use super::lamport::{lamport_principal, LamportVerifier};
use super::replay::StateTxn;

/// Principal authenticated by a scheme, plus any state it staged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authenticated {
    /// Identity the signature proves
    pub principal: Principal,
    /// Deltas staged by the scheme itself
    pub deltas: Vec<StateDelta>,
}

impl Authenticated {
    fn stateless(principal: Principal) -> Self {
        Self {
            principal,
            deltas: Vec::new(),
        }
    }
}

/// A signature scheme able to authenticate decoded records.
pub trait SchemeVerifier {
    /// Scheme this verifier accepts.
    fn scheme(&self) -> SchemeTag;

    /// Authenticate `record`. A record of another scheme is `MalformedInput`.
    fn authenticate(
        &self,
        record: &SignatureRecord,
        txn: &mut StateTxn<'_>,
    ) -> Result<Authenticated, AuthError>;
}

fn wrong_scheme() -> AuthError {
    AuthError::MalformedInput("record does not match verifier scheme")
}

impl SchemeVerifier for EcdsaVerifier {
    fn scheme(&self) -> SchemeTag {
        SchemeTag::Ecdsa
    }

    fn authenticate(
        &self,
        record: &SignatureRecord,
        _txn: &mut StateTxn<'_>,
    ) -> Result<Authenticated, AuthError> {
        let SignaturePayload::Ecdsa {
            signature,
            expected_signer,
        } = record.payload()
        else {
            return Err(wrong_scheme());
        };
        let principal = self.recover(record.digest().as_bytes(), signature, *expected_signer)?;
        Ok(Authenticated::stateless(principal))
    }
}

/// FROST verifier bound to one resolved group key.
#[derive(Clone, Copy, Debug)]
pub struct BoundFrostVerifier {
    verifier: FrostVerifier,
    group: GroupId,
    key: FrostPublicKey,
}

impl FrostVerifier {
    /// Bind to the key provisioned for `group`.
    pub fn bind(&self, group: GroupId, key: FrostPublicKey) -> BoundFrostVerifier {
        BoundFrostVerifier {
            verifier: *self,
            group,
            key,
        }
    }
}

impl SchemeVerifier for BoundFrostVerifier {
    fn scheme(&self) -> SchemeTag {
        SchemeTag::Frost
    }

    fn authenticate(
        &self,
        record: &SignatureRecord,
        _txn: &mut StateTxn<'_>,
    ) -> Result<Authenticated, AuthError> {
        let SignaturePayload::Frost { group, signature } = record.payload() else {
            return Err(wrong_scheme());
        };
        if *group != self.group {
            return Err(AuthError::UnknownGroupKey);
        }
        if !self
            .verifier
            .verify(&self.key, record.digest().as_bytes(), signature)
        {
            return Err(AuthError::InvalidSignature);
        }
        Ok(Authenticated::stateless(group_address(&self.key)))
    }
}

impl SchemeVerifier for LamportVerifier {
    fn scheme(&self) -> SchemeTag {
        SchemeTag::Lamport
    }

    fn authenticate(
        &self,
        record: &SignatureRecord,
        txn: &mut StateTxn<'_>,
    ) -> Result<Authenticated, AuthError> {
        let SignaturePayload::Lamport { account, signature } = record.payload() else {
            return Err(wrong_scheme());
        };
        let delta = self.verify_and_rotate(txn, *account, record.digest(), signature)?;
        Ok(Authenticated {
            principal: lamport_principal(account),
            deltas: vec![delta],
        })
    }
}
