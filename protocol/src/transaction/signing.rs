//! Transaction signing with Ed25519 keypairs.
//!
//! Every signer signs the raw bytes of the transaction id. Because the id
//! commits to the whole body, a signature over the id is a signature over
//! the transaction. Signatures are collected into a [`SignedTransaction`]
//! as the signing flow moves between parties.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::builder::WireTransaction;
use super::verification::TransactionError;
use crate::crypto::hash::SecureHash;
use crate::crypto::keys::{Keypair, PublicKey, Signature};

// ---------------------------------------------------------------------------
// TransactionSignature
// ---------------------------------------------------------------------------

/// A signature over a transaction id, tagged with the key that made it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub by: PublicKey,
    pub bytes: Signature,
}

impl TransactionSignature {
    /// True when `bytes` is a valid signature by `by` over `id`.
    pub fn verify(&self, id: &SecureHash) -> bool {
        self.by.verify(id.as_bytes(), &self.bytes)
    }
}

/// Signs a transaction id with `keypair`.
///
/// # Example
///
/// ```
/// use tally_protocol::crypto::{Keypair, SecureHash};
/// use tally_protocol::transaction::sign_id;
///
/// let kp = Keypair::generate();
/// let id = SecureHash::double_sha256(b"body");
/// let sig = sign_id(&kp, &id);
/// assert!(sig.verify(&id));
/// ```
pub fn sign_id(keypair: &Keypair, id: &SecureHash) -> TransactionSignature {
    TransactionSignature {
        by: keypair.public_key(),
        bytes: keypair.sign(id.as_bytes()),
    }
}

// ---------------------------------------------------------------------------
// SignedTransaction
// ---------------------------------------------------------------------------

/// A wire transaction plus the signatures collected so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "S: Serialize, C: Serialize",
    deserialize = "S: DeserializeOwned, C: DeserializeOwned"
))]
pub struct SignedTransaction<S, C> {
    pub tx: WireTransaction<S, C>,
    pub sigs: Vec<TransactionSignature>,
}

impl<S, C> SignedTransaction<S, C>
where
    S: Clone + Serialize,
    C: Clone + Serialize,
{
    pub fn new(tx: WireTransaction<S, C>, sigs: Vec<TransactionSignature>) -> Self {
        Self { tx, sigs }
    }

    pub fn id(&self) -> SecureHash {
        self.tx.id
    }

    /// Every key listed by a command, de-duplicated, in order.
    pub fn required_signing_keys(&self) -> Vec<PublicKey> {
        self.tx.required_signing_keys()
    }

    /// Required keys that have not contributed a signature yet.
    pub fn missing_signers(&self) -> Vec<PublicKey> {
        self.required_signing_keys()
            .into_iter()
            .filter(|key| !self.is_signed_by(key))
            .collect()
    }

    pub fn is_signed_by(&self, key: &PublicKey) -> bool {
        self.sigs.iter().any(|sig| &sig.by == key)
    }

    /// Returns a copy with `sig` attached. Any earlier signature by the same
    /// key is replaced.
    pub fn with_additional_signature(&self, sig: TransactionSignature) -> Self {
        let mut sigs: Vec<TransactionSignature> = self
            .sigs
            .iter()
            .filter(|existing| existing.by != sig.by)
            .cloned()
            .collect();
        sigs.push(sig);
        Self {
            tx: self.tx.clone(),
            sigs,
        }
    }

    /// Signs with `keypair` and returns the extended transaction.
    pub fn sign_with(&self, keypair: &Keypair) -> Self {
        self.with_additional_signature(sign_id(keypair, &self.tx.id))
    }

    /// Checks that every attached signature is valid and that every required
    /// key not listed in `allowed_missing` has signed.
    pub fn verify_signatures_except(
        &self,
        allowed_missing: &[PublicKey],
    ) -> Result<(), TransactionError> {
        for sig in &self.sigs {
            if !sig.verify(&self.tx.id) {
                return Err(TransactionError::InvalidSignature {
                    signer: sig.by.clone(),
                });
            }
        }

        let missing: Vec<PublicKey> = self
            .missing_signers()
            .into_iter()
            .filter(|key| !allowed_missing.contains(key))
            .collect();
        if !missing.is_empty() {
            return Err(TransactionError::SignaturesMissing { missing });
        }
        Ok(())
    }

    /// Every signature valid and every required signer present.
    pub fn verify_required_signatures(&self) -> Result<(), TransactionError> {
        self.verify_signatures_except(&[])
    }

    /// Stored id equals the recomputed id.
    pub fn check_integrity(&self) -> Result<(), TransactionError> {
        self.tx.check_integrity()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{dummy_party_with_key, DummyCommand, DummyState, DUMMY_CONTRACT_ID};
    use crate::transaction::builder::TransactionBuilder;

    struct Fixture {
        alice: Keypair,
        bob: Keypair,
        stx: SignedTransaction<DummyState, DummyCommand>,
    }

    fn fixture() -> Fixture {
        let (alice_party, alice) = dummy_party_with_key("Alice Corp");
        let (bob_party, bob) = dummy_party_with_key("Bob Corp");
        let (notary, _) = dummy_party_with_key("Notary Service");
        let mut builder = TransactionBuilder::new(notary);
        builder
            .add_output_state(DummyState::new(1, bob_party.clone()), DUMMY_CONTRACT_ID)
            .add_command(
                DummyCommand::Create,
                vec![alice_party.owning_key.clone(), bob_party.owning_key.clone()],
            );
        let wtx = builder.to_wire_transaction().unwrap();
        Fixture {
            alice,
            bob,
            stx: SignedTransaction::new(wtx, vec![]),
        }
    }

    #[test]
    fn test_missing_signers_shrinks_as_parties_sign() {
        let f = fixture();
        assert_eq!(f.stx.missing_signers().len(), 2);

        let partial = f.stx.sign_with(&f.alice);
        assert_eq!(partial.missing_signers(), vec![f.bob.public_key()]);

        let full = partial.sign_with(&f.bob);
        assert!(full.missing_signers().is_empty());
        full.verify_required_signatures().unwrap();
    }

    #[test]
    fn test_verify_except_allows_listed_keys() {
        let f = fixture();
        let partial = f.stx.sign_with(&f.alice);
        partial
            .verify_signatures_except(&[f.bob.public_key()])
            .unwrap();
        match partial.verify_required_signatures() {
            Err(TransactionError::SignaturesMissing { missing }) => {
                assert_eq!(missing, vec![f.bob.public_key()]);
            }
            other => panic!("expected SignaturesMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let f = fixture();
        let forged = TransactionSignature {
            by: f.bob.public_key(),
            bytes: f.alice.sign(f.stx.id().as_bytes()),
        };
        let stx = f.stx.sign_with(&f.alice).with_additional_signature(forged);
        match stx.verify_required_signatures() {
            Err(TransactionError::InvalidSignature { signer }) => {
                assert_eq!(signer, f.bob.public_key());
            }
            other => panic!("expected InvalidSignature, got {:?}", other),
        }
    }

    #[test]
    fn test_resigning_replaces_signature() {
        let f = fixture();
        let stx = f.stx.sign_with(&f.alice).sign_with(&f.alice);
        assert_eq!(stx.sigs.len(), 1);
    }

    #[test]
    fn test_extra_signer_must_still_be_valid() {
        let f = fixture();
        let outsider = Keypair::generate();
        let stx = f.stx.sign_with(&f.alice).sign_with(&f.bob).sign_with(&outsider);
        stx.verify_required_signatures().unwrap();
        assert!(stx.is_signed_by(&outsider.public_key()));
    }

    #[test]
    fn test_signature_over_other_id_fails() {
        let kp = Keypair::generate();
        let sig = sign_id(&kp, &SecureHash::double_sha256(b"one"));
        assert!(!sig.verify(&SecureHash::double_sha256(b"two")));
    }
}
