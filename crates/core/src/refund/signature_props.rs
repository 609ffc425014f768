//! Property-based tests for callback signatures.

use proptest::prelude::*;

use super::signature::{sign, verify};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The genuine signature always verifies.
    #[test]
    fn prop_genuine_signature_verifies(
        body in prop::collection::vec(any::<u8>(), 0..512),
        secret in "[a-zA-Z0-9]{1,32}",
    ) {
        let signature = sign(&body, &secret);
        prop_assert!(verify(&body, &secret, &signature));
    }

    /// Any other signature is rejected.
    #[test]
    fn prop_other_signature_rejected(
        body in prop::collection::vec(any::<u8>(), 0..512),
        secret in "[a-zA-Z0-9]{1,32}",
        presented in "[0-9a-f]{0,128}",
    ) {
        prop_assume!(presented != sign(&body, &secret));
        prop_assert!(!verify(&body, &secret, &presented));
    }

    /// A signature made with a different secret is rejected.
    #[test]
    fn prop_wrong_secret_rejected(
        body in prop::collection::vec(any::<u8>(), 0..512),
        secret in "[a-z]{1,16}",
        other in "[A-Z]{1,16}",
    ) {
        let signature = sign(&body, &other);
        prop_assert!(!verify(&body, &secret, &signature));
    }
}
