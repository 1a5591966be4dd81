//! Integration tests for the envelope crypto module.
//!
//! RSA tests use the fixture keys under `tests/fixtures/` so nothing here
//! pays for key generation.

use std::path::{Path, PathBuf};

use envelope::crypto::keys::parse_public_key;
use envelope::crypto::random::{generate_key_material, generate_salt, KEY_MATERIAL_LEN};
use envelope::crypto::symmetric::{self, decode_salt};
use envelope::crypto::{
    load_private_key, load_public_key, unwrap_block, wrap_block, CipherConfig, KeyUnwrap,
    KeyWrap, KeyWrapConfig, OaepDigest,
};
use envelope::errors::EnvelopeError;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

// ---------------------------------------------------------------------------
// Key loading
// ---------------------------------------------------------------------------

#[test]
fn pkcs8_key_pair_loads_with_matching_ids() {
    let private = load_private_key(&fixture("alice.pem")).expect("private key");
    let public = load_public_key(&fixture("alice.pub.pem")).expect("public key");

    assert_eq!(KeyUnwrap::key_id(&private), KeyWrap::key_id(&public));
    assert_eq!(KeyWrap::key_id(&public).len(), 64);
}

#[test]
fn pkcs1_key_pair_loads() {
    let private = load_private_key(&fixture("carol.pem")).expect("PKCS#1 private key");
    let public = load_public_key(&fixture("carol.pub.pem")).expect("PKCS#1 public key");
    assert_eq!(KeyUnwrap::key_id(&private), KeyWrap::key_id(&public));
}

#[test]
fn different_key_pairs_have_different_ids() {
    let alice = load_public_key(&fixture("alice.pub.pem")).unwrap();
    let bob = load_public_key(&fixture("bob.pub.pem")).unwrap();
    assert_ne!(alice.key_id(), bob.key_id());
}

#[test]
fn keys_under_2048_bits_are_rejected() {
    let err = load_public_key(&fixture("weak.pub.pem")).unwrap_err();
    assert!(matches!(err, EnvelopeError::Key(_)));
    assert!(err.to_string().contains("1024 bits"), "got: {err}");

    assert!(matches!(
        load_private_key(&fixture("weak.pem")),
        Err(EnvelopeError::Key(_))
    ));
}

#[test]
fn private_key_is_not_a_public_key() {
    let pem = std::fs::read_to_string(fixture("alice.pem")).unwrap();
    assert!(matches!(parse_public_key(&pem), Err(EnvelopeError::Key(_))));
}

// ---------------------------------------------------------------------------
// RSA-OAEP wrapping
// ---------------------------------------------------------------------------

#[test]
fn wrap_unwrap_roundtrip_for_both_digests() {
    let private = load_private_key(&fixture("alice.pem")).unwrap();
    let public = load_public_key(&fixture("alice.pub.pem")).unwrap();

    for digest in [OaepDigest::Sha1, OaepDigest::Sha256] {
        let scheme = KeyWrapConfig::with_digest(digest);
        let block = wrap_block(b"0011223344556677", &public, &scheme).expect("wrap");

        // A 2048-bit modulus gives 256 bytes of ciphertext: 344 base64
        // characters over six lines.
        assert_eq!(block.lines().count(), 6);
        assert!(block.ends_with('\n'));

        let unwrapped = unwrap_block(&block, &private, &scheme).expect("unwrap");
        assert_eq!(unwrapped.as_slice(), b"0011223344556677");
    }
}

#[test]
fn wrapping_is_randomized() {
    let public = load_public_key(&fixture("alice.pub.pem")).unwrap();
    let scheme = KeyWrapConfig::default();

    let a = wrap_block(b"same input", &public, &scheme).unwrap();
    let b = wrap_block(b"same input", &public, &scheme).unwrap();
    assert_ne!(a, b, "OAEP must not be deterministic");
}

#[test]
fn unwrap_with_wrong_key_is_a_cipher_error() {
    let alice = load_public_key(&fixture("alice.pub.pem")).unwrap();
    let bob = load_private_key(&fixture("bob.pem")).unwrap();
    let scheme = KeyWrapConfig::default();

    let block = wrap_block(b"secret", &alice, &scheme).unwrap();
    assert!(matches!(
        unwrap_block(&block, &bob, &scheme),
        Err(EnvelopeError::Cipher(_))
    ));
}

#[test]
fn unwrap_with_mismatched_digest_is_a_cipher_error() {
    let private = load_private_key(&fixture("alice.pem")).unwrap();
    let public = load_public_key(&fixture("alice.pub.pem")).unwrap();

    let block = wrap_block(b"secret", &public, &KeyWrapConfig::default()).unwrap();
    let sha1 = KeyWrapConfig::with_digest(OaepDigest::Sha1);
    assert!(matches!(
        unwrap_block(&block, &private, &sha1),
        Err(EnvelopeError::Cipher(_))
    ));
}

#[test]
fn wrap_enforces_oaep_input_limit() {
    let public = load_public_key(&fixture("alice.pub.pem")).unwrap();
    let scheme = KeyWrapConfig::default();
    let limit = scheme.max_input_len(256);
    assert_eq!(limit, 190);

    assert!(wrap_block(&vec![b'x'; limit], &public, &scheme).is_ok());

    let err = wrap_block(&vec![b'x'; limit + 1], &public, &scheme).unwrap_err();
    assert!(matches!(err, EnvelopeError::Cipher(_)));
    assert!(err.to_string().contains("at most 190"));
}

#[test]
fn fresh_secrets_fit_under_a_2048_bit_key() {
    let public = load_public_key(&fixture("alice.pub.pem")).unwrap();
    let scheme = KeyWrapConfig::with_digest(OaepDigest::Sha256);

    let key_material = generate_key_material().unwrap();
    let salt = generate_salt(64).unwrap();

    assert_eq!(key_material.len(), KEY_MATERIAL_LEN);
    assert!(wrap_block(key_material.as_bytes(), &public, &scheme).is_ok());
    assert!(wrap_block(salt.as_bytes(), &public, &scheme).is_ok());
}

// ---------------------------------------------------------------------------
// Symmetric layer
// ---------------------------------------------------------------------------

#[test]
fn symmetric_roundtrip_with_generated_secrets() {
    let config: CipherConfig = "-aes-256-cbc -pbkdf2 -md sha256 -iter 1000 -saltlen 16"
        .parse()
        .unwrap();
    let salt_hex = generate_salt(config.salt_len).unwrap();
    let salt = decode_salt(salt_hex.as_bytes(), &config).unwrap();
    let passphrase = generate_key_material().unwrap();

    let key = symmetric::derive_key(passphrase.as_bytes(), &salt, &config).unwrap();
    let block = symmetric::encrypt(b"DATABASE_URL=postgres://localhost/db", &key, &config).unwrap();
    let plaintext = symmetric::decrypt(&block, &key, &config).unwrap();

    assert_eq!(plaintext, b"DATABASE_URL=postgres://localhost/db");
}

#[test]
fn symmetric_decrypt_with_wrong_passphrase_fails() {
    let config: CipherConfig = "-aes-128-cbc -pbkdf2 -md sha256 -iter 1000 -saltlen 8"
        .parse()
        .unwrap();
    let salt = [7u8; 8];

    let right = symmetric::derive_key(b"right", &salt, &config).unwrap();
    let wrong = symmetric::derive_key(b"wrong", &salt, &config).unwrap();
    let block = symmetric::encrypt(&[0x42; 100], &right, &config).unwrap();

    // CBC with PKCS#7 either rejects the padding or yields garbage; it
    // never yields the original bytes.
    match symmetric::decrypt(&block, &wrong, &config) {
        Err(e) => assert!(matches!(e, EnvelopeError::Cipher(_))),
        Ok(bytes) => assert_ne!(bytes, vec![0x42; 100]),
    }
}
