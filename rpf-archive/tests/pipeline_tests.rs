mod common;

use std::fs;

use base64::{engine::general_purpose::STANDARD, Engine};
use common::standard_archive;
use pretty_assertions::{assert_eq, assert_ne};
use rpf_archive::{decrypt_and_dump, decrypt_and_dump_in, decrypt_resource, dump_archive, Error};
use rpf_crypto::chacha::encrypt_chacha20;
use rpf_crypto::derive_key;
use tempfile::TempDir;

const SEED: &[u8] = b"fixture-key-seed";
const IV: [u8; 8] = [0x10, 0x32, 0x54, 0x76, 0x98, 0xBA, 0xDC, 0xFE];

/// Assemble a token whose deobfuscation yields `SEED` and `IV`: 19 framing
/// bytes, the seed XORed with 0x69, two padding bytes, then the IV.
fn make_token() -> String {
    let mut raw = vec![0xCCu8; 19];
    raw.extend(SEED.iter().map(|b| b ^ 0x69));
    raw.extend_from_slice(&[0x00, 0x00]);
    raw.extend_from_slice(&IV);
    STANDARD.encode(raw)
}

fn encrypt_with(target: Option<&str>, plaintext: &[u8]) -> Vec<u8> {
    let key = derive_key(SEED, target);
    let mut data = plaintext.to_vec();
    encrypt_chacha20(&mut data, &key, &IV).unwrap();
    data
}

#[test]
fn decrypt_and_dump_mirrors_the_tree() {
    let _ = tracing_subscriber::fmt::try_init();

    let ciphertext = encrypt_with(None, &standard_archive());
    let dest = TempDir::new().unwrap();

    let outcome = decrypt_and_dump(&make_token(), &ciphertext[..], dest.path(), None).unwrap();

    assert_eq!(outcome.output_dir, dest.path());
    assert_eq!(outcome.summary.extracted, 4);
    assert_eq!(outcome.summary.failed, 0);

    assert_eq!(
        fs::read(dest.path().join("config.json")).unwrap(),
        b"{\"name\":\"demo\"}"
    );
    assert_eq!(
        fs::read(dest.path().join("readme.txt")).unwrap(),
        b"hello packfile"
    );
    assert_eq!(
        fs::read(dest.path().join("assets/a.dat")).unwrap(),
        vec![0xAA; 16]
    );
    assert_eq!(fs::read(dest.path().join("assets/b.dat")).unwrap(), b"bb");
}

#[test]
fn decrypt_and_dump_in_uses_the_given_scratch_dir() {
    let ciphertext = encrypt_with(None, &standard_archive());
    let dest = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();

    let outcome = decrypt_and_dump_in(
        &make_token(),
        &ciphertext[..],
        dest.path(),
        None,
        scratch.path(),
    )
    .unwrap();

    assert_eq!(outcome.summary.extracted, 4);
    assert!(dest.path().join("assets/a.dat").exists());
    // The scratch copy was removed once the dump finished.
    assert!(fs::read_dir(scratch.path()).unwrap().next().is_none());
}

#[test]
fn decrypt_and_dump_rejects_wrong_target_name() {
    // A key derived for another asset name decrypts to garbage, which
    // fails container validation rather than extracting junk.
    let ciphertext = encrypt_with(Some("other.rpf"), &standard_archive());
    let dest = TempDir::new().unwrap();

    let err = decrypt_and_dump(&make_token(), &ciphertext[..], dest.path(), None).unwrap_err();
    assert!(matches!(err, Error::BadMagic(_)));

    // Nothing was extracted.
    assert!(fs::read_dir(dest.path()).unwrap().next().is_none());
}

#[test]
fn decrypt_and_dump_propagates_token_errors() {
    let dest = TempDir::new().unwrap();
    let err = decrypt_and_dump("AAAA", &b""[..], dest.path(), None).unwrap_err();
    assert!(matches!(
        err,
        Error::Crypto(rpf_crypto::CryptoError::TokenTooShort { .. })
    ));
}

#[test]
fn decrypt_resource_writes_raw_plaintext() {
    let plaintext = b"not a container, just bytes";
    let ciphertext = encrypt_with(Some("model.ytd"), plaintext);

    let dest = TempDir::new().unwrap();
    let output = dest.path().join("stream/model.ytd");

    let outcome =
        decrypt_resource(&make_token(), &ciphertext[..], &output, Some("model.ytd")).unwrap();

    assert_eq!(outcome.output_path, output);
    assert_eq!(outcome.decrypted_len, plaintext.len());
    assert_eq!(fs::read(&output).unwrap(), plaintext);
}

#[test]
fn decrypt_resource_key_is_bound_to_target_name() {
    let plaintext = b"per-file key diversification";
    let ciphertext = encrypt_with(Some("a.ytd"), plaintext);

    let dest = TempDir::new().unwrap();
    let output = dest.path().join("b.ytd");

    // Decrypting under the wrong name succeeds (no authentication) but
    // yields garbage.
    let outcome =
        decrypt_resource(&make_token(), &ciphertext[..], &output, Some("b.ytd")).unwrap();
    assert_eq!(outcome.decrypted_len, plaintext.len());
    assert_ne!(fs::read(&output).unwrap(), plaintext);
}

#[test]
fn dump_archive_extracts_a_decrypted_container() {
    let scratch = TempDir::new().unwrap();
    let archive_path = scratch.path().join("resource.rpf");
    fs::write(&archive_path, standard_archive()).unwrap();

    let dest = TempDir::new().unwrap();
    let summary = dump_archive(&archive_path, dest.path()).unwrap();

    assert_eq!(summary.extracted, 4);
    assert!(dest.path().join("assets/b.dat").exists());
}
