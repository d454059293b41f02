// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Salted PBKDF2 password hashes.
//!
//! Stored form: `pbkdf2-sha256$<iterations>$<salt>$<hash>` with salt and hash
//! in unpadded standard base64. The iteration count travels with the hash, so
//! raising it only affects newly registered users.

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = ring::digest::SHA256_OUTPUT_LEN;

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> anyhow::Result<String> {
    let iterations = NonZeroU32::new(iterations).context("PBKDF2 iteration count must be > 0")?;

    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| anyhow::anyhow!("System random generator failed"))?;

    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    Ok(format!(
        "{SCHEME}${}${}${}",
        iterations,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    ))
}

/// Check `password` against an encoded hash in constant time.
///
/// Malformed hashes never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let Some((iterations, salt, hash)) = decode(encoded) else {
        tracing::warn!("Stored password hash is malformed");
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}

fn decode(encoded: &str) -> Option<(NonZeroU32, Vec<u8>, Vec<u8>)> {
    let mut parts = encoded.split('$');
    if parts.next()? != SCHEME {
        return None;
    }
    let iterations = NonZeroU32::new(parts.next()?.parse().ok()?)?;
    let salt = STANDARD_NO_PAD.decode(parts.next()?).ok()?;
    let hash = STANDARD_NO_PAD.decode(parts.next()?).ok()?;
    if parts.next().is_some() || hash.len() != HASH_LEN {
        return None;
    }
    Some((iterations, salt, hash))
}
