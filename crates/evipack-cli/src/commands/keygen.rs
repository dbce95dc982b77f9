//! Keygen command implementation.
//!
//! Convenience only; key storage and rotation policy is the operator's
//! responsibility.

use std::fs;

use evipack_core::Keypair;

pub fn run(out: String) -> Result<(), Box<dyn std::error::Error>> {
    let keypair = Keypair::generate();
    let public_path = format!("{}.pub", out);

    fs::write(&out, keypair.secret_hex())?;
    fs::write(&public_path, keypair.public_key_hex())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&out, fs::Permissions::from_mode(0o600))?;
    }

    println!("Secret key: {}", out);
    println!("Public key: {}", public_path);

    Ok(())
}
