//! Build script for harp-container.
//!
//! This emits compile-time warnings for security-sensitive feature flags.

fn main() {
    // Emit a compile-time warning when the unauthenticated-unseal feature is enabled
    #[cfg(feature = "unauthenticated-unseal")]
    {
        // Note: Using single-colon syntax for MSRV 1.75.0 compatibility
        println!("cargo:warning=SECURITY WARNING: The 'unauthenticated-unseal' feature is enabled.");
        println!("cargo:warning=Containers may be opened without verifying the producer signature.");
        println!("cargo:warning=An attacker who can substitute a sealed container will not be detected.");
        println!("cargo:warning=Keep this feature disabled unless signatures are verified out-of-band.");
    }
}
