//! Build script for qcscan - embeds the git commit hash into `--version`.
//!
//! Dev builds emit `VERGEN_GIT_SHA`. Builds with `--features release` emit
//! nothing, and `cli::version()` falls back to the bare package version.

fn main() {
    #[cfg(not(feature = "release"))]
    {
        use vergen_gitcl::{Emitter, GitclBuilder};

        let git = GitclBuilder::default()
            .sha(true)
            .build()
            .expect("Failed to configure git info");

        let emitted = Emitter::default()
            .add_instructions(&git)
            .and_then(|emitter| emitter.emit());

        if let Err(e) = emitted {
            // Source tarballs have no .git directory; keep the build going.
            println!("cargo:warning=Failed to get git info: {}", e);
            println!("cargo:rustc-env=VERGEN_GIT_SHA=unknown");
        }
    }
}
