fn main() {
    if let Ok(target) = std::env::var("TARGET") {
        println!("cargo:rustc-env=UARTFRAME_BUILD_TARGET={target}");
    }

    // CI exports GITHUB_SHA; release builds may pin GIT_HASH explicitly.
    let hash = std::env::var("GIT_HASH")
        .or_else(|_| std::env::var("GITHUB_SHA"))
        .ok()
        .filter(|hash| !hash.trim().is_empty());
    if let Some(hash) = hash {
        let short: String = hash.trim().chars().take(12).collect();
        println!("cargo:rustc-env=UARTFRAME_GIT_HASH={short}");
    }

    println!("cargo:rerun-if-env-changed=TARGET");
    println!("cargo:rerun-if-env-changed=GIT_HASH");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
}
