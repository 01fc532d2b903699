use std::env;
use std::path::PathBuf;

// ffmpeg-sys-next finds FFmpeg through pkg-config on Unix. On Windows it
// needs FFMPEG_DIR, so point users at a vcpkg install when one is present.
fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let windows = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "windows");
    if !windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=activity_meter needs FFmpeg development libraries; set FFMPEG_DIR (or VCPKG_ROOT for a vcpkg install)."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);

    if !candidate.exists() {
        println!(
            "cargo:warning=No vcpkg FFmpeg found at {}; install ffmpeg through vcpkg or set FFMPEG_DIR.",
            candidate.display(),
        );
        return;
    }

    println!(
        "cargo:warning=Found vcpkg FFmpeg at {0}. Export FFMPEG_DIR={0} to use it.",
        candidate.display(),
    );
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        println!("cargo:warning=Set VCPKGRS_DYNAMIC=1 if the vcpkg FFmpeg build is dynamic.");
    }
}
