//! 构建测试用的原生模块替身
//!
//! `tests/native/amapi_fixture.c` 编译为两个动态库（完整入口点集合 / 缺少 `AmMetersToScale`），
//! 路径通过 `AMAPI_FIXTURE_FULL` / `AMAPI_FIXTURE_PARTIAL` 传给测试。
//! 没有可用的 C 编译器时只给出警告，相关测试跳过。

use std::env;
use std::path::{Path, PathBuf};

const FIXTURE_SOURCE: &str = "tests/native/amapi_fixture.c";

fn main() {
    println!("cargo:rerun-if-changed={}", FIXTURE_SOURCE);
    println!("cargo:rerun-if-changed=build.rs");

    let Some(out_dir) = env::var_os("OUT_DIR").map(PathBuf::from) else {
        return;
    };
    let (prefix, suffix) = match env::var("CARGO_CFG_TARGET_OS").as_deref() {
        Ok("windows") => ("", "dll"),
        Ok("macos") | Ok("ios") => ("lib", "dylib"),
        _ => ("lib", "so"),
    };

    for (name, env_key, partial) in [
        ("amapi_fixture_full", "AMAPI_FIXTURE_FULL", false),
        ("amapi_fixture_partial", "AMAPI_FIXTURE_PARTIAL", true),
    ] {
        let output = out_dir.join(format!("{}{}.{}", prefix, name, suffix));
        match build_fixture(&out_dir, name, &output, partial) {
            Ok(()) => println!("cargo:rustc-env={}={}", env_key, output.display()),
            Err(reason) => println!("cargo:warning=native test fixture {} not built: {}", name, reason),
        }
    }
}

fn build_fixture(out_dir: &Path, name: &str, output: &Path, partial: bool) -> Result<(), String> {
    let compiler = cc::Build::new()
        .cargo_metadata(false)
        .try_get_compiler()
        .map_err(|e| e.to_string())?;
    let mut cmd = compiler.to_command();

    if compiler.is_like_msvc() {
        if partial {
            cmd.arg("/DAMAPI_FIXTURE_PARTIAL");
        }
        cmd.arg("/LD")
            .arg(FIXTURE_SOURCE)
            .arg(format!("/Fo{}", out_dir.join(format!("{}.obj", name)).display()))
            .arg(format!("/Fe{}", output.display()));
    } else {
        if partial {
            cmd.arg("-DAMAPI_FIXTURE_PARTIAL");
        }
        cmd.args(["-shared", "-fPIC"])
            .arg(FIXTURE_SOURCE)
            .arg("-o")
            .arg(output);
    }

    let status = cmd.status().map_err(|e| e.to_string())?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("compiler exited with {}", status))
    }
}
