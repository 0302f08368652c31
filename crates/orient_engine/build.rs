// build.rs
// Compiles the GLSL sources under resources/shaders to SPIR-V in target/shaders

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

const SHADER_EXTENSIONS: [&str; 2] = ["vert", "frag"];

/// Compile one shader stage if the source is newer than its SPIR-V output
fn compile_shader(glslc: &str, source: &Path, target_dir: &Path) -> bool {
    let Some(file_name) = source.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    // basic.vert -> basic_vert.spv so both stages of one program can coexist
    let out_file = target_dir.join(format!("{}.spv", file_name.replace('.', "_")));

    let needs_compile = match (std::fs::metadata(source), std::fs::metadata(&out_file)) {
        (Ok(src_meta), Ok(dst_meta)) => match (src_meta.modified(), dst_meta.modified()) {
            (Ok(src_time), Ok(dst_time)) => src_time > dst_time,
            _ => true,
        },
        _ => true,
    };

    if !needs_compile {
        eprintln!("info: Shader {file_name} is up to date");
        return false;
    }

    let status = Command::new(glslc)
        .arg(source)
        .arg("-o")
        .arg(&out_file)
        .status();

    match status {
        Ok(s) if s.success() => {
            eprintln!("info: Compiled {} -> {}", file_name, out_file.display());
            true
        }
        Ok(s) => {
            eprintln!("error: glslc failed for {} with exit code: {}", source.display(), s.code().unwrap_or(-1));
            panic!("Shader compilation failed");
        }
        Err(e) => {
            eprintln!("error: Failed to run glslc for {}: {}", source.display(), e);
            panic!("Failed to execute shader compiler");
        }
    }
}

fn main() {
    println!("cargo:rerun-if-changed=../../resources/shaders");
    println!("cargo:rerun-if-env-changed=SKIP_SHADERS");

    if env::var("SKIP_SHADERS").is_ok() {
        eprintln!("info: Skipping shader compilation (SKIP_SHADERS set)");
        return;
    }

    let vulkan_sdk = match env::var("VULKAN_SDK") {
        Ok(sdk) => sdk,
        Err(_) => {
            println!("cargo:rerun-if-env-changed=VULKAN_SDK");
            eprintln!("warning: VULKAN_SDK not set, shader compilation skipped");
            eprintln!("hint: Install Vulkan SDK and set VULKAN_SDK environment variable");
            return;
        }
    };

    let glslc = if cfg!(target_os = "windows") {
        format!("{vulkan_sdk}\\Bin\\glslc.exe")
    } else {
        format!("{vulkan_sdk}/bin/glslc")
    };

    if !Path::new(&glslc).exists() {
        eprintln!("error: glslc not found at: {glslc}");
        eprintln!("hint: Ensure Vulkan SDK is properly installed");
        panic!("Shader compiler not found");
    }

    let shader_dir = PathBuf::from("../../resources/shaders");
    let target_dir = PathBuf::from("../../target/shaders");

    if let Err(e) = std::fs::create_dir_all(&target_dir) {
        eprintln!("warning: Failed to create target directory: {e}");
        return;
    }

    let entries = match std::fs::read_dir(&shader_dir) {
        Ok(entries) => entries,
        Err(_) => {
            eprintln!("info: No shader directory found at: {}", shader_dir.display());
            return;
        }
    };

    let mut compiled_count = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_shader = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SHADER_EXTENSIONS.contains(&ext));

        if is_shader && compile_shader(&glslc, &path, &target_dir) {
            compiled_count += 1;
        }
    }

    if compiled_count > 0 {
        eprintln!("info: Successfully compiled {compiled_count} shader(s)");
    } else {
        eprintln!("info: All shaders are up to date");
    }
}
