use std::process::Command;
use sysinfo::System;
use tracing::debug;

/// Model class and compute device picked for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChoice {
    pub model_class: String,
    pub device: String,
}

/// Pick a recognizer model class and device from host resources.
///
/// Side-effect free apart from probing the host; callers invoke it
/// explicitly at the point of use, once per run.
pub fn select_model_and_device() -> ModelChoice {
    let mut system = System::new_all();
    system.refresh_memory();
    let memory_gb = system.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0);

    select_from_resources(
        std::env::consts::OS,
        std::env::consts::ARCH,
        memory_gb,
        detect_nvidia_vram_gb(),
    )
}

/// The selection ladder, separated from host probing so it can be tested.
fn select_from_resources(
    os: &str,
    arch: &str,
    memory_gb: f64,
    nvidia_vram_gb: Option<f64>,
) -> ModelChoice {
    // Apple Silicon: MPS can be numerically unstable for this workload, so
    // the device stays on CPU and the model scales with unified memory.
    if os == "macos" && arch == "aarch64" {
        let model_class = if memory_gb < 8.0 { "small" } else { "medium" };
        return ModelChoice {
            model_class: model_class.to_string(),
            device: "cpu".to_string(),
        };
    }

    if let Some(vram_gb) = nvidia_vram_gb {
        let model_class = if vram_gb > 10.0 {
            "large-v3"
        } else if vram_gb > 5.0 {
            "medium"
        } else {
            "small"
        };
        return ModelChoice {
            model_class: model_class.to_string(),
            device: "cuda".to_string(),
        };
    }

    let model_class = if memory_gb >= 8.0 { "small" } else { "base" };
    ModelChoice {
        model_class: model_class.to_string(),
        device: "cpu".to_string(),
    }
}

/// Total VRAM of the first NVIDIA GPU, if one is present.
fn detect_nvidia_vram_gb() -> Option<f64> {
    let output = Command::new("nvidia-smi")
        .arg("--query-gpu=memory.total")
        .arg("--format=csv,noheader,nounits")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8(output.stdout).ok()?;
    let vram_mb: f64 = stdout.lines().next()?.trim().parse().ok()?;
    debug!("Detected NVIDIA GPU with {} MB VRAM", vram_mb);

    Some(vram_mb / 1024.0)
}
