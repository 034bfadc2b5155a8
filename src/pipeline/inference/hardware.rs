//! Where does inference actually run?
//!
//! Ollama reports, per loaded model, how many bytes sit in VRAM (`/api/ps`).
//! That split is the only acceleration signal a local runtime exposes, so it
//! stands in for a GPU capability check.

use serde::{Deserialize, Serialize};

use super::ollama::{OllamaClient, RunningModelInfo};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpuTier {
    FullGpu,
    PartialGpu,
    CpuOnly,
}

impl std::fmt::Display for GpuTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FullGpu => write!(f, "Full GPU"),
            Self::PartialGpu => write!(f, "Partial GPU"),
            Self::CpuOnly => write!(f, "CPU only"),
        }
    }
}

/// Snapshot of loaded-model placement. Unknown placement counts as CPU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareProfile {
    pub vram_bytes: u64,
    pub total_model_bytes: u64,
    /// Human-readable summary, e.g. "GPU (1 model)" or "CPU".
    pub processor_label: String,
}

impl HardwareProfile {
    /// Aggregate `/api/ps` entries.
    pub fn from_running(models: &[RunningModelInfo]) -> Self {
        if models.is_empty() {
            return Self::unknown("no model loaded");
        }

        let total_model_bytes: u64 = models.iter().map(|m| m.size).sum();
        let vram_bytes: u64 = models.iter().map(|m| m.size_vram).sum();
        let on_gpu = models.iter().filter(|m| m.size_vram > 0).count();

        let processor_label = match on_gpu {
            0 => "CPU".to_string(),
            n if n == models.len() => format!("GPU ({n} model(s))"),
            n => format!("Mixed ({n}/{} on GPU)", models.len()),
        };

        Self {
            vram_bytes,
            total_model_bytes,
            processor_label,
        }
    }

    fn unknown(why: &str) -> Self {
        Self {
            vram_bytes: 0,
            total_model_bytes: 0,
            processor_label: format!("CPU ({why})"),
        }
    }

    pub fn gpu_tier(&self) -> GpuTier {
        if self.total_model_bytes == 0 || self.vram_bytes == 0 {
            GpuTier::CpuOnly
        } else if self.vram_bytes >= self.total_model_bytes {
            GpuTier::FullGpu
        } else {
            GpuTier::PartialGpu
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Detection
// ═══════════════════════════════════════════════════════════

/// Query `/api/ps`. Detection failures fall back to CPU.
pub fn detect_hardware(client: &OllamaClient) -> HardwareProfile {
    let _span = tracing::info_span!("hardware_detect").entered();

    let profile = match client.list_running_models() {
        Ok(models) => HardwareProfile::from_running(&models),
        Err(e) => {
            tracing::warn!(error = %e, "Hardware detection failed, assuming CPU");
            HardwareProfile::unknown("detection unavailable")
        }
    };

    tracing::info!(
        gpu_tier = %profile.gpu_tier(),
        vram_mb = profile.vram_bytes / 1_000_000,
        total_mb = profile.total_model_bytes / 1_000_000,
        "Hardware profile detected"
    );
    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(size: u64, size_vram: u64) -> RunningModelInfo {
        RunningModelInfo {
            name: "llama3.2:3b".into(),
            size,
            size_vram,
        }
    }

    #[test]
    fn tiers_follow_vram_share() {
        assert_eq!(
            HardwareProfile::from_running(&[running(3_000, 3_000)]).gpu_tier(),
            GpuTier::FullGpu
        );
        assert_eq!(
            HardwareProfile::from_running(&[running(3_000, 1_200)]).gpu_tier(),
            GpuTier::PartialGpu
        );
        assert_eq!(
            HardwareProfile::from_running(&[running(3_000, 0)]).gpu_tier(),
            GpuTier::CpuOnly
        );
    }

    #[test]
    fn nothing_loaded_counts_as_cpu() {
        let profile = HardwareProfile::from_running(&[]);
        assert_eq!(profile.gpu_tier(), GpuTier::CpuOnly);
        assert!(profile.processor_label.starts_with("CPU"));
    }

    #[test]
    fn mixed_placement_is_labelled() {
        let profile = HardwareProfile::from_running(&[running(100, 100), running(100, 0)]);
        assert_eq!(profile.processor_label, "Mixed (1/2 on GPU)");
        assert_eq!(profile.gpu_tier(), GpuTier::PartialGpu);
    }

    #[test]
    fn unreachable_runtime_falls_back_to_cpu() {
        let client = OllamaClient::new("http://127.0.0.1:1").unwrap();
        assert_eq!(detect_hardware(&client).gpu_tier(), GpuTier::CpuOnly);
    }

    #[test]
    fn tier_display() {
        assert_eq!(GpuTier::CpuOnly.to_string(), "CPU only");
        assert_eq!(
            serde_json::to_string(&GpuTier::PartialGpu).unwrap(),
            "\"partial_gpu\""
        );
    }
}
