/*!
 * Model preparation: export a model locally, then push it with the upload engine
 *
 * Exporting a model (fetching weights, assembling a pipeline, writing it out)
 * is done by an external command. This module picks the model family, runs
 * the exporter when the destination is not already prepared, and leaves the
 * upload to `core::Orchestrator`.
 */

use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, SyncError};

/// Default model exported when none is named
pub const DEFAULT_MODEL: &str = "ByteDance/SDXL-Lightning";

/// Default scratch directory for exported models
pub const DEFAULT_DESTDIR: &str = "local_setup";

/// File written by every successful export
pub const MODEL_INDEX_FILE: &str = "model_index.json";

/// How a model is assembled before export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    /// SDXL base pipeline with the distilled 4-step UNet swapped in
    SdxlLightning,

    /// Any other repository, exported as published
    Generic,
}

impl ModelFamily {
    pub fn for_model(model_name: &str) -> Self {
        match model_name {
            "ByteDance/SDXL-Lightning" => ModelFamily::SdxlLightning,
            _ => ModelFamily::Generic,
        }
    }

    /// Tag passed to the exporter
    pub fn tag(&self) -> &'static str {
        match self {
            ModelFamily::SdxlLightning => "sdxl-lightning",
            ModelFamily::Generic => "generic",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Whether `destdir` already holds an exported model
pub fn is_prepared(destdir: &Path) -> bool {
    destdir.join(MODEL_INDEX_FILE).is_file()
}

/// External command that writes a model into a directory
///
/// Invoked as `<command...> <model-name> <family-tag> <destdir>`.
#[derive(Debug, Clone)]
pub struct ModelExporter {
    program: String,
    args: Vec<String>,
}

impl ModelExporter {
    /// Parse a whitespace-separated command line
    ///
    /// `None` or an empty command means no exporter is configured.
    pub fn from_command(command: Option<&str>) -> Result<Self> {
        let mut parts = command.unwrap_or_default().split_whitespace();
        let program = parts.next().ok_or_else(|| {
            SyncError::CapabilityUnavailable(
                "no model exporter configured (set --exporter or MODEL_EXPORTER)".to_string(),
            )
        })?;

        Ok(Self {
            program: program.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }

    /// Run the exporter for `model_name` into `destdir`
    pub async fn export(&self, model_name: &str, family: ModelFamily, destdir: &Path) -> Result<()> {
        info!(
            "Exporting {} ({}) to {} with {}",
            model_name,
            family,
            destdir.display(),
            self.program
        );

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(model_name)
            .arg(family.tag())
            .arg(destdir)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    SyncError::CapabilityUnavailable(format!(
                        "model exporter {:?} cannot be run: {}",
                        self.program, e
                    ))
                }
                _ => SyncError::Io(e),
            })?;

        if !status.success() {
            return Err(SyncError::CapabilityUnavailable(format!(
                "model exporter {:?} failed for {}: {}",
                self.program, model_name, status
            )));
        }

        if !is_prepared(destdir) {
            return Err(SyncError::filesystem(
                destdir.join(MODEL_INDEX_FILE),
                "exporter finished without writing the model index",
            ));
        }
        Ok(())
    }
}

/// What `prepare_model` did before the upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareOutcome {
    Exported,
    AlreadyPrepared,
}

/// Make sure `destdir` holds an export of `model_name`
///
/// The exporter is only resolved when an export is actually needed, so an
/// already-prepared directory can be uploaded on a host without one.
pub async fn prepare_model(
    model_name: &str,
    destdir: &Path,
    exporter: Option<&str>,
) -> Result<PrepareOutcome> {
    tokio::fs::create_dir_all(destdir)
        .await
        .map_err(|e| SyncError::filesystem(destdir, e))?;

    if is_prepared(destdir) {
        info!(
            "{} already holds a prepared model, skipping export",
            destdir.display()
        );
        return Ok(PrepareOutcome::AlreadyPrepared);
    }

    let family = ModelFamily::for_model(model_name);
    debug!(model = model_name, family = %family, "Resolved model family");

    ModelExporter::from_command(exporter)?
        .export(model_name, family, destdir)
        .await?;
    Ok(PrepareOutcome::Exported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_model_family_table() {
        assert_eq!(
            ModelFamily::for_model("ByteDance/SDXL-Lightning"),
            ModelFamily::SdxlLightning
        );
        assert_eq!(
            ModelFamily::for_model("stabilityai/stable-diffusion-xl-base-1.0"),
            ModelFamily::Generic
        );
        assert_eq!(ModelFamily::SdxlLightning.to_string(), "sdxl-lightning");
    }

    #[test]
    fn test_exporter_parsing() {
        let exporter = ModelExporter::from_command(Some("python3 export.py --fp16")).unwrap();
        assert_eq!(exporter.program, "python3");
        assert_eq!(exporter.args, vec!["export.py", "--fp16"]);

        assert!(matches!(
            ModelExporter::from_command(None),
            Err(SyncError::CapabilityUnavailable(_))
        ));
        assert!(matches!(
            ModelExporter::from_command(Some("   ")),
            Err(SyncError::CapabilityUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_prepared_directory_skips_export() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(MODEL_INDEX_FILE), b"{}").unwrap();

        let outcome = prepare_model(DEFAULT_MODEL, dir.path(), None).await.unwrap();
        assert_eq!(outcome, PrepareOutcome::AlreadyPrepared);
    }

    #[tokio::test]
    async fn test_missing_exporter_is_capability_error() {
        let dir = tempdir().unwrap();
        let err = prepare_model(DEFAULT_MODEL, &dir.path().join("out"), None)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CAPABILITY);
        assert!(dir.path().join("out").is_dir());
    }

    #[tokio::test]
    async fn test_unknown_exporter_binary_is_capability_error() {
        let dir = tempdir().unwrap();
        let err = prepare_model(
            DEFAULT_MODEL,
            dir.path(),
            Some("model-sync-no-such-exporter-binary"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SyncError::CapabilityUnavailable(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_script_exporter_writes_model() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("export.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\nmkdir -p \"$3/unet\"\necho \"$1 $2\" > \"$3/unet/source.txt\"\necho '{}' > \"$3/model_index.json\"\n",
        )
        .unwrap();
        let command = format!("sh {}", script.display());

        let destdir = dir.path().join("local_setup");
        let outcome = prepare_model(DEFAULT_MODEL, &destdir, Some(&command))
            .await
            .unwrap();

        assert_eq!(outcome, PrepareOutcome::Exported);
        assert!(is_prepared(&destdir));
        assert_eq!(
            std::fs::read_to_string(destdir.join("unet/source.txt")).unwrap(),
            "ByteDance/SDXL-Lightning sdxl-lightning\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_exporter_is_reported() {
        let dir = tempdir().unwrap();
        let err = prepare_model(DEFAULT_MODEL, &dir.path().join("out"), Some("false"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::CapabilityUnavailable(_)));
    }
}
