//! Bundling and rendering through the Remotion CLI (`npx remotion ...`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use super::{Bundler, RenderProps, Renderer};
use crate::error::ExternalError;
use crate::media::process::run_command;

const NPX: &str = "npx";
const BUNDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const RENDER_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub struct RemotionCli {
    composition_id: String,
    work_root: PathBuf,
}

impl RemotionCli {
    /// Bundles and temporary render files are created under `work_root`.
    pub fn new(composition_id: impl Into<String>, work_root: impl Into<PathBuf>) -> Self {
        Self {
            composition_id: composition_id.into(),
            work_root: work_root.into(),
        }
    }

    fn scratch_path(&self, prefix: &str, extension: &str) -> PathBuf {
        self.work_root.join(format!(
            "{}-{}{}",
            prefix,
            uuid::Uuid::new_v4().simple(),
            extension
        ))
    }

    fn render_arguments(
        &self,
        bundle: &Path,
        output: &Path,
        props_file: &Path,
        concurrency: usize,
    ) -> Vec<String> {
        vec![
            "remotion".to_string(),
            "render".to_string(),
            bundle.to_string_lossy().into_owned(),
            self.composition_id.clone(),
            output.to_string_lossy().into_owned(),
            format!("--props={}", props_file.display()),
            format!("--concurrency={}", concurrency.max(1)),
            "--codec=h264".to_string(),
            "--x264-preset=veryfast".to_string(),
            "--hardware-acceleration=if-possible".to_string(),
            "--log=error".to_string(),
        ]
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        log::debug!("Failed to remove {}: {}", path.display(), e);
    }
}

#[async_trait]
impl Bundler for RemotionCli {
    async fn bundle(&self, entry_point: &Path, public_dir: &Path) -> Result<PathBuf, ExternalError> {
        let out_dir = self.scratch_path("remotion-bundle", "");
        log::info!("Bundling render project {}", entry_point.display());

        run_command(
            NPX,
            [
                "remotion".to_string(),
                "bundle".to_string(),
                entry_point.to_string_lossy().into_owned(),
                format!("--public-dir={}", public_dir.display()),
                format!("--out-dir={}", out_dir.display()),
            ],
            BUNDLE_TIMEOUT,
        )
        .await?;

        if !out_dir.is_dir() {
            return Err(ExternalError::UnexpectedOutput {
                program: NPX.to_string(),
                message: format!("bundle directory {} was not created", out_dir.display()),
            });
        }
        Ok(out_dir)
    }
}

#[async_trait]
impl Renderer for RemotionCli {
    async fn render(
        &self,
        bundle: &Path,
        props: &RenderProps,
        concurrency: usize,
    ) -> Result<Vec<u8>, ExternalError> {
        tokio::fs::create_dir_all(&self.work_root)
            .await
            .map_err(|e| ExternalError::Io {
                path: self.work_root.clone(),
                source: e,
            })?;

        let props_file = self.scratch_path("render-props", ".json");
        let output = self.scratch_path("render-output", ".mp4");

        let props_json = serde_json::to_vec(props).map_err(|e| ExternalError::UnexpectedOutput {
            program: NPX.to_string(),
            message: format!("could not encode render props: {}", e),
        })?;
        tokio::fs::write(&props_file, props_json)
            .await
            .map_err(|e| ExternalError::Io {
                path: props_file.clone(),
                source: e,
            })?;

        log::info!(
            "Rendering {} with concurrency {} ({} subtitle cues)",
            self.composition_id,
            concurrency,
            props.subtitles.len()
        );
        let result = run_command(
            NPX,
            self.render_arguments(bundle, &output, &props_file, concurrency),
            RENDER_TIMEOUT,
        )
        .await;
        remove_quietly(&props_file).await;
        result?;

        let bytes = tokio::fs::read(&output).await.map_err(|e| ExternalError::Io {
            path: output.clone(),
            source: e,
        });
        remove_quietly(&output).await;
        let bytes = bytes?;

        if bytes.is_empty() {
            return Err(ExternalError::UnexpectedOutput {
                program: NPX.to_string(),
                message: "render produced an empty file".to_string(),
            });
        }
        Ok(bytes)
    }
}
