//! The seam between the cache and whatever produces Tailwind output.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use ox1_config::TailwindSettings;
use tokio::sync::OnceCell;

use crate::error::GeneratorError;
use crate::generator::TailwindGenerator;
use crate::provider::{PackageManager, ProviderLookup};

/// Turns a global stylesheet into processed CSS.
#[async_trait]
pub trait CssProcessor: Send + Sync {
    async fn process(&self, stylesheet: &Path, input: &str) -> Result<String, GeneratorError>;

    fn name(&self) -> &str;
}

/// Processor backed by the Tailwind CLI.
///
/// The CLI is located on first use. A failed lookup is retried on the next
/// call, so installing Tailwind while the server runs is picked up.
pub struct TailwindCliProcessor {
    project_root: PathBuf,
    settings: TailwindSettings,
    generator: OnceCell<Arc<TailwindGenerator>>,
}

impl TailwindCliProcessor {
    pub fn new(project_root: PathBuf, settings: TailwindSettings) -> Self {
        Self {
            project_root,
            settings,
            generator: OnceCell::new(),
        }
    }

    async fn generator(&self) -> Result<Arc<TailwindGenerator>, GeneratorError> {
        self.generator
            .get_or_try_init(|| async {
                let provider = self.resolve_provider().await?;
                tracing::info!(provider = %provider.describe(), "using tailwind cli");

                let generator = TailwindGenerator::new(provider, self.project_root.clone())
                    .with_config(self.settings.config_file.clone())
                    .with_minify(self.settings.minify)
                    .with_timeout(self.settings.timeout_secs);
                Ok::<_, GeneratorError>(Arc::new(generator))
            })
            .await
            .cloned()
    }

    async fn resolve_provider(&self) -> Result<crate::provider::TailwindProvider, GeneratorError> {
        let preferred = self
            .settings
            .package_manager
            .as_deref()
            .and_then(PackageManager::from_name);

        match ProviderLookup::run(&self.project_root, preferred).await {
            ProviderLookup::NotInstalled {
                package_manager: Some(pm),
                ..
            } if self.settings.auto_install => {
                pm.install_tailwind(&self.project_root).await?;
                ProviderLookup::run(&self.project_root, Some(pm))
                    .await
                    .into_result()
            }
            lookup => lookup.into_result(),
        }
    }
}

#[async_trait]
impl CssProcessor for TailwindCliProcessor {
    async fn process(&self, stylesheet: &Path, input: &str) -> Result<String, GeneratorError> {
        let generator = self.generator().await?;
        tracing::debug!(stylesheet = %stylesheet.display(), "running tailwind cli");
        generator.generate_from_input(input).await
    }

    fn name(&self) -> &str {
        "tailwind-cli"
    }
}
