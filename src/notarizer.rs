//! The notarization workflow.

use crate::builder::DmgBuilder;
use crate::config::NotaryConfig;
use crate::error::Result;
use crate::notarization::NotarizationClient;
use crate::signing::SigningController;
use crate::tool::ToolRunner;
use tokio::time::Instant;

/// Builds, notarizes, staples and re-packages one app.
///
/// # Process
/// 1. Build the disk image
/// 2. Submit it for notarization
/// 3. Wait for the verdict
/// 4. Staple the ticket to the app bundle
/// 5. Rebuild the disk image around the stapled app
/// 6. Sign the new disk image
/// 7. Submit it for notarization
/// 8. Wait for the verdict
/// 9. Staple the ticket to the disk image
///
/// The first failing step aborts the run and its error is returned.
pub struct Notarizer<R, B> {
    config: NotaryConfig,
    runner: R,
    builder: B,
}

impl<R: ToolRunner, B: DmgBuilder> Notarizer<R, B> {
    pub fn new(config: NotaryConfig, runner: R, builder: B) -> Self {
        Self {
            config,
            runner,
            builder,
        }
    }

    #[must_use]
    pub fn config(&self) -> &NotaryConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<()> {
        let started = Instant::now();
        let client = NotarizationClient::new(&self.config, &self.runner).started_at(started);
        let signing = SigningController::new(&self.config, &self.runner);

        self.build_dmg().await?;
        let dmg = self.config.dmg_path()?;
        let submission = client.submit(&dmg).await?;
        client.await_verdict(&submission).await?;
        signing.staple_app().await?;

        step!("Repackaging the stapled app ...");
        self.build_dmg().await?;
        signing.sign_dmg().await?;
        let submission = client.submit(&dmg).await?;
        client.await_verdict(&submission).await?;
        signing.staple_dmg().await?;

        success!(
            "Notarized {} in {} seconds",
            dmg.display(),
            started.elapsed().as_secs()
        );
        Ok(())
    }

    async fn build_dmg(&self) -> Result<()> {
        step!("Building the disk image");
        self.builder.build_dmg(&self.config).await
    }
}
