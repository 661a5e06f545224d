//! Code signing and ticket stapling.

use crate::config::NotaryConfig;
use crate::error::Result;
use crate::tool::ToolRunner;
use std::path::Path;

const XCRUN: &str = "xcrun";
const CODESIGN: &str = "codesign";

/// Staples notarization tickets and re-signs the disk image.
///
/// Every operation fails with [`crate::NotaryError::ToolFailed`] when the
/// underlying tool exits nonzero.
pub struct SigningController<'a, R> {
    config: &'a NotaryConfig,
    runner: &'a R,
}

impl<'a, R: ToolRunner> SigningController<'a, R> {
    pub fn new(config: &'a NotaryConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }

    /// `xcrun stapler staple <app_path>`
    pub async fn staple_app(&self) -> Result<()> {
        let app_path = self.config.app_path()?;
        step!("Stapling the notarization ticket to {}", app_path.display());
        self.staple(&app_path).await
    }

    /// `codesign -v -s <identity> <dmg_path>`
    pub async fn sign_dmg(&self) -> Result<()> {
        let identity = self.config.identity()?;
        let dmg_path = self.config.dmg_path()?;
        step!("Signing the disk image");

        let args = vec![
            "-v".to_string(),
            "-s".to_string(),
            identity.to_string(),
            dmg_path.display().to_string(),
        ];
        self.runner
            .run(CODESIGN, &args)
            .await?
            .check(CODESIGN, "Signing failed")?;

        success!("Signed {}", dmg_path.display());
        Ok(())
    }

    /// `xcrun stapler staple <dmg_path>`
    pub async fn staple_dmg(&self) -> Result<()> {
        let dmg_path = self.config.dmg_path()?;
        step!("Stapling the notarization ticket to {}", dmg_path.display());
        self.staple(&dmg_path).await
    }

    async fn staple(&self, path: &Path) -> Result<()> {
        let args = vec![
            "stapler".to_string(),
            "staple".to_string(),
            path.display().to_string(),
        ];
        self.runner
            .run(XCRUN, &args)
            .await?
            .check(XCRUN, "Stapling failed")?;

        success!("Ticket stapled to {}", path.display());
        Ok(())
    }
}
