//! Disk image builders
//!
//! Building the disk image is left to the integrator: anything implementing
//! [`DmgBuilder`] that leaves a readable image at the configured `dmg_path`
//! will do. The workflow calls it twice, once for the first submission and
//! once more after the app has been stapled.

use crate::config::NotaryConfig;
use crate::error::{NotaryError, Result};
use crate::tool::ToolRunner;

/// Produces the disk image at `config.dmg_path()`.
#[allow(async_fn_in_trait)]
pub trait DmgBuilder {
    async fn build_dmg(&self, config: &NotaryConfig) -> Result<()>;
}

impl<B: DmgBuilder> DmgBuilder for &B {
    async fn build_dmg(&self, config: &NotaryConfig) -> Result<()> {
        (**self).build_dmg(config).await
    }
}

/// Builder used when none was supplied. Always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnimplementedBuilder;

impl DmgBuilder for UnimplementedBuilder {
    async fn build_dmg(&self, _config: &NotaryConfig) -> Result<()> {
        Err(NotaryError::BuildNotImplemented)
    }
}

/// Runs a configured command to build the disk image.
///
/// `{app_name}`, `{app_path}` and `{dmg_path}` in arguments are replaced with
/// the configured values. Placeholders are only resolved when present, so a
/// command that doesn't mention a key never requires it.
#[derive(Debug, Clone)]
pub struct CommandBuilder<R> {
    runner: R,
    command: Vec<String>,
}

impl<R: ToolRunner> CommandBuilder<R> {
    pub fn new(runner: R, command: Vec<String>) -> Self {
        Self { runner, command }
    }

    /// Command line after placeholder substitution.
    pub fn resolve(&self, config: &NotaryConfig) -> Result<Vec<String>> {
        self.command
            .iter()
            .map(|arg| substitute(arg, config))
            .collect()
    }
}

fn substitute(arg: &str, config: &NotaryConfig) -> Result<String> {
    let mut resolved = arg.to_string();

    if resolved.contains("{app_name}") {
        resolved = resolved.replace("{app_name}", config.app_name()?);
    }
    if resolved.contains("{app_path}") {
        resolved = resolved.replace("{app_path}", &config.app_path()?.display().to_string());
    }
    if resolved.contains("{dmg_path}") {
        resolved = resolved.replace("{dmg_path}", &config.dmg_path()?.display().to_string());
    }

    Ok(resolved)
}

impl<R: ToolRunner> DmgBuilder for CommandBuilder<R> {
    async fn build_dmg(&self, config: &NotaryConfig) -> Result<()> {
        let command = self.resolve(config)?;
        let Some((program, args)) = command.split_first() else {
            return Err(NotaryError::InvalidConfig(
                "[build] command must not be empty".to_string(),
            ));
        };

        let output = self
            .runner
            .run(program, args)
            .await?
            .check(program, "Disk image build failed")?;

        let stdout = output.stdout.trim();
        if !stdout.is_empty() {
            println!("{stdout}");
        }
        Ok(())
    }
}
