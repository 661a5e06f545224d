//! Automated notarization for macOS disk images
//!
//! Drives Apple's command-line tools through the full distribution workflow:
//! build a disk image, notarize it, staple the ticket to the app, rebuild and
//! sign the disk image, notarize that, and staple the ticket to the image.
//!
//! ```no_run
//! use notary::{CommandBuilder, NotaryConfig, Notarizer, SystemRunner};
//!
//! # async fn example() -> notary::Result<()> {
//! let config = NotaryConfig::load("notarize.cfg".as_ref()).await?;
//! let builder = CommandBuilder::new(SystemRunner::new(), vec!["./make_dmg.sh".to_string()]);
//! Notarizer::new(config, SystemRunner::new(), builder).run().await
//! # }
//! ```

#[macro_use]
pub mod output;

pub mod builder;
pub mod config;
pub mod error;
pub mod notarization;
pub mod notarizer;
pub mod signing;
pub mod tool;

// Re-export common types
pub use builder::{CommandBuilder, DmgBuilder, UnimplementedBuilder};
pub use config::{Backend, NotaryConfig};
pub use error::{NotaryError, Result};
pub use notarization::{Issue, NotarizationClient, Submission, Verdict};
pub use notarizer::Notarizer;
pub use signing::SigningController;
pub use tool::{SystemRunner, ToolOutput, ToolRunner};
