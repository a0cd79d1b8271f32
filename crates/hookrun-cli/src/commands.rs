//! CLI command definitions.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Also consume and run executions in this process
        #[arg(long)]
        with_worker: bool,
    },

    /// Consume dispatch messages and run executions
    Worker,

    /// Apply database migrations and exit
    Migrate,
}
