use clap::Subcommand;
use connectors::provider::AtomicityMode;

#[derive(Subcommand)]
pub enum Commands {
    /// Copy one table in parallel partitions under a single distributed
    /// transaction
    Copy {
        #[arg(long, help = "Source connection URL (mysql:// or postgres://)")]
        source_url: String,

        #[arg(long, help = "Destination connection URL (mysql:// or postgres://)")]
        destination_url: String,

        #[arg(long, help = "Source table, optionally schema-qualified")]
        table: String,

        #[arg(long, help = "Destination table; defaults to the source table name")]
        destination_table: Option<String>,

        #[arg(
            long,
            default_value_t = 4,
            help = "Worker count; clamped to the number of CPU cores"
        )]
        workers: usize,

        #[arg(
            long,
            default_value_t = engine_core::settings::DEFAULT_BATCH_SIZE,
            help = "Rows per fetch/insert batch"
        )]
        batch_size: usize,

        #[arg(
            long,
            default_value_t = AtomicityMode::Global,
            help = "\"global\" for all-or-nothing 2PC, \"per-branch\" for independent commits"
        )]
        atomicity: AtomicityMode,

        #[arg(long, help = "Print the run summary as JSON instead of text")]
        json: bool,

        #[arg(long, help = "Suppress the periodic progress display")]
        quiet: bool,
    },
    /// Open and close a connection to verify a URL
    TestConn {
        #[arg(long, help = "Connection URL to test")]
        url: String,
    },
}
