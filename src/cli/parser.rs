use crate::export::ExportFormat;
use clap::{Parser, Subcommand};

/// Command-line interface definition for tutorclock:
/// time-entry reconciliation and pay periods for tutoring franchises.
#[derive(Parser)]
#[command(
    name = "tutorclock",
    version = env!("CARGO_PKG_VERSION"),
    about = "Tutor time entry: clock in/out, reconcile against the posted schedule, resolve pay periods",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    /// Pin the clock to a fixed instant (RFC 3339)
    #[arg(global = true, long = "now", hide = true, value_name = "RFC3339")]
    pub now: Option<String>,

    /// Acting account: tutor:<id> or admin:<id>
    #[arg(global = true, long = "actor", value_name = "ACTOR")]
    pub actor: Option<String>,

    /// Print results as JSON instead of tables
    #[arg(global = true, long = "json")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields with their defaults")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(long = "editor", help = "Specify the editor to use")]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal operations log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Franchise payroll settings
    Franchise {
        #[command(subcommand)]
        action: FranchiseAction,
    },

    /// Pay period resolution and overrides
    Period {
        #[command(subcommand)]
        action: PeriodAction,
    },

    /// Weekly attestations
    Attest {
        #[command(subcommand)]
        action: AttestAction,
    },

    /// Schedule snapshots (derive, sign, verify)
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },

    /// Clock in or out (acts as the tutor given by --actor)
    Clock {
        #[command(subcommand)]
        action: ClockAction,
    },

    /// Show, save or submit a workday
    Day {
        #[command(subcommand)]
        action: DayAction,
    },

    /// Admin decisions and corrections
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },

    /// Print the audit trail of a day
    Audit {
        franchise: i64,

        day_id: i64,
    },

    /// Export the days of a pay period
    Export {
        franchise: i64,

        #[arg(long, value_name = "YYYY-MM-DD", help = "Any date inside the pay period (default: today)")]
        date: Option<String>,

        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long, short = 'f')]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum FranchiseAction {
    /// Create or update settings
    Set {
        franchise: i64,

        #[arg(long, help = "IANA timezone, e.g. America/Chicago")]
        timezone: Option<String>,

        #[arg(long = "period-type", help = "weekly | biweekly | semimonthly | monthly")]
        period_type: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD", help = "Biweekly anchor date")]
        anchor: Option<String>,
    },

    /// Show stored and effective settings
    Show { franchise: i64 },
}

#[derive(Subcommand)]
pub enum PeriodAction {
    /// Resolve the pay period containing a date
    Resolve {
        franchise: i64,

        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
    },

    /// Add a manual pay period override
    Override {
        franchise: i64,

        start: String,

        end: String,

        #[arg(long)]
        reason: Option<String>,
    },

    /// List overrides of a franchise
    ListOverrides { franchise: i64 },
}

#[derive(Subcommand)]
pub enum AttestAction {
    /// Attest a closed week (acts as the tutor given by --actor)
    Record {
        franchise: i64,

        #[arg(value_name = "WEEK_END")]
        week_end: String,

        #[arg(long, help = "Typed full name")]
        name: String,

        #[arg(
            long,
            default_value = "I attest that the hours recorded for this week are accurate."
        )]
        text: String,

        #[arg(long = "text-version", default_value = "v1")]
        text_version: String,
    },

    /// Would time entry on DATE be allowed right now?
    Check {
        franchise: i64,

        tutor: i64,

        date: String,
    },

    /// List a tutor's attestations
    List { franchise: i64, tutor: i64 },
}

#[derive(Subcommand)]
pub enum SnapshotAction {
    /// Derive a snapshot from a JSON array of {slotId, label}
    Derive {
        franchise: i64,

        tutor: i64,

        date: String,

        #[arg(long, value_name = "FILE")]
        entries: String,

        #[arg(long, help = "Override the franchise timezone")]
        timezone: Option<String>,

        #[arg(long = "slot-minutes")]
        slot_minutes: Option<i64>,

        #[arg(long, help = "Sign with the configured secret")]
        sign: bool,

        #[arg(long, value_name = "FILE", help = "Write to FILE instead of stdout")]
        out: Option<String>,
    },

    /// Sign a snapshot file with the configured secret
    Sign {
        file: String,

        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },

    /// Verify a snapshot file against the configured secret
    Verify { file: String },
}

#[derive(Subcommand)]
pub enum ClockAction {
    In {
        franchise: i64,
    },

    Out {
        franchise: i64,

        #[arg(long, help = "Compare with the schedule and submit")]
        finalize: bool,

        #[arg(long, value_name = "FILE", help = "Signed schedule snapshot (JSON)")]
        snapshot: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum DayAction {
    /// Show a day with its sessions and comparison
    Show {
        franchise: i64,

        #[arg(value_name = "YYYY-MM-DD")]
        date: Option<String>,

        #[arg(long, help = "Tutor id (admins; tutors default to themselves)")]
        tutor: Option<i64>,

        #[arg(long, help = "Look up by day id instead of date")]
        id: Option<i64>,
    },

    /// Replace the day's sessions (START/END, RFC 3339)
    Save {
        franchise: i64,

        date: String,

        #[arg(value_name = "START/END")]
        sessions: Vec<String>,
    },

    /// Submit the day against a schedule snapshot
    Submit {
        franchise: i64,

        date: String,

        #[arg(long, value_name = "FILE")]
        snapshot: String,
    },
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// Approve or deny a pending day
    Decide {
        franchise: i64,

        day_id: i64,

        #[arg(value_name = "approve|deny")]
        decision: String,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Rewrite every session of a day
    Fix {
        franchise: i64,

        day_id: i64,

        #[arg(value_name = "START/END")]
        sessions: Vec<String>,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Change one closed session
    EditSession {
        franchise: i64,

        day_id: i64,

        session_id: i64,

        #[arg(value_name = "START/END")]
        range: String,

        #[arg(long)]
        reason: Option<String>,
    },
}
