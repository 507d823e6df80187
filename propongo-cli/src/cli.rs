use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Build business proposals: scope, budget, qualifications and timeline")]
pub struct Cli {
    /// Path to the proposal store (a directory, or a .db/.sqlite file)
    #[clap(long, global = true)]
    pub store: Option<PathBuf>,

    /// Store backend: file or sqlite (inferred from the path by default)
    #[clap(long, global = true)]
    pub backend: Option<String>,

    /// Show debug logging on stderr
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum ScopeCommand {
    /// Set the project overview (opens an editor when no text is given)
    Overview { text: Option<String> },

    /// Set the timeline notes
    Notes { text: Option<String> },

    /// Set the risks and limitations
    Limitations { text: Option<String> },
}

#[derive(Subcommand, Debug)]
pub enum ObjectiveCommand {
    /// Add an objective
    Add { text: String },

    /// Remove an objective by its position (1-based)
    Remove { position: usize },
}

#[derive(Subcommand, Debug)]
pub enum DeliverableCommand {
    /// Add a deliverable
    Add { name: String },

    /// Remove a deliverable by its position (1-based)
    Remove { position: usize },

    /// Set or clear the dates of a deliverable
    Dates {
        /// Position of the deliverable (1-based)
        position: usize,

        /// Start date (YYYY-MM-DD); an empty value clears it
        #[clap(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD); an empty value clears it
        #[clap(long)]
        end: Option<String>,
    },

    /// List deliverables with their dates
    List,
}

#[derive(Subcommand, Debug)]
pub enum SectionCommand {
    /// Add a custom scope section
    Add { name: String },

    /// Rename a custom section
    Rename { id: String, name: String },

    /// Set the content of a custom section (opens an editor when no text is given)
    Content { id: String, text: Option<String> },

    /// Remove a custom section
    Remove { id: String },

    /// List custom sections
    List,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Add a deliverable group
    Add {
        /// Name of the group
        #[clap(long)]
        name: Option<String>,
    },

    /// Rename a group (by id or current name)
    Rename { group: String, name: String },

    /// Remove a group; its line items become ungrouped
    Remove {
        /// Group id or name
        group: String,

        /// Skip the confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Create a group for every scope deliverable that has none yet
    Import,

    /// List groups
    List,
}

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    /// Add a budget line item
    Add {
        /// Description of the work
        #[clap(long)]
        description: Option<String>,

        /// Number of units (default 1)
        #[clap(long)]
        units: Option<String>,

        /// Cost of one unit
        #[clap(long)]
        cost: Option<String>,

        /// Group id or name
        #[clap(long)]
        group: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// Remove a line item by its position (1-based)
    Remove { position: usize },

    /// List line items in entry order
    List,
}

#[derive(Subcommand, Debug)]
pub enum TeamCommand {
    /// Add a team member
    Add {
        #[clap(long)]
        name: String,

        #[clap(long)]
        role: String,

        #[clap(long, default_value = "")]
        bio: String,
    },

    /// Remove a team member by position (1-based)
    Remove { position: usize },
}

#[derive(Subcommand, Debug)]
pub enum ExperienceCommand {
    /// Add a relevant experience entry
    Add { text: String },

    /// Remove an experience entry by position (1-based)
    Remove { position: usize },
}

#[derive(Subcommand, Debug)]
pub enum TestimonialCommand {
    /// Add a client testimonial
    Add {
        #[clap(long)]
        quote: String,

        #[clap(long)]
        author: String,

        #[clap(long)]
        company: Option<String>,
    },

    /// Remove a testimonial by position (1-based)
    Remove { position: usize },
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Copy every blob from the current store into another store
    Migrate {
        /// Destination store path
        #[clap(long)]
        to: PathBuf,

        /// Destination backend (inferred from the path by default)
        #[clap(long)]
        backend: Option<String>,
    },

    /// Print the path of the current store
    Path,

    /// Show store statistics
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the current configuration
    Show,

    /// Set the default store path
    SetStore { path: PathBuf },

    /// Show the help link for a topic, or list all topics
    Help { topic: Option<String> },

    /// Change the help link for a topic
    SetHelp {
        /// Topic such as budget.breakdown
        topic: String,

        #[clap(long)]
        title: Option<String>,

        #[clap(long)]
        url: Option<String>,

        #[clap(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show an overview of the proposal
    Show,

    /// Set the client name and project title
    Info {
        #[clap(long)]
        client: Option<String>,

        #[clap(long)]
        title: Option<String>,
    },

    /// Edit scope text fields
    #[clap(subcommand)]
    Scope(ScopeCommand),

    /// Manage objectives
    #[clap(subcommand)]
    Objective(ObjectiveCommand),

    /// Manage deliverables and their dates
    #[clap(subcommand)]
    Deliverable(DeliverableCommand),

    /// Manage custom scope sections
    #[clap(subcommand)]
    Section(SectionCommand),

    /// Manage deliverable groups for the budget
    #[clap(subcommand)]
    Group(GroupCommand),

    /// Manage budget line items
    #[clap(subcommand)]
    Item(ItemCommand),

    /// Show the grouped budget with subtotals
    Budget,

    /// Set the budget narrative
    Narrative { text: Option<String> },

    /// Set the contingency costs text
    Contingency { text: Option<String> },

    /// Set the company background
    Background { text: Option<String> },

    /// Manage team members
    #[clap(subcommand)]
    Team(TeamCommand),

    /// Manage relevant experience
    #[clap(subcommand)]
    Experience(ExperienceCommand),

    /// Manage client testimonials
    #[clap(subcommand)]
    Testimonial(TestimonialCommand),

    /// Show the deliverable timeline
    Timeline {
        /// Reference date for defaults and the today marker (YYYY-MM-DD)
        #[clap(long)]
        today: Option<String>,

        /// Print the chart dataset as JSON
        #[clap(long)]
        json: bool,
    },

    /// Print the proposal as Markdown
    Preview,

    /// Export the proposal
    Export {
        /// Export format (markdown, json, timeline)
        #[clap(long, default_value = "markdown")]
        format: String,

        /// Output file path
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Replace the proposal with one read from a JSON file
    Import {
        file: PathBuf,

        /// Skip the confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Delete the stored proposal and start over
    Reset {
        /// Skip the confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Store commands
    #[clap(subcommand)]
    Db(DbCommand),

    /// Configuration commands
    #[clap(subcommand)]
    Config(ConfigCommand),
}
